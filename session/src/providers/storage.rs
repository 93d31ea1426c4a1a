//! Durable key-value storage trait.

use crate::error::Result;

/// Durable string storage.
///
/// This trait abstracts over wherever the session shadow copy lives
/// between process runs (a JSON file, a platform keychain, a browser-style
/// local store).
///
/// # Implementation Notes
///
/// - Values must survive a process restart
/// - `remove` of an absent key is not an error
/// - Failures are reported as [`crate::SessionError::Storage`]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}
