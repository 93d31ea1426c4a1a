//! Session environment.
//!
//! This module defines the environment type for dependency injection
//! in the session reducer and manager.

use crate::config::SessionConfig;
use crate::providers::{AuthApi, KeyValueStore, Navigator};
use grievance_core::Clock;

/// Session environment.
///
/// Contains all external dependencies of the session manager.
///
/// # Type Parameters
///
/// - `K`: Durable key-value store
/// - `A`: Authentication endpoint
/// - `N`: Navigation sink
/// - `C`: Clock
#[derive(Debug, Clone)]
pub struct SessionEnvironment<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    /// Durable storage for the session shadow copy.
    pub storage: K,

    /// Authentication endpoint.
    pub auth: A,

    /// Receiver of hard redirects.
    pub navigator: N,

    /// Time source for token expiry checks.
    pub clock: C,

    /// Manager configuration.
    pub config: SessionConfig,
}

impl<K, A, N, C> SessionEnvironment<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    /// Create a new session environment with the default configuration.
    #[must_use]
    pub fn new(storage: K, auth: A, navigator: N, clock: C) -> Self {
        Self {
            storage,
            auth,
            navigator,
            clock,
            config: SessionConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }
}
