//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! for use in unit and integration tests.

pub mod auth;
pub mod navigation;
pub mod storage;

pub use auth::MockAuthApi;
pub use navigation::MockNavigator;
pub use storage::MockKeyValueStore;
