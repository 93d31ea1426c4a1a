//! # Grievance Session
//!
//! Session and authorization manager for the IT Grievance portal client.
//!
//! The manager is the single source of truth for who is signed in and with
//! what privileges. It:
//!
//! - restores the session from durable storage at start-up
//! - signs in against the backend and writes the session through to storage
//! - re-validates the stored token lazily, whenever an authorization
//!   decision needs it
//! - ends the session on logout, expiry or a `401` from the API
//! - gates routes by authentication and role
//!
//! ## Architecture
//!
//! The session lifecycle is a reducer:
//!
//! ```text
//! Action → SessionReducer → (State, Effects) → SessionManager executes → More Actions
//! ```
//!
//! External dependencies (storage, the authentication endpoint, navigation,
//! the clock) are injected through [`SessionEnvironment`]. Mocks for all of
//! them live in [`mocks`] behind the `test-utils` feature.
//!
//! ## Example
//!
//! ```
//! use grievance_core::{Destination, SystemClock};
//! use grievance_session::guard::GuardOutcome;
//! use grievance_session::mocks::{MockAuthApi, MockKeyValueStore, MockNavigator};
//! use grievance_session::{SessionEnvironment, SessionManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = SessionManager::new(SessionEnvironment::new(
//!     MockKeyValueStore::new(),
//!     MockAuthApi::new(),
//!     MockNavigator::new(),
//!     SystemClock,
//! ));
//! manager.initialize().await;
//!
//! let outcome = manager.authorize_path("/my-complaints").await;
//! assert_eq!(outcome, GuardOutcome::Redirect(Destination::Login));
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod bearer;
pub mod config;
pub mod constants;
pub mod effects;
pub mod environment;
pub mod error;
pub mod guard;
pub mod manager;
pub mod metrics;
pub mod persistence;
pub mod providers;
pub mod reducer;
pub mod state;
pub mod stores;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::{ClearCause, SessionAction};
pub use bearer::BearerHandle;
pub use config::SessionConfig;
pub use effects::SessionEffect;
pub use environment::SessionEnvironment;
pub use error::{Result, SessionError};
pub use guard::{GuardInput, GuardOutcome};
pub use manager::{SessionManager, SessionSnapshot};
pub use reducer::SessionReducer;
pub use state::{BearerToken, Session, SessionState, SessionStatus};
pub use token::{InvalidReason, TokenValidity};
