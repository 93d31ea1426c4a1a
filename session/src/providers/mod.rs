//! Session providers.
//!
//! This module defines traits for every external dependency of the session
//! manager. The reducer and the manager depend on these traits; the
//! application wires concrete implementations.
//!
//! - [`KeyValueStore`]: durable string storage for the session shadow copy
//! - [`AuthApi`]: the backend's authentication endpoint
//! - [`Navigator`]: the sink for hard redirects
//!
//! Production implementations live next to the traits
//! ([`HttpAuthApi`], [`ChannelNavigator`]) and in [`crate::stores`].
//! In-memory versions for tests live in `crate::mocks`.

pub mod auth;
pub mod http_auth;
pub mod navigation;
pub mod storage;

pub use auth::{AuthApi, LoginResponse, RegisteredUser, RegistrationRequest};
pub use http_auth::HttpAuthApi;
pub use navigation::{ChannelNavigator, Navigator};
pub use storage::KeyValueStore;
