//! Session constants.
//!
//! This module contains constant values shared by the session manager and
//! the storage layer.

/// Durable storage keys of the persisted session.
///
/// The layout is a flat set of string keys so that any key-value backend
/// (a browser-style local store, a JSON file, a keychain) can hold it.
pub mod storage_keys {
    /// Bearer token.
    pub const TOKEN: &str = "token";

    /// Backend user identifier.
    pub const USER_ID: &str = "userId";

    /// Account username.
    pub const USERNAME: &str = "username";

    /// Account email address.
    pub const EMAIL: &str = "email";

    /// Role wire name (`USER` or `ADMIN`).
    pub const ROLE: &str = "role";

    /// Every key the manager writes, in write order.
    pub const ALL: [&str; 5] = [TOKEN, USER_ID, USERNAME, EMAIL, ROLE];
}

/// Authentication endpoint paths, relative to the API base URL.
pub mod endpoints {
    /// Credential exchange.
    pub const LOGIN: &str = "/api/auth/login";

    /// Account registration.
    pub const REGISTER: &str = "/api/auth/register";
}
