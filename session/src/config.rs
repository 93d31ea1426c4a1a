//! Session manager configuration.
//!
//! Configuration values should be provided by the application, not hardcoded.

use chrono::Duration;
use grievance_core::Destination;

/// Session manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Where hard redirects on logout, expiry and `401` lead.
    ///
    /// Default: [`Destination::Login`]
    pub sign_in: Destination,

    /// Safety margin subtracted from a token's lifetime.
    ///
    /// A token is treated as expired once `now + expiry_leeway >= exp`.
    ///
    /// Default: zero
    pub expiry_leeway: Duration,
}

impl SessionConfig {
    /// Create the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sign_in: Destination::Login,
            expiry_leeway: Duration::zero(),
        }
    }

    /// Set the sign-in destination.
    #[must_use]
    pub const fn with_sign_in(mut self, destination: Destination) -> Self {
        self.sign_in = destination;
        self
    }

    /// Set the expiry leeway.
    #[must_use]
    pub const fn with_expiry_leeway(mut self, leeway: Duration) -> Self {
        self.expiry_leeway = leeway;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
