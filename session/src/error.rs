//! Error types for session operations.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failure modes of the session manager and its providers.
///
/// The manager never retries. [`SessionError::is_retryable`] only tells the
/// caller whether offering "try again" makes sense.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════
    /// The endpoint refused the username/password pair.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials {
        /// Message from the backend, or a generic one
        message: String,
    },

    /// The endpoint answered with a non-success status other than `401`.
    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message from the backend, or the status reason
        message: String,
    },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered 2xx with a body that is not a usable envelope.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ═══════════════════════════════════════════════════════════
    // Lifecycle Errors
    // ═══════════════════════════════════════════════════════════
    /// `initialize()` has not completed yet.
    #[error("Session manager is not initialized")]
    NotInitialized,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════
    /// Durable storage failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invariant violation inside the manager.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns `true` if this error is due to what the user submitted.
    ///
    /// # Examples
    ///
    /// ```
    /// # use grievance_session::SessionError;
    /// let err = SessionError::InvalidCredentials { message: "bad password".into() };
    /// assert!(err.is_user_error());
    /// assert!(!SessionError::Transport("connection refused".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        match self {
            Self::InvalidCredentials { .. } => true,
            Self::Rejected { status, .. } => *status >= 400 && *status < 500,
            _ => false,
        }
    }

    /// Returns `true` if repeating the same call could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Storage(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
