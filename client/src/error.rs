//! Error types for the grievance API client.

use grievance_session::SessionError;
use thiserror::Error;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur when talking to the grievance backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered `401`; the session has been ended.
    #[error("Unauthorized - session ended")]
    Unauthorized,

    /// The backend answered `409` (duplicate resource).
    #[error("Conflict: {message}")]
    Conflict {
        /// Message from the backend
        message: String,
    },

    /// The backend answered `400` (invalid data).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Message from the backend
        message: String,
    },

    /// Any other non-success status.
    #[error("API error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the backend, or the canonical reason
        message: String,
    },

    /// A `2xx` envelope with `success: false`.
    #[error("Request refused: {message}")]
    Refused {
        /// Message from the backend
        message: String,
    },

    /// The request never got a response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// Session manager error (login, storage).
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// HTTP status behind this error, when there was a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Conflict { .. } => Some(409),
            Self::BadRequest { .. } => Some(400),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
