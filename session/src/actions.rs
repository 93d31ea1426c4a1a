//! Session actions.
//!
//! Actions are everything the session reducer reacts to: commands from the
//! application (`Initialize`, `Logout`, ...) and the results of effects the
//! manager executed on the reducer's behalf (`StoredSessionLoaded`,
//! `SessionPersisted`, ...).

use crate::state::{Session, StoredSession};
use crate::token::InvalidReason;

/// Why session storage is being cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearCause {
    /// The user signed out.
    Logout,
    /// An API request came back `401 Unauthorized`.
    Unauthorized,
    /// The stored token failed a lazy check.
    TokenInvalid(InvalidReason),
    /// The stored values could not be restored at start-up.
    RestoreRejected,
    /// A sign-in could not be persisted; partial writes are undone.
    LoginRollback,
    /// A failed sign-in overwrote part of a live session and the live
    /// session could not be written back.
    RollbackFailed,
}

impl ClearCause {
    /// Whether clearing ends with a hard redirect to sign-in.
    ///
    /// Only clears that end an active (or believed active) session redirect.
    /// Start-up normalization and login rollback leave the view alone.
    #[must_use]
    pub const fn redirects(self) -> bool {
        matches!(
            self,
            Self::Logout | Self::Unauthorized | Self::TokenInvalid(_) | Self::RollbackFailed
        )
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::Unauthorized => "unauthorized",
            Self::TokenInvalid(_) => "token_invalid",
            Self::RestoreRejected => "restore_rejected",
            Self::LoginRollback => "login_rollback",
            Self::RollbackFailed => "rollback_failed",
        }
    }
}

/// Session action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════
    /// Restore the session from durable storage. Only the first call counts.
    Initialize,

    /// Durable storage was read.
    StoredSessionLoaded(StoredSession),

    /// Durable storage could not be read at start-up.
    StorageUnavailable {
        /// Error description
        error: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Sign-in
    // ═══════════════════════════════════════════════════════════════════════
    /// The authentication endpoint accepted the credentials.
    LoginSucceeded(Session),

    /// Every field of the new session reached durable storage.
    SessionPersisted(Session),

    /// Writing the new session failed.
    PersistFailed {
        /// Error description
        error: String,
    },

    /// The live session was written back over a failed sign-in.
    SessionRewritten,

    /// Writing the live session back failed too.
    RewriteFailed {
        /// Error description
        error: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Sign-out
    // ═══════════════════════════════════════════════════════════════════════
    /// The user asked to sign out.
    Logout,

    /// An API request was answered with `401 Unauthorized`.
    Unauthorized,

    /// Session storage was cleared.
    StorageCleared(ClearCause),

    /// Clearing session storage failed. The session is dropped regardless.
    ClearFailed {
        /// Why storage was being cleared
        cause: ClearCause,
        /// Error description
        error: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Lazy expiry
    // ═══════════════════════════════════════════════════════════════════════
    /// Re-validate the stored token before answering "is anyone signed in".
    CheckAuthentication,

    /// The stored token was read back. `None` when absent or unreadable.
    StoredTokenRead(Option<String>),
}

impl SessionAction {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::StoredSessionLoaded(_) => "stored_session_loaded",
            Self::StorageUnavailable { .. } => "storage_unavailable",
            Self::LoginSucceeded(_) => "login_succeeded",
            Self::SessionPersisted(_) => "session_persisted",
            Self::PersistFailed { .. } => "persist_failed",
            Self::SessionRewritten => "session_rewritten",
            Self::RewriteFailed { .. } => "rewrite_failed",
            Self::Logout => "logout",
            Self::Unauthorized => "unauthorized",
            Self::StorageCleared(_) => "storage_cleared",
            Self::ClearFailed { .. } => "clear_failed",
            Self::CheckAuthentication => "check_authentication",
            Self::StoredTokenRead(_) => "stored_token_read",
        }
    }
}
