//! Session effects.
//!
//! Effects are **values**, not execution. The session manager interprets
//! them: storage effects run against the [`KeyValueStore`], bearer effects
//! against the [`BearerHandle`], and redirects go to the [`Navigator`] once
//! the new state is committed.
//!
//! [`KeyValueStore`]: crate::providers::KeyValueStore
//! [`BearerHandle`]: crate::bearer::BearerHandle
//! [`Navigator`]: crate::providers::Navigator

use crate::actions::ClearCause;
use crate::state::{BearerToken, Session};
use grievance_core::Destination;

/// Session effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Read every session key.
    ///
    /// Feeds back `StoredSessionLoaded` or `StorageUnavailable`.
    LoadStoredSession,

    /// Read the token key.
    ///
    /// Feeds back `StoredTokenRead`.
    ReadStoredToken,

    /// Write every session key.
    ///
    /// Feeds back `SessionPersisted` or `PersistFailed`.
    PersistSession(Session),

    /// Write the still-live session back after a failed sign-in left
    /// storage half overwritten.
    ///
    /// Feeds back `SessionRewritten` or `RewriteFailed`.
    RewriteSession(Session),

    /// Remove every session key.
    ///
    /// Feeds back `StorageCleared` or `ClearFailed`.
    ClearStorage(ClearCause),

    /// Attach the token to outgoing API requests.
    AttachBearer(BearerToken),

    /// Stop attaching a token to outgoing API requests.
    DetachBearer,

    /// Hard redirect, issued after the state change is committed.
    Redirect(Destination),
}

impl SessionEffect {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadStoredSession => "load_stored_session",
            Self::ReadStoredToken => "read_stored_token",
            Self::PersistSession(_) => "persist_session",
            Self::RewriteSession(_) => "rewrite_session",
            Self::ClearStorage(_) => "clear_storage",
            Self::AttachBearer(_) => "attach_bearer",
            Self::DetachBearer => "detach_bearer",
            Self::Redirect(_) => "redirect",
        }
    }
}
