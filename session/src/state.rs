//! Session state.
//!
//! [`SessionState`] is what the reducer owns. [`Session`] is the signed-in
//! account; it is either fully present or absent, never partially filled.

use grievance_core::{Role, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque bearer credential issued by the authentication endpoint.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header carrying this token.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer credential.
    pub token: BearerToken,
    /// Backend identifier.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Account email address.
    pub email: String,
    /// Account role.
    pub role: Role,
}

impl Session {
    /// Whether the account is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Lifecycle status of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// `initialize()` has not been called.
    #[default]
    Uninitialized,
    /// Durable storage is being read.
    Loading,
    /// Ready, nobody signed in.
    Anonymous,
    /// Ready, a session is present.
    Authenticated,
}

impl SessionStatus {
    /// Whether initialization has completed.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Anonymous | Self::Authenticated)
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State owned by the session reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Present iff `status == Authenticated`.
    pub session: Option<Session>,
    /// Incremented on every sign-in and sign-out.
    pub generation: u64,
}

impl SessionState {
    /// Install `session` and move to `Authenticated`.
    pub fn sign_in(&mut self, session: Session) {
        self.session = Some(session);
        self.status = SessionStatus::Authenticated;
        self.generation += 1;
    }

    /// Drop the session and move to `Anonymous`.
    ///
    /// Returns `false` when there was nothing to change.
    pub fn sign_out(&mut self) -> bool {
        let had_session = self.session.take().is_some();
        let was_anonymous = self.status == SessionStatus::Anonymous;
        self.status = SessionStatus::Anonymous;

        if had_session || !was_anonymous {
            self.generation += 1;
            true
        } else {
            false
        }
    }

    /// Role of the signed-in account, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(|session| session.role)
    }
}

/// Raw values read back from durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    /// `token` key.
    pub token: Option<String>,
    /// `userId` key.
    pub user_id: Option<String>,
    /// `username` key.
    pub username: Option<String>,
    /// `email` key.
    pub email: Option<String>,
    /// `role` key.
    pub role: Option<String>,
}

/// Why stored values do not form a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoredSessionDefect {
    /// A key is absent or empty.
    #[error("Stored session is missing `{0}`")]
    Missing(&'static str),

    /// The role is not a known wire name.
    #[error("Stored session has unknown role `{0}`")]
    UnknownRole(String),
}

impl StoredSession {
    /// Whether no session key holds a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.token.is_none()
            && self.user_id.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.role.is_none()
    }

    /// Assemble a session from the stored values.
    ///
    /// Token expiry is not checked here.
    ///
    /// # Errors
    ///
    /// Returns the first defect found: a missing or empty key, or a role that
    /// does not parse.
    pub fn into_session(self) -> std::result::Result<Session, StoredSessionDefect> {
        use crate::constants::storage_keys;

        fn required(
            value: Option<String>,
            key: &'static str,
        ) -> std::result::Result<String, StoredSessionDefect> {
            value
                .filter(|v| !v.is_empty())
                .ok_or(StoredSessionDefect::Missing(key))
        }

        let token = required(self.token, storage_keys::TOKEN)?;
        let user_id = required(self.user_id, storage_keys::USER_ID)?;
        let username = required(self.username, storage_keys::USERNAME)?;
        let email = required(self.email, storage_keys::EMAIL)?;
        let role = required(self.role, storage_keys::ROLE)?;
        let role = role
            .parse::<Role>()
            .map_err(|unknown| StoredSessionDefect::UnknownRole(unknown.0))?;

        Ok(Session {
            token: BearerToken::new(token),
            user_id: UserId::new(user_id),
            username,
            email,
            role,
        })
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            token: Some(session.token.as_str().to_string()),
            user_id: Some(session.user_id.to_string()),
            username: Some(session.username.clone()),
            email: Some(session.email.clone()),
            role: Some(session.role.as_str().to_string()),
        }
    }
}
