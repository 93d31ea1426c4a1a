//! Session reducer.
//!
//! The reducer is the whole session state machine:
//!
//! ```text
//! Uninitialized ──Initialize──▶ Loading ──▶ Anonymous ◀──────┐
//!                                   │           │             │ logout, lazy expiry,
//!                                   │           ▼ login       │ unauthorized
//!                                   └──────▶ Authenticated ───┘
//! ```
//!
//! It never performs I/O. Storage reads and writes are requested through
//! [`SessionEffect`]s and their outcome comes back as another
//! [`SessionAction`], so the in-memory state only changes after durable
//! storage has.

use crate::actions::{ClearCause, SessionAction};
use crate::effects::SessionEffect;
use crate::environment::SessionEnvironment;
use crate::providers::{AuthApi, KeyValueStore, Navigator};
use crate::state::{SessionState, SessionStatus, StoredSession};
use crate::token::{self, TokenValidity};
use grievance_core::{Clock, Reducer, SmallVec, smallvec};
use std::marker::PhantomData;

/// Session reducer.
#[derive(Debug, Clone)]
pub struct SessionReducer<K, A, N, C> {
    /// Phantom data to hold type parameters.
    _phantom: PhantomData<fn() -> (K, A, N, C)>,
}

impl<K, A, N, C> SessionReducer<K, A, N, C> {
    /// Create a new session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<K, A, N, C> Default for SessionReducer<K, A, N, C> {
    fn default() -> Self {
        Self::new()
    }
}

type Effects = SmallVec<[SessionEffect; 4]>;

impl<K, A, N, C> SessionReducer<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    fn restore(
        state: &mut SessionState,
        stored: StoredSession,
        env: &SessionEnvironment<K, A, N, C>,
    ) -> Effects {
        if stored.is_empty() {
            tracing::debug!("No stored session");
            state.status = SessionStatus::Anonymous;
            return SmallVec::new();
        }

        let session = match stored.into_session() {
            Ok(session) => session,
            Err(defect) => {
                tracing::warn!(%defect, "Discarding incomplete stored session");
                return smallvec![SessionEffect::ClearStorage(ClearCause::RestoreRejected)];
            }
        };

        match token::validate(
            Some(session.token.as_str()),
            env.clock.now(),
            env.config.expiry_leeway,
        ) {
            TokenValidity::Valid { expires_at } => {
                tracing::info!(
                    username = %session.username,
                    role = %session.role,
                    %expires_at,
                    "Restored stored session"
                );
                let bearer = session.token.clone();
                state.sign_in(session);
                smallvec![SessionEffect::AttachBearer(bearer)]
            }
            TokenValidity::Invalid { reason } => {
                tracing::info!(
                    username = %session.username,
                    %reason,
                    "Discarding stored session with unusable token"
                );
                smallvec![SessionEffect::ClearStorage(ClearCause::RestoreRejected)]
            }
        }
    }

    fn finish_clear(
        state: &mut SessionState,
        cause: ClearCause,
        env: &SessionEnvironment<K, A, N, C>,
    ) -> Effects {
        if cause.redirects() {
            if state.status.is_ready() && state.sign_out() {
                tracing::info!(cause = cause.as_str(), "Session ended");
            }
            return smallvec![
                SessionEffect::DetachBearer,
                SessionEffect::Redirect(env.config.sign_in),
            ];
        }

        if cause == ClearCause::RestoreRejected && state.status == SessionStatus::Loading {
            state.status = SessionStatus::Anonymous;
        }
        SmallVec::new()
    }
}

impl<K, A, N, C> Reducer for SessionReducer<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    type State = SessionState;
    type Action = SessionAction;
    type Effect = SessionEffect;
    type Environment = SessionEnvironment<K, A, N, C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Self::Effect; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Lifecycle
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Initialize => {
                if state.status != SessionStatus::Uninitialized {
                    tracing::warn!(status = %state.status, "Session manager already initialized");
                    return SmallVec::new();
                }
                state.status = SessionStatus::Loading;
                smallvec![SessionEffect::LoadStoredSession]
            }

            SessionAction::StoredSessionLoaded(stored) => {
                if state.status != SessionStatus::Loading {
                    tracing::warn!(status = %state.status, "Ignoring stored session outside of loading");
                    return SmallVec::new();
                }
                Self::restore(state, stored, env)
            }

            SessionAction::StorageUnavailable { error } => {
                if state.status == SessionStatus::Loading {
                    tracing::warn!(%error, "Session storage unreadable, starting anonymous");
                    state.status = SessionStatus::Anonymous;
                }
                SmallVec::new()
            }

            // ═══════════════════════════════════════════════════════════════
            // Sign-in: persist first, then commit
            // ═══════════════════════════════════════════════════════════════
            SessionAction::LoginSucceeded(session) => {
                if !state.status.is_ready() {
                    tracing::warn!(status = %state.status, "Ignoring login before initialization");
                    return SmallVec::new();
                }
                smallvec![SessionEffect::PersistSession(session)]
            }

            SessionAction::SessionPersisted(session) => {
                tracing::info!(
                    username = %session.username,
                    role = %session.role,
                    "Signed in"
                );
                let bearer = session.token.clone();
                state.sign_in(session);
                smallvec![SessionEffect::AttachBearer(bearer)]
            }

            SessionAction::PersistFailed { error } => {
                tracing::error!(%error, "Failed to persist session, rolling back");
                // Storage must go back to mirroring memory, not to empty
                match &state.session {
                    Some(live) => smallvec![SessionEffect::RewriteSession(live.clone())],
                    None => smallvec![SessionEffect::ClearStorage(ClearCause::LoginRollback)],
                }
            }

            SessionAction::SessionRewritten => {
                tracing::debug!("Live session written back after failed sign-in");
                SmallVec::new()
            }

            SessionAction::RewriteFailed { error } => {
                tracing::error!(%error, "Failed to write back live session");
                smallvec![SessionEffect::ClearStorage(ClearCause::RollbackFailed)]
            }

            // ═══════════════════════════════════════════════════════════════
            // Sign-out: clear first, then commit
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Logout => {
                smallvec![SessionEffect::ClearStorage(ClearCause::Logout)]
            }

            SessionAction::Unauthorized => {
                tracing::info!(
                    signed_in = state.session.is_some(),
                    "API rejected the bearer token"
                );
                smallvec![SessionEffect::ClearStorage(ClearCause::Unauthorized)]
            }

            SessionAction::StorageCleared(cause) => Self::finish_clear(state, cause, env),

            SessionAction::ClearFailed { cause, error } => {
                // Fail closed: the in-memory session goes regardless
                tracing::error!(cause = cause.as_str(), %error, "Failed to clear session storage");
                Self::finish_clear(state, cause, env)
            }

            // ═══════════════════════════════════════════════════════════════
            // Lazy expiry
            // ═══════════════════════════════════════════════════════════════
            SessionAction::CheckAuthentication => {
                if state.session.is_none() {
                    return SmallVec::new();
                }
                smallvec![SessionEffect::ReadStoredToken]
            }

            SessionAction::StoredTokenRead(stored) => {
                if state.session.is_none() {
                    return SmallVec::new();
                }
                match token::validate(
                    stored.as_deref(),
                    env.clock.now(),
                    env.config.expiry_leeway,
                ) {
                    TokenValidity::Valid { .. } => SmallVec::new(),
                    TokenValidity::Invalid { reason } => {
                        tracing::info!(%reason, "Stored token no longer valid");
                        smallvec![SessionEffect::ClearStorage(ClearCause::TokenInvalid(reason))]
                    }
                }
            }
        }
    }
}
