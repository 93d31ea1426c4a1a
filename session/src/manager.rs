//! Session manager.
//!
//! The manager is the imperative shell around [`SessionReducer`]. It owns the
//! state, executes the effects the reducer asks for, and publishes every
//! committed change on a `watch` channel.
//!
//! # Ordering
//!
//! Every mutation goes through [`SessionManager::dispatch`], which holds one
//! async mutex for the whole action cascade. Storage effects are awaited
//! while the lock is held, and the reducer only changes the session in
//! response to their completion, so no reader ever sees in-memory state
//! ahead of durable storage. Redirects are emitted after the lock is
//! released.
//!
//! The authentication endpoint is called without the lock. Its result is
//! applied afterwards; callers that may have been overtaken by a logout can
//! compare [`SessionManager::generation`] before and after.

use crate::actions::SessionAction;
use crate::bearer::BearerHandle;
use crate::config::SessionConfig;
use crate::effects::SessionEffect;
use crate::environment::SessionEnvironment;
use crate::error::{Result, SessionError};
use crate::guard::{self, GuardInput, GuardOutcome};
use crate::metrics;
use crate::persistence;
use crate::providers::{AuthApi, KeyValueStore, Navigator, RegisteredUser, RegistrationRequest};
use crate::reducer::SessionReducer;
use crate::state::{Session, SessionState, SessionStatus};
use grievance_core::{AccessRequirement, Clock, Credentials, Destination, Reducer, SmallVec};
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::{Mutex, watch};

/// Committed view of the session, as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Signed-in account, if any.
    pub session: Option<Session>,
    /// Mutation counter.
    pub generation: u64,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            status: state.status,
            session: state.session.clone(),
            generation: state.generation,
        }
    }
}

/// Session & authorization manager.
///
/// # Lifecycle
///
/// ```text
/// new() ─▶ initialize() ─▶ login()/logout()/is_authenticated()/authorize()... ─▶ dispose()
/// ```
///
/// # Example
///
/// ```
/// use grievance_core::{Credentials, Role, SystemClock};
/// use grievance_session::mocks::{MockAuthApi, MockKeyValueStore, MockNavigator};
/// use grievance_session::{SessionEnvironment, SessionManager, SessionStatus};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), grievance_session::SessionError> {
/// let token = "eyJhbGciOiJIUzI1NiJ9.eyJleHAiOjQxMDI0NDQ4MDB9.c2ln"; // exp = 2100-01-01
/// let auth = MockAuthApi::new().with_account("alice", "pw", Role::User, token);
/// let env = SessionEnvironment::new(
///     MockKeyValueStore::new(),
///     auth,
///     MockNavigator::new(),
///     SystemClock,
/// );
///
/// let manager = SessionManager::new(env);
/// manager.initialize().await;
/// assert_eq!(manager.status(), SessionStatus::Anonymous);
///
/// let session = manager.login(&Credentials::new("alice", "pw")).await?;
/// assert_eq!(session.role, Role::User);
/// assert!(manager.is_authenticated().await);
/// assert!(!manager.is_admin());
/// # Ok(())
/// # }
/// ```
pub struct SessionManager<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    reducer: SessionReducer<K, A, N, C>,
    env: SessionEnvironment<K, A, N, C>,
    state: Mutex<SessionState>,
    snapshot: watch::Sender<SessionSnapshot>,
    bearer: BearerHandle,
}

impl<K, A, N, C> SessionManager<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    /// Create an uninitialized manager owning `env`.
    #[must_use]
    pub fn new(env: SessionEnvironment<K, A, N, C>) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            reducer: SessionReducer::new(),
            env,
            state: Mutex::new(SessionState::default()),
            snapshot,
            bearer: BearerHandle::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Restore the session from durable storage.
    ///
    /// Runs once. A valid stored session is restored and its bearer attached;
    /// anything expired, malformed or incomplete is cleared from storage.
    /// Storage failures leave the manager anonymous. Readiness is signalled
    /// in every case. Later calls are logged no-ops.
    #[tracing::instrument(skip(self), name = "session_initialize")]
    pub async fn initialize(&self) {
        self.dispatch(SessionAction::Initialize).await;
    }

    /// Wait until initialization has completed.
    ///
    /// Never resolves if [`Self::initialize`] is never called.
    pub async fn ready(&self) {
        let mut receiver = self.snapshot.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = receiver.wait_for(|snapshot| snapshot.status.is_ready()).await;
    }

    /// Tear the manager down.
    ///
    /// Detaches the bearer and closes the snapshot channel. Durable storage is
    /// left as it is, so the session is restored on the next start.
    pub fn dispose(self) {
        self.bearer.detach();
        tracing::debug!("Session manager disposed");
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sign-in / sign-out
    // ═══════════════════════════════════════════════════════════════════════

    /// Sign in with `credentials`.
    ///
    /// On success the session is written to durable storage, committed in
    /// memory, and its bearer attached, in that order.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotInitialized`]: `initialize()` has not completed
    /// - [`SessionError::InvalidCredentials`]: blank or refused credentials
    /// - [`SessionError::Rejected`] / [`SessionError::Transport`] /
    ///   [`SessionError::MalformedResponse`]: from the endpoint, untouched
    /// - [`SessionError::Storage`]: the session could not be persisted; the
    ///   partial write is undone and nothing changes in memory
    #[tracing::instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        if !self.status().is_ready() {
            return Err(SessionError::NotInitialized);
        }

        if credentials.is_blank() {
            return Err(SessionError::InvalidCredentials {
                message: "Username and password are required".to_string(),
            });
        }

        let started = Instant::now();
        let session = match self.env.auth.login(credentials).await {
            Ok(response) => Session::from(response),
            Err(e) => {
                tracing::info!(error = %e, "Login failed");
                metrics::record_login(Err(&e), started.elapsed());
                return Err(e);
            }
        };

        let errors = self
            .dispatch(SessionAction::LoginSucceeded(session.clone()))
            .await;

        if let Some(e) = errors.into_iter().next() {
            metrics::record_login(Err(&e), started.elapsed());
            return Err(e);
        }

        if self.current_session().as_ref() != Some(&session) {
            let e = SessionError::Internal("Login was not applied".to_string());
            metrics::record_login(Err(&e), started.elapsed());
            return Err(e);
        }

        metrics::record_login(Ok(()), started.elapsed());
        Ok(session)
    }

    /// Sign out.
    ///
    /// Clears durable storage, drops the in-memory session, detaches the
    /// bearer and redirects to sign-in. Idempotent.
    #[tracing::instrument(skip(self), name = "session_logout")]
    pub async fn logout(&self) {
        self.dispatch(SessionAction::Logout).await;
    }

    /// React to a `401 Unauthorized` from any API call.
    ///
    /// Same effect as [`Self::logout`].
    #[tracing::instrument(skip(self), name = "session_unauthorized")]
    pub async fn handle_unauthorized(&self) {
        self.dispatch(SessionAction::Unauthorized).await;
    }

    /// Create an account. Does not sign in and does not touch the session.
    ///
    /// # Errors
    ///
    /// Propagates the endpoint's error untouched.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<RegisteredUser> {
        self.env.auth.register(request).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicates
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether a live session exists.
    ///
    /// Re-reads the token from durable storage and checks its expiry. An
    /// invalid or missing stored token ends the session exactly as
    /// [`Self::logout`] does, and `false` is returned.
    pub async fn is_authenticated(&self) -> bool {
        if self.snapshot.borrow().session.is_none() {
            return false;
        }

        self.dispatch(SessionAction::CheckAuthentication).await;
        self.status() == SessionStatus::Authenticated
    }

    /// Whether the in-memory session belongs to an administrator.
    ///
    /// Does not re-validate expiry.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.snapshot
            .borrow()
            .session
            .as_ref()
            .is_some_and(Session::is_admin)
    }

    /// Copy of the in-memory session.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.snapshot.borrow().session.clone()
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.snapshot.borrow().status
    }

    /// Mutation counter; changes on every sign-in and sign-out.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.snapshot.borrow().generation
    }

    /// Copy of the committed state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver of committed state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Token slot read by the API client.
    #[must_use]
    pub const fn bearer(&self) -> &BearerHandle {
        &self.bearer
    }

    /// Manager configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.env.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Route gating
    // ═══════════════════════════════════════════════════════════════════════

    /// Decide whether a destination with `requirement` may render.
    ///
    /// Returns [`GuardOutcome::RenderLoading`] until initialization completes.
    /// Destinations that require a session trigger the lazy expiry check
    /// before the role is consulted.
    pub async fn authorize(&self, requirement: AccessRequirement) -> GuardOutcome {
        let status = self.status();
        if !status.is_ready() || !requirement.requires_auth {
            return guard::decide(
                GuardInput::from_status(status, self.role()),
                requirement,
                self.env.config.sign_in,
            );
        }

        let input = if self.is_authenticated().await {
            GuardInput::from_status(self.status(), self.role())
        } else {
            GuardInput::Anonymous
        };

        let outcome = guard::decide(input, requirement, self.env.config.sign_in);
        tracing::debug!(?requirement, ?outcome, "Route guard decision");
        outcome
    }

    /// [`Self::authorize`] for a path. Unknown paths redirect to the welcome
    /// page.
    pub async fn authorize_path(&self, path: &str) -> GuardOutcome {
        match Destination::from_path(path) {
            Some(destination) => self.authorize(destination.requirement()).await,
            None => {
                tracing::debug!(path, "Unknown path");
                GuardOutcome::Redirect(Destination::Welcome)
            }
        }
    }

    /// Navigation entries for the current role.
    #[must_use]
    pub fn menu(&self) -> Vec<Destination> {
        Destination::menu_for(self.role())
    }

    /// Where the current account lands after sign-in.
    #[must_use]
    pub fn landing(&self) -> Destination {
        match self.role() {
            Some(role) => Destination::landing_for(role),
            None => Destination::landing_for(grievance_core::Role::User),
        }
    }

    fn role(&self) -> Option<grievance_core::Role> {
        self.snapshot.borrow().session.as_ref().map(|s| s.role)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Effect execution
    // ═══════════════════════════════════════════════════════════════════════

    /// Reduce `action` and every action fed back by its effects.
    ///
    /// Returns the errors callers need to see (only failed persistence on
    /// sign-in; everything else is handled by the reducer).
    async fn dispatch(&self, action: SessionAction) -> Vec<SessionError> {
        let mut errors = Vec::new();
        let mut redirects = Vec::new();

        {
            let mut state = self.state.lock().await;
            let mut queue = VecDeque::from([action]);

            while let Some(action) = queue.pop_front() {
                tracing::trace!(action = action.name(), "Reducing");
                let before = state.status;
                let effects = self.reducer.reduce(&mut *state, action, &self.env);

                let mut pending: SmallVec<[SessionEffect; 4]> = SmallVec::new();
                for effect in effects {
                    match effect {
                        SessionEffect::AttachBearer(token) => self.bearer.attach(token),
                        SessionEffect::DetachBearer => self.bearer.detach(),
                        SessionEffect::Redirect(destination) => redirects.push(destination),
                        other => pending.push(other),
                    }
                }

                self.publish(&state, before);

                for effect in pending {
                    if let Some(next) = self.execute(effect, &mut errors).await {
                        queue.push_back(next);
                    }
                }
            }
        }

        for destination in redirects {
            tracing::info!(%destination, "Redirecting");
            self.env.navigator.redirect(destination);
        }

        errors
    }

    /// Run one storage effect and return the action describing its outcome.
    async fn execute(
        &self,
        effect: SessionEffect,
        errors: &mut Vec<SessionError>,
    ) -> Option<SessionAction> {
        tracing::trace!(effect = effect.name(), "Executing effect");
        let storage = &self.env.storage;

        match effect {
            SessionEffect::LoadStoredSession => match persistence::load(storage).await {
                Ok(stored) => Some(SessionAction::StoredSessionLoaded(stored)),
                Err(e) => {
                    metrics::record_storage_error("load");
                    Some(SessionAction::StorageUnavailable {
                        error: e.to_string(),
                    })
                }
            },

            SessionEffect::ReadStoredToken => match persistence::read_token(storage).await {
                Ok(token) => Some(SessionAction::StoredTokenRead(token)),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read stored token");
                    metrics::record_storage_error("read_token");
                    Some(SessionAction::StoredTokenRead(None))
                }
            },

            SessionEffect::PersistSession(session) => {
                match persistence::save(storage, &session).await {
                    Ok(()) => Some(SessionAction::SessionPersisted(session)),
                    Err(e) => {
                        metrics::record_storage_error("save");
                        let error = e.to_string();
                        errors.push(e);
                        Some(SessionAction::PersistFailed { error })
                    }
                }
            }

            SessionEffect::RewriteSession(session) => {
                match persistence::save(storage, &session).await {
                    Ok(()) => Some(SessionAction::SessionRewritten),
                    Err(e) => {
                        metrics::record_storage_error("rewrite");
                        Some(SessionAction::RewriteFailed {
                            error: e.to_string(),
                        })
                    }
                }
            }

            SessionEffect::ClearStorage(cause) => {
                metrics::record_clear(cause);
                match persistence::clear(storage).await {
                    Ok(()) => Some(SessionAction::StorageCleared(cause)),
                    Err(e) => {
                        metrics::record_storage_error("clear");
                        Some(SessionAction::ClearFailed {
                            cause,
                            error: e.to_string(),
                        })
                    }
                }
            }

            // Applied synchronously by `dispatch`
            SessionEffect::AttachBearer(_)
            | SessionEffect::DetachBearer
            | SessionEffect::Redirect(_) => None,
        }
    }

    /// Publish `state` if it differs from the last committed snapshot.
    fn publish(&self, state: &SessionState, before: SessionStatus) {
        if before != state.status {
            tracing::debug!(from = %before, to = %state.status, "Session status changed");
            metrics::record_transition(before, state.status);
        }

        let next = SessionSnapshot::from(state);
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl<K, A, N, C> std::fmt::Debug for SessionManager<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("snapshot", &*self.snapshot.borrow())
            .field("config", &self.env.config)
            .finish_non_exhaustive()
    }
}
