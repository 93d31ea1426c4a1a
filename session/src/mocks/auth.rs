//! Mock authentication endpoint for testing.

use crate::error::{Result, SessionError};
use crate::providers::auth::DEFAULT_INVALID_CREDENTIALS;
use crate::providers::{AuthApi, LoginResponse, RegisteredUser, RegistrationRequest};
use crate::state::BearerToken;
use grievance_core::{Credentials, Role, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    response: LoginResponse,
}

/// Mock authentication endpoint.
///
/// Accounts are registered up front with the token the endpoint should hand
/// out. A forced failure, when set, is returned by every call instead.
#[derive(Debug, Clone, Default)]
pub struct MockAuthApi {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    failure: Arc<Mutex<Option<SessionError>>>,
    login_calls: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
}

fn lock_failed() -> SessionError {
    SessionError::Internal("Mutex lock failed".to_string())
}

impl MockAuthApi {
    /// Create an endpoint with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account that signs in with `password` and receives `token`.
    #[must_use]
    pub fn with_account(self, username: &str, password: &str, role: Role, token: &str) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let response = LoginResponse {
            token: BearerToken::new(token),
            user_id: UserId::new(id.to_string()),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            name: None,
        };

        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(
                username.to_string(),
                Account {
                    password: password.to_string(),
                    response,
                },
            );
        }
        self
    }

    /// Make every subsequent call fail with `error`, or clear the failure.
    pub fn fail_with(&self, error: Option<SessionError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    /// Number of `login` calls so far (for testing).
    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }
}

impl AuthApi for MockAuthApi {
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<LoginResponse>> + Send {
        let accounts = Arc::clone(&self.accounts);
        let failure = Arc::clone(&self.failure);
        let credentials = credentials.clone();
        self.login_calls.fetch_add(1, Ordering::SeqCst);

        async move {
            if let Some(error) = failure.lock().map_err(|_| lock_failed())?.clone() {
                return Err(error);
            }

            let accounts = accounts.lock().map_err(|_| lock_failed())?;
            match accounts.get(&credentials.username) {
                Some(account) if account.password == credentials.password => {
                    Ok(account.response.clone())
                }
                _ => Err(SessionError::InvalidCredentials {
                    message: DEFAULT_INVALID_CREDENTIALS.to_string(),
                }),
            }
        }
    }

    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> impl Future<Output = Result<RegisteredUser>> + Send {
        let accounts = Arc::clone(&self.accounts);
        let failure = Arc::clone(&self.failure);
        let next_id = Arc::clone(&self.next_id);
        let request = request.clone();

        async move {
            if let Some(error) = failure.lock().map_err(|_| lock_failed())?.clone() {
                return Err(error);
            }

            let mut accounts = accounts.lock().map_err(|_| lock_failed())?;
            let taken = accounts.contains_key(&request.username)
                || accounts
                    .values()
                    .any(|account| account.response.email == request.email);
            if taken {
                return Err(SessionError::Rejected {
                    status: 409,
                    message: "Username or email already exists".to_string(),
                });
            }

            let id = next_id.fetch_add(1, Ordering::SeqCst) + 1;
            accounts.insert(
                request.username.clone(),
                Account {
                    password: request.password.clone(),
                    response: LoginResponse {
                        token: BearerToken::new(format!("registered.{id}.token")),
                        user_id: UserId::new(id.to_string()),
                        username: request.username.clone(),
                        email: request.email.clone(),
                        role: Role::User,
                        name: Some(request.full_name.clone()),
                    },
                },
            );

            Ok(RegisteredUser {
                username: request.username,
                message: Some("User registered successfully".to_string()),
            })
        }
    }
}
