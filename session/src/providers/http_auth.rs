//! HTTP implementation of the authentication endpoint.

use crate::constants::endpoints;
use crate::error::{Result, SessionError};
use crate::providers::auth::{
    AuthApi, AuthEnvelope, DEFAULT_INVALID_CREDENTIALS, LoginResponse, RegisteredUser,
    RegistrationRequest,
};
use grievance_core::Credentials;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Authentication endpoint reached over HTTP.
///
/// # Example
///
/// ```no_run
/// use grievance_session::providers::HttpAuthApi;
/// use std::time::Duration;
///
/// let auth = HttpAuthApi::new("http://localhost:8080", Duration::from_secs(10))?;
/// # Ok::<(), grievance_session::SessionError>(())
/// ```
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    /// API base URL, without trailing slash.
    base_url: String,

    /// HTTP client for making requests.
    http_client: Client,
}

impl HttpAuthApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Internal`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(base_url, http_client))
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST `body` and return the status with the decoded envelope.
    ///
    /// Non-JSON bodies decode to an empty envelope; the caller decides what
    /// that means for the status it got.
    async fn post<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, AuthEnvelope, Option<serde_json::Error>)> {
        let response = self
            .http_client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        match serde_json::from_str::<AuthEnvelope>(&text) {
            Ok(envelope) => Ok((status, envelope, None)),
            Err(e) => Ok((status, AuthEnvelope::default(), Some(e))),
        }
    }
}

/// Message for a non-success status, preferring the backend's own.
fn rejection(status: StatusCode, envelope: AuthEnvelope) -> SessionError {
    SessionError::Rejected {
        status: status.as_u16(),
        message: envelope.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        }),
    }
}

impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        tracing::debug!(username = %credentials.username, "Submitting credentials");

        let (status, envelope, decode_error) = self.post(endpoints::LOGIN, credentials).await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(SessionError::InvalidCredentials {
                message: envelope
                    .message
                    .unwrap_or_else(|| DEFAULT_INVALID_CREDENTIALS.to_string()),
            });
        }

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Login rejected");
            return Err(rejection(status, envelope));
        }

        if let Some(e) = decode_error {
            return Err(SessionError::MalformedResponse(e.to_string()));
        }

        envelope.into_login()
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<RegisteredUser> {
        tracing::debug!(username = %request.username, "Registering account");

        let (status, envelope, decode_error) = self.post(endpoints::REGISTER, request).await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Registration rejected");
            return Err(rejection(status, envelope));
        }

        if decode_error.is_some() {
            // Some deployments answer 201 with an empty body
            return Ok(RegisteredUser {
                username: request.username.clone(),
                message: None,
            });
        }

        envelope.into_registered(&request.username)
    }
}
