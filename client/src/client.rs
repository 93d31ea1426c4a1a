//! Authenticated API client.
//!
//! Every request carries the bearer currently attached by the session
//! manager. A `401` response ends the session through
//! [`UnauthorizedHandler`] before the error reaches the caller.

use crate::error::{ApiError, Result};
use crate::metrics;
use crate::types::{
    Comment, Complaint, CurrentUser, Envelope, EscalationRequest, EscalationStats,
    EscalationTimeline, NewComment, NewComplaint, StatsBody, StatusUpdate,
};
use grievance_core::Clock;
use grievance_session::providers::{AuthApi, KeyValueStore, Navigator};
use grievance_session::{BearerHandle, BearerToken, SessionManager};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Reacts to a `401` from the backend.
pub trait UnauthorizedHandler: Send + Sync {
    /// The backend refused the bearer; end the session.
    fn on_unauthorized(&self) -> impl std::future::Future<Output = ()> + Send;
}

impl<K, A, N, C> UnauthorizedHandler for SessionManager<K, A, N, C>
where
    K: KeyValueStore,
    A: AuthApi,
    N: Navigator,
    C: Clock,
{
    async fn on_unauthorized(&self) {
        self.handle_unauthorized().await;
    }
}

/// Grievance backend client.
///
/// # Example
///
/// ```no_run
/// use grievance_client::ApiClient;
/// use grievance_core::SystemClock;
/// use grievance_session::mocks::{MockAuthApi, MockKeyValueStore, MockNavigator};
/// use grievance_session::{SessionEnvironment, SessionManager};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), grievance_client::ApiError> {
/// let manager = Arc::new(SessionManager::new(SessionEnvironment::new(
///     MockKeyValueStore::new(),
///     MockAuthApi::new(),
///     MockNavigator::new(),
///     SystemClock,
/// )));
/// manager.initialize().await;
///
/// let api = ApiClient::new(
///     "http://localhost:8080",
///     Duration::from_secs(10),
///     manager.bearer(),
///     Arc::clone(&manager),
/// )?;
/// let complaints = api.my_complaints().await?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClient<H> {
    http_client: Client,
    base_url: String,
    bearer: watch::Receiver<Option<BearerToken>>,
    unauthorized: Arc<H>,
}

impl<H: UnauthorizedHandler> ApiClient<H> {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        bearer: &BearerHandle,
        unauthorized: Arc<H>,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(base_url, http_client, bearer, unauthorized))
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(
        base_url: impl Into<String>,
        http_client: Client,
        bearer: &BearerHandle,
        unauthorized: Arc<H>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer: bearer.subscribe(),
            unauthorized,
        }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Account behind the current bearer (`GET /api/auth/me`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn me(&self) -> Result<CurrentUser> {
        let body = self
            .send("auth.me", self.http_client.get(self.url("/api/auth/me")))
            .await?;

        let envelope: Envelope<serde_json::Value> = decode(&body)?;
        refuse_unless_success(&envelope)?;
        decode(&body)
    }

    /// Every complaint in the system (`GET /api/complaints`, admins only).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn all_complaints(&self) -> Result<Vec<Complaint>> {
        let body = self
            .send("complaints.all", self.http_client.get(self.url("/api/complaints")))
            .await?;
        data(&body)
    }

    /// Complaints filed by the signed-in account
    /// (`GET /api/complaints/my-complaints`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn my_complaints(&self) -> Result<Vec<Complaint>> {
        let body = self
            .send(
                "complaints.mine",
                self.http_client.get(self.url("/api/complaints/my-complaints")),
            )
            .await?;
        data(&body)
    }

    /// File a complaint (`POST /api/complaints`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn create_complaint(&self, complaint: NewComplaint) -> Result<Complaint> {
        let request = self
            .http_client
            .post(self.url("/api/complaints"))
            .multipart(complaint.into_form());

        let body = self.send("complaints.create", request).await?;
        data(&body)
    }

    /// Change a complaint's status (`PUT /api/complaints/{id}/status`,
    /// admins only).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn update_status(&self, id: i64, update: &StatusUpdate) -> Result<Complaint> {
        let request = self
            .http_client
            .put(self.url(&format!("/api/complaints/{id}/status")))
            .json(update);

        let body = self.send("complaints.update_status", request).await?;
        data(&body)
    }

    /// One complaint (`GET /api/complaints/{id}/details`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn complaint_details(&self, id: i64) -> Result<Complaint> {
        let body = self
            .send(
                "complaints.details",
                self.http_client
                    .get(self.url(&format!("/api/complaints/{id}/details"))),
            )
            .await?;
        data(&body)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Comments
    // ═══════════════════════════════════════════════════════════════════════

    /// Comments on a complaint (`GET /api/complaints/{id}/comments`).
    ///
    /// With `admin_view` the backend also returns internal notes, provided
    /// the caller is an admin.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn comments(&self, complaint_id: i64, admin_view: bool) -> Result<Vec<Comment>> {
        let request = self
            .http_client
            .get(self.url(&format!("/api/complaints/{complaint_id}/comments")))
            .query(&[("adminView", admin_view)]);

        let body = self.send("comments.list", request).await?;
        // An empty thread may come back without `data`
        let envelope: Envelope<Vec<Comment>> = decode(&body)?;
        refuse_unless_success(&envelope)?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Post a comment (`POST /api/comments`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`]. An internal note from a non-admin comes back as
    /// [`ApiError::Refused`].
    pub async fn add_comment(&self, comment: NewComment) -> Result<Comment> {
        let request = self
            .http_client
            .post(self.url("/api/comments"))
            .multipart(comment.into_form());

        let body = self.send("comments.create", request).await?;
        data(&body)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Escalation
    // ═══════════════════════════════════════════════════════════════════════

    /// Escalation levels of one complaint
    /// (`GET /api/complaints/{id}/escalation-timeline`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn escalation_timeline(&self, complaint_id: i64) -> Result<EscalationTimeline> {
        let body = self
            .send(
                "escalation.timeline",
                self.http_client.get(
                    self.url(&format!("/api/complaints/{complaint_id}/escalation-timeline")),
                ),
            )
            .await?;

        let envelope: Envelope<serde_json::Value> = decode(&body)?;
        refuse_unless_success(&envelope)?;
        decode(&body)
    }

    /// The signed-in account's escalated complaints
    /// (`GET /api/complaints/my/escalated`).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn my_escalated_complaints(&self) -> Result<Vec<Complaint>> {
        let body = self
            .send(
                "escalation.mine",
                self.http_client.get(self.url("/api/complaints/my/escalated")),
            )
            .await?;
        data(&body)
    }

    /// Escalation dashboard figures (`GET /api/admin/escalation/stats`,
    /// admins only).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn escalation_stats(&self) -> Result<EscalationStats> {
        let body = self
            .send(
                "escalation.stats",
                self.http_client.get(self.url("/api/admin/escalation/stats")),
            )
            .await?;

        let envelope: Envelope<serde_json::Value> = decode(&body)?;
        refuse_unless_success(&envelope)?;
        let StatsBody { stats, data } = decode(&body)?;
        stats
            .or(data)
            .ok_or_else(|| ApiError::Decode("missing `stats`".to_string()))
    }

    /// Every escalated complaint (`GET /api/admin/escalation/complaints`,
    /// admins only).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn escalated_complaints(&self) -> Result<Vec<Complaint>> {
        let body = self
            .send(
                "escalation.all",
                self.http_client.get(self.url("/api/admin/escalation/complaints")),
            )
            .await?;
        data(&body)
    }

    /// Move a complaint to another escalation level
    /// (`POST /api/admin/complaints/{id}/escalate`, admins only).
    ///
    /// Returns the backend's confirmation message, if any.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn escalate(
        &self,
        complaint_id: i64,
        request: &EscalationRequest,
    ) -> Result<Option<String>> {
        let request = self
            .http_client
            .post(self.url(&format!("/api/admin/complaints/{complaint_id}/escalate")))
            .json(request);

        let body = self.send("escalation.manual", request).await?;
        // Some deployments answer with an empty 200
        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<serde_json::Value> = decode(&body)?;
        refuse_unless_success(&envelope)?;
        Ok(envelope.message)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach the bearer, send, and map the status. Returns the body of a
    /// success response.
    #[tracing::instrument(skip(self, request), level = "debug")]
    async fn send(&self, endpoint: &'static str, request: RequestBuilder) -> Result<String> {
        let header = self.bearer.borrow().as_ref().map(BearerToken::header_value);
        let request = match header {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_response(endpoint, None, started.elapsed());
                tracing::warn!(endpoint, error = %e, "Request failed");
                return Err(ApiError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        metrics::record_response(endpoint, Some(status.as_u16()), started.elapsed());

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(endpoint, "Bearer refused, ending session");
            metrics::record_unauthorized(endpoint);
            self.unauthorized.on_unauthorized().await;
            return Err(ApiError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "Response received");
            return Ok(body);
        }

        tracing::warn!(endpoint, status = status.as_u16(), "Request rejected");
        Err(rejection(status, &body))
    }
}

impl<H> std::fmt::Debug for ApiClient<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("bearer_attached", &self.bearer.borrow().is_some())
            .finish_non_exhaustive()
    }
}

/// Error for a non-success, non-401 status.
fn rejection(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    match status {
        StatusCode::CONFLICT => ApiError::Conflict { message },
        StatusCode::BAD_REQUEST => ApiError::BadRequest { message },
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn refuse_unless_success<T>(envelope: &Envelope<T>) -> Result<()> {
    if envelope.success == Some(false) {
        return Err(ApiError::Refused {
            message: envelope
                .message
                .clone()
                .unwrap_or_else(|| "Request refused".to_string()),
        });
    }
    Ok(())
}

/// Unwrap `{ success, data }`.
fn data<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = decode(body)?;
    refuse_unless_success(&envelope)?;
    envelope
        .data
        .ok_or_else(|| ApiError::Decode("missing `data`".to_string()))
}
