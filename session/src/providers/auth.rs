//! Authentication endpoint trait and its wire types.

use crate::error::{Result, SessionError};
use crate::state::{BearerToken, Session};
use grievance_core::{Credentials, Role, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication endpoint.
///
/// # Implementation Notes
///
/// - No retries: a failure is reported once, as is
/// - `401` and a `success: false` body both mean invalid credentials
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token and account details.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidCredentials`]: credentials refused
    /// - [`SessionError::Rejected`]: any other non-success status
    /// - [`SessionError::Transport`]: no response
    /// - [`SessionError::MalformedResponse`]: unusable success body
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<LoginResponse>> + Send;

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Rejected`] with status `409`: username or email taken
    /// - [`SessionError::Rejected`] with status `400`: invalid data
    /// - [`SessionError::Transport`]: no response
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> impl std::future::Future<Output = Result<RegisteredUser>> + Send;
}

/// Successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
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
    /// Display name, when the backend sends one.
    pub name: Option<String>,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            user_id: response.user_id,
            username: response.username,
            email: response.email,
            role: response.role,
        }
    }
}

/// Account registration form.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Display name.
    pub full_name: String,
}

impl RegistrationRequest {
    /// Build a request whose display name is the username.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            full_name: username.clone(),
            username,
            email: email.into(),
            password: password.into(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Account created by [`AuthApi::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    /// Username of the new account.
    pub username: String,
    /// Confirmation message from the backend.
    pub message: Option<String>,
}

/// `userId` arrives as a JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdValue {
    Number(i64),
    Text(String),
}

impl From<IdValue> for UserId {
    fn from(id: IdValue) -> Self {
        match id {
            IdValue::Number(n) => Self::from(n),
            IdValue::Text(s) => Self::new(s),
        }
    }
}

/// Response body shared by the login and register endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<IdValue>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message shown when the backend refuses credentials without saying why.
pub(crate) const DEFAULT_INVALID_CREDENTIALS: &str = "Invalid username or password";

impl AuthEnvelope {
    /// Interpret a 2xx login body.
    ///
    /// Only an explicit `"success": true` signs in. A body without the flag
    /// is malformed even when the other fields are present.
    pub(crate) fn into_login(self) -> Result<LoginResponse> {
        let missing = |field: &str| SessionError::MalformedResponse(format!("missing `{field}`"));

        match self.success {
            Some(true) => {}
            Some(false) => {
                return Err(SessionError::InvalidCredentials {
                    message: self
                        .message
                        .unwrap_or_else(|| DEFAULT_INVALID_CREDENTIALS.to_string()),
                });
            }
            None => return Err(missing("success")),
        }

        let token = self.token.filter(|t| !t.is_empty()).ok_or_else(|| missing("token"))?;
        let user_id = self.user_id.ok_or_else(|| missing("userId"))?;
        let username = self.username.ok_or_else(|| missing("username"))?;
        let email = self.email.ok_or_else(|| missing("email"))?;
        let role = self.role.ok_or_else(|| missing("role"))?;
        let role = role
            .parse::<Role>()
            .map_err(|e| SessionError::MalformedResponse(e.to_string()))?;

        Ok(LoginResponse {
            token: BearerToken::new(token),
            user_id: user_id.into(),
            username,
            email,
            role,
            name: self.name,
        })
    }

    /// Interpret a 2xx register body.
    pub(crate) fn into_registered(self, requested: &str) -> Result<RegisteredUser> {
        if self.success == Some(false) {
            return Err(SessionError::Rejected {
                status: 200,
                message: self
                    .message
                    .unwrap_or_else(|| "Registration failed".to_string()),
            });
        }

        Ok(RegisteredUser {
            username: self.username.unwrap_or_else(|| requested.to_string()),
            message: self.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> AuthEnvelope {
        serde_json::from_value(value).unwrap_or_default()
    }

    #[test]
    fn test_login_envelope_with_numeric_id() {
        let response = envelope(json!({
            "success": true,
            "token": "h.p.s",
            "userId": 12,
            "username": "alice",
            "email": "alice@example.com",
            "role": "ADMIN",
            "name": "Alice"
        }))
        .into_login();

        assert_eq!(
            response,
            Ok(LoginResponse {
                token: BearerToken::new("h.p.s"),
                user_id: UserId::new("12"),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                role: Role::Admin,
                name: Some("Alice".to_string()),
            })
        );
    }

    #[test]
    fn test_login_envelope_with_string_id() {
        let response = envelope(json!({
            "success": true,
            "token": "h.p.s",
            "userId": "u-9",
            "username": "bob",
            "email": "bob@example.com",
            "role": "USER"
        }))
        .into_login();
        assert_eq!(response.map(|r| r.user_id), Ok(UserId::new("u-9")));
    }

    #[test]
    fn test_success_false_is_invalid_credentials() {
        let result = envelope(json!({ "success": false, "message": "Bad password" })).into_login();
        assert_eq!(
            result,
            Err(SessionError::InvalidCredentials {
                message: "Bad password".to_string()
            })
        );
    }

    #[test]
    fn test_incomplete_envelope_is_malformed() {
        let result = envelope(json!({ "success": true, "token": "h.p.s" })).into_login();
        assert!(matches!(result, Err(SessionError::MalformedResponse(_))));

        let result = envelope(json!({
            "success": true,
            "token": "h.p.s",
            "userId": 1,
            "username": "eve",
            "email": "eve@example.com",
            "role": "OWNER"
        }))
        .into_login();
        assert!(matches!(result, Err(SessionError::MalformedResponse(_))));
    }

    #[test]
    fn test_login_without_success_flag_is_malformed() {
        let result = envelope(json!({
            "token": "h.p.s",
            "userId": 1,
            "username": "alice",
            "email": "alice@example.com",
            "role": "USER"
        }))
        .into_login();
        assert_eq!(
            result,
            Err(SessionError::MalformedResponse("missing `success`".to_string()))
        );
    }

    #[test]
    fn test_registration_request_wire_shape() {
        let request = RegistrationRequest::new("carol", "carol@example.com", "pw");
        let body = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(body["fullName"], json!("carol"));
        assert!(!format!("{request:?}").contains("\"pw\""));
    }
}
