//! Integration tests for the HTTP authentication endpoint.

#![allow(clippy::unwrap_used)]

use grievance_core::{Credentials, Role, UserId};
use grievance_session::SessionError;
use grievance_session::providers::{AuthApi, HttpAuthApi, RegistrationRequest};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(server: &MockServer) -> HttpAuthApi {
    HttpAuthApi::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn alice() -> Credentials {
    Credentials::new("alice", "alice-pw")
}

#[tokio::test]
async fn test_login_success_maps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "alice-pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "h.p.s",
            "userId": 12,
            "username": "alice",
            "email": "alice@example.com",
            "role": "USER",
            "name": "Alice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = create_client(&server).login(&alice()).await.unwrap();

    assert_eq!(response.token.as_str(), "h.p.s");
    assert_eq!(response.user_id, UserId::from(12));
    assert_eq!(response.username, "alice");
    assert_eq!(response.email, "alice@example.com");
    assert_eq!(response.role, Role::User);
    assert_eq!(response.name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_login_success_false_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Bad credentials"
        })))
        .mount(&server)
        .await;

    let result = create_client(&server).login(&alice()).await;

    assert_eq!(
        result,
        Err(SessionError::InvalidCredentials {
            message: "Bad credentials".to_string()
        })
    );
}

#[tokio::test]
async fn test_login_401_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = create_client(&server).login(&alice()).await;

    assert_eq!(
        result,
        Err(SessionError::InvalidCredentials {
            message: "Invalid username or password".to_string()
        })
    );
}

#[tokio::test]
async fn test_login_server_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = create_client(&server).login(&alice()).await;

    let Err(error) = result else {
        unreachable!("expected a rejection, got {result:?}");
    };
    assert_eq!(
        error,
        SessionError::Rejected {
            status: 500,
            message: "Internal Server Error".to_string()
        }
    );
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_login_with_incomplete_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "h.p.s",
            "username": "alice"
        })))
        .mount(&server)
        .await;

    let result = create_client(&server).login(&alice()).await;

    assert!(matches!(result, Err(SessionError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_login_body_without_success_flag_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "h.p.s",
            "userId": 12,
            "username": "alice",
            "email": "alice@example.com",
            "role": "USER"
        })))
        .mount(&server)
        .await;

    let result = create_client(&server).login(&alice()).await;

    assert!(matches!(result, Err(SessionError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_login_without_server_is_transport_error() {
    let server = MockServer::start().await;
    let client = create_client(&server);
    drop(server);

    let result = client.login(&alice()).await;

    assert!(matches!(result, Err(SessionError::Transport(_))));
}

#[tokio::test]
async fn test_register_sends_full_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "pw",
            "fullName": "carol"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "message": "User registered successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = create_client(&server)
        .register(&RegistrationRequest::new("carol", "carol@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(created.username, "carol");
    assert_eq!(created.message.as_deref(), Some("User registered successfully"));
}

#[tokio::test]
async fn test_register_conflict_carries_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "message": "Username is already taken"
        })))
        .mount(&server)
        .await;

    let result = create_client(&server)
        .register(&RegistrationRequest::new("alice", "a@example.com", "pw"))
        .await;

    let Err(error) = result else {
        unreachable!("expected a conflict, got {result:?}");
    };
    assert_eq!(
        error,
        SessionError::Rejected {
            status: 409,
            message: "Username is already taken".to_string()
        }
    );
    assert!(error.is_user_error());
}

#[tokio::test]
async fn test_register_empty_created_body_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let created = create_client(&server)
        .register(&RegistrationRequest::new("dave", "dave@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(created.username, "dave");
    assert_eq!(created.message, None);
}
