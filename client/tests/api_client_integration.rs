//! Integration tests for the authenticated API client.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use grievance_client::{
    ApiClient, ApiError, CommentKind, ComplaintStatus, EscalationRequest, NewComment,
    NewComplaint, Priority, StatusUpdate, TimelineStage,
};
use grievance_core::{Clock, Credentials, Destination, Role};
use grievance_session::mocks::{MockAuthApi, MockKeyValueStore, MockNavigator};
use grievance_session::{SessionEnvironment, SessionManager, SessionStatus};
use grievance_testing::{FixedClock, test_clock, tokens};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

type TestManager = SessionManager<MockKeyValueStore, MockAuthApi, MockNavigator, FixedClock>;

struct TestEnv {
    server: MockServer,
    manager: Arc<TestManager>,
    api: ApiClient<TestManager>,
    storage: MockKeyValueStore,
    navigator: MockNavigator,
    token: String,
}

/// Backend mock plus a manager signed in as `alice` with the given role.
async fn create_test_env(role: Role) -> TestEnv {
    let server = MockServer::start().await;
    let token = tokens::expiring_at(test_clock().now() + Duration::hours(1));
    let storage = MockKeyValueStore::new();
    let navigator = MockNavigator::new();

    let manager = Arc::new(SessionManager::new(SessionEnvironment::new(
        storage.clone(),
        MockAuthApi::new().with_account("alice", "pw", role, &token),
        navigator.clone(),
        test_clock(),
    )));
    manager.initialize().await;
    manager
        .login(&Credentials::new("alice", "pw"))
        .await
        .unwrap();

    let api = ApiClient::new(
        server.uri(),
        std::time::Duration::from_secs(5),
        manager.bearer(),
        Arc::clone(&manager),
    )
    .unwrap();

    TestEnv {
        server,
        manager,
        api,
        storage,
        navigator,
        token,
    }
}

fn complaint_json(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Complaint {id}"),
        "description": "Details",
        "category": "Network",
        "status": status,
        "priority": "MEDIUM",
        "userId": 1,
        "userName": "alice",
        "createdAt": 1_735_689_600_000_i64
    })
}

#[tokio::test]
async fn test_requests_carry_the_bearer() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints/my-complaints"))
        .and(header("authorization", format!("Bearer {}", env.token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [complaint_json(1, "OPEN"), complaint_json(2, "RESOLVED")],
            "count": 2
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let complaints = env.api.my_complaints().await.unwrap();

    assert_eq!(complaints.len(), 2);
    assert_eq!(complaints[1].status, ComplaintStatus::Resolved);
}

#[tokio::test]
async fn test_no_bearer_after_logout() {
    let env = create_test_env(Role::User).await;
    env.manager.logout().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(|request: &Request| {
            if request.headers.contains_key("authorization") {
                ResponseTemplate::new(500)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": false,
                    "message": "Missing token"
                }))
            }
        })
        .mount(&env.server)
        .await;

    let result = env.api.me().await;

    assert!(matches!(result, Err(ApiError::Refused { message }) if message == "Missing token"));
}

#[tokio::test]
async fn test_unauthorized_ends_the_session() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&env.server)
        .await;

    let result = env.api.all_complaints().await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(env.manager.status(), SessionStatus::Anonymous);
    assert!(!env.manager.bearer().is_attached());
    assert!(env.storage.snapshot().is_empty());
    assert_eq!(env.navigator.last_redirect(), Some(Destination::Login));
}

#[tokio::test]
async fn test_me_reads_top_level_fields() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "userId": 1,
            "username": "alice",
            "email": "alice@example.com",
            "role": "ADMIN",
            "name": "Alice"
        })))
        .mount(&env.server)
        .await;

    let user = env.api.me().await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_non_admin_listing_is_refused() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Admin access required"
        })))
        .mount(&env.server)
        .await;

    let result = env.api.all_complaints().await;

    assert!(matches!(result, Err(ApiError::Refused { .. })));
    // A refusal is not an authentication failure
    assert_eq!(env.manager.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_create_complaint_posts_form() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("POST"))
        .and(path("/api/complaints"))
        .and(header_exists("authorization"))
        .respond_with(|request: &Request| {
            let body = String::from_utf8_lossy(&request.body);
            let complete = ["title", "description", "priority", "category", "HIGH", "VPN down"]
                .iter()
                .all(|needle| body.contains(needle));
            if complete {
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "message": "Complaint created successfully",
                    "complaintId": 11,
                    "data": complaint_json(11, "OPEN")
                }))
            } else {
                ResponseTemplate::new(400).set_body_json(json!({"message": "Incomplete form"}))
            }
        })
        .mount(&env.server)
        .await;

    let created = env
        .api
        .create_complaint(
            NewComplaint::new("VPN down", "Cannot reach the intranet")
                .with_category("Network")
                .with_priority(Priority::High),
        )
        .await
        .unwrap();

    assert_eq!(created.id, 11);
    assert_eq!(created.status, ComplaintStatus::Open);
}

#[tokio::test]
async fn test_update_status_sends_json() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("PUT"))
        .and(path("/api/complaints/5/status"))
        .and(body_json(json!({"status": "IN_PROGRESS", "assignedTo": "root"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Status updated to IN_PROGRESS",
            "data": complaint_json(5, "IN_PROGRESS")
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let updated = env
        .api
        .update_status(
            5,
            &StatusUpdate::new(ComplaintStatus::InProgress).assigned_to("root"),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ComplaintStatus::InProgress);
}

#[tokio::test]
async fn test_error_statuses_map_to_variants() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("PUT"))
        .and(path("/api/complaints/1/status"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "Already closed"})))
        .mount(&env.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/complaints/2/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&env.server)
        .await;

    let update = StatusUpdate::new(ComplaintStatus::Closed);

    let conflict = env.api.update_status(1, &update).await;
    assert!(matches!(conflict, Err(ApiError::Conflict { message }) if message == "Already closed"));

    let unavailable = env.api.update_status(2, &update).await;
    assert!(matches!(unavailable, Err(ApiError::Status { status: 503, .. })));

    assert_eq!(env.manager.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let env = create_test_env(Role::User).await;
    let TestEnv { server, api, .. } = env;
    drop(server);

    let result = api.my_complaints().await;

    assert!(matches!(result, Err(ApiError::Transport(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// Details and comments
// ═══════════════════════════════════════════════════════════════════════════

fn comment_json(id: i64, kind: &str) -> serde_json::Value {
    json!({
        "id": id,
        "content": format!("Comment {id}"),
        "type": kind,
        "isAdminOnly": kind == "INTERNAL",
        "createdAt": "2025-01-02T09:00:00",
        "authorName": "Root",
        "authorRole": "ADMIN",
        "complaintId": 5
    })
}

#[tokio::test]
async fn test_complaint_details() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints/5/details"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": complaint_json(5, "UNDER_REVIEW"),
            "isAdmin": true
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let complaint = env.api.complaint_details(5).await.unwrap();

    assert_eq!(complaint.id, 5);
    assert_eq!(complaint.status, ComplaintStatus::UnderReview);
}

#[tokio::test]
async fn test_comments_pass_admin_view() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints/5/comments"))
        .and(query_param("adminView", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [comment_json(1, "PUBLIC"), comment_json(2, "INTERNAL")],
            "count": 2,
            "isAdmin": true
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let comments = env.api.comments(5, true).await.unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1].kind, CommentKind::Internal);
    assert_eq!(comments[1].is_admin_only, Some(true));
    assert_eq!(comments[0].author_role, Some(Role::Admin));
}

#[tokio::test]
async fn test_empty_comment_thread() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints/8/comments"))
        .and(query_param("adminView", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 0})))
        .mount(&env.server)
        .await;

    let comments = env.api.comments(8, false).await.unwrap();

    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_add_comment_posts_form() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("POST"))
        .and(path("/api/comments"))
        .and(header_exists("authorization"))
        .respond_with(|request: &Request| {
            let body = String::from_utf8_lossy(&request.body);
            let complete = ["complaintId", "content", "isAdminOnly", "INTERNAL", "Swapped the cable"]
                .iter()
                .all(|needle| body.contains(needle));
            if complete {
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "message": "Comment added successfully",
                    "data": comment_json(3, "INTERNAL")
                }))
            } else {
                ResponseTemplate::new(400).set_body_json(json!({"message": "Incomplete form"}))
            }
        })
        .expect(1)
        .mount(&env.server)
        .await;

    let comment = env
        .api
        .add_comment(NewComment::new(5, "Swapped the cable").internal())
        .await
        .unwrap();

    assert_eq!(comment.id, 3);
    assert_eq!(comment.kind, CommentKind::Internal);
}

#[tokio::test]
async fn test_internal_comment_from_user_is_refused() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("POST"))
        .and(path("/api/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Only admins can post internal or admin-only comments"
        })))
        .mount(&env.server)
        .await;

    let result = env
        .api
        .add_comment(NewComment::new(5, "Internal from a user").internal())
        .await;

    assert!(matches!(result, Err(ApiError::Refused { message }) if message.starts_with("Only admins")));
    assert_eq!(env.manager.status(), SessionStatus::Authenticated);
}

// ═══════════════════════════════════════════════════════════════════════════
// Escalation
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_escalation_timeline() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("GET"))
        .and(path("/api/complaints/5/escalation-timeline"))
        .and(header("authorization", format!("Bearer {}", env.token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Complaint escalated to level 1",
            "timeline": [
                {"title": "Submitted", "description": "Filed", "icon": "📝", "status": "completed",
                 "reachedAt": 1_735_689_600_000_i64},
                {"title": "Level 1", "description": "Team lead", "icon": "⚠️", "status": "current",
                 "timeLimitHours": 24, "reachedAt": "2025-01-02T08:00:00"},
                {"title": "Level 2", "description": "Manager", "icon": "🔥", "status": "pending",
                 "timeLimitHours": 48}
            ]
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let timeline = env.api.escalation_timeline(5).await.unwrap();

    assert_eq!(timeline.message.as_deref(), Some("Complaint escalated to level 1"));
    assert_eq!(timeline.entries.len(), 3);
    assert_eq!(timeline.entries[2].status, TimelineStage::Pending);
    assert_eq!(timeline.current().map(|entry| entry.title.as_str()), Some("Level 1"));
}

#[tokio::test]
async fn test_my_escalated_complaints() {
    let env = create_test_env(Role::User).await;
    let mut escalated = complaint_json(9, "IN_PROGRESS");
    escalated["escalationLevel"] = json!(2);
    escalated["escalatedAt"] = json!("2025-01-03T12:00:00Z");
    escalated["nextEscalationTime"] = json!(1_736_000_000_000_i64);
    Mock::given(method("GET"))
        .and(path("/api/complaints/my/escalated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [escalated]
        })))
        .mount(&env.server)
        .await;

    let complaints = env.api.my_escalated_complaints().await.unwrap();

    assert_eq!(complaints.len(), 1);
    assert_eq!(complaints[0].escalation_level, Some(2));
    assert!(complaints[0].escalated_at.is_some());
    assert!(complaints[0].next_escalation_time.is_some());
}

#[tokio::test]
async fn test_escalation_dashboard_reads_stats_under_either_key() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/escalation/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Escalation statistics retrieved",
            "data": {
                "totalComplaints": 8,
                "totalEscalated": 2,
                "escalationRate": "25.0%",
                "priorityCounts": {"HIGH": 3, "MEDIUM": 5},
                "escalatedPriorityCounts": {"HIGH": 2}
            }
        })))
        .up_to_n_times(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/escalation/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "stats": {"totalEscalated": 4, "levelCounts": {"5": 1}, "totalHighPriority": 3}
        })))
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/escalation/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [complaint_json(2, "OPEN"), complaint_json(4, "IN_PROGRESS")],
            "count": 2
        })))
        .mount(&env.server)
        .await;

    let stats = env.api.escalation_stats().await.unwrap();
    assert_eq!(stats.total_complaints, 8);
    assert_eq!(stats.escalation_rate.as_deref(), Some("25.0%"));
    assert_eq!(stats.escalated_priority_counts.get("HIGH"), Some(&2));

    let stats = env.api.escalation_stats().await.unwrap();
    assert_eq!(stats.total_escalated, 4);
    assert_eq!(stats.level_counts.get(&5), Some(&1));
    assert_eq!(stats.total_high_priority, 3);

    let complaints = env.api.escalated_complaints().await.unwrap();
    assert_eq!(complaints.len(), 2);
}

#[tokio::test]
async fn test_escalation_dashboard_refused_for_users() {
    let env = create_test_env(Role::User).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/escalation/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Admin access required"
        })))
        .mount(&env.server)
        .await;

    let result = env.api.escalation_stats().await;

    assert!(matches!(result, Err(ApiError::Refused { message }) if message == "Admin access required"));
    assert!(env.manager.is_authenticated().await);
}

#[tokio::test]
async fn test_manual_escalation_sends_target_level() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/complaints/7/escalate"))
        .and(body_json(json!({"targetLevel": 3, "reason": "Manual escalation by admin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Complaint escalated to level 3"
        })))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/complaints/8/escalate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&env.server)
        .await;

    let request = EscalationRequest::new(3, "Manual escalation by admin");

    let message = env.api.escalate(7, &request).await.unwrap();
    assert_eq!(message.as_deref(), Some("Complaint escalated to level 3"));

    let message = env.api.escalate(8, &request).await.unwrap();
    assert_eq!(message, None);
}

#[tokio::test]
async fn test_escalation_with_expired_bearer_ends_session() {
    let env = create_test_env(Role::Admin).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/complaints/7/escalate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&env.server)
        .await;

    let result = env
        .api
        .escalate(7, &EscalationRequest::new(5, "Stuck for a week"))
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(env.manager.status(), SessionStatus::Anonymous);
    assert_eq!(env.navigator.last_redirect(), Some(Destination::Login));
}
