//! Property tests for token expiry and the lazy authentication check.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Duration;
use grievance_core::{Clock, Destination};
use grievance_session::mocks::{MockAuthApi, MockKeyValueStore, MockNavigator};
use grievance_session::token::validate;
use grievance_session::{SessionEnvironment, SessionManager, SessionStatus};
use grievance_testing::{ManualClock, properties, test_clock};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

fn stored(token: &str) -> MockKeyValueStore {
    MockKeyValueStore::with_entries([
        ("token", token),
        ("userId", "7"),
        ("username", "alice"),
        ("email", "alice@example.com"),
        ("role", "USER"),
    ])
}

/// Restore `token`, then run the lazy check `later` after start-up.
///
/// Returns the check result, the storage mock and the navigator mock.
fn restore_then_check(
    token: &str,
    later: Duration,
) -> (bool, SessionStatus, MockKeyValueStore, MockNavigator) {
    let storage = stored(token);
    let navigator = MockNavigator::new();
    let clock = ManualClock::new(test_clock().now());
    let manager = SessionManager::new(SessionEnvironment::new(
        storage.clone(),
        MockAuthApi::new(),
        navigator.clone(),
        clock.clone(),
    ));

    runtime().block_on(async {
        manager.initialize().await;
        clock.advance(later);
        let authenticated = manager.is_authenticated().await;
        (authenticated, manager.status(), storage, navigator)
    })
}

proptest! {
    #[test]
    fn live_tokens_validate(token in properties::live_token(test_clock().now())) {
        prop_assert!(validate(Some(token.as_str()), test_clock().now(), Duration::zero()).is_valid());
    }

    #[test]
    fn expired_tokens_never_validate(token in properties::expired_token(test_clock().now())) {
        prop_assert!(!validate(Some(token.as_str()), test_clock().now(), Duration::zero()).is_valid());
    }

    #[test]
    fn malformed_tokens_never_validate(token in properties::malformed_token()) {
        prop_assert!(!validate(Some(token.as_str()), test_clock().now(), Duration::zero()).is_valid());
    }

    #[test]
    fn live_session_stays_untouched(token in properties::live_token(test_clock().now() + Duration::hours(1))) {
        let (authenticated, status, storage, navigator) =
            restore_then_check(&token, Duration::minutes(30));

        prop_assert!(authenticated);
        prop_assert_eq!(status, SessionStatus::Authenticated);
        prop_assert_eq!(storage.write_count(), 0);
        prop_assert!(navigator.redirects().is_empty());
    }

    #[test]
    fn session_expiring_while_running_is_ended(
        token in properties::live_token(test_clock().now()),
    ) {
        // Every generated token is dead ten years and a day later
        let (authenticated, status, storage, navigator) =
            restore_then_check(&token, Duration::days(3_651));

        prop_assert!(!authenticated);
        prop_assert_eq!(status, SessionStatus::Anonymous);
        prop_assert!(storage.snapshot().is_empty());
        prop_assert_eq!(navigator.redirects(), vec![Destination::Login]);
    }

    #[test]
    fn malformed_stored_token_restores_anonymous(token in properties::malformed_token()) {
        let (authenticated, status, storage, navigator) =
            restore_then_check(&token, Duration::zero());

        prop_assert!(!authenticated);
        prop_assert_eq!(status, SessionStatus::Anonymous);
        prop_assert!(storage.snapshot().is_empty());
        prop_assert!(navigator.redirects().is_empty());
    }
}
