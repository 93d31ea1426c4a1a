//! # Grievance Testing
//!
//! Testing utilities for the IT Grievance portal client.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - Bearer token fixtures with chosen expiry claims
//! - Property-based strategies for token tests
//! - A Given/When/Then harness for reducers ([`ReducerTest`])
//!
//! ## Example
//!
//! ```
//! use grievance_testing::{ManualClock, tokens};
//! use grievance_core::Clock;
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(grievance_testing::test_clock().now());
//! let token = tokens::expiring_at(clock.now() + Duration::minutes(5));
//! assert_eq!(token.split('.').count(), 3);
//!
//! clock.advance(Duration::minutes(10));
//! ```

pub mod tokens;

/// Mock implementations of Environment traits
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use grievance_core::Clock;
    use std::sync::{Arc, PoisonError, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use grievance_testing::mocks::FixedClock;
    /// use grievance_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same instant, so a test can hand one clone to the
    /// code under test and keep another to advance time (for example to let a
    /// token expire in a long-lived session).
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock frozen at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward (or backward, for a negative duration).
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.write().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute instant.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.write().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_735_689_600))
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes to the test harness.
    ///
    /// Safe to call from every test; only the first call installs anything.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "grievance=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// Strategies for bearer tokens whose claims are well-formed, expired, or
/// unreadable.
pub mod properties {
    use crate::tokens;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    /// Tokens whose `exp` lies strictly after `now` (1 second to ~10 years).
    pub fn live_token(now: DateTime<Utc>) -> impl Strategy<Value = String> {
        (1i64..315_360_000).prop_map(move |secs| tokens::expiring_at(now + Duration::seconds(secs)))
    }

    /// Tokens whose `exp` is at or before `now` (0 seconds to ~10 years ago).
    pub fn expired_token(now: DateTime<Utc>) -> impl Strategy<Value = String> {
        (0i64..315_360_000).prop_map(move |secs| tokens::expiring_at(now - Duration::seconds(secs)))
    }

    /// Tokens whose claims segment cannot be read.
    pub fn malformed_token() -> impl Strategy<Value = String> {
        prop_oneof![
            // Not three segments
            "[A-Za-z0-9_-]{0,40}",
            "[A-Za-z0-9_-]{1,20}\\.[A-Za-z0-9_-]{1,20}",
            // Middle segment outside the base64 alphabet
            "[a-z]{4}\\.[!@$%^&*]{4,12}\\.[a-z]{4}",
            // Middle segment decodes, but not to a JSON object with `exp`
            "[a-zA-Z ]{0,24}".prop_map(|text| tokens::with_raw_payload(&text)),
            Just(tokens::without_expiry()),
        ]
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::ReducerTest;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use grievance_core::Clock;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_manual_clock_shares_time_between_clones() {
        let clock = ManualClock::new(test_clock().now());
        let handle = clock.clone();

        handle.advance(Duration::hours(2));
        assert_eq!(clock.now(), test_clock().now() + Duration::hours(2));

        handle.set(test_clock().now());
        assert_eq!(clock.now(), test_clock().now());
    }
}
