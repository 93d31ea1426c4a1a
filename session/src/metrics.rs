//! Session metrics.
//!
//! Counters are recorded through the `metrics` facade; nothing is exported
//! unless the application installs a recorder.

use crate::actions::ClearCause;
use crate::error::SessionError;
use crate::state::SessionStatus;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register descriptions for every session metric.
///
/// Call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        "session.transitions.total",
        "Session status changes, labelled by source and target status"
    );
    describe_counter!(
        "session.logins.total",
        "Login attempts, labelled by outcome"
    );
    describe_histogram!(
        "session.login.duration_seconds",
        "Time spent in the authentication endpoint per login"
    );
    describe_counter!(
        "session.clears.total",
        "Session storage clears, labelled by cause"
    );
    describe_counter!(
        "session.lazy_expiry.total",
        "Sessions ended by the lazy token check, labelled by reason"
    );
    describe_counter!(
        "session.storage.errors.total",
        "Durable storage failures, labelled by operation"
    );
}

pub(crate) fn record_transition(from: SessionStatus, to: SessionStatus) {
    counter!(
        "session.transitions.total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub(crate) fn record_login(result: Result<(), &SessionError>, elapsed: Duration) {
    let outcome = match result {
        Ok(()) => "success",
        Err(SessionError::InvalidCredentials { .. }) => "invalid_credentials",
        Err(SessionError::Rejected { .. }) => "rejected",
        Err(SessionError::Transport(_)) => "transport",
        Err(SessionError::Storage(_)) => "storage",
        Err(_) => "error",
    };
    counter!("session.logins.total", "outcome" => outcome).increment(1);
    histogram!("session.login.duration_seconds").record(elapsed.as_secs_f64());
}

pub(crate) fn record_clear(cause: ClearCause) {
    counter!("session.clears.total", "cause" => cause.as_str()).increment(1);
    if let ClearCause::TokenInvalid(reason) = cause {
        counter!("session.lazy_expiry.total", "reason" => reason.as_str()).increment(1);
    }
}

pub(crate) fn record_storage_error(operation: &'static str) {
    counter!("session.storage.errors.total", "operation" => operation).increment(1);
}
