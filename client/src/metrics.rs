//! API client metrics.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register descriptions for every API client metric.
pub fn register_metrics() {
    describe_counter!(
        "api.responses.total",
        "Backend responses, labelled by endpoint and status class"
    );
    describe_histogram!(
        "api.request.duration_seconds",
        "Round-trip time per request, labelled by endpoint"
    );
    describe_counter!(
        "api.unauthorized.total",
        "Responses that ended the session with 401"
    );
}

/// Label for a response status. `None` means the request never got one.
fn status_class(status: Option<u16>) -> &'static str {
    match status {
        Some(200..=299) => "2xx",
        Some(401) => "401",
        Some(400..=499) => "4xx",
        Some(500..=599) => "5xx",
        Some(_) => "other",
        None => "transport",
    }
}

pub(crate) fn record_response(endpoint: &'static str, status: Option<u16>, elapsed: Duration) {
    let class = status_class(status);
    counter!("api.responses.total", "endpoint" => endpoint, "status" => class).increment(1);
    histogram!("api.request.duration_seconds", "endpoint" => endpoint)
        .record(elapsed.as_secs_f64());
}

pub(crate) fn record_unauthorized(endpoint: &'static str) {
    counter!("api.unauthorized.total", "endpoint" => endpoint).increment(1);
}
