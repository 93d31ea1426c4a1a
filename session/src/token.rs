//! Bearer token inspection.
//!
//! The client never verifies signatures; it only reads the expiry claim so
//! that a stale session is dropped before the backend has to reject it.
//! Inspection never fails loudly: every defect maps to
//! [`TokenValidity::Invalid`].

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Claims the client reads from the token payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    /// Subject (the username).
    #[serde(default)]
    pub sub: Option<String>,
    /// Issued-at, seconds since the epoch.
    #[serde(default)]
    pub iat: Option<f64>,
    /// Expiry, seconds since the epoch.
    #[serde(default)]
    pub exp: Option<f64>,
}

/// Why a token cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// No token stored.
    Missing,
    /// Wrong segment count, bad base64, or a payload that is not a claims object.
    Malformed,
    /// Payload has no `exp` claim.
    MissingExpiry,
    /// `exp` is not after the current time.
    Expired,
}

impl InvalidReason {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::MissingExpiry => "missing_expiry",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of inspecting a token against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidity {
    /// The token may be used until `expires_at`.
    Valid {
        /// Instant of the `exp` claim.
        expires_at: DateTime<Utc>,
    },
    /// The token must be discarded.
    Invalid {
        /// What is wrong with it.
        reason: InvalidReason,
    },
}

impl TokenValidity {
    /// Whether the token may be used.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Decode the payload segment of `token`.
///
/// The segment is expected to be base64url without padding. Standard
/// alphabet and trailing `=` are tolerated.
///
/// # Errors
///
/// Returns [`InvalidReason::Malformed`] when the token does not have three
/// segments or the payload is not a base64 JSON object.
pub fn decode_claims(token: &str) -> Result<Claims, InvalidReason> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(InvalidReason::Malformed);
    };

    let payload = payload.trim_end_matches('=');
    let bytes = if payload.contains(['+', '/']) {
        STANDARD_NO_PAD.decode(payload)
    } else {
        URL_SAFE_NO_PAD.decode(payload)
    }
    .map_err(|_| InvalidReason::Malformed)?;

    serde_json::from_slice(&bytes).map_err(|_| InvalidReason::Malformed)
}

/// Convert an `exp` claim to an instant.
fn expiry_instant(exp: f64) -> Option<DateTime<Utc>> {
    let millis = (exp * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= 9.0e15 {
        return None;
    }
    // Bounded above, so the cast is exact
    #[allow(clippy::cast_possible_truncation)]
    DateTime::from_timestamp_millis(millis as i64)
}

/// Inspect `token` at instant `now`.
///
/// A token is valid iff `now + leeway < exp`. With the default zero leeway
/// this is the strict `now < exp` comparison.
#[must_use]
pub fn validate(token: Option<&str>, now: DateTime<Utc>, leeway: Duration) -> TokenValidity {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return TokenValidity::Invalid {
            reason: InvalidReason::Missing,
        };
    };

    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(reason) => return TokenValidity::Invalid { reason },
    };

    let Some(exp) = claims.exp else {
        return TokenValidity::Invalid {
            reason: InvalidReason::MissingExpiry,
        };
    };

    let Some(expires_at) = expiry_instant(exp) else {
        return TokenValidity::Invalid {
            reason: InvalidReason::Malformed,
        };
    };

    if now + leeway < expires_at {
        tracing::trace!(sub = ?claims.sub, %expires_at, "Token is valid");
        TokenValidity::Valid { expires_at }
    } else {
        tracing::debug!(sub = ?claims.sub, %expires_at, %now, "Token has expired");
        TokenValidity::Invalid {
            reason: InvalidReason::Expired,
        }
    }
}
