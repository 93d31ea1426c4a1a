//! Bearer token fixtures.
//!
//! Tokens are shaped like the backend's: `header.claims.signature`, each
//! segment base64url without padding. The signature is never checked by the
//! client, so fixtures carry a constant placeholder.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const SIGNATURE: &str = "c2lnbmF0dXJl";

fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Token with arbitrary claims.
#[must_use]
pub fn with_claims(claims: &Value) -> String {
    with_raw_payload(&claims.to_string())
}

/// Token whose claims segment is `payload`, encoded verbatim.
#[must_use]
pub fn with_raw_payload(payload: &str) -> String {
    format!(
        "{}.{}.{SIGNATURE}",
        encode(HEADER.as_bytes()),
        encode(payload.as_bytes())
    )
}

/// Token for `alice` expiring at `exp` (whole seconds).
#[must_use]
pub fn expiring_at(exp: DateTime<Utc>) -> String {
    with_claims(&json!({
        "sub": "alice",
        "iat": exp.timestamp() - 86_400,
        "exp": exp.timestamp(),
    }))
}

/// Token with a subject but no `exp` claim.
#[must_use]
pub fn without_expiry() -> String {
    with_claims(&json!({ "sub": "alice" }))
}

/// Token whose claims segment is not base64.
#[must_use]
pub fn undecodable() -> String {
    format!("{}.%%%not-base64%%%.{SIGNATURE}", encode(HEADER.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grievance_core::Clock;

    #[test]
    fn test_fixture_shape() {
        let token = expiring_at(crate::test_clock().now());
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);

        let claims = URL_SAFE_NO_PAD.decode(segments[1]).unwrap_or_default();
        let claims: Value = serde_json::from_slice(&claims).unwrap_or_default();
        assert_eq!(claims["exp"], json!(1_735_689_600));
        assert_eq!(claims["sub"], json!("alice"));
    }

    #[test]
    fn test_undecodable_is_three_segments() {
        assert_eq!(undecodable().split('.').count(), 3);
    }
}
