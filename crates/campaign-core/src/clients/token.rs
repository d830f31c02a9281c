//! Bearer token inspection
//!
//! Tokens are JWTs issued by the same service that consumes them. Only the
//! payload is decoded to read `exp`; the signature is never verified since
//! the client has no key to verify it with.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde_json::{Map, Value};
use std::fmt;

/// Number of characters shown when a token is logged
const REDACTED_PREFIX_LEN: usize = 20;

/// Expiry information carried by a token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expiry {
    /// `exp` claim in epoch seconds
    At(f64),
    /// No `exp` claim
    Never,
    /// Not a decodable JWT, or `exp` is not a number
    Unreadable,
}

#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the claims segment; `None` when the token is not a readable JWT
    pub fn claims(&self) -> Option<Map<String, Value>> {
        let segments: Vec<&str> = self.0.split('.').collect();
        let [_header, payload, _signature] = segments.as_slice() else {
            return None;
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            Value::Object(claims) => Some(claims),
            _ => None,
        }
    }

    /// Expiry as read from the `exp` claim
    pub fn expiry(&self) -> Expiry {
        let Some(claims) = self.claims() else {
            return Expiry::Unreadable;
        };

        match claims.get("exp") {
            None | Some(Value::Null) => Expiry::Never,
            Some(exp) => exp.as_f64().map(Expiry::At).unwrap_or(Expiry::Unreadable),
        }
    }

    /// Usable only while `exp` lies strictly in the future
    pub fn is_expired_at(&self, now_epoch_seconds: f64) -> bool {
        match self.expiry() {
            Expiry::At(exp) => now_epoch_seconds >= exp,
            Expiry::Never => false,
            Expiry::Unreadable => {
                log::warn!("Could not decode bearer token to check expiry, treating it as expired");
                true
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_epoch_seconds())
    }

    /// Prefix safe to put in a log line
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(REDACTED_PREFIX_LEN).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&self.redacted()).finish()
    }
}

pub(crate) fn now_epoch_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Build an unsigned JWT with the given claims (test fixtures)
#[cfg(test)]
pub(crate) fn encode_test_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
pub(crate) fn token_expiring_in(seconds: i64) -> String {
    encode_test_token(&serde_json::json!({
        "sub": "operator@example.com",
        "exp": Utc::now().timestamp() + seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_future_exp_is_not_expired() {
        for offset in [5, 60, 3600, 86_400 * 30] {
            let token = BearerToken::new(token_expiring_in(offset));
            assert!(!token.is_expired(), "exp now+{} should be valid", offset);
        }
    }

    #[test]
    fn test_past_exp_is_expired() {
        for offset in [-1, -10, -3600] {
            let token = BearerToken::new(token_expiring_in(offset));
            assert!(token.is_expired(), "exp now{} should be expired", offset);
        }
    }

    #[test]
    fn test_exp_equal_to_now_is_expired() {
        let token = BearerToken::new(encode_test_token(&json!({ "exp": 1_000 })));
        assert!(token.is_expired_at(1_000.0));
        assert!(!token.is_expired_at(999.5));
    }

    #[test]
    fn test_missing_exp_never_expires() {
        let token = BearerToken::new(encode_test_token(&json!({ "sub": "x" })));
        assert_eq!(token.expiry(), Expiry::Never);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_undecodable_tokens_are_expired() {
        for raw in ["", "not-a-jwt", "a.b", "a.!!!.c", "a.b.c.d"] {
            assert!(BearerToken::new(raw).is_expired(), "{:?} should be treated as expired", raw);
        }

        // payload that is JSON but not an object
        let array_payload = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"[1,2]"));
        assert!(BearerToken::new(array_payload).is_expired());

        let bad_exp = encode_test_token(&json!({ "exp": "tomorrow" }));
        assert!(BearerToken::new(bad_exp).is_expired());
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":10}"#);
        assert!(payload.ends_with("=="));
        let token = BearerToken::new(format!("h.{}.s", payload));
        assert_eq!(token.expiry(), Expiry::At(10.0));
    }

    #[test]
    fn test_redaction_keeps_prefix_only() {
        let token = BearerToken::new("eyJhbGciOiJIUzI1NiJ9.very-secret-payload.sig");
        let redacted = token.redacted();
        assert_eq!(redacted, "eyJhbGciOiJIUzI1NiJ9...");
        assert!(!format!("{:?}", token).contains("very-secret"));
    }
}
