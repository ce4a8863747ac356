//! Access token inspection.
//!
//! Only the `exp` claim is read. Signatures are the server's business; the
//! client just needs to know whether sending the token is pointless.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct Claims {
    exp: f64,
}

/// Expiry instant embedded in the token, if it can be decoded
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = PAYLOAD_ENGINE.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    if !claims.exp.is_finite() {
        return None;
    }
    DateTime::from_timestamp(claims.exp.floor() as i64, 0)
}

/// Whether the token is expired at `now`, treating it as expired `skew` early.
///
/// Malformed tokens are always expired.
pub fn is_expired_at(token: &str, now: DateTime<Utc>, skew: Duration) -> bool {
    match expires_at(token) {
        Some(exp) => now + skew >= exp,
        None => true,
    }
}

/// Whether the token is expired right now
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now(), Duration::zero())
}

#[cfg(test)]
pub(crate) fn unsigned_token(exp: i64) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"token_type":"access","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

    #[test]
    fn test_past_exp_is_expired() {
        let token = unsigned_token(Utc::now().timestamp() - 60);
        assert!(is_expired(&token));
    }

    #[test]
    fn test_future_exp_is_valid() {
        let exp = Utc::now().timestamp() + 3600;
        let token = unsigned_token(exp);
        assert!(!is_expired(&token));
        assert_eq!(expires_at(&token).unwrap().timestamp(), exp);
    }

    #[test]
    fn test_skew_expires_early() {
        let now = Utc::now();
        let token = unsigned_token(now.timestamp() + 30);
        assert!(!is_expired_at(&token, now, Duration::zero()));
        assert!(is_expired_at(&token, now, Duration::seconds(60)));
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        let no_exp = format!("h.{}.s", URL_SAFE_NO_PAD.encode(r#"{"sub":"1"}"#));
        let string_exp = format!("h.{}.s", URL_SAFE_NO_PAD.encode(r#"{"exp":"tomorrow"}"#));

        for token in ["", "a", "a.b", "a.%%%.c", &not_json, &no_exp, &string_exp] {
            assert!(is_expired(token), "expected {token:?} to be expired");
        }
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let exp = Utc::now().timestamp() + 3600;
        // 25 bytes of JSON, so the encoding ends in "=="
        let payload = URL_SAFE.encode(format!(r#"{{"exp":{exp},"ab":1}}"#));
        assert!(payload.ends_with("=="));
        assert!(!is_expired(&format!("h.{payload}.s")));
    }

    #[test]
    fn test_fractional_exp() {
        let exp = Utc::now().timestamp() + 3600;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}.5}}"#));
        assert_eq!(expires_at(&format!("h.{payload}.s")).unwrap().timestamp(), exp);
    }
}
