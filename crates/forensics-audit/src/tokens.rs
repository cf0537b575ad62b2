//! HMAC-signed presign/download/export tokens (spec §4.11).
//!
//! Token shape: `base64url(JSON(payload)) + "." + hex(HMAC_SHA256(payload, secret))`.
//! Verification recomputes the HMAC and compares in constant time before
//! trusting the payload, so a forged or truncated tag can't be distinguished
//! from a wrong one by timing.

use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use forensics_types::audit::TokenPayload;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn sign(secret: &[u8], payload_json: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload_json);
    hex::encode(mac.finalize().into_bytes())
}

/// Build a token for `id`, valid until `now + ttl`.
pub fn generate(id: &str, secret: &[u8], ttl: Duration, now: DateTime<Utc>) -> Option<String> {
    if ttl <= Duration::zero() {
        return None;
    }
    let payload = TokenPayload {
        id: id.to_string(),
        exp: now + ttl,
    };
    let payload_json = serde_json::to_vec(&payload).ok()?;
    let encoded = BASE64URL_NOPAD.encode(&payload_json);
    let tag = sign(secret, &payload_json);
    Some(format!("{encoded}.{tag}"))
}

/// Verify `token` against `secret`, returning the id iff the tag matches and
/// the token has not expired as of `now`.
pub fn verify(token: &str, secret: &[u8], now: DateTime<Utc>) -> Option<String> {
    let (encoded, tag) = token.split_once('.')?;
    let payload_json = BASE64URL_NOPAD.decode(encoded.as_bytes()).ok()?;
    let expected_tag = sign(secret, &payload_json);

    let tag_bytes = hex::decode(tag).ok()?;
    let expected_bytes = hex::decode(&expected_tag).ok()?;
    if tag_bytes.len() != expected_bytes.len() {
        return None;
    }
    if tag_bytes.ct_eq(&expected_bytes).unwrap_u8() != 1 {
        return None;
    }

    let payload: TokenPayload = serde_json::from_slice(&payload_json).ok()?;
    if payload.exp <= now {
        return None;
    }
    Some(payload.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_succeeds_within_ttl() {
        let now = Utc::now();
        let token = generate("abc123", b"secret", Duration::minutes(60), now).unwrap();
        assert_eq!(verify(&token, b"secret", now + Duration::minutes(30)), Some("abc123".to_string()));
    }

    #[test]
    fn expired_token_fails_verification() {
        let now = Utc::now();
        let token = generate("abc123", b"secret", Duration::minutes(60), now).unwrap();
        assert_eq!(verify(&token, b"secret", now + Duration::minutes(61)), None);
    }

    #[test]
    fn zero_or_negative_ttl_yields_no_token() {
        let now = Utc::now();
        assert!(generate("abc123", b"secret", Duration::zero(), now).is_none());
        assert!(generate("abc123", b"secret", Duration::minutes(-5), now).is_none());
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let now = Utc::now();
        let token = generate("abc123", b"secret-a", Duration::minutes(60), now).unwrap();
        assert_eq!(verify(&token, b"secret-b", now), None);
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let now = Utc::now();
        let token = generate("abc123", b"secret", Duration::minutes(60), now).unwrap();
        let (_, tag) = token.split_once('.').unwrap();
        let forged_payload = BASE64URL_NOPAD.encode(br#"{"id":"other","exp":"2999-01-01T00:00:00Z"}"#);
        let forged = format!("{forged_payload}.{tag}");
        assert_eq!(verify(&forged, b"secret", now), None);
    }
}
