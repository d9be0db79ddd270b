// src/slack/signature.rs
//! Slack request signing (v0 scheme).
//!
//! Slack signs every webhook with `X-Slack-Signature: v0=<hex>` where the hex is an
//! HMAC-SHA256 over `v0:<timestamp>:<raw body>` keyed by the app's signing secret.
//! Everything here is a pure function of its inputs.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_VERSION: &str = "v0";

/// The body could not be turned into the text Slack signed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("body is not valid base64: {0}")]
    Base64(String),
    #[error("decoded body is not valid UTF-8")]
    Utf8,
}

/// Verify a Slack request signature.
///
/// `raw_body` must be the exact bytes Slack sent. When `is_base64_encoded` is set
/// (API-gateway style delivery) the body is decoded first and must be UTF-8.
/// A mismatch is logged and reported as `Ok(false)`; only malformed input errors.
pub fn verify(
    signature: &str,
    timestamp: &str,
    raw_body: &[u8],
    is_base64_encoded: bool,
    signing_secret: &[u8],
) -> Result<bool, DecodeError> {
    let decoded;
    let body: &[u8] = if is_base64_encoded {
        let bytes = STANDARD
            .decode(raw_body)
            .map_err(|e| DecodeError::Base64(e.to_string()))?;
        decoded = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
        decoded.as_bytes()
    } else {
        raw_body
    };

    let expected = compute_signature(timestamp, body, signing_secret);
    let matched: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
    if !matched {
        error!(computed = %expected, provided = %signature, "slack signature mismatch");
    }
    Ok(matched)
}

/// `v0=` + lowercase hex HMAC-SHA256 over `v0:{timestamp}:{body}`.
pub fn compute_signature(timestamp: &str, body: &[u8], signing_secret: &[u8]) -> String {
    // HMAC takes keys of any length, so this only fails on an impossible key size.
    let mut mac = match HmacSha256::new_from_slice(signing_secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Replay guard: the request timestamp must be within `max_age_secs` of `now_unix`.
/// `max_age_secs == 0` turns the check off.
pub fn is_fresh(timestamp: &str, now_unix: i64, max_age_secs: u64) -> bool {
    if max_age_secs == 0 {
        return true;
    }
    match timestamp.trim().parse::<i64>() {
        Ok(ts) => now_unix.abs_diff(ts) <= max_age_secs,
        Err(_) => false,
    }
}

/// API-gateway style proxy event (e.g. a Lambda function URL invocation).
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyEvent {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

impl ProxyEvent {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Verify a proxy event. Missing signature headers count as a failed verification.
pub fn verify_proxy_event(event: &ProxyEvent, signing_secret: &[u8]) -> Result<bool, DecodeError> {
    let (Some(signature), Some(timestamp)) =
        (event.header(SIGNATURE_HEADER), event.header(TIMESTAMP_HEADER))
    else {
        error!("slack signature headers missing from proxy event");
        return Ok(false);
    };
    verify(
        signature,
        timestamp,
        event.body.as_bytes(),
        event.is_base64_encoded,
        signing_secret,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    const SECRET: &[u8] = b"8f742231b10e8888abcd99yyyzzz85a5";
    const TS: &str = "1531420618";
    const BODY: &str = "token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";

    #[test]
    fn matches_slack_documented_example() {
        let sig = "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503";
        assert_eq!(compute_signature(TS, BODY.as_bytes(), SECRET), sig);
        assert_eq!(verify(sig, TS, BODY.as_bytes(), false, SECRET), Ok(true));
    }

    #[test]
    fn body_or_timestamp_change_fails() {
        let sig = compute_signature(TS, BODY.as_bytes(), SECRET);
        let mut tampered = BODY.as_bytes().to_vec();
        tampered[0] ^= 0x01;
        assert_eq!(verify(&sig, TS, &tampered, false, SECRET), Ok(false));
        assert_eq!(verify(&sig, "1531420619", BODY.as_bytes(), false, SECRET), Ok(false));
    }

    #[test]
    fn wrong_length_signature_fails() {
        assert_eq!(verify("v0=abc", TS, BODY.as_bytes(), false, SECRET), Ok(false));
        assert_eq!(verify("", TS, BODY.as_bytes(), false, SECRET), Ok(false));
    }

    #[test]
    fn base64_body_is_decoded_before_signing() {
        let sig = compute_signature(TS, BODY.as_bytes(), SECRET);
        let encoded = STANDARD.encode(BODY);
        assert_eq!(verify(&sig, TS, encoded.as_bytes(), true, SECRET), Ok(true));
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let res = verify("v0=00", TS, b"***not base64***", true, SECRET);
        assert!(matches!(res, Err(DecodeError::Base64(_))));
    }

    #[test]
    fn non_utf8_base64_payload_is_decode_error() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0xfd]);
        let res = verify("v0=00", TS, encoded.as_bytes(), true, SECRET);
        assert_eq!(res, Err(DecodeError::Utf8));
    }

    #[test]
    fn proxy_event_headers_are_case_insensitive() {
        let sig = compute_signature(TS, BODY.as_bytes(), SECRET);
        let mut headers = HashMap::new();
        headers.insert("X-Slack-Signature".to_string(), sig);
        headers.insert("X-Slack-Request-Timestamp".to_string(), TS.to_string());
        let event = ProxyEvent {
            headers,
            body: BODY.to_string(),
            is_base64_encoded: false,
        };
        assert_eq!(verify_proxy_event(&event, SECRET), Ok(true));
    }

    #[test]
    fn proxy_event_without_headers_fails() {
        let event: ProxyEvent =
            serde_json::from_str(r#"{"body":"x","isBase64Encoded":false}"#).unwrap();
        assert_eq!(verify_proxy_event(&event, SECRET), Ok(false));
    }

    #[test]
    fn freshness_window() {
        assert!(is_fresh("1000", 1200, 300));
        assert!(is_fresh("1500", 1200, 300));
        assert!(!is_fresh("800", 1200, 300));
        assert!(!is_fresh("soon", 1200, 300));
        assert!(is_fresh("soon", 1200, 0));
    }
}
