//! Provider presets (§4.8): each wraps the canonical message
//! construction a provider's webhook signature actually signs -- only
//! GitHub's is a bare `HMAC(secret, body)`; Stripe, Slack, and Twilio
//! each sign a composed string, so they cannot reuse
//! [`SignatureVerifier::verify`] directly against the raw body.

use std::collections::BTreeMap;

use crate::verifier::{constant_time_str_eq, Algorithm, Encoding, SignatureVerifier};

/// GitHub: `sha256=` + hex HMAC-SHA256 of the raw body.
pub mod github {
    use super::{Algorithm, SignatureVerifier};

    /// Verify a GitHub `X-Hub-Signature-256` header.
    #[must_use]
    pub fn verify(secret: &[u8], payload: &[u8], header: &str) -> bool {
        SignatureVerifier::new(Algorithm::Sha256)
            .with_prefix("sha256=")
            .verify(secret, payload, header)
    }

    /// Produce the header value a GitHub webhook sender would emit.
    #[must_use]
    pub fn sign(secret: &[u8], payload: &[u8]) -> String {
        SignatureVerifier::new(Algorithm::Sha256)
            .with_prefix("sha256=")
            .sign(secret, payload)
    }
}

/// Stripe: header is `t=<timestamp>,v1=<hex hmac>`; the signed message
/// is `"{timestamp}.{body}"`.
pub mod stripe {
    use super::{constant_time_str_eq, Algorithm, SignatureVerifier};

    /// Parse a Stripe `Stripe-Signature` header into `(timestamp, v1)`.
    /// `None` if either component is missing.
    #[must_use]
    pub fn parse_header(header: &str) -> Option<(&str, &str)> {
        let mut timestamp = None;
        let mut v1 = None;
        for part in header.split(',') {
            let (key, value) = part.split_once('=')?;
            match key {
                "t" => timestamp = Some(value),
                "v1" => v1 = Some(value),
                _ => {}
            }
        }
        Some((timestamp?, v1?))
    }

    /// Verify a Stripe `Stripe-Signature` header against `payload`.
    #[must_use]
    pub fn verify(secret: &[u8], payload: &[u8], header: &str) -> bool {
        let Some((timestamp, v1)) = parse_header(header) else {
            return false;
        };
        let signed_payload = format!("{timestamp}.{}", String::from_utf8_lossy(payload));
        let expected = SignatureVerifier::new(Algorithm::Sha256).sign(secret, signed_payload.as_bytes());
        constant_time_str_eq(&expected, v1)
    }

    /// Produce the header value a Stripe webhook sender would emit for
    /// a given `timestamp` and `payload`.
    #[must_use]
    pub fn sign(secret: &[u8], timestamp: &str, payload: &[u8]) -> String {
        let signed_payload = format!("{timestamp}.{}", String::from_utf8_lossy(payload));
        let v1 = SignatureVerifier::new(Algorithm::Sha256).sign(secret, signed_payload.as_bytes());
        format!("t={timestamp},v1={v1}")
    }
}

/// Slack: signed message is `"v0:{timestamp}:{body}"`, emitted as
/// `v0=<hex hmac-sha256>`.
pub mod slack {
    use super::{Algorithm, SignatureVerifier};

    /// Verify a Slack `X-Slack-Signature` header for the given
    /// `timestamp` (the paired `X-Slack-Request-Timestamp` header) and
    /// raw `payload`.
    #[must_use]
    pub fn verify(secret: &[u8], timestamp: &str, payload: &[u8], header: &str) -> bool {
        let signed = format!("v0:{timestamp}:{}", String::from_utf8_lossy(payload));
        SignatureVerifier::new(Algorithm::Sha256)
            .with_prefix("v0=")
            .verify(secret, signed.as_bytes(), header)
    }

    /// Produce the header value a Slack webhook sender would emit.
    #[must_use]
    pub fn sign(secret: &[u8], timestamp: &str, payload: &[u8]) -> String {
        let signed = format!("v0:{timestamp}:{}", String::from_utf8_lossy(payload));
        SignatureVerifier::new(Algorithm::Sha256)
            .with_prefix("v0=")
            .sign(secret, signed.as_bytes())
    }
}

/// Twilio: `sha1(url + sorted_params_concatenated)`, base64-encoded.
pub mod twilio {
    use super::{Algorithm, BTreeMap, Encoding, SignatureVerifier};

    fn signed_string(url: &str, params: &BTreeMap<String, String>) -> String {
        let mut signed = url.to_string();
        for (key, value) in params {
            signed.push_str(key);
            signed.push_str(value);
        }
        signed
    }

    /// Verify a Twilio `X-Twilio-Signature` header. `params` must be
    /// the full set of POST body parameters Twilio signed (sorted
    /// internally, so insertion order does not matter -- a
    /// [`BTreeMap`] already guarantees sorted iteration).
    #[must_use]
    pub fn verify(
        secret: &[u8],
        url: &str,
        params: &BTreeMap<String, String>,
        header: &str,
    ) -> bool {
        let signed = signed_string(url, params);
        SignatureVerifier::new(Algorithm::Sha1)
            .with_encoding(Encoding::Base64)
            .verify(secret, signed.as_bytes(), header)
    }

    /// Produce the header value a Twilio webhook sender would emit.
    #[must_use]
    pub fn sign(secret: &[u8], url: &str, params: &BTreeMap<String, String>) -> String {
        let signed = signed_string(url, params);
        SignatureVerifier::new(Algorithm::Sha1)
            .with_encoding(Encoding::Base64)
            .sign(secret, signed.as_bytes())
    }
}
