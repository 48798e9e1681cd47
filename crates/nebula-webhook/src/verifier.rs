//! The generic configurable verifier (§4.8 first paragraph).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Supported HMAC digest algorithms (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// HMAC-MD5.
    Md5,
    /// HMAC-SHA1.
    Sha1,
    /// HMAC-SHA256 (the default).
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

/// How the raw HMAC digest is encoded before comparison (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Lowercase hex.
    Hex,
    /// Standard base64.
    Base64,
}

impl Default for Encoding {
    fn default() -> Self {
        Self::Hex
    }
}

fn mac_bytes(algorithm: Algorithm, secret: &[u8], payload: &[u8]) -> Vec<u8> {
    fn run<D: Mac + hmac::digest::KeyInit>(secret: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut mac = <D as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
    match algorithm {
        Algorithm::Md5 => run::<Hmac<Md5>>(secret, payload),
        Algorithm::Sha1 => run::<Hmac<Sha1>>(secret, payload),
        Algorithm::Sha256 => run::<Hmac<Sha256>>(secret, payload),
        Algorithm::Sha512 => run::<Hmac<Sha512>>(secret, payload),
    }
}

fn encode(encoding: Encoding, bytes: &[u8]) -> String {
    match encoding {
        Encoding::Hex => hex::encode(bytes),
        Encoding::Base64 => BASE64.encode(bytes),
    }
}

/// A configurable `HMAC(algorithm, secret, payload)` verifier with an
/// optional fixed prefix stripped before comparison (§4.8).
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    algorithm: Algorithm,
    encoding: Encoding,
    prefix: Option<String>,
}

impl SignatureVerifier {
    /// Build a verifier for the given algorithm, hex-encoded, no prefix.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            encoding: Encoding::default(),
            prefix: None,
        }
    }

    /// Override the encoding (default is hex).
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set a fixed prefix (e.g. `"sha256="`) stripped from the header
    /// value before comparison.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Compute the signature for `payload` under `secret`, with the
    /// configured prefix prepended (matching the header format a
    /// producer would emit).
    #[must_use]
    pub fn sign(&self, secret: &[u8], payload: &[u8]) -> String {
        let digest = encode(self.encoding, &mac_bytes(self.algorithm, secret, payload));
        match &self.prefix {
            Some(prefix) => format!("{prefix}{digest}"),
            None => digest,
        }
    }

    /// Verify `signature_header` against the signature computed for
    /// `payload` under `secret`. Constant-time in the encoded
    /// signature's length (§8).
    #[must_use]
    pub fn verify(&self, secret: &[u8], payload: &[u8], signature_header: &str) -> bool {
        let candidate = match &self.prefix {
            Some(prefix) => match signature_header.strip_prefix(prefix.as_str()) {
                Some(rest) => rest,
                None => return false,
            },
            None => signature_header,
        };
        let expected = encode(self.encoding, &mac_bytes(self.algorithm, secret, payload));
        constant_time_str_eq(&expected, candidate)
    }
}

/// Constant-time string comparison, independent of where the first
/// mismatching byte falls (§8 signature-verifier invariant). Strings of
/// different length are rejected up front -- that length check itself
/// is not secret-dependent, only the byte-by-byte comparison is.
#[must_use]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
