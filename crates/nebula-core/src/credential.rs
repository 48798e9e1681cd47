//! Credential payload shape (§3).
//!
//! `CredentialData` is intentionally opaque: every field is optional and
//! consumers pull whatever they need. The type never implements `Debug`
//! in a way that prints secret material -- fields that hold raw secrets
//! are wrapped so a stray `{:?}` in a log line cannot leak them, the same
//! defensive pattern as `action::context::SecureString` upstream.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A secret value that redacts itself in `Debug` and `Display`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Callers that need the plaintext (e.g. to
    /// build an `Authorization` header) call this explicitly -- it never
    /// happens implicitly via `Debug`/`Display`/logging.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Credential material resolved by a `CredentialProvider`. All fields are
/// optional; the node handler that requested it knows which ones apply
/// to its credential `type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialData {
    /// Credential type discriminant (e.g. `"basicAuth"`, `"oauth2"`).
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Username, for basic-auth style credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password, for basic-auth style credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    /// Bearer-style token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Secret>,
    /// OAuth-style access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Secret>,
    /// API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Secret>,
    /// Arbitrary additional string fields specific to a credential type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
    /// Arbitrary additional structured fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl CredentialData {
    /// Build an empty credential of the given type.
    pub fn new(credential_type: impl Into<String>) -> Self {
        Self {
            credential_type: credential_type.into(),
            ..Self::default()
        }
    }

    /// Borrow the username, if set.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Expose the password, if set.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(Secret::expose)
    }

    /// Expose the bearer token, if set.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(Secret::expose)
    }

    /// Expose the OAuth access token, if set.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(Secret::expose)
    }

    /// Expose the API key, if set.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(Secret::expose)
    }

    /// Look up a custom string field.
    #[must_use]
    pub fn custom(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }
}
