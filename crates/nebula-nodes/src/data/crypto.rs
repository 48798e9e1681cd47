//! `crypto` node (§8 round-trip invariant: `base64encode ∘
//! base64decode = id`): hashing and encoding primitives shared with
//! the webhook signature verifier's algorithm set.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::Md5;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Handler for the `crypto` node type.
pub struct CryptoHandler {
    meta: NodeMetadata,
}

impl CryptoHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("crypto", "Crypto", "Hashing and encoding primitives"),
        }
    }
}

impl Default for CryptoHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_hex(algorithm: &str, data: &[u8]) -> nebula_error::Result<String> {
    Ok(match algorithm {
        "md5" => hex::encode(Md5::digest(data)),
        "sha1" => hex::encode(Sha1::digest(data)),
        "sha256" => hex::encode(Sha256::digest(data)),
        "sha512" => hex::encode(Sha512::digest(data)),
        other => return Err(nebula_error::Error::validation(format!("unknown hash algorithm: {other}"))),
    })
}

#[async_trait]
impl NodeHandler for CryptoHandler {
    fn node_type(&self) -> &str {
        "crypto"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let operation = ctx
            .config
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("crypto requires `operation`"))?;
        let value = ctx
            .config
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("crypto requires a string `value`"))?;

        let mut output = NodeOutput::new();
        match operation {
            "hash" => {
                let algorithm = ctx.config.get("algorithm").and_then(Value::as_str).unwrap_or("sha256");
                output.insert("value".into(), json!(hash_hex(algorithm, value.as_bytes())?));
            }
            "base64encode" => {
                output.insert("value".into(), json!(BASE64.encode(value.as_bytes())));
            }
            "base64decode" => {
                let bytes = BASE64
                    .decode(value)
                    .map_err(|e| nebula_error::Error::validation(format!("invalid base64: {e}")))?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| nebula_error::Error::validation(format!("decoded bytes are not utf-8: {e}")))?;
                output.insert("value".into(), json!(text));
            }
            "hexencode" => {
                output.insert("value".into(), json!(hex::encode(value.as_bytes())));
            }
            "hexdecode" => {
                let bytes =
                    hex::decode(value).map_err(|e| nebula_error::Error::validation(format!("invalid hex: {e}")))?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| nebula_error::Error::validation(format!("decoded bytes are not utf-8: {e}")))?;
                output.insert("value".into(), json!(text));
            }
            other => return Err(nebula_error::Error::validation(format!("unknown crypto operation: {other}"))),
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, NodeId, WorkflowId, WorkspaceId};
    use parking_lot::RwLock;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn ctx(config: Value) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            json!({}),
            config.as_object().cloned().unwrap_or_default(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        )
    }

    #[tokio::test]
    async fn base64_round_trips() {
        let handler = CryptoHandler::new();
        let encoded = handler
            .execute(&ctx(json!({"operation": "base64encode", "value": "hello world"})))
            .await
            .unwrap();
        let decoded = handler
            .execute(&ctx(json!({"operation": "base64decode", "value": encoded["value"]})))
            .await
            .unwrap();
        assert_eq!(decoded["value"], json!("hello world"));
    }

    #[tokio::test]
    async fn sha256_matches_known_digest() {
        let handler = CryptoHandler::new();
        let out = handler
            .execute(&ctx(json!({"operation": "hash", "algorithm": "sha256", "value": "abc"})))
            .await
            .unwrap();
        assert_eq!(
            out["value"],
            json!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[tokio::test]
    async fn unknown_algorithm_is_validation_error() {
        let handler = CryptoHandler::new();
        let err = handler
            .execute(&ctx(json!({"operation": "hash", "algorithm": "crc32", "value": "x"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Validation);
    }
}
