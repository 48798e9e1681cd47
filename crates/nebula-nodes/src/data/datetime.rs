//! `datetime` node (§4.5 data-transform set): parses, formats, shifts,
//! and diffs timestamps. All timestamps are UTC.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};

/// Handler for the `datetime` node type.
pub struct DatetimeHandler {
    meta: NodeMetadata,
}

impl DatetimeHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("datetime", "Date/Time", "Parses, formats, shifts, and diffs timestamps"),
        }
    }
}

impl Default for DatetimeHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_input(ctx: &ExecutionContext) -> nebula_error::Result<DateTime<Utc>> {
    let raw = ctx
        .config
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| nebula_error::Error::validation("datetime requires a string `value`"))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| nebula_error::Error::validation(format!("invalid ISO 8601 timestamp: {e}")))
}

fn duration_from(amount: i64, unit: &str) -> nebula_error::Result<Duration> {
    match unit {
        "milliseconds" => Ok(Duration::milliseconds(amount)),
        "seconds" => Ok(Duration::seconds(amount)),
        "minutes" => Ok(Duration::minutes(amount)),
        "hours" => Ok(Duration::hours(amount)),
        "days" => Ok(Duration::days(amount)),
        other => Err(nebula_error::Error::validation(format!("unknown datetime unit: {other}"))),
    }
}

#[async_trait]
impl NodeHandler for DatetimeHandler {
    fn node_type(&self) -> &str {
        "datetime"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let operation = ctx
            .config
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("datetime requires `operation`"))?;

        let mut output = NodeOutput::new();
        match operation {
            "now" => {
                output.insert("value".into(), json!(Utc::now().to_rfc3339()));
            }
            "format" => {
                let dt = parse_input(ctx)?;
                let format = ctx.config.get("format").and_then(Value::as_str).unwrap_or("%Y-%m-%d");
                output.insert("value".into(), json!(dt.format(format).to_string()));
            }
            "add" => {
                let dt = parse_input(ctx)?;
                let amount = ctx.config.get("amount").and_then(Value::as_i64).unwrap_or(0);
                let unit = ctx.config.get("unit").and_then(Value::as_str).unwrap_or("seconds");
                let shifted = dt + duration_from(amount, unit)?;
                output.insert("value".into(), json!(shifted.to_rfc3339()));
            }
            "diff" => {
                let dt = parse_input(ctx)?;
                let other_raw = ctx
                    .config
                    .get("other")
                    .and_then(Value::as_str)
                    .ok_or_else(|| nebula_error::Error::validation("diff requires `other`"))?;
                let other = DateTime::parse_from_rfc3339(other_raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| nebula_error::Error::validation(format!("invalid ISO 8601 timestamp: {e}")))?;
                let unit = ctx.config.get("unit").and_then(Value::as_str).unwrap_or("seconds");
                let delta = dt - other;
                let value = match unit {
                    "milliseconds" => delta.num_milliseconds(),
                    "seconds" => delta.num_seconds(),
                    "minutes" => delta.num_minutes(),
                    "hours" => delta.num_hours(),
                    "days" => delta.num_days(),
                    other => return Err(nebula_error::Error::validation(format!("unknown datetime unit: {other}"))),
                };
                output.insert("value".into(), json!(value));
            }
            other => return Err(nebula_error::Error::validation(format!("unknown datetime operation: {other}"))),
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
    async fn formats_a_parsed_timestamp() {
        let handler = DatetimeHandler::new();
        let out = handler
            .execute(&ctx(json!({"operation": "format", "value": "2026-01-15T10:00:00Z", "format": "%Y-%m-%d"})))
            .await
            .unwrap();
        assert_eq!(out["value"], json!("2026-01-15"));
    }

    #[tokio::test]
    async fn adds_a_duration() {
        let handler = DatetimeHandler::new();
        let out = handler
            .execute(&ctx(json!({"operation": "add", "value": "2026-01-15T10:00:00Z", "amount": 1, "unit": "days"})))
            .await
            .unwrap();
        assert_eq!(out["value"], json!("2026-01-16T10:00:00+00:00"));
    }

    #[tokio::test]
    async fn diffs_two_timestamps_in_hours() {
        let handler = DatetimeHandler::new();
        let out = handler
            .execute(&ctx(json!({
                "operation": "diff",
                "value": "2026-01-15T12:00:00Z",
                "other": "2026-01-15T10:00:00Z",
                "unit": "hours"
            })))
            .await
            .unwrap();
        assert_eq!(out["value"], json!(2));
    }
}
