//! `filter` node (§4.5 data-transform set): keeps array items matching
//! a condition set, reusing the `condition`/`switch` evaluator.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};

use crate::logic::conditions::{self, CombineWith, Condition};

/// Handler for the `filter` node type.
pub struct FilterHandler {
    meta: NodeMetadata,
}

impl FilterHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("filter", "Filter", "Keeps array items matching a condition set"),
        }
    }
}

impl Default for FilterHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn items_source(ctx: &ExecutionContext) -> nebula_error::Result<Vec<Value>> {
    let raw = ctx
        .config
        .get("items")
        .cloned()
        .unwrap_or_else(|| ctx.input.get("items").cloned().unwrap_or(Value::Null));
    raw.as_array()
        .cloned()
        .ok_or_else(|| nebula_error::Error::validation("filter requires an `items` array"))
}

fn item_conditions(ctx: &ExecutionContext, item: &Value) -> nebula_error::Result<(Vec<Condition>, CombineWith)> {
    let raw_conditions = ctx
        .config
        .get("conditions")
        .cloned()
        .ok_or_else(|| nebula_error::Error::validation("filter requires `conditions`"))?;
    let mut conditions: Vec<Condition> =
        serde_json::from_value(raw_conditions).map_err(|e| nebula_error::Error::validation(e.to_string()))?;
    for cond in &mut conditions {
        if let Value::String(path) = &cond.left_value {
            if let Some(v) = conditions::lookup_path(item, path) {
                cond.left_value = v.clone();
            }
        }
    }
    let combine_with = ctx
        .config
        .get("combineWith")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| nebula_error::Error::validation(e.to_string()))?
        .unwrap_or_default();
    Ok((conditions, combine_with))
}

#[async_trait]
impl NodeHandler for FilterHandler {
    fn node_type(&self) -> &str {
        "filter"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let items = items_source(ctx)?;
        let mut kept = Vec::new();
        for item in items {
            let (conds, combine_with) = item_conditions(ctx, &item)?;
            let results = conds.iter().map(conditions::evaluate);
            if conditions::combine(results, combine_with) {
                kept.push(item);
            }
        }
        let mut output = NodeOutput::new();
        output.insert("count".into(), json!(kept.len()));
        output.insert("items".into(), json!(kept));
        Ok(output)
    }
}
