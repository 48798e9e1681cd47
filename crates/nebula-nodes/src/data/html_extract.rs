//! `html_extract` node (§4.5 data-transform set): runs a CSS selector
//! against an HTML document and returns matched text/attributes.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use scraper::{Html, Selector};
use serde_json::{json, Value};

/// Handler for the `html_extract` node type.
pub struct HtmlExtractHandler {
    meta: NodeMetadata,
}

impl HtmlExtractHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("html_extract", "HTML Extract", "Runs a CSS selector against an HTML document"),
        }
    }
}

impl Default for HtmlExtractHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for HtmlExtractHandler {
    fn node_type(&self) -> &str {
        "html_extract"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let html = ctx
            .config
            .get("html")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("html_extract requires a string `html`"))?;
        let selector_str = ctx
            .config
            .get("selector")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("html_extract requires `selector`"))?;
        let attribute = ctx.config.get("attribute").and_then(Value::as_str);

        let selector = Selector::parse(selector_str)
            .map_err(|e| nebula_error::Error::validation(format!("invalid css selector: {e:?}")))?;
        let document = Html::parse_document(html);

        let matches: Vec<Value> = document
            .select(&selector)
            .map(|el| match attribute {
                Some(attr) => el.value().attr(attr).map_or(Value::Null, |v| json!(v)),
                None => json!(el.text().collect::<Vec<_>>().join("")),
            })
            .collect();

        let mut output = NodeOutput::new();
        output.insert("count".into(), json!(matches.len()));
        output.insert("matches".into(), json!(matches));
        Ok(output)
    }
}
