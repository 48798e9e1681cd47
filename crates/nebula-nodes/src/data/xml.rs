//! `xml` node (§8 round-trip invariant: `toXml ∘ parse` preserves
//! element names, attribute values, and leaf text): converts between
//! an XML document and a JSON element tree `{name, attributes,
//! children, text}`.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{json, Value};
use std::io::Cursor;

/// Handler for the `xml` node type.
pub struct XmlHandler {
    meta: NodeMetadata,
}

impl XmlHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("xml", "XML", "Converts between an XML document and a JSON element tree"),
        }
    }
}

impl Default for XmlHandler {
    fn default() -> Self {
        Self::new()
    }
}

struct Element {
    name: String,
    attributes: serde_json::Map<String, Value>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "attributes": self.attributes,
            "children": self.children.iter().map(Element::to_json).collect::<Vec<_>>(),
            "text": self.text,
        })
    }

    fn from_json(value: &Value) -> nebula_error::Result<Self> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("xml element requires `name`"))?
            .to_string();
        let attributes = value
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let text = value.get("text").and_then(Value::as_str).unwrap_or_default().to_string();
        let children = value
            .get("children")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Self::from_json).collect::<nebula_error::Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            name,
            attributes,
            children,
            text,
        })
    }
}

fn parse(xml: &str) -> nebula_error::Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| nebula_error::Error::validation(format!("invalid xml: {e}")))?
        {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let el = element_from_start(&start)?;
                push_child(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                let finished = stack.pop().ok_or_else(|| nebula_error::Error::validation("unbalanced xml"))?;
                push_child(&mut stack, &mut root, finished);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&decode_text(&text)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| nebula_error::Error::validation("xml document has no root element"))
}

fn element_from_start(start: &BytesStart) -> nebula_error::Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = serde_json::Map::new();
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| nebula_error::Error::validation(format!("invalid xml attribute: {e}")))?
            .into_owned();
        attributes.insert(key, json!(value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn decode_text(text: &BytesText) -> nebula_error::Result<String> {
    text.unescape()
        .map(|s| s.into_owned())
        .map_err(|e| nebula_error::Error::validation(format!("invalid xml text: {e}")))
}

fn push_child(stack: &mut Vec<Element>, root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => *root = Some(el),
    }
}

fn to_xml(el: &Element) -> nebula_error::Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_element(&mut writer, el)?;
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| nebula_error::Error::fatal(format!("non-utf8 xml output: {e}")))
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, el: &Element) -> nebula_error::Result<()> {
    let mut start = BytesStart::new(el.name.clone());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str().unwrap_or_default()));
    }

    let io_err = |e: quick_xml::Error| nebula_error::Error::fatal(format!("xml write failed: {e}"));

    if el.children.is_empty() && el.text.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(io_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(io_err)?;
    if !el.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&el.text)))
            .map_err(io_err)?;
    }
    for child in &el.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.clone())))
        .map_err(io_err)?;
    Ok(())
}

#[async_trait]
impl NodeHandler for XmlHandler {
    fn node_type(&self) -> &str {
        "xml"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let mode = ctx
            .config
            .get("mode")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("xml requires `mode`: parse | toXml"))?;

        let mut output = NodeOutput::new();
        match mode {
            "parse" => {
                let raw = ctx
                    .config
                    .get("value")
                    .and_then(Value::as_str)
                    .ok_or_else(|| nebula_error::Error::validation("parse mode requires a string `value`"))?;
                output.insert("value".into(), parse(raw)?.to_json());
            }
            "toXml" => {
                let value = ctx
                    .config
                    .get("value")
                    .ok_or_else(|| nebula_error::Error::validation("toXml mode requires `value`"))?;
                let element = Element::from_json(value)?;
                output.insert("value".into(), json!(to_xml(&element)?));
            }
            other => return Err(nebula_error::Error::validation(format!("unknown xml mode: {other}"))),
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
    async fn parses_nested_elements_with_attributes() {
        let handler = XmlHandler::new();
        let xml = r#"<root id="1"><child>hello</child></root>"#;
        let out = handler.execute(&ctx(json!({"mode": "parse", "value": xml}))).await.unwrap();
        let value = &out["value"];
        assert_eq!(value["name"], json!("root"));
        assert_eq!(value["attributes"]["id"], json!("1"));
        assert_eq!(value["children"][0]["name"], json!("child"));
        assert_eq!(value["children"][0]["text"], json!("hello"));
    }

    #[tokio::test]
    async fn to_xml_then_parse_preserves_structure() {
        let handler = XmlHandler::new();
        let xml = r#"<root id="1"><child>hello</child></root>"#;
        let parsed = handler.execute(&ctx(json!({"mode": "parse", "value": xml}))).await.unwrap();

        let regenerated = handler
            .execute(&ctx(json!({"mode": "toXml", "value": parsed["value"]})))
            .await
            .unwrap();
        let reparsed = handler
            .execute(&ctx(json!({"mode": "parse", "value": regenerated["value"]})))
            .await
            .unwrap();

        assert_eq!(reparsed["value"]["name"], json!("root"));
        assert_eq!(reparsed["value"]["attributes"]["id"], json!("1"));
        assert_eq!(reparsed["value"]["children"][0]["text"], json!("hello"));
    }
}
