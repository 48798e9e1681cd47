//! Static node metadata (§4.3).

/// The category a node type belongs to, inferred from the prefix before
/// the first `.` in its registry key (e.g. `"data.filter"` is
/// [`Category::Data`]). Types with no `.` are [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Workflow entry points (`trigger.*`).
    Trigger,
    /// Control-flow constructs: `condition`, `switch`, `loop`, `merge`, …
    Logic,
    /// Pure data-transform nodes: `filter`, `sort`, `aggregate`, …
    Data,
    /// Third-party integrations (`slack.*`, `airtable.*`, …).
    Integration,
    /// Anything not matching a recognised prefix.
    Other,
}

impl Category {
    /// Infer a category from a node-type string.
    #[must_use]
    pub fn infer(node_type: &str) -> Self {
        match node_type.split('.').next().unwrap_or(node_type) {
            "trigger" => Self::Trigger,
            "condition" | "switch" | "loop" | "merge" | "wait" | "try_catch" | "retry"
            | "throw_error" | "continue_on_fail" | "timeout" | "fallback" | "set_variable"
            | "expression" | "math" | "sub_workflow" | "execute_workflow" => Self::Logic,
            "filter" | "sort" | "limit" | "unique" | "split_batches" | "aggregate"
            | "remove_duplicates" | "json_transform" | "xml" | "html_extract" | "datetime"
            | "crypto" => Self::Data,
            other if node_type.contains('.') && other != "trigger" => Self::Integration,
            _ => Self::Other,
        }
    }
}

/// Static description of a registered node type, independent of any
/// particular invocation.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    /// Registry key, e.g. `"condition"` or `"slack.postMessage"`.
    pub node_type: String,
    /// Human-readable display name.
    pub name: String,
    /// One-line description shown in the node picker.
    pub description: String,
    /// Category, inferred at construction time from `node_type`.
    pub category: Category,
}

impl NodeMetadata {
    /// Build metadata for `node_type`, inferring its category.
    pub fn new(
        node_type: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let node_type = node_type.into();
        let category = Category::infer(&node_type);
        Self {
            node_type,
            name: name.into(),
            description: description.into(),
            category,
        }
    }
}
