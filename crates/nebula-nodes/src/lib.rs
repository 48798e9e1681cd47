//! First-party node handler set: the trigger passthrough, control-flow,
//! and data-transform nodes every Nebula workflow can use without a
//! custom integration (§3 line 27, §4.5).

pub mod data;
pub mod logic;
pub mod trigger;

use std::sync::Arc;

use nebula_node::{NodeHandler, NodeRegistry};

pub use trigger::TriggerHandler;

/// Register every handler in this crate into `registry`. Called once
/// by the worker binary at startup, before
/// [`NodeRegistry::freeze`](nebula_node::NodeRegistry::freeze).
pub fn register_all(registry: &mut NodeRegistry) {
    let handlers: Vec<Arc<dyn NodeHandler>> = vec![
        Arc::new(TriggerHandler::new("manual")),
        Arc::new(TriggerHandler::new("trigger.manual")),
        Arc::new(logic::ConditionHandler::new()),
        Arc::new(logic::SwitchHandler::new()),
        Arc::new(logic::LoopHandler::new()),
        Arc::new(logic::MergeHandler::new()),
        Arc::new(logic::WaitHandler::new()),
        Arc::new(logic::TryCatchHandler::new()),
        Arc::new(logic::RetryHandler::new()),
        Arc::new(logic::ThrowErrorHandler::new()),
        Arc::new(logic::ContinueOnFailHandler::new()),
        Arc::new(logic::TimeoutHandler::new()),
        Arc::new(logic::FallbackHandler::new()),
        Arc::new(logic::SetVariableHandler::new()),
        Arc::new(logic::ExpressionHandler::new()),
        Arc::new(logic::MathHandler::new()),
        Arc::new(data::FilterHandler::new()),
        Arc::new(data::SortHandler::new()),
        Arc::new(data::LimitHandler::new()),
        Arc::new(data::UniqueHandler::new()),
        Arc::new(data::SplitBatchesHandler::new()),
        Arc::new(data::AggregateHandler::new()),
        Arc::new(data::RemoveDuplicatesHandler::new()),
        Arc::new(data::JsonTransformHandler::new()),
        Arc::new(data::XmlHandler::new()),
        Arc::new(data::HtmlExtractHandler::new()),
        Arc::new(data::DatetimeHandler::new()),
        Arc::new(data::CryptoHandler::new()),
    ];
    for handler in handlers {
        registry.register(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_trigger_control_flow_and_data_node() {
        let mut registry = NodeRegistry::new();
        register_all(&mut registry);
        assert_eq!(registry.len(), 28);
        assert!(registry.contains("manual"));
        assert!(registry.contains("trigger.manual"));
        assert!(registry.contains("condition"));
        assert!(registry.contains("crypto"));
        assert!(registry.contains("expression"));
        assert!(registry.contains("math"));
    }
}
