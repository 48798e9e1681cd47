//! Public entry point: parse + evaluate, with a small per-engine AST
//! cache so a node that re-resolves the same config on every
//! iteration (e.g. inside a `loop` body) does not re-lex/re-parse it
//! each time (§9 design note).

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

use crate::ast::Expr;
use crate::error::Result;
use crate::eval::eval;
use crate::parser::parse;

/// Evaluates the restricted expression grammar (§4.2), with parsed ASTs
/// cached by source string.
pub struct ExpressionEngine {
    cache: Mutex<HashMap<String, Expr>>,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    /// Create an engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate `src` against `scope`.
    pub fn evaluate(&self, src: &str, scope: &Value) -> Result<Value> {
        let expr = self.parsed(src)?;
        eval(&expr, scope)
    }

    fn parsed(&self, src: &str) -> Result<Expr> {
        if let Some(expr) = self.cache.lock().get(src) {
            return Ok(expr.clone());
        }
        let expr = parse(src)?;
        self.cache.lock().insert(src.to_string(), expr.clone());
        Ok(expr)
    }

    /// Number of distinct source strings currently cached.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn evaluate_caches_parsed_ast() {
        let engine = ExpressionEngine::new();
        assert_eq!(engine.cache_len(), 0);
        engine.evaluate("1 + 1", &json!({})).unwrap();
        assert_eq!(engine.cache_len(), 1);
        engine.evaluate("1 + 1", &json!({})).unwrap();
        assert_eq!(engine.cache_len(), 1);
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let engine = ExpressionEngine::new();
        let scope = json!({"x": 5});
        let a = engine.evaluate("$json.x * 2", &scope).unwrap();
        let b = engine.evaluate("$json.x * 2", &scope).unwrap();
        assert_eq!(a, b);
    }
}
