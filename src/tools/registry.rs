//! Tool registry — name to implementation, resolved once at construction.
//!
//! A conversation loop only ever dispatches against the registry it was
//! built with. There is no global table and no late mutation during a run.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::Tool;

/// Rejection of a second registration under an existing name.
#[derive(Debug, thiserror::Error)]
#[error("tool already registered: {0}")]
pub struct DuplicateTool(pub String);

/// Name-keyed table of tool implementations.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique within the registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), DuplicateTool> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Model-facing definitions (name, description, input schema), sorted by
    /// name so prompt construction is deterministic.
    pub fn definitions(&self) -> Vec<Value> {
        let mut entries: Vec<(&String, &Arc<dyn Tool>)> = self.tools.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(name, tool)| {
                json!({
                    "name": name,
                    "description": tool.description(),
                    "input_schema": tool.input_schema(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolError;
    use async_trait::async_trait;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "fixture"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _input: Value) -> Result<String, ToolError> {
            Ok(format!("ran {}", self.0))
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("alpha"))).unwrap();

        assert!(registry.contains("alpha"));
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("beta").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("alpha"))).unwrap();

        let err = registry.register(Arc::new(NamedTool("alpha")));
        assert_eq!(
            err.unwrap_err().to_string(),
            "tool already registered: alpha"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_and_definitions_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("zeta"))).unwrap();
        registry.register(Arc::new(NamedTool("alpha"))).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "zeta"]);

        let defs = registry.definitions();
        assert_eq!(defs[0]["name"], "alpha");
        assert_eq!(defs[1]["name"], "zeta");
        assert_eq!(defs[0]["description"], "fixture");
    }
}
