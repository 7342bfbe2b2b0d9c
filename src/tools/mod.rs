//! Tool registry: the callable capabilities declared to the language model

pub mod calculator;
pub mod datetime;
pub mod kb;
pub mod memory;

use std::sync::Arc;

use serde_json::{json, Value};

pub use calculator::CalculatorTool;
pub use datetime::{CurrentDateTool, CurrentTimeTool};
pub use kb::{kb_tools, InitializeKbTool, IsKbLoadedTool, QueryKbTool};
pub use memory::{memory_tools, GetMemoryTool, UpdateMemoryTool};

/// A callable capability the model may request by name.
///
/// Failures come back as plain strings so the control loop can hand them to
/// the model verbatim instead of crashing the turn.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the argument payload
    fn parameters(&self) -> Value;
    fn invoke(&self, args: Value) -> Result<String, String>;
}

/// Name-indexed collection of tools plus the catalog surface for the model
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name).cloned()
    }

    /// Catalog entries in the shape the model endpoint consumes
    pub fn catalog(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters(),
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

/// Pull a string argument out of a tool payload
pub(crate) fn string_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|value| value.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes the provided text back."
        }
        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }
        fn invoke(&self, args: Value) -> Result<String, String> {
            string_arg(&args, "text").ok_or_else(|| "missing required argument 'text'".to_string())
        }
    }

    #[test]
    fn test_registry_lookup_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert!(registry.get("echo").is_some());
        assert!(registry.get("nope").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_catalog_shape() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0]["name"], "echo");
        assert!(catalog[0]["description"].as_str().unwrap().len() > 1);
        assert_eq!(catalog[0]["parameters"]["type"], "object");
    }

    #[test]
    fn test_invoke_through_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let tool = registry.get("echo").unwrap();
        assert_eq!(tool.invoke(json!({"text": "hi"})), Ok("hi".to_string()));
        assert!(tool.invoke(json!({})).is_err());
    }
}
