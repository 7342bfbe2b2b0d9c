//! Knowledge-base tools: initialize, query, readiness check

use std::sync::Arc;

use serde_json::{json, Value};

use crate::kb::KnowledgeBase;

use super::{string_arg, Tool};

/// Forces a (re)build of the knowledge-base retriever
pub struct InitializeKbTool {
    kb: Arc<KnowledgeBase>,
}

impl Tool for InitializeKbTool {
    fn name(&self) -> &str {
        "initialize_kb"
    }

    fn description(&self) -> &str {
        "Initializes (or rebuilds) the internal knowledge base so it can answer queries."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn invoke(&self, _args: Value) -> Result<String, String> {
        self.kb
            .ensure_ready(true)
            .map(|_| "The knowledge base has been initialized.".to_string())
            .map_err(|e| format!("failed to initialize the knowledge base: {}", e))
    }
}

/// Similarity search over the indexed documentation
pub struct QueryKbTool {
    kb: Arc<KnowledgeBase>,
}

impl Tool for QueryKbTool {
    fn name(&self) -> &str {
        "query_kb"
    }

    fn description(&self) -> &str {
        "Searches the internal knowledge base and returns the most relevant documentation."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search for in the knowledge base"
                }
            },
            "required": ["query"]
        })
    }

    fn invoke(&self, args: Value) -> Result<String, String> {
        let query = string_arg(&args, "query")
            .ok_or_else(|| "missing required argument 'query'".to_string())?;
        self.kb
            .query(&query)
            .map_err(|e| format!("knowledge-base query failed: {}", e))
    }
}

/// Reports whether the knowledge base is loaded, without loading it
pub struct IsKbLoadedTool {
    kb: Arc<KnowledgeBase>,
}

impl Tool for IsKbLoadedTool {
    fn name(&self) -> &str {
        "is_kb_loaded"
    }

    fn description(&self) -> &str {
        "Checks whether the internal knowledge base has been loaded."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn invoke(&self, _args: Value) -> Result<String, String> {
        Ok(self.kb.is_ready().to_string())
    }
}

/// The knowledge-base tool set over a shared service handle
pub fn kb_tools(kb: Arc<KnowledgeBase>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(InitializeKbTool { kb: kb.clone() }),
        Arc::new(QueryKbTool { kb: kb.clone() }),
        Arc::new(IsKbLoadedTool { kb }),
    ]
}
