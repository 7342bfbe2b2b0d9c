//! Persistent-memory tools: read and merge-update the agent's memory file

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::agent::memory::{update_memory, AgentMemory, MemoryUpdate};

use super::Tool;

/// Reads the whole memory record
pub struct GetMemoryTool {
    path: PathBuf,
}

impl Tool for GetMemoryTool {
    fn name(&self) -> &str {
        "get_memory"
    }

    fn description(&self) -> &str {
        "Retrieves the agent's persistent memory about the user."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn invoke(&self, _args: Value) -> Result<String, String> {
        match AgentMemory::load(&self.path) {
            Ok(memory) => serde_json::to_string_pretty(&memory)
                .map_err(|e| format!("error serializing memory: {}", e)),
            Err(e) => Err(format!("error reading memory: {}", e)),
        }
    }
}

/// Merges new values into the memory record
pub struct UpdateMemoryTool {
    path: PathBuf,
}

impl Tool for UpdateMemoryTool {
    fn name(&self) -> &str {
        "update_memory"
    }

    fn description(&self) -> &str {
        "Updates the persistent memory by merging new values. Accepts a memory record, \
         a mapping of keys to values, or a JSON string of either; plain top-level keys \
         are stored as user information."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "memory": {
                    "description": "The memory update: an object (optionally with a user_info mapping) or a JSON-encoded string of one"
                }
            },
            "required": ["memory"]
        })
    }

    fn invoke(&self, args: Value) -> Result<String, String> {
        // The payload may arrive wrapped in the declared "memory" parameter
        // or as the bare object itself; accept both.
        let payload = match args.get("memory") {
            Some(inner) => inner.clone(),
            None => args,
        };
        let status = match MemoryUpdate::from_value(payload) {
            Ok(update) => update_memory(&self.path, update),
            Err(message) => format!("Error updating memory: {}", message),
        };
        // This tool never fails its caller; problems are reported in the text.
        Ok(status)
    }
}

/// The memory tool set over a shared memory file path
pub fn memory_tools(path: PathBuf) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetMemoryTool { path: path.clone() }),
        Arc::new(UpdateMemoryTool { path }),
    ]
}
