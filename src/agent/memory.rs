//! Durable user-profile memory with merge-update semantics
//!
//! The memory is one JSON document at a fixed path, loaded fully before
//! every read or update and overwritten fully after every update. Single
//! process, single writer.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocqError, DocqResult};

/// The agent's persistent memory record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentMemory {
    /// Facts about the user, keyed by arbitrary strings
    #[serde(default)]
    pub user_info: Map<String, Value>,
}

impl AgentMemory {
    /// Read the memory file. An absent file yields an empty record;
    /// a malformed file is a parse error.
    pub fn load(path: &Path) -> DocqResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            DocqError::Parse(format!("malformed memory file '{}': {}", path.display(), e))
        })
    }

    /// Overwrite the memory file with the full record
    pub fn save(&self, path: &Path) -> DocqResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// An incoming memory update before normalization.
///
/// The model may send a structured record, a raw mapping, or a JSON-encoded
/// string of either; each variant normalizes to the same mapping shape.
#[derive(Debug, Clone)]
pub enum MemoryUpdate {
    Record(AgentMemory),
    JsonText(String),
    Mapping(Map<String, Value>),
}

impl MemoryUpdate {
    /// Classify an untyped JSON payload by its discriminant.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(text) => Ok(MemoryUpdate::JsonText(text)),
            Value::Object(map) => Ok(MemoryUpdate::Mapping(map)),
            other => Err(format!(
                "unsupported memory input type: {}; expected a mapping or a JSON-encoded string of one",
                json_type_name(&other)
            )),
        }
    }

    fn into_mapping(self) -> Result<Map<String, Value>, String> {
        match self {
            MemoryUpdate::Record(record) => match serde_json::to_value(record) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err("memory record could not be converted to a mapping".to_string()),
            },
            MemoryUpdate::JsonText(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err("memory update must be a JSON object".to_string()),
                Err(_) => Err("provided string is not valid JSON".to_string()),
            },
            MemoryUpdate::Mapping(map) => Ok(map),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Merge `update` into the memory at `path` and persist the result.
///
/// Merge policy: a `user_info` sub-mapping merges key-wise into the existing
/// `user_info` (shallow, last write wins); every other top-level key merges
/// into `user_info` directly, so `{"favorite_color":"blue"}` updates
/// `user_info.favorite_color`. This never returns an error: every failure
/// comes back as the status text so the model can react conversationally.
pub fn update_memory(path: &Path, update: MemoryUpdate) -> String {
    let mut memory = match AgentMemory::load(path) {
        Ok(memory) => memory,
        Err(e) => return format!("Error updating memory: {}", e),
    };

    let incoming = match update.into_mapping() {
        Ok(mapping) => mapping,
        Err(message) => return format!("Error updating memory: {}", message),
    };

    for (key, value) in incoming {
        if key == "user_info" {
            // Merge the sub-mapping; a non-mapping user_info is dropped.
            if let Value::Object(inner) = value {
                for (k, v) in inner {
                    memory.user_info.insert(k, v);
                }
            }
        } else {
            memory.user_info.insert(key, value);
        }
    }

    match memory.save(path) {
        Ok(()) => "Memory updated successfully.".to_string(),
        Err(e) => format!("Error updating memory: {}", e),
    }
}
