//! Configuration loading for the agent
//!
//! The configuration lives in a single JSON document. Every string field
//! must be non-empty; a missing required field or wrong type is fatal at
//! startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocqError, DocqResult};

fn default_docs_glob() -> String {
    "**/*.md".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_tool_rounds() -> usize {
    25
}

fn default_inference_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> usize {
    2
}

/// Configuration for the docq agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat model name sent to the inference endpoint
    pub model: String,
    /// Embedding model name (must be a model fastembed knows)
    pub embedding_name: String,
    /// Root directory of the documentation to index
    pub docs_path: PathBuf,
    /// Glob pattern selecting documentation files under `docs_path`
    #[serde(default = "default_docs_glob")]
    pub docs_glob: String,
    /// Directory where the chunk store and vector index persist
    pub db_path: PathBuf,
    /// Collection name within `db_path`
    pub collection_name: String,
    /// Path of the JSON file holding the agent's persistent memory
    pub memory_path: PathBuf,
    /// Number of chunks returned per knowledge-base query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Cap on tool-call rounds within a single turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// Chat-completions endpoint URL
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    /// Timeout for one model request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retry budget for transient model-endpoint failures
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn load_from_file(path: &Path) -> DocqResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DocqError::Configuration(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| {
            DocqError::Configuration(format!("malformed config file '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DocqResult<()> {
        let strings = [
            ("model", &self.model),
            ("embedding_name", &self.embedding_name),
            ("docs_glob", &self.docs_glob),
            ("collection_name", &self.collection_name),
            ("inference_url", &self.inference_url),
        ];
        for (field, value) in strings {
            if value.trim().is_empty() {
                return Err(DocqError::Configuration(format!(
                    "field '{}' must be a non-empty string",
                    field
                )));
            }
        }

        let paths = [
            ("docs_path", &self.docs_path),
            ("db_path", &self.db_path),
            ("memory_path", &self.memory_path),
        ];
        for (field, value) in paths {
            if value.as_os_str().is_empty() {
                return Err(DocqError::Configuration(format!(
                    "field '{}' must be a non-empty path",
                    field
                )));
            }
        }

        if self.top_k == 0 {
            return Err(DocqError::Configuration(
                "field 'top_k' must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(DocqError::Configuration(
                "field 'chunk_size' must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
