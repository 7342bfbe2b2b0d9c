//! Error types for docq operations

use thiserror::Error;

/// Main error type for docq operations
#[derive(Error, Debug)]
pub enum DocqError {
    /// Malformed or incomplete configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required file or directory is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vector index or chunk store failure
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Malformed persisted document (memory file, chunk record)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Failure inside a tool invocation
    #[error("Tool '{name}' failed: {message}")]
    ToolExecution { name: String, message: String },

    /// Language-model endpoint failure
    #[error("Model endpoint error: {0}")]
    Model(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DocqError {
    fn from(err: serde_json::Error) -> Self {
        DocqError::Parse(err.to_string())
    }
}

/// Result type alias for docq operations
pub type DocqResult<T> = Result<T, DocqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocqError::NotFound("document folder './docs'".to_string());
        assert_eq!(err.to_string(), "Not found: document folder './docs'");

        let err = DocqError::ToolExecution {
            name: "calculator".to_string(),
            message: "division by zero".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'calculator' failed: division by zero");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DocqError = json_err.into();
        assert!(matches!(err, DocqError::Parse(_)));
    }
}
