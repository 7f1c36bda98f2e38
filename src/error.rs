//! Error types for the Arbor editing engine
//!
//! Structured errors are defined with thiserror. Most of them describe
//! internal invariant violations: the executor logs them and rolls the
//! session back instead of surfacing them to the user.

use crate::editor::ast::NodeId;
use crate::editor::scope::ScopeId;
use thiserror::Error;

/// Main error type for Arbor operations
#[derive(Error, Debug)]
pub enum EditorError {
    /// Node id does not exist or was deleted
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node has no parent where one was required
    #[error("Node is detached from the tree: {0}")]
    Detached(NodeId),

    /// A hole was expected but something else was found
    #[error("Expected a hole at node {0}")]
    MissingHole(NodeId),

    /// Node has a different shape than the operation requires
    #[error("Unexpected construct at node {node}: {found}")]
    UnexpectedConstruct { node: NodeId, found: String },

    /// Scope id does not exist
    #[error("Scope not found: {0}")]
    ScopeNotFound(ScopeId),

    /// Template id is not registered in the catalog
    #[error("Unknown construct template: {0}")]
    UnknownTemplate(String),

    /// Template failed validation at load time
    #[error("Malformed construct template {id}: {reason}")]
    MalformedTemplate { id: String, reason: String },

    /// Key name the router cannot parse
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    /// Buffer edit does not fit the buffer
    #[error("Buffer edit out of range: {0}")]
    BufferRange(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Arbor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Convert anyhow::Error to EditorError
impl From<anyhow::Error> for EditorError {
    fn from(err: anyhow::Error) -> Self {
        EditorError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EditorError::NodeNotFound(NodeId(7));
        assert_eq!(err.to_string(), "Node not found: #7");

        let err = EditorError::MalformedTemplate {
            id: "print".to_string(),
            reason: "empty trigger".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed construct template print: empty trigger");
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json");
        assert!(json_err.is_err());

        let editor_err: EditorError = json_err.unwrap_err().into();
        assert!(matches!(editor_err, EditorError::Serialization(_)));
    }
}
