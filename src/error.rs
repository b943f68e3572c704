//! Error types for schematic decoding and variant resolution.

use thiserror::Error;

/// Result type alias using SchematicError.
pub type Result<T> = std::result::Result<T, SchematicError>;

/// Main error type for decoding schematics and resolving block variants.
#[derive(Error, Debug)]
pub enum SchematicError {
    /// Input too short or otherwise unusable before any parsing starts.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A primitive or array read ran past the end of the buffer.
    #[error("Unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Structurally invalid tag data (bad tag id, bad root, negative length...).
    #[error("Malformed tag: {0}")]
    MalformedTag(String),

    /// The tag tree does not match the schematic layout.
    #[error("Schema mismatch at {path}: {reason}")]
    SchemaMismatch { path: String, reason: String },

    /// No block definition exists for the block name.
    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    /// A block definition is unusable (no variants, empty apply list...).
    #[error("Invalid block definition for {block}: {reason}")]
    InvalidDefinition { block: String, reason: String },

    /// I/O error while inflating compressed input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON block definitions.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchematicError {
    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchematicError::SchemaMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn definition(block: impl Into<String>, reason: impl Into<String>) -> Self {
        SchematicError::InvalidDefinition {
            block: block.into(),
            reason: reason.into(),
        }
    }
}
