//! Error type shared by every stage of the asset pipeline

use std::path::PathBuf;

/// Errors raised while generating, packing, assembling or post-processing assets.
///
/// Some variants are fatal for the step that raises them (`InvalidParameter`,
/// `IndexOverflow`), others are collected as per-asset warnings by the
/// post-processor (`MalformedDataUri`, `GeometryUnavailable`, `MissingBuffer`,
/// `MissingNode`).
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Generator parameter outside its valid range
    #[error("invalid {name}: {value} (must be {requirement})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        requirement: &'static str,
    },

    /// Index does not fit the 2-byte index type
    #[error("index {index} at position {position} exceeds the u16 index range (max 65535)")]
    IndexOverflow { index: u32, position: usize },

    /// Index refers past the end of the vertex arrays
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    /// Attribute arrays of one mesh disagree on vertex count
    #[error("{attribute} has {actual} elements, expected {expected}")]
    AttributeCountMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Inline `data:` payload could not be decoded
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),

    /// Embedding requested but no fresh binary was supplied
    #[error("no binary available to embed (buffer already inline: {already_inline}), buffer left unchanged")]
    GeometryUnavailable { already_inline: bool },

    /// Document declares no buffer to embed geometry into
    #[error("document has no buffer to embed geometry into")]
    MissingBuffer,

    /// Light target node does not exist
    #[error("node {node} not found (document has {node_count} nodes)")]
    MissingNode { node: u32, node_count: usize },

    /// Filesystem failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document (de)serialization failure
    #[error("invalid glTF JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the pipeline may skip the affected item and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedDataUri(_)
                | Self::GeometryUnavailable { .. }
                | Self::MissingBuffer
                | Self::MissingNode { .. }
        )
    }
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, AssetError>;
