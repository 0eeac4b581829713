//! Error types for chitra.
//!
//! Uses thiserror for structured errors with context, split by concern
//! the way the rest of the crate is: buffers, nodes, graph, codec. All
//! node- and graph-level conditions are recoverable by design: a node
//! whose `process()` fails keeps existing with an empty output, and the
//! graph keeps running. Nothing in the core terminates the process.

use std::path::PathBuf;
use thiserror::Error;

/// Errors constructing or reshaping an [`crate::core::ImageBuffer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Channel count other than 1, 3, or 4.
    #[error("invalid channel count {0}: expected 1, 3, or 4")]
    InvalidChannelCount(u8),

    /// Raw sample vector does not match the stated dimensions.
    #[error(
        "sample data length {got} does not match {expected} \
         ({width}x{height}x{channels})"
    )]
    LengthMismatch {
        /// Expected sample count (`width * height * channels`).
        expected: usize,
        /// Actual length of the supplied vector.
        got: usize,
        /// Stated width.
        width: u32,
        /// Stated height.
        height: u32,
        /// Stated channel count.
        channels: u8,
    },
}

/// Recoverable per-node conditions.
///
/// `MissingInput` and `InvalidParameter` are the two conditions every
/// node can report; both leave the node alive with its prior state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// `process()` was invoked with an empty input buffer. The node's
    /// output is left empty.
    #[error("no input image for node '{node}'")]
    MissingInput {
        /// Display name of the node that was missing its input.
        node: String,
    },

    /// A parameter setter received an out-of-range or mismatched value.
    /// The prior parameter value is retained and no reprocess happens.
    #[error("invalid parameter '{parameter}' on node '{node}': {reason}")]
    InvalidParameter {
        /// Display name of the node.
        node: String,
        /// Parameter that was rejected.
        parameter: String,
        /// Why it was rejected.
        reason: String,
    },

    /// `set_parameter` was called with a name the node does not have.
    #[error("node '{node}' has no parameter named '{parameter}'")]
    UnknownParameter {
        /// Display name of the node.
        node: String,
        /// The unrecognized parameter name.
        parameter: String,
    },
}

/// Errors related to graph structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// `connect()` referenced a node id that is not a graph member.
    /// The connection is dropped; the graph is unchanged.
    #[error("invalid connection: node '{0}' is not a member of the graph")]
    InvalidConnection(String),
}

/// Errors at the image codec boundary.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The file could not be opened.
    #[error("image not found: {0}")]
    NotFound(PathBuf),

    /// The file opened but could not be decoded.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        /// Path that failed to decode.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// Encoding or writing the output failed.
    #[error("failed to save image {path}: {source}")]
    Encode {
        /// Path that failed to encode.
        path: PathBuf,
        /// Underlying encoder error.
        source: image::ImageError,
    },

    /// Requested output format is not one of jpg, jpeg, png.
    #[error("unsupported format '{0}': expected jpg, jpeg, or png")]
    UnsupportedFormat(String),

    /// Attempted to save an empty buffer.
    #[error("cannot save an empty image buffer")]
    EmptyBuffer,

    /// Filesystem-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for chitra.
///
/// Enables `?` conversion from every concern-specific error.
#[derive(Error, Debug)]
pub enum ChitraError {
    /// Buffer construction error.
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Node-level condition.
    #[error("node error: {0}")]
    Node(#[from] NodeError),

    /// Graph structure error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Codec boundary error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result alias for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_display() {
        let err = NodeError::MissingInput {
            node: "blur".to_string(),
        };
        assert_eq!(err.to_string(), "no input image for node 'blur'");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = NodeError::InvalidParameter {
            node: "conv".to_string(),
            parameter: "kernel".to_string(),
            reason: "expected 9 values, got 4".to_string(),
        };
        assert!(err.to_string().contains("conv"));
        assert!(err.to_string().contains("expected 9 values, got 4"));
    }

    #[test]
    fn test_invalid_connection_display() {
        let err = GraphError::InvalidConnection("ghost".to_string());
        assert_eq!(
            err.to_string(),
            "invalid connection: node 'ghost' is not a member of the graph"
        );
    }

    #[test]
    fn test_top_level_conversions() {
        let err: ChitraError = NodeError::MissingInput {
            node: "x".to_string(),
        }
        .into();
        assert!(matches!(err, ChitraError::Node(_)));

        let err: ChitraError = BufferError::InvalidChannelCount(2).into();
        assert!(matches!(err, ChitraError::Buffer(_)));
    }
}
