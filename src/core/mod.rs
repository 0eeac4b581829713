//! Core types and traits: buffers, parameter values, the node contract,
//! and the error taxonomy.

pub mod buffer;
pub mod error;
pub mod node;
pub mod value;

pub use buffer::{ImageBuffer, SampleType};
pub use error::{
    BufferError, ChitraError, CodecError, CodecResult, GraphError, GraphResult, NodeError,
    NodeResult,
};
pub use node::{NodeInfo, NodeKind, TransformNode};
pub use value::Value;
