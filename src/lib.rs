//! # Chitra - Node-based Image Transform Pipeline
//!
//! Chitra wires discrete image transform stages ("nodes") into a graph
//! and executes them on demand. Each node consumes a raster buffer,
//! applies one transform (blur, brightness/contrast, channel split,
//! thresholding, edge detection, blend, procedural noise, convolution),
//! and exposes the result for the next stage.
//!
//! ## Execution model
//!
//! A [`graph::NodeGraph`] pass processes every node in insertion order,
//! then copies each connection's source output into its destination's
//! input, then invokes the presentation hook. Propagation happening
//! *after* processing means an edge's effect is visible from the
//! following pass, not the current one. Parameter setters re-run their
//! node's transform immediately ("eager re-evaluation"), so outputs
//! always reflect the current parameters.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chitra::prelude::*;
//!
//! let mut graph = NodeGraph::new();
//!
//! let mut source = ImageInputNode::new("photo", "input.png");
//! source.process()?;
//! graph.add(Box::new(source));
//!
//! let mut blur = BlurNode::new("soften");
//! blur.set_radius(4)?;
//! graph.add(Box::new(blur));
//!
//! graph.connect("image_input_photo", "blur_soften")?;
//!
//! // First pass processes, then propagates; the second pass sees the
//! // propagated input.
//! graph.run();
//! graph.run();
//!
//! let result = graph.find("blur_soften").unwrap().output();
//! save_image("output.png", result, SaveFormat::Png, 90)?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: buffers, parameter values, the node contract, errors
//! - [`graph`]: graph structure and execution passes
//! - [`nodes`]: the built-in transform nodes and the registry
//! - [`ops`]: shared kernels, convolution, and resampling
//! - [`io`]: the image codec boundary
//!
//! ## Error policy
//!
//! Core conditions are recoverable: a node processed without input
//! keeps an empty output, an invalid connection is dropped and
//! reported, a rejected parameter leaves prior state intact. Nothing in
//! the core terminates the process.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod graph;
pub mod io;
pub mod nodes;
pub mod ops;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chitra::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::buffer::{ImageBuffer, SampleType};
    pub use crate::core::node::{NodeInfo, NodeKind, TransformNode};
    pub use crate::core::value::Value;

    // Errors
    pub use crate::core::error::{
        BufferError, ChitraError, CodecError, CodecResult, GraphError, GraphResult, NodeError,
        NodeResult,
    };

    // Graph
    pub use crate::graph::structure::{Connection, NodeGraph, RenderHook};

    // Nodes
    pub use crate::nodes::{
        BlendMode, BlendNode, BlurNode, BrightnessContrastNode, ChannelSplitterNode,
        ConvolutionNode, EdgeDetectionNode, EdgeDetector, ImageInputNode, KernelPreset, NoiseKind,
        NoiseNode, NoiseUsage, NodeRegistry, OutputNode, ThresholdMethod, ThresholdNode,
    };

    // Shared ops
    pub use crate::ops::{convolve, resize_bilinear, Kernel};

    // Codec boundary
    pub use crate::io::{load_image, save_image, SaveFormat};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "chitra");
    }

    #[test]
    fn test_basic_graph_assembly() {
        let mut graph = NodeGraph::new();
        graph.add(Box::new(BlurNode::new("a")));
        graph.add(Box::new(ThresholdNode::new("b")));
        assert!(graph.connect("blur_a", "threshold_b").is_ok());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_registry_builtins_available() {
        let registry = NodeRegistry::with_builtins();
        assert!(registry.contains("image_input"));
        assert!(registry.contains("blur"));
        assert!(registry.contains("noise"));
        assert!(registry.contains("convolution"));
    }
}
