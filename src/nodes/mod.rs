//! The built-in transform nodes.
//!
//! Each module holds one node: its parameter set, its algorithm, and
//! its `TransformNode` implementation. Boundary nodes (`input`,
//! `output`) talk to the codec layer; everything else is pure raster
//! work on in-memory buffers.

mod blend;
mod blur;
mod brightness;
mod channels;
mod convolution;
mod edge;
mod input;
mod noise;
mod output;
pub mod registry;
mod threshold;

pub use blend::{BlendMode, BlendNode};
pub use blur::BlurNode;
pub use brightness::BrightnessContrastNode;
pub use channels::ChannelSplitterNode;
pub use convolution::{ConvolutionNode, KernelPreset};
pub use edge::{EdgeDetectionNode, EdgeDetector};
pub use input::ImageInputNode;
pub use noise::{NoiseKind, NoiseNode, NoiseUsage};
pub use output::OutputNode;
pub use registry::NodeRegistry;
pub use threshold::{ThresholdMethod, ThresholdNode};

use crate::core::error::{NodeError, NodeResult};
use crate::core::value::Value;

/// Read a parameter value as an integer or report `InvalidParameter`.
pub(crate) fn expect_integer(node: &str, parameter: &str, value: &Value) -> NodeResult<i64> {
    value
        .as_integer()
        .ok_or_else(|| NodeError::InvalidParameter {
            node: node.to_string(),
            parameter: parameter.to_string(),
            reason: format!("expected an integer, got {}", value),
        })
}

/// Read a parameter value as a float or report `InvalidParameter`.
pub(crate) fn expect_float(node: &str, parameter: &str, value: &Value) -> NodeResult<f64> {
    value.as_float().ok_or_else(|| NodeError::InvalidParameter {
        node: node.to_string(),
        parameter: parameter.to_string(),
        reason: format!("expected a number, got {}", value),
    })
}

/// Read a parameter value as a boolean or report `InvalidParameter`.
pub(crate) fn expect_bool(node: &str, parameter: &str, value: &Value) -> NodeResult<bool> {
    value.as_bool().ok_or_else(|| NodeError::InvalidParameter {
        node: node.to_string(),
        parameter: parameter.to_string(),
        reason: format!("expected a boolean, got {}", value),
    })
}

/// Read a parameter value as text or report `InvalidParameter`.
pub(crate) fn expect_text<'v>(
    node: &str,
    parameter: &str,
    value: &'v Value,
) -> NodeResult<&'v str> {
    value.as_text().ok_or_else(|| NodeError::InvalidParameter {
        node: node.to_string(),
        parameter: parameter.to_string(),
        reason: format!("expected text, got {}", value),
    })
}

/// Report an unknown parameter name.
pub(crate) fn unknown_parameter(node: &str, parameter: &str) -> NodeError {
    NodeError::UnknownParameter {
        node: node.to_string(),
        parameter: parameter.to_string(),
    }
}
