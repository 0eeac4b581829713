//! The node contract shared by every transform stage.
//!
//! Each stage of the pipeline is a [`TransformNode`]: it owns its input
//! and output buffers and a variant-specific parameter set, and exposes
//! the uniform lifecycle the graph drives: `set_input`, `process`,
//! `output`. Parameter mutation is *eager*: every successful setter call
//! ends by re-running the transform, so a node's output is always
//! consistent with its current parameters and last-seen input.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// Closed discriminant naming each transform a node can perform.
///
/// The variant set is fixed and enumerable; adding a transform means
/// adding a variant here, a module under `nodes/`, and a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Image source: loads a file into its output.
    ImageInput,
    /// Image sink: encodes its input to a file.
    Output,
    /// Gaussian or directional blur.
    Blur,
    /// Linear brightness/contrast adjustment.
    BrightnessContrast,
    /// Color channel splitter/merger.
    ChannelSplitter,
    /// Binary, adaptive, or Otsu thresholding.
    Threshold,
    /// Sobel or Canny edge detection.
    EdgeDetection,
    /// Two-input blend compositing.
    Blend,
    /// Procedural noise synthesis.
    Noise,
    /// Preset or custom kernel convolution.
    Convolution,
}

impl NodeKind {
    /// Stable string id used by the registry and for node id prefixes.
    pub fn id(&self) -> &'static str {
        match self {
            NodeKind::ImageInput => "image_input",
            NodeKind::Output => "output",
            NodeKind::Blur => "blur",
            NodeKind::BrightnessContrast => "brightness_contrast",
            NodeKind::ChannelSplitter => "channel_splitter",
            NodeKind::Threshold => "threshold",
            NodeKind::EdgeDetection => "edge_detection",
            NodeKind::Blend => "blend",
            NodeKind::Noise => "noise",
            NodeKind::Convolution => "convolution",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::ImageInput => "Image Input",
            NodeKind::Output => "Output",
            NodeKind::Blur => "Blur",
            NodeKind::BrightnessContrast => "Brightness/Contrast",
            NodeKind::ChannelSplitter => "Channel Splitter",
            NodeKind::Threshold => "Threshold",
            NodeKind::EdgeDetection => "Edge Detection",
            NodeKind::Blend => "Blend",
            NodeKind::Noise => "Noise",
            NodeKind::Convolution => "Convolution",
        }
    }

    /// All kinds in display order.
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::ImageInput,
            NodeKind::Output,
            NodeKind::Blur,
            NodeKind::BrightnessContrast,
            NodeKind::ChannelSplitter,
            NodeKind::Threshold,
            NodeKind::EdgeDetection,
            NodeKind::Blend,
            NodeKind::Noise,
            NodeKind::Convolution,
        ]
    }
}

/// Metadata describing a node kind for listings and the registry.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    /// Stable kind id (e.g. `"blur"`).
    pub id: &'static str,
    /// Display name (e.g. `"Blur"`).
    pub name: &'static str,
    /// One-line description of what the transform does.
    pub description: &'static str,
}

/// The uniform contract every transform stage implements.
///
/// # Lifecycle
///
/// A node is created once at graph-assembly time with default
/// parameters, mutated through setters (each of which eagerly re-runs
/// the transform), and destroyed with the graph. `process()` is a pure
/// function of the current input and parameters.
///
/// # Error policy
///
/// `process()` must tolerate an empty input: it leaves the output empty
/// and returns [`NodeError::MissingInput`]; it never panics. Parameter
/// setters reject bad values with [`NodeError::InvalidParameter`] and
/// retain the prior state.
pub trait TransformNode {
    /// Stable identity string (e.g. `"blur_main"`). Unique per node by
    /// caller convention; the graph stores it as the node's handle.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Which transform this node performs.
    fn kind(&self) -> NodeKind;

    /// Replace the current input buffer. No transform is applied;
    /// callers re-run `process()` (or the graph does on its next pass).
    fn set_input(&mut self, input: ImageBuffer);

    /// Run the transform: current input + current parameters → output.
    ///
    /// An empty input leaves the output empty and reports
    /// [`NodeError::MissingInput`].
    fn process(&mut self) -> NodeResult<()>;

    /// The last computed output. Empty if the node never processed
    /// successfully.
    fn output(&self) -> &ImageBuffer;

    /// Uniform parameter surface for the presentation layer.
    ///
    /// A successful set re-runs `process()` before returning (eager
    /// re-evaluation). A rejected set is a no-op. The `MissingInput`
    /// condition arising from the re-run is *not* an error here: the
    /// parameter was stored; the transform simply has nothing to chew on
    /// yet.
    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()>;
}

/// Shared helper: run `process()` after a parameter change, swallowing
/// the missing-input condition (the parameter took effect; output stays
/// empty until an input arrives) but propagating everything else.
pub(crate) fn reprocess_after_set<N: TransformNode + ?Sized>(node: &mut N) -> NodeResult<()> {
    match node.process() {
        Ok(()) | Err(NodeError::MissingInput { .. }) => Ok(()),
        Err(other) => Err(other),
    }
}
