//! Convolution filter node: fixed presets or a user-supplied kernel.
//!
//! Supports 3x3 and 5x5 kernels. The named presets (sharpen, emboss,
//! edge-enhance) are fixed 3x3 kernels; a custom kernel must supply
//! exactly `size * size` weights or the setter is rejected and the
//! previous kernel stays active.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_integer, expect_text, unknown_parameter};
use crate::ops::{convolve, Kernel};
use serde::{Deserialize, Serialize};

/// Named kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelPreset {
    /// Center-weighted sharpening.
    Sharpen,
    /// Diagonal relief effect.
    Emboss,
    /// Edge enhancement.
    EdgeEnhance,
    /// User-supplied weights.
    Custom,
}

impl KernelPreset {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sharpen" => Some(KernelPreset::Sharpen),
            "emboss" => Some(KernelPreset::Emboss),
            "edge_enhance" | "edge-enhance" => Some(KernelPreset::EdgeEnhance),
            _ => None,
        }
    }
}

fn identity_kernel(size: usize) -> Kernel {
    let mut data = vec![0.0; size * size];
    data[size * size / 2] = 1.0;
    // Size is always 3 or 5 here.
    Kernel::from_data(size, data).unwrap_or_else(|| Kernel::sharpen())
}

/// Convolves its input with the active kernel.
#[derive(Debug, Clone)]
pub struct ConvolutionNode {
    id: String,
    name: String,
    input: ImageBuffer,
    output: ImageBuffer,
    preset: KernelPreset,
    kernel_size: usize,
    kernel: Kernel,
}

impl ConvolutionNode {
    /// Create a convolution node with the sharpen preset.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("convolution_{}", name),
            name,
            input: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            preset: KernelPreset::Sharpen,
            kernel_size: 3,
            kernel: Kernel::sharpen(),
        }
    }

    /// Active preset (Custom when a user kernel is loaded).
    pub fn preset(&self) -> KernelPreset {
        self.preset
    }

    /// Active kernel size (3 or 5).
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// The currently active kernel weights.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Set the kernel size (3 or 5) and reprocess.
    ///
    /// The fixed presets are 3x3, so growing the size switches to a
    /// custom identity kernel ready for [`Self::set_custom_kernel`].
    pub fn set_kernel_size(&mut self, size: usize) -> NodeResult<()> {
        if size != 3 && size != 5 {
            return Err(NodeError::InvalidParameter {
                node: self.name.clone(),
                parameter: "kernel_size".to_string(),
                reason: "kernel size must be 3 or 5".to_string(),
            });
        }
        if size != self.kernel.size() {
            self.preset = KernelPreset::Custom;
            self.kernel = identity_kernel(size);
        }
        self.kernel_size = size;
        reprocess_after_set(self)
    }

    /// Load a named preset kernel (always 3x3) and reprocess.
    pub fn set_preset(&mut self, preset: KernelPreset) -> NodeResult<()> {
        self.kernel = match preset {
            KernelPreset::Sharpen => Kernel::sharpen(),
            KernelPreset::Emboss => Kernel::emboss(),
            KernelPreset::EdgeEnhance => Kernel::edge_enhance(),
            KernelPreset::Custom => identity_kernel(self.kernel_size),
        };
        if preset != KernelPreset::Custom {
            self.kernel_size = 3;
        }
        self.preset = preset;
        reprocess_after_set(self)
    }

    /// Install a custom kernel and reprocess.
    ///
    /// The weight vector must hold exactly `kernel_size * kernel_size`
    /// values; otherwise the setter is rejected and the active kernel
    /// is unchanged.
    pub fn set_custom_kernel(&mut self, weights: Vec<f32>) -> NodeResult<()> {
        let expected = self.kernel_size * self.kernel_size;
        let got = weights.len();
        match Kernel::from_data(self.kernel_size, weights) {
            Some(kernel) => {
                self.kernel = kernel;
                self.preset = KernelPreset::Custom;
                reprocess_after_set(self)
            }
            None => Err(NodeError::InvalidParameter {
                node: self.name.clone(),
                parameter: "kernel".to_string(),
                reason: format!("expected {} values, got {}", expected, got),
            }),
        }
    }
}

impl TransformNode for ConvolutionNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Convolution
    }

    fn set_input(&mut self, input: ImageBuffer) {
        self.input = input;
    }

    fn process(&mut self) -> NodeResult<()> {
        if self.input.is_empty() {
            self.output = ImageBuffer::empty();
            return Err(NodeError::MissingInput {
                node: self.name.clone(),
            });
        }
        self.output = convolve(&self.input, &self.kernel);
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "preset" => {
                let text = expect_text(&self.name, name, &value)?;
                let preset =
                    KernelPreset::parse(text).ok_or_else(|| NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: format!(
                            "unknown preset '{}': expected sharpen, emboss, or edge_enhance",
                            text
                        ),
                    })?;
                self.set_preset(preset)
            }
            "kernel_size" => {
                let size = expect_integer(&self.name, name, &value)?;
                if size < 0 {
                    return Err(NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: "kernel size must be 3 or 5".to_string(),
                    });
                }
                self.set_kernel_size(size as usize)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}
