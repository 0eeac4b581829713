//! Blur node: isotropic Gaussian or directional (motion-style) blur.
//!
//! Two kernel families, selected by the `directional` flag. The
//! Gaussian kernel smooths uniformly in every direction; the
//! directional kernel averages along a line at the configured angle,
//! imitating motion blur. Kernel construction lives in
//! [`crate::ops::Kernel`]; both families normalize to sum 1 so overall
//! brightness is preserved.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_bool, expect_float, expect_integer, unknown_parameter};
use crate::ops::{convolve, Kernel};

/// Applies Gaussian or directional blur to its input.
#[derive(Debug, Clone)]
pub struct BlurNode {
    id: String,
    name: String,
    input: ImageBuffer,
    output: ImageBuffer,
    radius: u32,
    angle: f32,
    directional: bool,
}

impl BlurNode {
    /// Create a blur node with default parameters (Gaussian, radius 3).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("blur_{}", name),
            name,
            input: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            radius: 3,
            angle: 0.0,
            directional: false,
        }
    }

    /// Current blur radius.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Current directional angle in degrees.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Whether directional blur is enabled.
    pub fn directional(&self) -> bool {
        self.directional
    }

    /// Set the kernel radius (must be at least 1) and reprocess.
    pub fn set_radius(&mut self, radius: u32) -> NodeResult<()> {
        if radius < 1 {
            return Err(NodeError::InvalidParameter {
                node: self.name.clone(),
                parameter: "radius".to_string(),
                reason: "radius must be at least 1".to_string(),
            });
        }
        self.radius = radius;
        reprocess_after_set(self)
    }

    /// Set the directional angle in degrees and reprocess.
    pub fn set_angle(&mut self, angle: f32) -> NodeResult<()> {
        self.angle = angle;
        reprocess_after_set(self)
    }

    /// Toggle directional blur and reprocess.
    pub fn set_directional(&mut self, directional: bool) -> NodeResult<()> {
        self.directional = directional;
        reprocess_after_set(self)
    }
}

impl TransformNode for BlurNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Blur
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

        let kernel = if self.directional {
            Kernel::directional(self.radius, self.angle)
        } else {
            Kernel::gaussian(self.radius)
        };
        self.output = convolve(&self.input, &kernel);
        log::debug!(
            "blur '{}' applied with radius {} ({})",
            self.name,
            self.radius,
            if self.directional {
                "directional"
            } else {
                "gaussian"
            }
        );
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "radius" => {
                let radius = expect_integer(&self.name, name, &value)?;
                if !(1..=u32::MAX as i64).contains(&radius) {
                    return Err(NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: "radius must be at least 1".to_string(),
                    });
                }
                self.set_radius(radius as u32)
            }
            "angle" => {
                let angle = expect_float(&self.name, name, &value)?;
                self.set_angle(angle as f32)
            }
            "directional" => {
                let directional = expect_bool(&self.name, name, &value)?;
                self.set_directional(directional)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}
