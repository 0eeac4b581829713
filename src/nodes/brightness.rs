//! Brightness/contrast node: per-channel linear adjustment.
//!
//! Output sample = clamp(alpha * input + beta, 0, 255), where alpha is
//! the contrast gain (default 1.0) and beta the brightness offset
//! (default 0). `reset()` restores the defaults.

use crate::core::buffer::{ImageBuffer, SampleType};
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_float, unknown_parameter};

/// Applies `alpha * v + beta` per channel, saturating to `[0, 255]`.
#[derive(Debug, Clone)]
pub struct BrightnessContrastNode {
    id: String,
    name: String,
    input: ImageBuffer,
    output: ImageBuffer,
    alpha: f64,
    beta: f64,
}

impl BrightnessContrastNode {
    /// Create a node with neutral parameters (alpha 1.0, beta 0).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("brightness_contrast_{}", name),
            name,
            input: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            alpha: 1.0,
            beta: 0.0,
        }
    }

    /// Create a node with explicit contrast and brightness.
    pub fn with_params(name: impl Into<String>, alpha: f64, beta: f64) -> Self {
        let mut node = Self::new(name);
        node.alpha = alpha;
        node.beta = beta;
        node
    }

    /// Contrast gain.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Brightness offset.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Set contrast and brightness together and reprocess.
    pub fn set_params(&mut self, alpha: f64, beta: f64) -> NodeResult<()> {
        self.alpha = alpha;
        self.beta = beta;
        reprocess_after_set(self)
    }

    /// Restore the neutral defaults (alpha 1.0, beta 0) and reprocess.
    pub fn reset(&mut self) -> NodeResult<()> {
        log::info!("reset '{}' to alpha=1.0, beta=0", self.name);
        self.set_params(1.0, 0.0)
    }
}

impl TransformNode for BrightnessContrastNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::BrightnessContrast
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

        let alpha = self.alpha;
        let beta = self.beta;
        let bytes = match self.input.sample_type() {
            SampleType::U8 => self.input.clone(),
            SampleType::F32 => self.input.to_u8(),
        };
        let adjusted = bytes
            .as_u8()
            .unwrap_or(&[])
            .iter()
            .map(|&s| (alpha * f64::from(s) + beta).round().clamp(0.0, 255.0) as u8)
            .collect();
        self.output = ImageBuffer::from_raw_u8(
            bytes.width(),
            bytes.height(),
            bytes.channels(),
            adjusted,
        )
        .unwrap_or_else(|_| ImageBuffer::empty());
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "alpha" | "contrast" => {
                let alpha = expect_float(&self.name, name, &value)?;
                self.set_params(alpha, self.beta)
            }
            "beta" | "brightness" => {
                let beta = expect_float(&self.name, name, &value)?;
                self.set_params(self.alpha, beta)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(level: u8) -> ImageBuffer {
        ImageBuffer::from_raw_u8(4, 4, 3, vec![level; 48]).unwrap()
    }

    #[test]
    fn test_neutral_params_are_identity() {
        let mut node = BrightnessContrastNode::new("bc");
        node.set_input(flat_image(100));
        node.process().unwrap();
        assert_eq!(node.output(), &flat_image(100));
    }

    #[test]
    fn test_brightness_offset() {
        let mut node = BrightnessContrastNode::new("bc");
        node.set_input(flat_image(100));
        node.set_params(1.0, 30.0).unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 130));
    }

    #[test]
    fn test_contrast_gain() {
        let mut node = BrightnessContrastNode::new("bc");
        node.set_input(flat_image(100));
        node.set_params(1.5, 0.0).unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 150));
    }

    #[test]
    fn test_output_saturates_both_ends() {
        let mut node = BrightnessContrastNode::new("bc");
        node.set_input(flat_image(200));
        node.set_params(2.0, 0.0).unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 255));

        node.set_params(1.0, -255.0).unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut node = BrightnessContrastNode::with_params("bc", 2.5, -40.0);
        node.set_input(flat_image(80));
        node.process().unwrap();

        node.reset().unwrap();
        assert_eq!(node.alpha(), 1.0);
        assert_eq!(node.beta(), 0.0);
        assert_eq!(node.output(), &flat_image(80));
    }

    #[test]
    fn test_missing_input() {
        let mut node = BrightnessContrastNode::new("bc");
        assert!(matches!(
            node.process(),
            Err(NodeError::MissingInput { .. })
        ));
        assert!(node.output().is_empty());
    }

    #[test]
    fn test_set_parameter_aliases() {
        let mut node = BrightnessContrastNode::new("bc");
        node.set_parameter("contrast", Value::Float(1.2)).unwrap();
        node.set_parameter("brightness", Value::Integer(10)).unwrap();
        assert_eq!(node.alpha(), 1.2);
        assert_eq!(node.beta(), 10.0);
    }
}
