//! Blend node: composite two images with a selectable blend mode.
//!
//! The canonical input slot feeds input A (the base); input B arrives
//! through the dedicated [`BlendNode::set_input_b`] setter, since graph
//! connections only ever target the canonical slot. B is resized to
//! A's dimensions when they differ, both are normalized to `[0, 1]`,
//! the mode formula is applied elementwise, and the result is mixed
//! with A by the opacity before converting back to 8-bit.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_float, expect_text, unknown_parameter};
use crate::ops::resize_bilinear;
use serde::{Deserialize, Serialize};

/// Compositing formula applied to the normalized inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Result is B.
    Normal,
    /// `A * B` elementwise.
    Multiply,
    /// `1 - (1 - A)(1 - B)`.
    Screen,
    /// `2AB` where A < 0.5, else `1 - 2(1 - A)(1 - B)`.
    Overlay,
    /// `|A - B|`.
    Difference,
}

impl BlendMode {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "normal" => Some(BlendMode::Normal),
            "multiply" => Some(BlendMode::Multiply),
            "screen" => Some(BlendMode::Screen),
            "overlay" => Some(BlendMode::Overlay),
            "difference" => Some(BlendMode::Difference),
            _ => None,
        }
    }

    /// Apply the mode formula to one pair of normalized samples.
    fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            BlendMode::Normal => b,
            BlendMode::Multiply => a * b,
            BlendMode::Screen => 1.0 - (1.0 - a) * (1.0 - b),
            BlendMode::Overlay => {
                if a < 0.5 {
                    2.0 * a * b
                } else {
                    1.0 - 2.0 * (1.0 - a) * (1.0 - b)
                }
            }
            BlendMode::Difference => (a - b).abs(),
        }
    }
}

/// Composites inputs A and B.
#[derive(Debug, Clone)]
pub struct BlendNode {
    id: String,
    name: String,
    input_a: ImageBuffer,
    input_b: ImageBuffer,
    output: ImageBuffer,
    mode: BlendMode,
    opacity: f32,
}

impl BlendNode {
    /// Create a blend node (Normal mode, opacity 1.0).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("blend_{}", name),
            name,
            input_a: ImageBuffer::empty(),
            input_b: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            mode: BlendMode::Normal,
            opacity: 1.0,
        }
    }

    /// Active blend mode.
    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    /// Current opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the second input (the blend layer). No transform is applied;
    /// like the canonical slot, callers re-run `process()`.
    pub fn set_input_b(&mut self, input: ImageBuffer) {
        self.input_b = input;
    }

    /// Select the blend mode and reprocess.
    pub fn set_mode(&mut self, mode: BlendMode) -> NodeResult<()> {
        self.mode = mode;
        reprocess_after_set(self)
    }

    /// Set the opacity (clamped to `[0, 1]`) and reprocess.
    pub fn set_opacity(&mut self, opacity: f32) -> NodeResult<()> {
        self.opacity = opacity.clamp(0.0, 1.0);
        reprocess_after_set(self)
    }

    /// Make `b` compatible with `a`: same dimensions and channel count.
    fn conform(b: &ImageBuffer, a: &ImageBuffer) -> ImageBuffer {
        let resized = resize_bilinear(b, a.width(), a.height()).to_u8();
        let target = a.channels();
        if resized.channels() == target {
            return resized;
        }
        if target == 1 {
            return resized.to_luma();
        }

        let (width, height) = (resized.width(), resized.height());
        let samples = match resized.as_u8() {
            Some(s) => s,
            None => return ImageBuffer::empty(),
        };
        let conformed: Vec<u8> = match resized.channels() {
            // Gray layer replicated across the color channels (plus
            // opaque alpha if A carries one).
            1 => samples
                .iter()
                .flat_map(|&s| {
                    let mut px = [s; 4];
                    if target == 4 {
                        px[3] = 255;
                    }
                    px.into_iter().take(target as usize)
                })
                .collect(),
            // RGB layer gains an opaque alpha channel.
            3 => samples
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            // RGBA layer drops its alpha channel.
            _ => samples
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        };
        ImageBuffer::from_raw_u8(width, height, target, conformed)
            .unwrap_or_else(|_| ImageBuffer::empty())
    }
}

impl TransformNode for BlendNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Blend
    }

    /// The canonical input slot feeds input A.
    fn set_input(&mut self, input: ImageBuffer) {
        self.input_a = input;
    }

    fn process(&mut self) -> NodeResult<()> {
        if self.input_a.is_empty() || self.input_b.is_empty() {
            self.output = ImageBuffer::empty();
            return Err(NodeError::MissingInput {
                node: self.name.clone(),
            });
        }

        let b_conformed = Self::conform(&self.input_b, &self.input_a);
        let a = self.input_a.to_u8().to_f32();
        let b = b_conformed.to_u8().to_f32();

        let (a_samples, b_samples) = match (a.as_f32(), b.as_f32()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                self.output = ImageBuffer::empty();
                return Ok(());
            }
        };

        let mode = self.mode;
        let opacity = self.opacity;
        let blended: Vec<f32> = a_samples
            .iter()
            .zip(b_samples)
            .map(|(&va, &vb)| opacity * mode.apply(va, vb) + (1.0 - opacity) * va)
            .collect();

        self.output = ImageBuffer::from_raw_f32(a.width(), a.height(), a.channels(), blended)
            .map(|buf| buf.to_u8())
            .unwrap_or_else(|_| ImageBuffer::empty());
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "mode" => {
                let text = expect_text(&self.name, name, &value)?;
                let mode = BlendMode::parse(text).ok_or_else(|| NodeError::InvalidParameter {
                    node: self.name.clone(),
                    parameter: name.to_string(),
                    reason: format!(
                        "unknown mode '{}': expected normal, multiply, screen, overlay, \
                         or difference",
                        text
                    ),
                })?;
                self.set_mode(mode)
            }
            "opacity" => {
                let opacity = expect_float(&self.name, name, &value)?;
                self.set_opacity(opacity as f32)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_of(level: u8) -> ImageBuffer {
        ImageBuffer::from_raw_u8(4, 4, 3, vec![level; 48]).unwrap()
    }

    #[test]
    fn test_normal_full_opacity_returns_b() {
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(30));
        node.set_input_b(image_of(200));
        node.process().unwrap();
        assert_eq!(node.output(), &image_of(200));
    }

    #[test]
    fn test_zero_opacity_returns_a() {
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(30));
        node.set_input_b(image_of(200));
        node.set_opacity(0.0).unwrap();
        assert_eq!(node.output(), &image_of(30));

        // Holds for every mode.
        for mode in [
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Difference,
        ] {
            node.set_mode(mode).unwrap();
            assert_eq!(node.output(), &image_of(30), "mode {:?}", mode);
        }
    }

    #[test]
    fn test_multiply_darkens() {
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(128));
        node.set_input_b(image_of(128));
        node.set_mode(BlendMode::Multiply).unwrap();
        // (128/255)^2 * 255 = 64.25 -> 64
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 64));
    }

    #[test]
    fn test_screen_brightens() {
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(128));
        node.set_input_b(image_of(128));
        node.set_mode(BlendMode::Screen).unwrap();
        // 1 - (1 - 0.502)^2 = 0.752 -> 192
        let out = node.output().as_u8().unwrap();
        assert!(out.iter().all(|&s| s == 192), "got {}", out[0]);
    }

    #[test]
    fn test_overlay_piecewise() {
        // Dark base: 2ab. 64/255 = 0.251, 2 * 0.251 * 0.502 = 0.252 -> 64
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(64));
        node.set_input_b(image_of(128));
        node.set_mode(BlendMode::Overlay).unwrap();
        let dark = node.output().as_u8().unwrap()[0];
        assert!((63..=65).contains(&dark), "got {}", dark);

        // Bright base: 1 - 2(1-a)(1-b). a=0.753, b=0.502:
        // 1 - 2 * 0.247 * 0.498 = 0.754 -> 192
        node.set_input(image_of(192));
        node.process().unwrap();
        let bright = node.output().as_u8().unwrap()[0];
        assert!((191..=193).contains(&bright), "got {}", bright);
    }

    #[test]
    fn test_difference_is_symmetric() {
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(200));
        node.set_input_b(image_of(50));
        node.set_mode(BlendMode::Difference).unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 150));

        node.set_input(image_of(50));
        node.set_input_b(image_of(200));
        node.process().unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 150));
    }

    #[test]
    fn test_b_resized_to_a() {
        let a = image_of(100);
        let b = ImageBuffer::from_raw_u8(8, 2, 3, vec![50; 48]).unwrap();
        let mut node = BlendNode::new("mix");
        node.set_input(a);
        node.set_input_b(b);
        node.process().unwrap();
        assert_eq!(node.output().width(), 4);
        assert_eq!(node.output().height(), 4);
    }

    #[test]
    fn test_gray_b_conformed_to_color_a() {
        let a = image_of(100);
        let b = ImageBuffer::from_raw_u8(4, 4, 1, vec![50; 16]).unwrap();
        let mut node = BlendNode::new("mix");
        node.set_input(a);
        node.set_input_b(b);
        node.process().unwrap();
        assert_eq!(node.output().channels(), 3);
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 50));
    }

    #[test]
    fn test_either_input_missing_fails() {
        let mut node = BlendNode::new("mix");
        node.set_input(image_of(10));
        assert!(matches!(
            node.process(),
            Err(NodeError::MissingInput { .. })
        ));

        let mut node = BlendNode::new("mix");
        node.set_input_b(image_of(10));
        assert!(matches!(
            node.process(),
            Err(NodeError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_opacity_clamped() {
        let mut node = BlendNode::new("mix");
        node.set_opacity(2.0).unwrap();
        assert_eq!(node.opacity(), 1.0);
        node.set_opacity(-1.0).unwrap();
        assert_eq!(node.opacity(), 0.0);
    }

    #[test]
    fn test_mode_parameter() {
        let mut node = BlendNode::new("mix");
        node.set_parameter("mode", Value::from("screen")).unwrap();
        assert_eq!(node.mode(), BlendMode::Screen);
        assert!(node.set_parameter("mode", Value::from("dodge")).is_err());
        assert_eq!(node.mode(), BlendMode::Screen);
    }
}
