//! Edge detection node: Sobel gradient magnitude or Canny.
//!
//! Input is reduced to luma first. The Sobel path convolves with a
//! derivative kernel pair of configurable odd size (3, 5, or 7) and
//! takes the per-pixel gradient magnitude. The Canny path wraps
//! [`imageproc::edges::canny`] (gradient, non-maximum suppression, and
//! hysteresis thresholding) the same way the wider ecosystem does,
//! with the low threshold clamped to never exceed the high one.
//!
//! With the overlay flag set, the edge map is mixed back over the
//! original image (0.7 original + 0.3 edges) instead of being returned
//! raw.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::io::{from_gray_image, to_gray_image};
use crate::nodes::{expect_bool, expect_float, expect_integer, expect_text, unknown_parameter};
use crate::ops::{convolve, Kernel};
use serde::{Deserialize, Serialize};

/// Minimum Canny threshold. Zero thresholds make every gradient pixel
/// a candidate edge and drown the result in noise.
const MIN_CANNY_THRESHOLD: f32 = 1.0;

/// Which edge detection algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDetector {
    /// Gradient magnitude from a Sobel derivative pair.
    Sobel,
    /// Canny with hysteresis thresholding.
    Canny,
}

impl EdgeDetector {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sobel" => Some(EdgeDetector::Sobel),
            "canny" => Some(EdgeDetector::Canny),
            _ => None,
        }
    }
}

/// Detects edges in its input.
#[derive(Debug, Clone)]
pub struct EdgeDetectionNode {
    id: String,
    name: String,
    input: ImageBuffer,
    output: ImageBuffer,
    detector: EdgeDetector,
    sobel_kernel_size: u32,
    canny_low: f32,
    canny_high: f32,
    overlay: bool,
}

impl EdgeDetectionNode {
    /// Create an edge detection node (Sobel, kernel size 3).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("edge_detection_{}", name),
            name,
            input: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            detector: EdgeDetector::Sobel,
            sobel_kernel_size: 3,
            canny_low: 50.0,
            canny_high: 150.0,
            overlay: false,
        }
    }

    /// Active detector.
    pub fn detector(&self) -> EdgeDetector {
        self.detector
    }

    /// Sobel kernel size (3, 5, or 7).
    pub fn sobel_kernel_size(&self) -> u32 {
        self.sobel_kernel_size
    }

    /// Canny hysteresis thresholds `(low, high)`.
    pub fn canny_thresholds(&self) -> (f32, f32) {
        (self.canny_low, self.canny_high)
    }

    /// Whether the edge map is overlaid on the original image.
    pub fn overlay(&self) -> bool {
        self.overlay
    }

    /// Select the detector and reprocess.
    pub fn set_detector(&mut self, detector: EdgeDetector) -> NodeResult<()> {
        self.detector = detector;
        reprocess_after_set(self)
    }

    /// Set the Sobel kernel size and reprocess. Even sizes are bumped
    /// to the next odd value; the result is clamped to 3-7.
    pub fn set_sobel_kernel_size(&mut self, size: u32) -> NodeResult<()> {
        let odd = if size % 2 == 0 { size + 1 } else { size };
        self.sobel_kernel_size = odd.clamp(3, 7);
        reprocess_after_set(self)
    }

    /// Set both hysteresis thresholds and reprocess. Values are clamped
    /// to at least 1.0, and low is clamped to at most high.
    pub fn set_canny_thresholds(&mut self, low: f32, high: f32) -> NodeResult<()> {
        self.canny_high = high.max(MIN_CANNY_THRESHOLD);
        self.canny_low = low.max(MIN_CANNY_THRESHOLD).min(self.canny_high);
        reprocess_after_set(self)
    }

    /// Toggle overlay mode and reprocess.
    pub fn set_overlay(&mut self, overlay: bool) -> NodeResult<()> {
        self.overlay = overlay;
        reprocess_after_set(self)
    }

    fn sobel_magnitude(&self, gray: &ImageBuffer) -> ImageBuffer {
        let (gx, gy) = Kernel::sobel_pair(self.sobel_kernel_size as usize);
        // Convolve in float so negative derivative responses survive.
        let gray_f = gray.to_f32();
        let dx = convolve(&gray_f, &gx);
        let dy = convolve(&gray_f, &gy);

        let (dx, dy) = match (dx.as_f32(), dy.as_f32()) {
            (Some(dx), Some(dy)) => (dx, dy),
            _ => return ImageBuffer::empty(),
        };
        let magnitude = dx
            .iter()
            .zip(dy)
            .map(|(&x, &y)| (x.hypot(y) * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        ImageBuffer::from_raw_u8(gray.width(), gray.height(), 1, magnitude)
            .unwrap_or_else(|_| ImageBuffer::empty())
    }

    fn canny_edges(&self, gray: &ImageBuffer) -> ImageBuffer {
        match to_gray_image(gray) {
            Some(img) => {
                from_gray_image(imageproc::edges::canny(&img, self.canny_low, self.canny_high))
            }
            None => ImageBuffer::empty(),
        }
    }

    /// Mix the single-channel edge map over the original color image:
    /// 0.7 original + 0.3 edges, per channel.
    fn overlay_edges(original: &ImageBuffer, edges: &ImageBuffer) -> ImageBuffer {
        let color = original.to_u8();
        let channels = color.channels();
        let (color_samples, edge_samples) = match (color.as_u8(), edges.as_u8()) {
            (Some(c), Some(e)) => (c, e),
            _ => return ImageBuffer::empty(),
        };

        let mixed = color_samples
            .iter()
            .enumerate()
            .map(|(i, &orig)| {
                let edge = edge_samples[i / channels as usize];
                (0.7 * f32::from(orig) + 0.3 * f32::from(edge)).round() as u8
            })
            .collect();
        ImageBuffer::from_raw_u8(color.width(), color.height(), channels, mixed)
            .unwrap_or_else(|_| ImageBuffer::empty())
    }
}

impl TransformNode for EdgeDetectionNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::EdgeDetection
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

        let gray = self.input.to_u8().to_luma();
        let edges = match self.detector {
            EdgeDetector::Sobel => self.sobel_magnitude(&gray),
            EdgeDetector::Canny => self.canny_edges(&gray),
        };

        self.output = if self.overlay && !edges.is_empty() {
            Self::overlay_edges(&self.input, &edges)
        } else {
            edges
        };
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "detector" => {
                let text = expect_text(&self.name, name, &value)?;
                let detector =
                    EdgeDetector::parse(text).ok_or_else(|| NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: format!("unknown detector '{}': expected sobel or canny", text),
                    })?;
                self.set_detector(detector)
            }
            "kernel_size" => {
                let size = expect_integer(&self.name, name, &value)?;
                if size < 1 {
                    return Err(NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: "kernel size must be positive".to_string(),
                    });
                }
                self.set_sobel_kernel_size(size as u32)
            }
            "low" => {
                let low = expect_float(&self.name, name, &value)? as f32;
                self.set_canny_thresholds(low, self.canny_high)
            }
            "high" => {
                let high = expect_float(&self.name, name, &value)? as f32;
                self.set_canny_thresholds(self.canny_low, high)
            }
            "overlay" => {
                let overlay = expect_bool(&self.name, name, &value)?;
                self.set_overlay(overlay)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_edge_image() -> ImageBuffer {
        let data: Vec<u8> = (0..20 * 20)
            .map(|i| if i % 20 < 10 { 0 } else { 255 })
            .collect();
        ImageBuffer::from_raw_u8(20, 20, 1, data).unwrap()
    }

    #[test]
    fn test_sobel_finds_vertical_boundary() {
        let mut node = EdgeDetectionNode::new("e");
        node.set_input(vertical_edge_image());
        node.process().unwrap();

        let out = node.output();
        assert_eq!(out.channels(), 1);
        // Strong response at the boundary column, none in flat regions.
        assert!(out.sample(10, 10, 0) > 128.0);
        assert!(out.sample(3, 10, 0) < 1.0);
        assert!(out.sample(17, 10, 0) < 1.0);
    }

    #[test]
    fn test_canny_finds_vertical_boundary() {
        let mut node = EdgeDetectionNode::new("e");
        node.set_input(vertical_edge_image());
        node.set_detector(EdgeDetector::Canny).unwrap();

        let out = node.output();
        let edge_pixels: u32 = out
            .as_u8()
            .unwrap()
            .iter()
            .map(|&s| u32::from(s > 0))
            .sum();
        assert!(edge_pixels > 0, "expected canny to mark the boundary");
    }

    #[test]
    fn test_uniform_image_has_no_edges() {
        let flat = ImageBuffer::from_raw_u8(10, 10, 1, vec![128; 100]).unwrap();
        let mut node = EdgeDetectionNode::new("e");
        node.set_input(flat);
        node.process().unwrap();
        assert!(node.output().as_u8().unwrap().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_kernel_size_forced_into_range() {
        let mut node = EdgeDetectionNode::new("e");
        node.set_sobel_kernel_size(4).unwrap();
        assert_eq!(node.sobel_kernel_size(), 5);
        node.set_sobel_kernel_size(9).unwrap();
        assert_eq!(node.sobel_kernel_size(), 7);
        node.set_sobel_kernel_size(1).unwrap();
        assert_eq!(node.sobel_kernel_size(), 3);
    }

    #[test]
    fn test_canny_low_clamped_to_high() {
        let mut node = EdgeDetectionNode::new("e");
        node.set_canny_thresholds(200.0, 100.0).unwrap();
        let (low, high) = node.canny_thresholds();
        assert_eq!(high, 100.0);
        assert!(low <= high);
    }

    #[test]
    fn test_overlay_keeps_channel_count() {
        let data: Vec<u8> = (0..20 * 20 * 3).map(|i| (i % 256) as u8).collect();
        let color = ImageBuffer::from_raw_u8(20, 20, 3, data).unwrap();

        let mut node = EdgeDetectionNode::new("e");
        node.set_input(color);
        node.set_overlay(true).unwrap();

        let out = node.output();
        assert_eq!(out.channels(), 3);
        assert_eq!(out.width(), 20);
    }

    #[test]
    fn test_overlay_weights() {
        // Flat white image with no edges: overlay = 0.7 * 255 + 0.3 * 0.
        let flat = ImageBuffer::from_raw_u8(10, 10, 1, vec![255; 100]).unwrap();
        let mut node = EdgeDetectionNode::new("e");
        node.set_input(flat);
        node.set_overlay(true).unwrap();
        let out = node.output().as_u8().unwrap();
        assert!(out.iter().all(|&s| s == 179)); // round(178.5)
    }

    #[test]
    fn test_missing_input() {
        let mut node = EdgeDetectionNode::new("e");
        assert!(matches!(
            node.process(),
            Err(NodeError::MissingInput { .. })
        ));
        assert!(node.output().is_empty());
    }

    #[test]
    fn test_detector_parameter() {
        let mut node = EdgeDetectionNode::new("e");
        node.set_parameter("detector", Value::from("canny")).unwrap();
        assert_eq!(node.detector(), EdgeDetector::Canny);
        assert!(node.set_parameter("detector", Value::from("prewitt")).is_err());
        assert_eq!(node.detector(), EdgeDetector::Canny);
    }
}
