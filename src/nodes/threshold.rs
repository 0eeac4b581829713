//! Threshold node: binary, adaptive-mean, and Otsu thresholding.
//!
//! Input is reduced to a single luma channel first. Three mutually
//! exclusive methods:
//!
//! - **Binary**: sample >= threshold becomes the max value, else 0.
//! - **Adaptive**: per-pixel threshold is the local mean over an odd
//!   block minus a constant C; block sizes are forced odd.
//! - **Otsu**: the global threshold is chosen automatically by
//!   maximizing between-class variance over all 256 candidate levels;
//!   ties across a plateau resolve to the plateau midpoint.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_integer, expect_text, unknown_parameter};
use crate::ops::reflect;
use serde::{Deserialize, Serialize};

/// Which thresholding decision rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Fixed global threshold.
    Binary,
    /// Local-mean threshold minus a constant.
    Adaptive,
    /// Automatic global threshold (between-class variance).
    Otsu,
}

impl ThresholdMethod {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "binary" => Some(ThresholdMethod::Binary),
            "adaptive" => Some(ThresholdMethod::Adaptive),
            "otsu" => Some(ThresholdMethod::Otsu),
            _ => None,
        }
    }
}

/// Thresholds its input into a binary single-channel image.
#[derive(Debug, Clone)]
pub struct ThresholdNode {
    id: String,
    name: String,
    input: ImageBuffer,
    output: ImageBuffer,
    method: ThresholdMethod,
    threshold_value: u8,
    max_value: u8,
    block_size: u32,
    c: i32,
}

impl ThresholdNode {
    /// Create a threshold node (binary method, threshold 128, max 255).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("threshold_{}", name),
            name,
            input: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            method: ThresholdMethod::Binary,
            threshold_value: 128,
            max_value: 255,
            block_size: 11,
            c: 2,
        }
    }

    /// Active method.
    pub fn method(&self) -> ThresholdMethod {
        self.method
    }

    /// Fixed threshold used by the binary method.
    pub fn threshold_value(&self) -> u8 {
        self.threshold_value
    }

    /// Block size used by the adaptive method (always odd).
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Constant subtracted from the local mean in adaptive mode.
    pub fn c(&self) -> i32 {
        self.c
    }

    /// Select the thresholding method and reprocess.
    pub fn set_method(&mut self, method: ThresholdMethod) -> NodeResult<()> {
        self.method = method;
        reprocess_after_set(self)
    }

    /// Set the binary threshold value and reprocess.
    pub fn set_threshold_value(&mut self, value: u8) -> NodeResult<()> {
        self.threshold_value = value;
        reprocess_after_set(self)
    }

    /// Set the adaptive block size and reprocess. Even sizes are
    /// incremented to the next odd value; sizes below 3 are rejected.
    pub fn set_block_size(&mut self, size: u32) -> NodeResult<()> {
        if size < 3 {
            return Err(NodeError::InvalidParameter {
                node: self.name.clone(),
                parameter: "block_size".to_string(),
                reason: "block size must be at least 3".to_string(),
            });
        }
        self.block_size = if size % 2 == 0 { size + 1 } else { size };
        reprocess_after_set(self)
    }

    /// Set the adaptive constant C and reprocess.
    pub fn set_c(&mut self, c: i32) -> NodeResult<()> {
        self.c = c;
        reprocess_after_set(self)
    }

    /// Otsu's method: histogram the image and pick the level that
    /// maximizes between-class variance. A plateau of equally good
    /// levels resolves to its midpoint.
    fn otsu_threshold(gray: &[u8]) -> u8 {
        let mut histogram = [0u64; 256];
        for &s in gray {
            histogram[s as usize] += 1;
        }
        let total = gray.len() as f64;
        let total_sum: f64 = histogram
            .iter()
            .enumerate()
            .map(|(level, &count)| level as f64 * count as f64)
            .sum();

        let mut best_sigma = -1.0f64;
        let mut best_first = 0usize;
        let mut best_last = 0usize;
        let mut weight0 = 0.0f64;
        let mut sum0 = 0.0f64;

        for t in 0..256 {
            weight0 += histogram[t] as f64;
            if weight0 == 0.0 {
                continue;
            }
            let weight1 = total - weight0;
            if weight1 == 0.0 {
                break;
            }
            sum0 += t as f64 * histogram[t] as f64;

            let mean0 = sum0 / weight0;
            let mean1 = (total_sum - sum0) / weight1;
            let diff = mean0 - mean1;
            let sigma = weight0 * weight1 * diff * diff;

            if sigma > best_sigma + f64::EPSILON {
                best_sigma = sigma;
                best_first = t;
                best_last = t;
            } else if (sigma - best_sigma).abs() <= f64::EPSILON {
                best_last = t;
            }
        }
        ((best_first + best_last) / 2) as u8
    }

    fn apply_binary(&self, gray: &[u8], threshold: u8) -> Vec<u8> {
        gray.iter()
            .map(|&s| if s >= threshold { self.max_value } else { 0 })
            .collect()
    }

    fn apply_adaptive(&self, gray: &[u8], width: u32, height: u32) -> Vec<u8> {
        let half = (self.block_size / 2) as i64;
        let mut out = Vec::with_capacity(gray.len());
        for y in 0..height {
            for x in 0..width {
                let mut sum = 0u64;
                for dy in -half..=half {
                    let sy = reflect(i64::from(y) + dy, height);
                    for dx in -half..=half {
                        let sx = reflect(i64::from(x) + dx, width);
                        sum += u64::from(gray[(sy * width + sx) as usize]);
                    }
                }
                let count = (self.block_size * self.block_size) as f64;
                let local = sum as f64 / count - f64::from(self.c);
                let sample = f64::from(gray[(y * width + x) as usize]);
                out.push(if sample > local { self.max_value } else { 0 });
            }
        }
        out
    }
}

impl TransformNode for ThresholdNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Threshold
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
        let width = gray.width();
        let height = gray.height();
        let samples = gray.as_u8().unwrap_or(&[]);

        let binarized = match self.method {
            ThresholdMethod::Binary => self.apply_binary(samples, self.threshold_value),
            ThresholdMethod::Adaptive => self.apply_adaptive(samples, width, height),
            ThresholdMethod::Otsu => {
                let threshold = Self::otsu_threshold(samples);
                log::debug!("otsu on '{}' selected threshold {}", self.name, threshold);
                // Otsu's split puts <= t in the background class.
                samples
                    .iter()
                    .map(|&s| if s > threshold { self.max_value } else { 0 })
                    .collect()
            }
        };

        self.output = ImageBuffer::from_raw_u8(width, height, 1, binarized)
            .unwrap_or_else(|_| ImageBuffer::empty());
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "method" => {
                let text = expect_text(&self.name, name, &value)?;
                let method =
                    ThresholdMethod::parse(text).ok_or_else(|| NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: format!(
                            "unknown method '{}': expected binary, adaptive, or otsu",
                            text
                        ),
                    })?;
                self.set_method(method)
            }
            "value" => {
                let v = expect_integer(&self.name, name, &value)?;
                if !(0..=255).contains(&v) {
                    return Err(NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: "threshold must be in 0-255".to_string(),
                    });
                }
                self.set_threshold_value(v as u8)
            }
            "block_size" => {
                let v = expect_integer(&self.name, name, &value)?;
                if v < 0 {
                    return Err(NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: "block size must be positive".to_string(),
                    });
                }
                self.set_block_size(v as u32)
            }
            "c" => {
                let v = expect_integer(&self.name, name, &value)?;
                self.set_c(v as i32)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}
