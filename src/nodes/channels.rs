//! Channel splitter node: split a color image into per-channel buffers
//! and merge them back.
//!
//! `process()` extracts R, G, B (and alpha for 4-channel input) as
//! single-channel buffers, and optionally derives a luma view when the
//! grayscale flag is set. Note the asymmetry in `output()`: splitting
//! does not itself produce a canonical multi-channel output: the node
//! forwards either the luma view (grayscale flag on) or the untouched
//! input (flag off). The split channels are reachable through the
//! channel accessors and [`ChannelSplitterNode::merge_channels`].

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_bool, unknown_parameter};

/// Splits color input into single-channel buffers.
#[derive(Debug, Clone)]
pub struct ChannelSplitterNode {
    id: String,
    name: String,
    input: ImageBuffer,
    red: ImageBuffer,
    green: ImageBuffer,
    blue: ImageBuffer,
    alpha: ImageBuffer,
    grayscale: ImageBuffer,
    output_grayscale: bool,
}

impl ChannelSplitterNode {
    /// Create a splitter; `output_grayscale` selects what `output()`
    /// forwards (luma view vs. passthrough input).
    pub fn new(name: impl Into<String>, output_grayscale: bool) -> Self {
        let name = name.into();
        Self {
            id: format!("channel_splitter_{}", name),
            name,
            input: ImageBuffer::empty(),
            red: ImageBuffer::empty(),
            green: ImageBuffer::empty(),
            blue: ImageBuffer::empty(),
            alpha: ImageBuffer::empty(),
            grayscale: ImageBuffer::empty(),
            output_grayscale,
        }
    }

    /// The extracted red channel (empty until a color input processed).
    pub fn red(&self) -> &ImageBuffer {
        &self.red
    }

    /// The extracted green channel.
    pub fn green(&self) -> &ImageBuffer {
        &self.green
    }

    /// The extracted blue channel.
    pub fn blue(&self) -> &ImageBuffer {
        &self.blue
    }

    /// The extracted alpha channel (empty unless input had 4 channels).
    pub fn alpha(&self) -> &ImageBuffer {
        &self.alpha
    }

    /// Whether the grayscale view is being forwarded by `output()`.
    pub fn output_grayscale(&self) -> bool {
        self.output_grayscale
    }

    /// Toggle the grayscale flag and reprocess.
    pub fn set_output_grayscale(&mut self, enable: bool) -> NodeResult<()> {
        self.output_grayscale = enable;
        reprocess_after_set(self)
    }

    /// Restore defaults (grayscale off) and reprocess.
    pub fn reset(&mut self) -> NodeResult<()> {
        self.set_output_grayscale(false)
    }

    /// Recombine the stored blue, green, and red channels into one
    /// color image reproducing the pre-split pixel layout.
    ///
    /// Returns the empty buffer (and logs) if any channel is missing.
    pub fn merge_channels(&self) -> ImageBuffer {
        if self.red.is_empty() || self.green.is_empty() || self.blue.is_empty() {
            log::error!(
                "cannot merge channels on '{}': one or more channels are empty",
                self.name
            );
            return ImageBuffer::empty();
        }

        let width = self.red.width();
        let height = self.red.height();
        let (r, g, b) = match (self.red.as_u8(), self.green.as_u8(), self.blue.as_u8()) {
            (Some(r), Some(g), Some(b)) => (r, g, b),
            _ => return ImageBuffer::empty(),
        };

        let mut merged = Vec::with_capacity(r.len() * 3);
        for i in 0..r.len() {
            merged.push(r[i]);
            merged.push(g[i]);
            merged.push(b[i]);
        }
        ImageBuffer::from_raw_u8(width, height, 3, merged)
            .unwrap_or_else(|_| ImageBuffer::empty())
    }
}

impl TransformNode for ChannelSplitterNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::ChannelSplitter
    }

    fn set_input(&mut self, input: ImageBuffer) {
        self.input = input;
    }

    fn process(&mut self) -> NodeResult<()> {
        if self.input.is_empty() {
            self.red = ImageBuffer::empty();
            self.green = ImageBuffer::empty();
            self.blue = ImageBuffer::empty();
            self.alpha = ImageBuffer::empty();
            self.grayscale = ImageBuffer::empty();
            return Err(NodeError::MissingInput {
                node: self.name.clone(),
            });
        }

        let input = self.input.to_u8();
        match input.channels() {
            3 => {
                self.red = input.channel(0);
                self.green = input.channel(1);
                self.blue = input.channel(2);
                self.alpha = ImageBuffer::empty();
            }
            4 => {
                self.red = input.channel(0);
                self.green = input.channel(1);
                self.blue = input.channel(2);
                self.alpha = input.channel(3);
            }
            other => {
                // Single-channel input has nothing to split.
                log::warn!(
                    "channel splitter '{}' received {}-channel input, nothing to split",
                    self.name,
                    other
                );
                self.red = ImageBuffer::empty();
                self.green = ImageBuffer::empty();
                self.blue = ImageBuffer::empty();
                self.alpha = ImageBuffer::empty();
            }
        }

        self.grayscale = if self.output_grayscale {
            input.to_luma()
        } else {
            ImageBuffer::empty()
        };
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        if self.output_grayscale {
            &self.grayscale
        } else {
            &self.input
        }
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "grayscale" => {
                let enable = expect_bool(&self.name, name, &value)?;
                self.set_output_grayscale(enable)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_image() -> ImageBuffer {
        let data = vec![
            255, 0, 0, // red pixel
            0, 255, 0, // green pixel
            0, 0, 255, // blue pixel
            10, 20, 30, // mixed pixel
        ];
        ImageBuffer::from_raw_u8(2, 2, 3, data).unwrap()
    }

    #[test]
    fn test_split_rgb() {
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(rgb_image());
        node.process().unwrap();

        assert_eq!(node.red().as_u8().unwrap(), &[255, 0, 0, 10]);
        assert_eq!(node.green().as_u8().unwrap(), &[0, 255, 0, 20]);
        assert_eq!(node.blue().as_u8().unwrap(), &[0, 0, 255, 30]);
        assert!(node.alpha().is_empty());
    }

    #[test]
    fn test_split_rgba_keeps_alpha() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let input = ImageBuffer::from_raw_u8(2, 1, 4, data).unwrap();
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(input);
        node.process().unwrap();
        assert_eq!(node.alpha().as_u8().unwrap(), &[4, 8]);
    }

    #[test]
    fn test_merge_reproduces_original() {
        let original = rgb_image();
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(original.clone());
        node.process().unwrap();

        assert_eq!(node.merge_channels(), original);
    }

    #[test]
    fn test_merge_without_split_is_empty() {
        let node = ChannelSplitterNode::new("split", false);
        assert!(node.merge_channels().is_empty());
    }

    #[test]
    fn test_output_passthrough_without_grayscale_flag() {
        let original = rgb_image();
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(original.clone());
        node.process().unwrap();
        assert_eq!(node.output(), &original);
    }

    #[test]
    fn test_output_grayscale_with_flag() {
        let mut node = ChannelSplitterNode::new("split", true);
        node.set_input(rgb_image());
        node.process().unwrap();
        let out = node.output();
        assert_eq!(out.channels(), 1);
        // Pure red pixel -> 0.299 * 255 = 76.
        assert_eq!(out.sample(0, 0, 0), 76.0);
    }

    #[test]
    fn test_single_channel_input_nothing_to_split() {
        let gray = ImageBuffer::from_raw_u8(2, 2, 1, vec![9; 4]).unwrap();
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(gray);
        node.process().unwrap();
        assert!(node.red().is_empty());
        assert!(node.merge_channels().is_empty());
    }

    #[test]
    fn test_missing_input_clears_channels() {
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(rgb_image());
        node.process().unwrap();
        assert!(!node.red().is_empty());

        node.set_input(ImageBuffer::empty());
        assert!(matches!(
            node.process(),
            Err(NodeError::MissingInput { .. })
        ));
        assert!(node.red().is_empty());
    }

    #[test]
    fn test_grayscale_parameter() {
        let mut node = ChannelSplitterNode::new("split", false);
        node.set_input(rgb_image());
        node.set_parameter("grayscale", Value::Boolean(true)).unwrap();
        assert!(node.output_grayscale());
        assert_eq!(node.output().channels(), 1);
    }
}
