//! Image input node: the source end of a pipeline.
//!
//! Holds a file path and loads it through the codec boundary on every
//! `process()`. A failed load is logged and leaves the previous output
//! in place, so an injected in-memory image (via
//! [`ImageInputNode::set_output`]) survives passes where the path is
//! invalid. Tests and callers without files on disk rely on this.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{NodeKind, TransformNode};
use crate::core::value::Value;
use crate::io::load_image;
use crate::nodes::{expect_text, unknown_parameter};
use std::path::{Path, PathBuf};

/// Loads an image file into its output.
#[derive(Debug, Clone)]
pub struct ImageInputNode {
    id: String,
    name: String,
    path: PathBuf,
    loaded: ImageBuffer,
    output: ImageBuffer,
}

impl ImageInputNode {
    /// Create an input node for the given file path.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            id: format!("image_input_{}", name),
            name,
            path: path.into(),
            loaded: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
        }
    }

    /// The configured source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point the node at a different file and reload immediately.
    pub fn set_source_path(&mut self, path: impl Into<PathBuf>) -> NodeResult<()> {
        self.path = path.into();
        self.process()
    }

    /// Inject an in-memory image as this node's output, bypassing the
    /// file load.
    pub fn set_output(&mut self, output: ImageBuffer) {
        self.output = output;
    }

    /// Replace the output with a luma view of the loaded image.
    pub fn to_grayscale(&mut self) {
        if self.loaded.is_empty() {
            log::warn!("no image loaded on '{}' to convert to grayscale", self.name);
            return;
        }
        self.output = self.loaded.to_luma();
        log::info!("converted '{}' to grayscale", self.name);
    }
}

impl TransformNode for ImageInputNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::ImageInput
    }

    /// Source nodes have no upstream input; the buffer is dropped.
    fn set_input(&mut self, _input: ImageBuffer) {}

    fn process(&mut self) -> NodeResult<()> {
        match load_image(&self.path) {
            Ok(buffer) => {
                self.loaded = buffer;
                self.output = self.loaded.clone();
                Ok(())
            }
            Err(err) => {
                // Keep whatever output we had (possibly injected).
                log::error!("failed to load image for '{}': {}", self.name, err);
                Ok(())
            }
        }
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "path" => {
                let path = expect_text(&self.name, name, &value)?;
                self.set_source_path(path)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{save_image, SaveFormat};

    fn color_image() -> ImageBuffer {
        let data: Vec<u8> = (0..4 * 4 * 3).map(|i| (i * 5 % 256) as u8).collect();
        ImageBuffer::from_raw_u8(4, 4, 3, data).unwrap()
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        save_image(&path, &color_image(), SaveFormat::Png, 90).unwrap();

        let mut node = ImageInputNode::new("src", &path);
        node.process().unwrap();
        assert_eq!(node.output(), &color_image());
    }

    #[test]
    fn test_missing_file_keeps_previous_output() {
        let mut node = ImageInputNode::new("src", "/no/such/file.png");
        node.set_output(color_image());
        node.process().unwrap();
        assert_eq!(node.output(), &color_image());
    }

    #[test]
    fn test_missing_file_without_override_is_empty() {
        let mut node = ImageInputNode::new("src", "/no/such/file.png");
        node.process().unwrap();
        assert!(node.output().is_empty());
    }

    #[test]
    fn test_to_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        save_image(&path, &color_image(), SaveFormat::Png, 90).unwrap();

        let mut node = ImageInputNode::new("src", &path);
        node.process().unwrap();
        node.to_grayscale();
        assert_eq!(node.output().channels(), 1);
    }

    #[test]
    fn test_grayscale_without_load_is_noop() {
        let mut node = ImageInputNode::new("src", "/no/such/file.png");
        node.set_output(color_image());
        node.to_grayscale();
        // Injected output untouched: nothing was loaded.
        assert_eq!(node.output().channels(), 3);
    }

    #[test]
    fn test_path_parameter_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.png");
        save_image(&path, &color_image(), SaveFormat::Png, 90).unwrap();

        let mut node = ImageInputNode::new("src", "/nowhere.png");
        node.process().unwrap();
        assert!(node.output().is_empty());

        node.set_parameter("path", Value::from(path.to_str().unwrap()))
            .unwrap();
        assert!(!node.output().is_empty());
    }
}
