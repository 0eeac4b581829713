//! Output node: the sink end of a pipeline.
//!
//! Encodes its input to disk when processed. The save result is kept as
//! a status flag rather than an error: a failed write is logged and
//! the pipeline keeps running. Unlike the transform nodes, parameter
//! setters here do not trigger reprocessing: a sink with filesystem
//! side effects writes only when explicitly processed.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{NodeKind, TransformNode};
use crate::core::value::Value;
use crate::io::{save_image, SaveFormat};
use crate::nodes::{expect_integer, expect_text, unknown_parameter};
use std::path::{Path, PathBuf};

/// Saves its input to a file.
#[derive(Debug, Clone)]
pub struct OutputNode {
    id: String,
    name: String,
    input: ImageBuffer,
    save_path: PathBuf,
    format: SaveFormat,
    quality: u8,
    last_save_ok: bool,
}

impl OutputNode {
    /// Create an output node. `save_path` is the path without
    /// extension; the format's canonical extension is appended when
    /// saving.
    pub fn new(
        name: impl Into<String>,
        save_path: impl Into<PathBuf>,
        format: SaveFormat,
        quality: u8,
    ) -> Self {
        let name = name.into();
        Self {
            id: format!("output_{}", name),
            name,
            input: ImageBuffer::empty(),
            save_path: save_path.into(),
            format,
            quality: quality.clamp(1, 100),
            last_save_ok: false,
        }
    }

    /// The configured save path (without extension).
    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// The configured output format.
    pub fn format(&self) -> SaveFormat {
        self.format
    }

    /// The configured quality (JPEG quality or PNG compression source).
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Whether the most recent `process()` saved successfully.
    pub fn last_save_ok(&self) -> bool {
        self.last_save_ok
    }

    /// Change the save path. Takes effect on the next `process()`.
    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) {
        self.save_path = path.into();
    }

    /// Change the output format. Takes effect on the next `process()`.
    pub fn set_format(&mut self, format: SaveFormat) {
        self.format = format;
    }

    /// Change the quality (clamped to 1-100). Takes effect on the next
    /// `process()`.
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(1, 100);
    }

    /// The full destination path with extension.
    pub fn full_path(&self) -> PathBuf {
        let mut path = self.save_path.clone();
        let stem = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.set_file_name(format!("{}.{}", stem, self.format.extension()));
        path
    }
}

impl TransformNode for OutputNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Output
    }

    fn set_input(&mut self, input: ImageBuffer) {
        self.input = input;
    }

    fn process(&mut self) -> NodeResult<()> {
        if self.input.is_empty() {
            self.last_save_ok = false;
            return Err(NodeError::MissingInput {
                node: self.name.clone(),
            });
        }

        let path = self.full_path();
        match save_image(&path, &self.input, self.format, self.quality) {
            Ok(()) => {
                self.last_save_ok = true;
                log::info!("saved output of '{}' to {}", self.name, path.display());
            }
            Err(err) => {
                self.last_save_ok = false;
                log::error!("failed to save output of '{}': {}", self.name, err);
            }
        }
        Ok(())
    }

    /// Sinks pass their input through unchanged.
    fn output(&self) -> &ImageBuffer {
        &self.input
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "path" => {
                let path = expect_text(&self.name, name, &value)?;
                self.set_save_path(path);
                Ok(())
            }
            "format" => {
                let text = expect_text(&self.name, name, &value)?;
                let format = SaveFormat::parse(text).map_err(|_| NodeError::InvalidParameter {
                    node: self.name.clone(),
                    parameter: name.to_string(),
                    reason: format!("unsupported format '{}'", text),
                })?;
                self.set_format(format);
                Ok(())
            }
            "quality" => {
                let quality = expect_integer(&self.name, name, &value)?;
                if !(1..=100).contains(&quality) {
                    return Err(NodeError::InvalidParameter {
                        node: self.name.clone(),
                        parameter: name.to_string(),
                        reason: "quality must be in 1-100".to_string(),
                    });
                }
                self.set_quality(quality as u8);
                Ok(())
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_image;

    fn test_image() -> ImageBuffer {
        ImageBuffer::from_raw_u8(4, 4, 3, vec![120; 48]).unwrap()
    }

    #[test]
    fn test_save_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("result");

        let mut node = OutputNode::new("sink", &base, SaveFormat::Png, 80);
        node.set_input(test_image());
        node.process().unwrap();

        assert!(node.last_save_ok());
        let saved = load_image(dir.path().join("result.png")).unwrap();
        assert_eq!(saved, test_image());
    }

    #[test]
    fn test_missing_input_does_not_save() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("never");

        let mut node = OutputNode::new("sink", &base, SaveFormat::Png, 80);
        assert!(matches!(
            node.process(),
            Err(NodeError::MissingInput { .. })
        ));
        assert!(!node.last_save_ok());
        assert!(!dir.path().join("never.png").exists());
    }

    #[test]
    fn test_unwritable_path_is_not_fatal() {
        let mut node = OutputNode::new("sink", "/no/such/dir/result", SaveFormat::Png, 80);
        node.set_input(test_image());
        // The save fails but process() recovers.
        node.process().unwrap();
        assert!(!node.last_save_ok());
    }

    #[test]
    fn test_full_path_appends_extension() {
        let node = OutputNode::new("sink", "/tmp/picture", SaveFormat::Jpeg, 90);
        assert_eq!(node.full_path(), PathBuf::from("/tmp/picture.jpg"));
    }

    #[test]
    fn test_output_is_passthrough() {
        let mut node = OutputNode::new("sink", "/tmp/x", SaveFormat::Png, 80);
        node.set_input(test_image());
        assert_eq!(node.output(), &test_image());
    }

    #[test]
    fn test_quality_clamped() {
        let mut node = OutputNode::new("sink", "/tmp/x", SaveFormat::Jpeg, 200);
        assert_eq!(node.quality(), 100);
        node.set_quality(0);
        assert_eq!(node.quality(), 1);
        assert!(node.set_parameter("quality", Value::Integer(150)).is_err());
    }

    #[test]
    fn test_format_parameter() {
        let mut node = OutputNode::new("sink", "/tmp/x", SaveFormat::Png, 80);
        node.set_parameter("format", Value::from("jpeg")).unwrap();
        assert_eq!(node.format(), SaveFormat::Jpeg);
        assert!(node.set_parameter("format", Value::from("tiff")).is_err());
    }
}
