//! Image codec boundary.
//!
//! Everything that touches the `image` crate's decoders and encoders
//! lives here: loading a file into an [`ImageBuffer`], saving a buffer
//! with format-dependent quality, and the conversions between
//! `ImageBuffer` and `image::DynamicImage` that the boundary (and the
//! Canny wrapper in the edge node) needs.
//!
//! Codec failures are surfaced as [`CodecError`] values and never
//! propagate into node or graph state.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{CodecError, CodecResult};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GrayImage, ImageEncoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Output formats the save boundary supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JPEG; quality is the encoder quality, 1-100.
    Jpeg,
    /// PNG; quality is rescaled to a compression level (quality / 10,
    /// clamped to 0-9).
    Png,
}

impl SaveFormat {
    /// Parse a user-supplied format name (`jpg`, `jpeg`, `png`).
    pub fn parse(name: &str) -> CodecResult<Self> {
        match name.to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(SaveFormat::Jpeg),
            "png" => Ok(SaveFormat::Png),
            other => Err(CodecError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Png => "png",
        }
    }
}

/// Load an image from disk into an 8-bit buffer.
///
/// Grayscale files decode to 1 channel, opaque color to 3, color with
/// alpha to 4.
pub fn load_image(path: impl AsRef<Path>) -> CodecResult<ImageBuffer> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CodecError::NotFound(path.to_path_buf()));
    }
    let decoded = image::open(path).map_err(|source| CodecError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(from_dynamic(decoded))
}

/// Save a buffer to disk.
///
/// `quality` is interpreted per format: JPEG encoder quality 1-100, or
/// PNG compression level `quality / 10` clamped to 0-9. JPEG cannot
/// carry an alpha channel, so 4-channel buffers are flattened to RGB
/// first. Float buffers are converted to 8-bit before encoding.
pub fn save_image(
    path: impl AsRef<Path>,
    buffer: &ImageBuffer,
    format: SaveFormat,
    quality: u8,
) -> CodecResult<()> {
    let path = path.as_ref();
    if buffer.is_empty() {
        return Err(CodecError::EmptyBuffer);
    }

    let bytes = buffer.to_u8();
    let writer = BufWriter::new(File::create(path)?);
    let encode = |err| CodecError::Encode {
        path: path.to_path_buf(),
        source: err,
    };

    match format {
        SaveFormat::Jpeg => {
            let quality = quality.clamp(1, 100);
            // JPEG has no alpha; drop it.
            let rgb = if bytes.channels() == 4 {
                let data = bytes
                    .as_u8()
                    .unwrap_or(&[])
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                ImageBuffer::from_raw_u8(bytes.width(), bytes.height(), 3, data)
                    .unwrap_or_else(|_| ImageBuffer::empty())
            } else {
                bytes
            };
            let color = color_type(rgb.channels());
            let encoder = JpegEncoder::new_with_quality(writer, quality);
            encoder
                .write_image(
                    rgb.as_u8().unwrap_or(&[]),
                    rgb.width(),
                    rgb.height(),
                    color,
                )
                .map_err(encode)
        }
        SaveFormat::Png => {
            let compression = match quality / 10 {
                0..=2 => CompressionType::Fast,
                3..=6 => CompressionType::Default,
                _ => CompressionType::Best,
            };
            let encoder = PngEncoder::new_with_quality(writer, compression, FilterType::Adaptive);
            encoder
                .write_image(
                    bytes.as_u8().unwrap_or(&[]),
                    bytes.width(),
                    bytes.height(),
                    color_type(bytes.channels()),
                )
                .map_err(encode)
        }
    }
}

fn color_type(channels: u8) -> image::ExtendedColorType {
    match channels {
        1 => image::ExtendedColorType::L8,
        3 => image::ExtendedColorType::Rgb8,
        _ => image::ExtendedColorType::Rgba8,
    }
}

/// Convert a decoded `DynamicImage` into an 8-bit buffer, preserving
/// the natural channel count (1, 3, or 4).
pub fn from_dynamic(image: DynamicImage) -> ImageBuffer {
    let result = match image {
        DynamicImage::ImageLuma8(gray) => {
            let (w, h) = gray.dimensions();
            ImageBuffer::from_raw_u8(w, h, 1, gray.into_raw())
        }
        DynamicImage::ImageRgba8(rgba) => {
            let (w, h) = rgba.dimensions();
            ImageBuffer::from_raw_u8(w, h, 4, rgba.into_raw())
        }
        other if other.color().has_alpha() => {
            let rgba = other.to_rgba8();
            let (w, h) = rgba.dimensions();
            ImageBuffer::from_raw_u8(w, h, 4, rgba.into_raw())
        }
        other => {
            let rgb = other.to_rgb8();
            let (w, h) = rgb.dimensions();
            ImageBuffer::from_raw_u8(w, h, 3, rgb.into_raw())
        }
    };
    result.unwrap_or_else(|_| ImageBuffer::empty())
}

/// View a single-channel buffer as an `image::GrayImage` for interop
/// with `imageproc`. Returns `None` for empty or multi-channel buffers.
pub fn to_gray_image(buffer: &ImageBuffer) -> Option<GrayImage> {
    if buffer.is_empty() || buffer.channels() != 1 {
        return None;
    }
    let bytes = buffer.to_u8();
    GrayImage::from_raw(bytes.width(), bytes.height(), bytes.as_u8()?.to_vec())
}

/// Wrap an `image::GrayImage` back into a single-channel buffer.
pub fn from_gray_image(image: GrayImage) -> ImageBuffer {
    let (w, h) = image.dimensions();
    ImageBuffer::from_raw_u8(w, h, 1, image.into_raw()).unwrap_or_else(|_| ImageBuffer::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(SaveFormat::parse("jpg").unwrap(), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::parse("JPEG").unwrap(), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::parse("png").unwrap(), SaveFormat::Png);
        assert!(matches!(
            SaveFormat::parse("webp"),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_image("/definitely/not/here.png");
        assert!(matches!(result, Err(CodecError::NotFound(_))));
    }

    #[test]
    fn test_save_empty_buffer_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let result = save_image(&path, &ImageBuffer::empty(), SaveFormat::Png, 90);
        assert!(matches!(result, Err(CodecError::EmptyBuffer)));
    }

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.png");

        let data: Vec<u8> = (0..4 * 3 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let buffer = ImageBuffer::from_raw_u8(4, 3, 3, data).unwrap();

        save_image(&path, &buffer, SaveFormat::Png, 60).unwrap();
        let loaded = load_image(&path).unwrap();
        // PNG is lossless: samples survive exactly.
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn test_jpeg_saves_rgba_without_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.jpg");

        let buffer = ImageBuffer::from_raw_u8(2, 2, 4, vec![128; 16]).unwrap();
        save_image(&path, &buffer, SaveFormat::Jpeg, 90).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.channels(), 3);
        assert_eq!(loaded.width(), 2);
    }

    #[test]
    fn test_gray_image_interop() {
        let buffer = ImageBuffer::from_raw_u8(2, 2, 1, vec![0, 64, 128, 255]).unwrap();
        let gray = to_gray_image(&buffer).unwrap();
        assert_eq!(gray.dimensions(), (2, 2));
        let back = from_gray_image(gray);
        assert_eq!(back, buffer);
    }

    #[test]
    fn test_gray_interop_rejects_color() {
        let buffer = ImageBuffer::new_u8(2, 2, 3).unwrap();
        assert!(to_gray_image(&buffer).is_none());
        assert!(to_gray_image(&ImageBuffer::empty()).is_none());
    }
}
