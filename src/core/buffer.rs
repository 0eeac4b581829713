//! The raster buffer type that flows between nodes.
//!
//! Every transform reads and writes [`ImageBuffer`]: an owned, contiguous,
//! interleaved 2-D grid of samples with 1, 3, or 4 channels and either
//! 8-bit unsigned or 32-bit float samples. A buffer is either *empty*
//! (zero dimensions, nothing allocated) or fully allocated and
//! rectangular; there is no partially-initialized state.
//!
//! Buffers are value types. Nodes own their input and output buffers
//! exclusively, and every cross-node transfer is a copy, so mutating one
//! node's input can never affect another node's output.

use crate::core::error::BufferError;
use std::fmt;

/// Per-sample storage type of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// 8-bit unsigned samples in `[0, 255]`.
    U8,
    /// 32-bit float samples, nominally in `[0, 1]`.
    F32,
}

/// Contiguous sample storage, interleaved by channel.
#[derive(Clone, PartialEq)]
enum Samples {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

/// An owned 2-D raster image.
///
/// Samples are stored row-major, channels interleaved: the sample for
/// channel `c` of pixel `(x, y)` lives at index
/// `(y * width + x) * channels + c`.
#[derive(Clone, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    samples: Samples,
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sample_type", &self.sample_type())
            .finish()
    }
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

fn check_channels(channels: u8) -> Result<(), BufferError> {
    match channels {
        1 | 3 | 4 => Ok(()),
        other => Err(BufferError::InvalidChannelCount(other)),
    }
}

fn check_len(
    width: u32,
    height: u32,
    channels: u8,
    len: usize,
) -> Result<(), BufferError> {
    let expected = width as usize * height as usize * channels as usize;
    if len == expected {
        Ok(())
    } else {
        Err(BufferError::LengthMismatch {
            expected,
            got: len,
            width,
            height,
            channels,
        })
    }
}

impl ImageBuffer {
    /// The empty buffer: zero dimensions, no storage.
    ///
    /// Transforms treat an empty input as a missing input and leave their
    /// own output empty.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 0,
            samples: Samples::U8(Vec::new()),
        }
    }

    /// Allocate a zero-filled 8-bit buffer.
    ///
    /// Fails with [`BufferError::InvalidChannelCount`] unless `channels`
    /// is 1, 3, or 4.
    pub fn new_u8(width: u32, height: u32, channels: u8) -> Result<Self, BufferError> {
        check_channels(channels)?;
        let len = width as usize * height as usize * channels as usize;
        Ok(Self {
            width,
            height,
            channels,
            samples: Samples::U8(vec![0; len]),
        })
    }

    /// Allocate a zero-filled float buffer.
    pub fn new_f32(width: u32, height: u32, channels: u8) -> Result<Self, BufferError> {
        check_channels(channels)?;
        let len = width as usize * height as usize * channels as usize;
        Ok(Self {
            width,
            height,
            channels,
            samples: Samples::F32(vec![0.0; len]),
        })
    }

    /// Build an 8-bit buffer from raw interleaved samples.
    ///
    /// The sample vector length must equal `width * height * channels`.
    pub fn from_raw_u8(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, BufferError> {
        check_channels(channels)?;
        check_len(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            samples: Samples::U8(data),
        })
    }

    /// Build a float buffer from raw interleaved samples.
    pub fn from_raw_f32(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<f32>,
    ) -> Result<Self, BufferError> {
        check_channels(channels)?;
        check_len(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            samples: Samples::F32(data),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of channels (1, 3, or 4; 0 for the empty buffer).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Storage type of the samples.
    pub fn sample_type(&self) -> SampleType {
        match self.samples {
            Samples::U8(_) => SampleType::U8,
            Samples::F32(_) => SampleType::F32,
        }
    }

    /// `true` if this is the empty buffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total number of samples (`width * height * channels`).
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Whether `other` has the same width and height.
    pub fn same_dimensions(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Raw 8-bit samples, if this buffer stores `U8`.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.samples {
            Samples::U8(v) => Some(v),
            Samples::F32(_) => None,
        }
    }

    /// Mutable raw 8-bit samples, if this buffer stores `U8`.
    pub fn as_u8_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.samples {
            Samples::U8(v) => Some(v),
            Samples::F32(_) => None,
        }
    }

    /// Raw float samples, if this buffer stores `F32`.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.samples {
            Samples::F32(v) => Some(v),
            Samples::U8(_) => None,
        }
    }

    /// Mutable raw float samples, if this buffer stores `F32`.
    pub fn as_f32_mut(&mut self) -> Option<&mut [f32]> {
        match &mut self.samples {
            Samples::F32(v) => Some(v),
            Samples::U8(_) => None,
        }
    }

    /// Read one sample as `f32` in the buffer's native range.
    ///
    /// Out-of-bounds coordinates return 0.0; callers that need border
    /// behavior use the reflected accessors in `ops`.
    pub fn sample(&self, x: u32, y: u32, c: u8) -> f32 {
        if x >= self.width || y >= self.height || c >= self.channels {
            return 0.0;
        }
        let idx = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + c as usize;
        match &self.samples {
            Samples::U8(v) => f32::from(v[idx]),
            Samples::F32(v) => v[idx],
        }
    }

    /// Convert to a float buffer normalized to `[0, 1]`.
    ///
    /// 8-bit samples are divided by 255; float buffers are returned as-is.
    pub fn to_f32(&self) -> ImageBuffer {
        match &self.samples {
            Samples::F32(_) => self.clone(),
            Samples::U8(v) => ImageBuffer {
                width: self.width,
                height: self.height,
                channels: self.channels,
                samples: Samples::F32(v.iter().map(|&s| f32::from(s) / 255.0).collect()),
            },
        }
    }

    /// Convert to an 8-bit buffer.
    ///
    /// Float samples are clamped to `[0, 1]` and scaled by 255; 8-bit
    /// buffers are returned as-is.
    pub fn to_u8(&self) -> ImageBuffer {
        match &self.samples {
            Samples::U8(_) => self.clone(),
            Samples::F32(v) => ImageBuffer {
                width: self.width,
                height: self.height,
                channels: self.channels,
                samples: Samples::U8(
                    v.iter()
                        .map(|&s| (s.clamp(0.0, 1.0) * 255.0).round() as u8)
                        .collect(),
                ),
            },
        }
    }

    /// Extract a single channel as a 1-channel buffer of the same
    /// sample type. Returns the empty buffer when `c` is out of range
    /// or the buffer is empty.
    pub fn channel(&self, c: u8) -> ImageBuffer {
        if self.is_empty() || c >= self.channels {
            return ImageBuffer::empty();
        }
        let stride = self.channels as usize;
        let samples = match &self.samples {
            Samples::U8(v) => {
                Samples::U8(v.iter().skip(c as usize).step_by(stride).copied().collect())
            }
            Samples::F32(v) => {
                Samples::F32(v.iter().skip(c as usize).step_by(stride).copied().collect())
            }
        };
        ImageBuffer {
            width: self.width,
            height: self.height,
            channels: 1,
            samples,
        }
    }

    /// Reduce to a single-channel luma view using the Rec. 601 weights
    /// (0.299 R + 0.587 G + 0.114 B). Single-channel buffers are
    /// returned unchanged; the alpha channel of RGBA input is ignored.
    pub fn to_luma(&self) -> ImageBuffer {
        if self.is_empty() || self.channels == 1 {
            return self.clone();
        }
        let stride = self.channels as usize;
        match &self.samples {
            Samples::U8(v) => {
                let gray = v
                    .chunks_exact(stride)
                    .map(|px| {
                        let luma = 0.299 * f32::from(px[0])
                            + 0.587 * f32::from(px[1])
                            + 0.114 * f32::from(px[2]);
                        luma.round().clamp(0.0, 255.0) as u8
                    })
                    .collect();
                ImageBuffer {
                    width: self.width,
                    height: self.height,
                    channels: 1,
                    samples: Samples::U8(gray),
                }
            }
            Samples::F32(v) => {
                let gray = v
                    .chunks_exact(stride)
                    .map(|px| 0.299 * px[0] + 0.587 * px[1] + 0.114 * px[2])
                    .collect();
                ImageBuffer {
                    width: self.width,
                    height: self.height,
                    channels: 1,
                    samples: Samples::F32(gray),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buf = ImageBuffer::empty();
        assert!(buf.is_empty());
        assert_eq!(buf.width(), 0);
        assert_eq!(buf.height(), 0);
        assert_eq!(buf.sample_count(), 0);
    }

    #[test]
    fn test_invalid_channel_count_rejected() {
        assert!(matches!(
            ImageBuffer::new_u8(4, 4, 2),
            Err(BufferError::InvalidChannelCount(2))
        ));
        assert!(matches!(
            ImageBuffer::new_f32(4, 4, 5),
            Err(BufferError::InvalidChannelCount(5))
        ));
    }

    #[test]
    fn test_raw_length_mismatch_rejected() {
        let result = ImageBuffer::from_raw_u8(2, 2, 3, vec![0; 11]);
        assert!(matches!(result, Err(BufferError::LengthMismatch { .. })));
    }

    #[test]
    fn test_allocation_is_zero_filled() {
        let buf = ImageBuffer::new_u8(3, 2, 3).unwrap();
        assert!(!buf.is_empty());
        assert_eq!(buf.sample_count(), 18);
        assert!(buf.as_u8().unwrap().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_sample_indexing() {
        let data = vec![
            10, 20, 30, // (0,0)
            40, 50, 60, // (1,0)
            70, 80, 90, // (0,1)
            100, 110, 120, // (1,1)
        ];
        let buf = ImageBuffer::from_raw_u8(2, 2, 3, data).unwrap();
        assert_eq!(buf.sample(0, 0, 0), 10.0);
        assert_eq!(buf.sample(1, 0, 2), 60.0);
        assert_eq!(buf.sample(1, 1, 1), 110.0);
        // Out of bounds reads as zero.
        assert_eq!(buf.sample(2, 0, 0), 0.0);
    }

    #[test]
    fn test_f32_round_trip_via_u8() {
        let buf = ImageBuffer::from_raw_u8(2, 1, 1, vec![0, 255]).unwrap();
        let float = buf.to_f32();
        assert_eq!(float.sample_type(), SampleType::F32);
        assert_eq!(float.as_f32().unwrap(), &[0.0, 1.0]);
        let back = float.to_u8();
        assert_eq!(back, buf);
    }

    #[test]
    fn test_to_u8_clamps_out_of_range() {
        let buf = ImageBuffer::from_raw_f32(3, 1, 1, vec![-0.5, 0.5, 1.5]).unwrap();
        let bytes = buf.to_u8();
        assert_eq!(bytes.as_u8().unwrap(), &[0, 128, 255]);
    }

    #[test]
    fn test_channel_extraction() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let buf = ImageBuffer::from_raw_u8(2, 1, 3, data).unwrap();
        let green = buf.channel(1);
        assert_eq!(green.channels(), 1);
        assert_eq!(green.as_u8().unwrap(), &[2, 5]);
        assert!(buf.channel(3).is_empty());
    }

    #[test]
    fn test_luma_weights() {
        let buf = ImageBuffer::from_raw_u8(1, 1, 3, vec![255, 0, 0]).unwrap();
        let gray = buf.to_luma();
        assert_eq!(gray.channels(), 1);
        // 0.299 * 255 = 76.245
        assert_eq!(gray.as_u8().unwrap(), &[76]);
    }

    #[test]
    fn test_luma_of_single_channel_is_identity() {
        let buf = ImageBuffer::from_raw_u8(2, 1, 1, vec![7, 9]).unwrap();
        assert_eq!(buf.to_luma(), buf);
    }
}
