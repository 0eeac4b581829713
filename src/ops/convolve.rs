//! Same-size 2-D convolution with reflected borders.
//!
//! Applies a [`Kernel`] to every channel of a buffer independently.
//! Borders are handled by reflecting coordinates about the edge pixel
//! (`gfedcb|abcdefgh|gfedcba`), so no border pixel is duplicated and
//! the output has the same dimensions as the input.

use crate::core::buffer::{ImageBuffer, SampleType};
use crate::ops::kernel::Kernel;

/// Reflect an out-of-range coordinate back into `[0, len)`.
///
/// Reflection is about the edge sample itself, matching the border mode
/// of the convolution. A length-1 axis always maps to 0.
pub fn reflect(idx: i64, len: u32) -> u32 {
    debug_assert!(len > 0);
    if len == 1 {
        return 0;
    }
    let len = i64::from(len);
    // Fold into the repeating period [0, 2 * (len - 1)).
    let period = 2 * (len - 1);
    let mut i = idx.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as u32
}

/// Convolve `input` with `kernel`, producing a same-size buffer of the
/// same sample type. 8-bit outputs are saturated to `[0, 255]`; float
/// outputs are left unclamped.
///
/// The empty buffer convolves to the empty buffer.
pub fn convolve(input: &ImageBuffer, kernel: &Kernel) -> ImageBuffer {
    if input.is_empty() {
        return ImageBuffer::empty();
    }

    let width = input.width();
    let height = input.height();
    let channels = input.channels();
    let r = kernel.radius();
    let ksize = kernel.size();

    let mut out = vec![0.0f32; input.sample_count()];
    let stride = channels as usize;

    for y in 0..height {
        for x in 0..width {
            let base = (y as usize * width as usize + x as usize) * stride;
            for c in 0..channels {
                let mut acc = 0.0f32;
                for ky in 0..ksize {
                    let sy = reflect(i64::from(y) + ky as i64 - r, height);
                    for kx in 0..ksize {
                        let sx = reflect(i64::from(x) + kx as i64 - r, width);
                        acc += kernel.at(kx, ky) * input.sample(sx, sy, c);
                    }
                }
                out[base + c as usize] = acc;
            }
        }
    }

    let result = match input.sample_type() {
        SampleType::U8 => ImageBuffer::from_raw_u8(
            width,
            height,
            channels,
            out.iter()
                .map(|&s| s.round().clamp(0.0, 255.0) as u8)
                .collect(),
        ),
        SampleType::F32 => ImageBuffer::from_raw_f32(width, height, channels, out),
    };

    // Channel count and length come straight from a non-empty input, so
    // construction cannot fail.
    result.unwrap_or_else(|_| ImageBuffer::empty())
}
