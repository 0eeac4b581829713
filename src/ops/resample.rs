//! Bilinear resampling with reflected borders.
//!
//! Used by the blend node (resizing input B to input A's dimensions) and
//! the noise node (displacement remapping). Sampling outside the image
//! reflects coordinates back inside, so displaced lookups always hit a
//! valid pixel.

use crate::core::buffer::{ImageBuffer, SampleType};
use crate::ops::convolve::reflect;

/// Sample channel `c` at fractional coordinates `(x, y)` with bilinear
/// interpolation. Coordinates outside the image are reflected inward.
///
/// Returns 0.0 for the empty buffer.
pub fn sample_bilinear(buf: &ImageBuffer, x: f32, y: f32, c: u8) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let xi = x0 as i64;
    let yi = y0 as i64;
    let x0r = reflect(xi, buf.width());
    let x1r = reflect(xi + 1, buf.width());
    let y0r = reflect(yi, buf.height());
    let y1r = reflect(yi + 1, buf.height());

    let p00 = buf.sample(x0r, y0r, c);
    let p10 = buf.sample(x1r, y0r, c);
    let p01 = buf.sample(x0r, y1r, c);
    let p11 = buf.sample(x1r, y1r, c);

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    top + fy * (bottom - top)
}

/// Resize a buffer to `(width, height)` with bilinear interpolation,
/// preserving the sample type. Resizing the empty buffer, or resizing
/// to zero dimensions, yields the empty buffer.
pub fn resize_bilinear(input: &ImageBuffer, width: u32, height: u32) -> ImageBuffer {
    if input.is_empty() || width == 0 || height == 0 {
        return ImageBuffer::empty();
    }
    if input.width() == width && input.height() == height {
        return input.clone();
    }

    let channels = input.channels();
    let sx = input.width() as f32 / width as f32;
    let sy = input.height() as f32 / height as f32;

    let mut out = Vec::with_capacity(width as usize * height as usize * channels as usize);
    for y in 0..height {
        // Map destination pixel centers onto the source grid.
        let src_y = (y as f32 + 0.5) * sy - 0.5;
        for x in 0..width {
            let src_x = (x as f32 + 0.5) * sx - 0.5;
            for c in 0..channels {
                out.push(sample_bilinear(input, src_x, src_y, c));
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
    result.unwrap_or_else(|_| ImageBuffer::empty())
}
