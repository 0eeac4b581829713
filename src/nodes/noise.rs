//! Procedural noise node.
//!
//! Synthesizes a single-channel noise field at the input's resolution
//! and either tints the image with it (color usage) or uses it as a
//! per-pixel displacement map (displacement usage). Three noise
//! families are available (gradient/Perlin-style, simplex-style, and
//! cellular/Worley), all built on a deterministic integer hash so the
//! same seed always reproduces the same field.
//!
//! Fractal parameters follow the usual octave model: each octave
//! doubles the frequency and scales amplitude by the persistence.

use crate::core::buffer::ImageBuffer;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{reprocess_after_set, NodeKind, TransformNode};
use crate::core::value::Value;
use crate::nodes::{expect_bool, expect_float, expect_integer, expect_text, unknown_parameter};
use crate::ops::sample_bilinear;
use serde::{Deserialize, Serialize};

/// Additive weight of the noise field in color usage.
const COLOR_BLEND_STRENGTH: f32 = 0.2;

/// Pixel offset magnitude in displacement usage.
const DISPLACEMENT_STRENGTH: f32 = 20.0;

/// Smallest accepted frequency; lower requests are floored here.
const MIN_SCALE: f32 = 0.001;

/// Noise family to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    /// Lattice gradient noise (Perlin-style).
    Gradient,
    /// Simplex-style noise on a skewed triangular grid.
    Simplex,
    /// Cellular (Worley) noise: distance to the nearest feature point.
    Cellular,
}

impl NoiseKind {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gradient" | "perlin" => Some(NoiseKind::Gradient),
            "simplex" => Some(NoiseKind::Simplex),
            "cellular" | "worley" => Some(NoiseKind::Cellular),
            _ => None,
        }
    }
}

/// How the synthesized field is applied to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseUsage {
    /// Blend the field additively into the image.
    Color,
    /// Treat the field as a per-pixel displacement map.
    Displacement,
}

// ---------------------------------------------------------------------
// Hash-based noise primitives
// ---------------------------------------------------------------------

/// Integer avalanche hash.
#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

/// Hash a lattice point to `[0, 1)`.
#[inline]
fn hash_f32(x: i32, y: i32, seed: u32) -> f32 {
    let h = hash_u32(
        (x as u32)
            .wrapping_mul(374_761_393)
            .wrapping_add((y as u32).wrapping_mul(668_265_263))
            .wrapping_add(seed),
    );
    (h & 0x00FF_FFFF) as f32 / 16_777_216.0
}

/// Hash a lattice point to a unit gradient vector.
#[inline]
fn gradient_at(x: i32, y: i32, seed: u32) -> (f32, f32) {
    let angle = hash_f32(x, y, seed) * std::f32::consts::TAU;
    angle.sin_cos()
}

/// Quintic fade curve, zero first and second derivatives at 0 and 1.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// 2-D lattice gradient noise, roughly in `[-1, 1]`.
fn gradient_noise(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let fx = x - xi as f32;
    let fy = y - yi as f32;

    let dot = |gx: i32, gy: i32| {
        let (sin, cos) = gradient_at(gx, gy, seed);
        let dx = x - gx as f32;
        let dy = y - gy as f32;
        cos * dx + sin * dy
    };

    let u = fade(fx);
    let v = fade(fy);
    let top = dot(xi, yi) + u * (dot(xi + 1, yi) - dot(xi, yi));
    let bottom = dot(xi, yi + 1) + u * (dot(xi + 1, yi + 1) - dot(xi, yi + 1));
    // sqrt(2) compensates for the diagonal reach of unit gradients.
    (top + v * (bottom - top)) * std::f32::consts::SQRT_2
}

/// 2-D simplex-style noise on a skewed triangular grid, roughly `[-1, 1]`.
fn simplex_noise(x: f32, y: f32, seed: u32) -> f32 {
    const F2: f32 = 0.366_025_42; // (sqrt(3) - 1) / 2
    const G2: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6

    let s = (x + y) * F2;
    let i = (x + s).floor();
    let j = (y + s).floor();
    let t = (i + j) * G2;
    let x0 = x - (i - t);
    let y0 = y - (j - t);

    let (i1, j1) = if x0 > y0 { (1.0, 0.0) } else { (0.0, 1.0) };
    let x1 = x0 - i1 + G2;
    let y1 = y0 - j1 + G2;
    let x2 = x0 - 1.0 + 2.0 * G2;
    let y2 = y0 - 1.0 + 2.0 * G2;

    let corner = |cx: f32, cy: f32, gi: i32, gj: i32| {
        let t = 0.5 - cx * cx - cy * cy;
        if t <= 0.0 {
            return 0.0;
        }
        let (sin, cos) = gradient_at(gi, gj, seed);
        let t = t * t;
        t * t * (cos * cx + sin * cy)
    };

    let n0 = corner(x0, y0, i as i32, j as i32);
    let n1 = corner(x1, y1, i as i32 + i1 as i32, j as i32 + j1 as i32);
    let n2 = corner(x2, y2, i as i32 + 1, j as i32 + 1);

    // 70 scales the contribution sum into [-1, 1].
    70.0 * (n0 + n1 + n2)
}

/// 2-D cellular (Worley) noise: distance to the nearest feature point,
/// in `[0, ~1.4]` before normalization.
fn cellular_noise(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;

    let mut min_dist = f32::MAX;
    for cy in (yi - 1)..=(yi + 1) {
        for cx in (xi - 1)..=(xi + 1) {
            let fx = cx as f32 + hash_f32(cx, cy, seed);
            let fy = cy as f32 + hash_f32(cx, cy, seed.wrapping_add(1));
            let dx = x - fx;
            let dy = y - fy;
            let dist = dx.hypot(dy);
            if dist < min_dist {
                min_dist = dist;
            }
        }
    }
    min_dist
}

/// Sum `octaves` layers of the base noise, doubling frequency and
/// scaling amplitude by `persistence` each layer.
fn fractal_noise(
    kind: NoiseKind,
    x: f32,
    y: f32,
    scale: f32,
    octaves: u32,
    persistence: f32,
    seed: u32,
) -> f32 {
    let mut total = 0.0;
    let mut frequency = scale;
    let mut amplitude = 1.0;
    for octave in 0..octaves {
        let octave_seed = seed.wrapping_add(octave);
        let sample = match kind {
            NoiseKind::Gradient => gradient_noise(x * frequency, y * frequency, octave_seed),
            NoiseKind::Simplex => simplex_noise(x * frequency, y * frequency, octave_seed),
            NoiseKind::Cellular => cellular_noise(x * frequency, y * frequency, octave_seed),
        };
        total += sample * amplitude;
        frequency *= 2.0;
        amplitude *= persistence;
    }
    total
}

/// Evaluate the fractal noise at every integer pixel coordinate and
/// min-max normalize the field to `[0, 1]`. A constant field (possible
/// on degenerate parameters) normalizes to all zeros.
fn synthesize_field(
    kind: NoiseKind,
    width: u32,
    height: u32,
    scale: f32,
    octaves: u32,
    persistence: f32,
    seed: u32,
) -> Vec<f32> {
    let mut field = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            field.push(fractal_noise(
                kind,
                x as f32,
                y as f32,
                scale,
                octaves,
                persistence,
                seed,
            ));
        }
    }

    let min = field.iter().copied().fold(f32::MAX, f32::min);
    let max = field.iter().copied().fold(f32::MIN, f32::max);
    let range = max - min;
    if range > 0.0 {
        for v in &mut field {
            *v = (*v - min) / range;
        }
    } else {
        field.fill(0.0);
    }
    field
}

// ---------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------

/// Synthesizes procedural noise over its input.
#[derive(Debug, Clone)]
pub struct NoiseNode {
    id: String,
    name: String,
    input: ImageBuffer,
    output: ImageBuffer,
    kind: NoiseKind,
    scale: f32,
    octaves: u32,
    persistence: f32,
    usage: NoiseUsage,
    seed: u32,
}

impl NoiseNode {
    /// Create a noise node (gradient noise, scale 0.05, 3 octaves,
    /// persistence 0.5, color usage).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("noise_{}", name),
            name,
            input: ImageBuffer::empty(),
            output: ImageBuffer::empty(),
            kind: NoiseKind::Gradient,
            scale: 0.05,
            octaves: 3,
            persistence: 0.5,
            usage: NoiseUsage::Color,
            seed: 1337,
        }
    }

    /// Active noise family.
    pub fn noise_kind(&self) -> NoiseKind {
        self.kind
    }

    /// Frequency of the base octave.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Number of fractal octaves (1-10).
    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Per-octave amplitude falloff (0-1).
    pub fn persistence(&self) -> f32 {
        self.persistence
    }

    /// How the field is applied.
    pub fn usage(&self) -> NoiseUsage {
        self.usage
    }

    /// Select the noise family and reprocess.
    pub fn set_noise_kind(&mut self, kind: NoiseKind) -> NodeResult<()> {
        self.kind = kind;
        reprocess_after_set(self)
    }

    /// Set the base frequency (floored at 0.001) and reprocess.
    pub fn set_scale(&mut self, scale: f32) -> NodeResult<()> {
        self.scale = scale.max(MIN_SCALE);
        reprocess_after_set(self)
    }

    /// Set the octave count (clamped to 1-10) and reprocess.
    pub fn set_octaves(&mut self, octaves: u32) -> NodeResult<()> {
        self.octaves = octaves.clamp(1, 10);
        reprocess_after_set(self)
    }

    /// Set the persistence (clamped to 0-1) and reprocess.
    pub fn set_persistence(&mut self, persistence: f32) -> NodeResult<()> {
        self.persistence = persistence.clamp(0.0, 1.0);
        reprocess_after_set(self)
    }

    /// Select color or displacement usage and reprocess.
    pub fn set_usage(&mut self, usage: NoiseUsage) -> NodeResult<()> {
        self.usage = usage;
        reprocess_after_set(self)
    }

    /// Set the hash seed and reprocess.
    pub fn set_seed(&mut self, seed: u32) -> NodeResult<()> {
        self.seed = seed;
        reprocess_after_set(self)
    }

    fn synthesize(&self, width: u32, height: u32) -> Vec<f32> {
        synthesize_field(
            self.kind,
            width,
            height,
            self.scale,
            self.octaves,
            self.persistence,
            self.seed,
        )
    }

    /// Color usage: add the field (weight 0.2) onto every channel of
    /// the normalized input, then min-max renormalize to `[0, 1]`.
    fn apply_color(&self, field: &[f32]) -> ImageBuffer {
        let input = self.input.to_u8().to_f32();
        let channels = input.channels() as usize;
        let samples = match input.as_f32() {
            Some(s) => s,
            None => return ImageBuffer::empty(),
        };

        let mut combined: Vec<f32> = samples
            .iter()
            .enumerate()
            .map(|(i, &v)| v + field[i / channels] * COLOR_BLEND_STRENGTH)
            .collect();

        let min = combined.iter().copied().fold(f32::MAX, f32::min);
        let max = combined.iter().copied().fold(f32::MIN, f32::max);
        let range = max - min;
        if range > 0.0 {
            for v in &mut combined {
                *v = (*v - min) / range;
            }
        }

        ImageBuffer::from_raw_f32(
            input.width(),
            input.height(),
            input.channels(),
            combined,
        )
        .map(|buf| buf.to_u8())
        .unwrap_or_else(|_| ImageBuffer::empty())
    }

    /// Displacement usage: offset both coordinates by
    /// `(field - 0.5) * 2 * strength` and resample the input with
    /// bilinear interpolation and reflected borders.
    fn apply_displacement(&self, field: &[f32]) -> ImageBuffer {
        let input = self.input.to_u8();
        let width = input.width();
        let height = input.height();
        let channels = input.channels();

        let mut warped = Vec::with_capacity(input.sample_count());
        for y in 0..height {
            for x in 0..width {
                let noise = field[(y * width + x) as usize];
                let displacement = (noise - 0.5) * 2.0 * DISPLACEMENT_STRENGTH;
                let sx = x as f32 + displacement;
                let sy = y as f32 + displacement;
                for c in 0..channels {
                    let sample = sample_bilinear(&input, sx, sy, c);
                    warped.push(sample.round().clamp(0.0, 255.0) as u8);
                }
            }
        }
        ImageBuffer::from_raw_u8(width, height, channels, warped)
            .unwrap_or_else(|_| ImageBuffer::empty())
    }
}

impl TransformNode for NoiseNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Noise
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

        let field = self.synthesize(self.input.width(), self.input.height());
        self.output = match self.usage {
            NoiseUsage::Color => self.apply_color(&field),
            NoiseUsage::Displacement => self.apply_displacement(&field),
        };
        Ok(())
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> NodeResult<()> {
        match name {
            "kind" => {
                let text = expect_text(&self.name, name, &value)?;
                let kind = NoiseKind::parse(text).ok_or_else(|| NodeError::InvalidParameter {
                    node: self.name.clone(),
                    parameter: name.to_string(),
                    reason: format!(
                        "unknown noise kind '{}': expected gradient, simplex, or cellular",
                        text
                    ),
                })?;
                self.set_noise_kind(kind)
            }
            "scale" => {
                let scale = expect_float(&self.name, name, &value)?;
                self.set_scale(scale as f32)
            }
            "octaves" => {
                let octaves = expect_integer(&self.name, name, &value)?;
                self.set_octaves(octaves.max(0) as u32)
            }
            "persistence" => {
                let persistence = expect_float(&self.name, name, &value)?;
                self.set_persistence(persistence as f32)
            }
            "displacement" => {
                let on = expect_bool(&self.name, name, &value)?;
                self.set_usage(if on {
                    NoiseUsage::Displacement
                } else {
                    NoiseUsage::Color
                })
            }
            "seed" => {
                let seed = expect_integer(&self.name, name, &value)?;
                self.set_seed(seed as u32)
            }
            other => Err(unknown_parameter(&self.name, other)),
        }
    }
}
