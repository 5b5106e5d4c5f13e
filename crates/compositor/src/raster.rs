//! Pure distance-to-shade rasterization.
//!
//! Everything here is free of I/O and state: the rasterizer maps one decoded
//! 128×128 distance field through an orientation remap, a bilinear sample,
//! and the coverage transfer function, then cross-fades each covered pixel
//! from the previous layer's shade toward the layer's target shade. Pixels
//! the field does not cover are left untouched so prior layers show through.

use crate::asset::{Orientation, RasterVariant};
use crate::types::{Frame, RasterRect};

/// Side length of every decoded distance-field texture.
pub const FIELD_SIZE: usize = 128;

/// Texel count of one decoded field plane.
pub const FIELD_TEXELS: usize = FIELD_SIZE * FIELD_SIZE;

/// Distance range baked into the field textures, in field pixels.
pub const SDF_PIXEL_RANGE: f32 = 4.0;

/// Scale the source artwork was baked at.
pub const SDF_BAKE_SCALE: f32 = 0.5;

/// Coverage slope applied to raw samples: pixel range over bake scale.
pub const SDF_RANGE: f32 = SDF_PIXEL_RANGE / SDF_BAKE_SCALE;

/// One decoded 128×128 8-bit distance-field plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceField {
    texels: Box<[u8]>,
}

impl Default for DistanceField {
    fn default() -> Self {
        Self {
            texels: vec![0; FIELD_TEXELS].into_boxed_slice(),
        }
    }
}

impl DistanceField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texel(&self, x: usize, y: usize) -> u8 {
        self.texels[y * FIELD_SIZE + x]
    }

    pub fn set_texel(&mut self, x: usize, y: usize, value: u8) {
        self.texels[y * FIELD_SIZE + x] = value;
    }

    /// Overwrites the plane from a decoded buffer of exactly
    /// [`FIELD_TEXELS`] bytes.
    pub fn fill_from(&mut self, data: &[u8]) {
        self.texels.copy_from_slice(data);
    }

    pub fn fill(&mut self, value: u8) {
        self.texels.fill(value);
    }

    /// Bilinearly samples the plane at normalized `(u, v)`, returning [0, 1].
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let max = (FIELD_SIZE - 1) as f32;
        let fx = (u.clamp(0.0, 1.0) * max).min(max);
        let fy = (v.clamp(0.0, 1.0) * max).min(max);
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(FIELD_SIZE - 1);
        let y1 = (y0 + 1).min(FIELD_SIZE - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = lerp(
            self.texel(x0, y0) as f32,
            self.texel(x1, y0) as f32,
            tx,
        );
        let bottom = lerp(
            self.texel(x0, y1) as f32,
            self.texel(x1, y1) as f32,
            tx,
        );
        lerp(top, bottom, ty) / 255.0
    }
}

/// Per-layer dynamic parameters applied at sample time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerParams {
    /// Horizontal parallax shift in normalized output space.
    pub offset: f32,
    /// Coverage multiplier for fade effects.
    pub opacity: f32,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            offset: 0.0,
            opacity: 1.0,
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn dist_val_with_range(sample: f32, range: f32) -> f32 {
    (sample - 0.5) * range + 0.5
}

/// Converts a raw field sample in [0, 1] to a coverage value.
pub fn dist_val(sample: f32) -> f32 {
    dist_val_with_range(sample, SDF_RANGE)
}

/// Coverage for inverted variants; equals `1 - dist_val(sample)`.
pub fn dist_val_inverted(sample: f32) -> f32 {
    1.0 - dist_val(sample)
}

/// Cubic Hermite blend from `a` to `b` by `t`, clamped to [0, 1].
pub fn smooth_step(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let t = t * t * (3.0 - 2.0 * t);
    a + (b - a) * t
}

fn remap(orientation: Orientation, u: f32, v: f32) -> (f32, f32) {
    match orientation {
        Orientation::Identity => (u, v),
        Orientation::Rot90Cw => (v, 1.0 - u),
        Orientation::Rot90Ccw => (1.0 - v, u),
        Orientation::Rot180 => (1.0 - u, 1.0 - v),
    }
}

/// Rasterizes one decoded layer into `frame` over `rect`.
///
/// Covered pixels cross-fade from `last_shade` toward `target_shade` by the
/// coverage value; uncovered pixels keep whatever earlier layers wrote.
#[allow(clippy::too_many_arguments)]
pub fn rasterize_layer(
    field: &DistanceField,
    rect: &RasterRect,
    variant: RasterVariant,
    params: LayerParams,
    last_shade: u8,
    target_shade: u8,
    frame: &mut Frame,
) {
    for y in 0..rect.height {
        let v = (y as f32 + 0.5) * rect.inv_height;
        for x in 0..rect.width {
            let u = (x as f32 + 0.5) * rect.inv_width + params.offset;
            if !(0.0..=1.0).contains(&u) {
                continue;
            }
            let Some(alpha) = coverage_at(field, variant, params.opacity, u, v) else {
                continue;
            };
            let shade = smooth_step(last_shade as f32, target_shade as f32, alpha)
                .round()
                .clamp(0.0, 255.0) as u8;
            frame.set(rect.x + x as i32, rect.y + y as i32, shade);
        }
    }
}

/// Accumulates layer coverage into an 8-bit opacity plane.
///
/// Each covered pixel keeps the maximum coverage seen so far, so repeated
/// accumulation only ever widens the mask.
pub fn accumulate_mask(
    field: &DistanceField,
    rect: &RasterRect,
    variant: RasterVariant,
    mask: &mut Frame,
) {
    for y in 0..rect.height {
        let v = (y as f32 + 0.5) * rect.inv_height;
        for x in 0..rect.width {
            let u = (x as f32 + 0.5) * rect.inv_width;
            let Some(alpha) = coverage_at(field, variant, 1.0, u, v) else {
                continue;
            };
            let px = rect.x + x as i32;
            let py = rect.y + y as i32;
            let value = (alpha * 255.0).round() as u8;
            if value > mask.get(px, py) {
                mask.set(px, py, value);
            }
        }
    }
}

/// Scales `frame` in place by the opacity plane built by [`accumulate_mask`].
pub fn composite_masked(frame: &mut Frame, mask: &Frame) {
    debug_assert_eq!(frame.as_bytes().len(), mask.as_bytes().len());
    for (pixel, &opacity) in frame.as_bytes_mut().iter_mut().zip(mask.as_bytes()) {
        *pixel = ((*pixel as u16 * opacity as u16 + 127) / 255) as u8;
    }
}

fn coverage_at(
    field: &DistanceField,
    variant: RasterVariant,
    opacity: f32,
    u: f32,
    v: f32,
) -> Option<f32> {
    let (su, sv) = remap(variant.orientation, u, v);
    let sample = field.sample(su, sv);
    let alpha = if variant.inverted {
        dist_val_inverted(sample)
    } else {
        dist_val(sample)
    } * opacity;
    (alpha > 0.0).then(|| alpha.min(1.0))
}
