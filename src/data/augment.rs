// ============================================================
// Layer 4 — Image Augmentation
// ============================================================
// The fixed augmentation recipe applied to the training feed
// only: random rotation up to ±40°, width/height shift up to
// ±20%, shear up to ±0.2°, zoom in [0.8, 1.2] per axis, and a
// horizontal flip half the time. Out-of-bounds samples take the
// nearest edge pixel (fill mode "nearest"). Rescaling by 1/255
// happens at load time, for both feeds.
//
// The warp is a single inverse-mapped affine transform with
// nearest-neighbour sampling, so one pass produces the augmented
// image. Parameter sampling and the warp are split so tests can
// drive the warp with exact parameters.

use rand::Rng;

/// One concrete draw of the augmentation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentParams {
    /// Rotation in degrees, counter-clockwise
    pub rotation: f32,
    /// Shear angle in degrees
    pub shear: f32,
    /// Horizontal shift in pixels
    pub shift_x: f32,
    /// Vertical shift in pixels
    pub shift_y: f32,
    /// Zoom factor per axis; 1.0 means unchanged
    pub zoom_x: f32,
    pub zoom_y: f32,
    /// Mirror horizontally
    pub flip: bool,
}

impl AugmentParams {
    pub fn identity() -> Self {
        Self {
            rotation: 0.0,
            shear:    0.0,
            shift_x:  0.0,
            shift_y:  0.0,
            zoom_x:   1.0,
            zoom_y:   1.0,
            flip:     false,
        }
    }
}

/// Samples augmentation parameters from the fixed recipe ranges.
#[derive(Debug, Clone)]
pub struct Augmentor {
    /// Max absolute rotation in degrees
    rotation_range: f32,
    /// Max shift as a fraction of width/height
    width_shift: f32,
    height_shift: f32,
    /// Max absolute shear in degrees
    shear_range: f32,
    /// Zoom is drawn from [1 - zoom_range, 1 + zoom_range]
    zoom_range: f32,
    horizontal_flip: bool,
}

impl Default for Augmentor {
    /// The recipe the pipeline always trains with.
    fn default() -> Self {
        Self {
            rotation_range:  40.0,
            width_shift:     0.2,
            height_shift:    0.2,
            shear_range:     0.2,
            zoom_range:      0.2,
            horizontal_flip: true,
        }
    }
}

impl Augmentor {
    /// Draw one set of parameters for an image of the given size.
    pub fn sample(&self, width: usize, height: usize, rng: &mut impl Rng) -> AugmentParams {
        let uniform = |rng: &mut dyn rand::RngCore, range: f32| -> f32 {
            if range > 0.0 {
                rng.gen_range(-range..=range)
            } else {
                0.0
            }
        };

        let zoom = |rng: &mut dyn rand::RngCore| -> f32 {
            if self.zoom_range > 0.0 {
                rng.gen_range(1.0 - self.zoom_range..=1.0 + self.zoom_range)
            } else {
                1.0
            }
        };

        AugmentParams {
            rotation: uniform(rng, self.rotation_range),
            shear:    uniform(rng, self.shear_range),
            shift_x:  uniform(rng, self.width_shift) * width as f32,
            shift_y:  uniform(rng, self.height_shift) * height as f32,
            zoom_x:   zoom(rng),
            zoom_y:   zoom(rng),
            flip:     self.horizontal_flip && rng.gen_bool(0.5),
        }
    }

    /// Sample parameters and warp. CHW pixel layout in and out.
    pub fn apply(
        &self,
        pixels: &[f32],
        channels: usize,
        height: usize,
        width: usize,
        rng: &mut impl Rng,
    ) -> Vec<f32> {
        let params = self.sample(width, height, rng);
        warp(pixels, channels, height, width, &params)
    }
}

/// Apply one affine warp to a CHW image with nearest-neighbour
/// sampling and edge-clamp fill.
pub fn warp(
    pixels: &[f32],
    channels: usize,
    height: usize,
    width: usize,
    params: &AugmentParams,
) -> Vec<f32> {
    debug_assert_eq!(pixels.len(), channels * height * width);

    let theta = params.rotation.to_radians();
    let shear = params.shear.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let tan_s = shear.tan();
    let cos_s = shear.cos();

    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;

    let plane = height * width;
    let mut out = vec![0.0f32; pixels.len()];

    for y in 0..height {
        for x in 0..width {
            let x_dst = if params.flip { width - 1 - x } else { x };

            // Inverse mapping: undo shift, rotation, shear, zoom
            // in the reverse of the forward composition order.
            let u = x_dst as f32 - cx - params.shift_x;
            let v = y as f32 - cy - params.shift_y;

            let ru = cos_t * u + sin_t * v;
            let rv = -sin_t * u + cos_t * v;

            let su = ru + tan_s * rv;
            let sv = rv / cos_s;

            let src_x = su / params.zoom_x + cx;
            let src_y = sv / params.zoom_y + cy;

            // Fill mode "nearest": clamp to the image border
            let sx = (src_x.round().max(0.0) as usize).min(width - 1);
            let sy = (src_y.round().max(0.0) as usize).min(height - 1);

            for c in 0..channels {
                out[c * plane + y * width + x] = pixels[c * plane + sy * width + sx];
            }
        }
    }

    out
}
