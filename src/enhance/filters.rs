//! Small float filters used to render cell variants.
//!
//! All filters clamp border samples to the image extents and never
//! binarize: outputs stay in `[0, 1]` floats so faint strokes keep their
//! gray-level nuance.
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Trait implemented by separable 1D filters.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order), centred on the middle tap.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_5TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[0.0625, 0.25, 0.375, 0.25, 0.0625]);

/// Normalised 3-tap binomial filter `[1, 2, 1] / 4` (mild anti-aliasing).
pub const BINOMIAL_3TAP: StaticSeparableFilter = StaticSeparableFilter::new(&[0.25, 0.5, 0.25]);

/// Apply a separable filter horizontally then vertically.
pub fn apply_separable(filter: &dyn SeparableFilter, src: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    let radius = taps.len() / 2;
    let (w, h) = (src.w, src.h);
    if w == 0 || h == 0 {
        return src.clone();
    }
    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        let row = src.row(y);
        let out = tmp.row_mut(y);
        for (x, dst) in out.iter_mut().enumerate() {
            *dst = taps
                .iter()
                .enumerate()
                .map(|(k, t)| t * row[clamp_index(x as isize + k as isize - radius as isize, w)])
                .sum();
        }
    }
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v: f32 = taps
                .iter()
                .enumerate()
                .map(|(k, t)| t * tmp.get(x, clamp_index(y as isize + k as isize - radius as isize, h)))
                .sum();
            out.set(x, y, v);
        }
    }
    out
}

/// 3×3 convolution with border clamping; output clamped to `[0, 1]`.
pub fn convolve3x3(src: &ImageF32, kernel: &[[f32; 3]; 3]) -> ImageF32 {
    let (w, h) = (src.w, src.h);
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (ky, krow) in kernel.iter().enumerate() {
                let yy = clamp_index(y as isize + ky as isize - 1, h);
                for (kx, kv) in krow.iter().enumerate() {
                    let xx = clamp_index(x as isize + kx as isize - 1, w);
                    acc += kv * src.get(xx, yy);
                }
            }
            out.set(x, y, acc.clamp(0.0, 1.0));
        }
    }
    out
}

/// Minimum gray-level span worth stretching; narrower spans are paper noise.
const MIN_STRETCH_SPAN: f32 = 0.1;

/// Linear min/max stretch to the full `[0, 1]` range. Near-flat images are
/// returned unchanged.
pub fn stretch_contrast(src: &ImageF32) -> ImageF32 {
    let (lo, hi) = src
        .data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    if !span.is_finite() || span < MIN_STRETCH_SPAN {
        return src.clone();
    }
    src.map(|v| (v - lo) / span)
}

/// `src + amount · (src − blur(src))`, clamped to `[0, 1]`.
pub fn unsharp_mask(src: &ImageF32, amount: f32) -> ImageF32 {
    let blurred = apply_separable(&GAUSSIAN_5TAP, src);
    let mut out = src.clone();
    for (o, b) in out.data.iter_mut().zip(&blurred.data) {
        *o = (*o + amount * (*o - b)).clamp(0.0, 1.0);
    }
    out
}

#[inline]
fn clamp_index(idx: isize, upper: usize) -> usize {
    idx.clamp(0, upper as isize - 1) as usize
}
