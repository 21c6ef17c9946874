//! Cell enhancer: several visually distinct renderings of one cell crop.
//!
//! Recognition engines disagree on which rendering they read best, and
//! faint iron-gall ink often survives only in one of them. Every variant is
//! derived from an upscaled grayscale crop without binarization. Variants
//! are returned in priority order together with their scoring weight.

pub mod filters;

use crate::image::ImageF32;
use filters::{apply_separable, convolve3x3, stretch_contrast, unsharp_mask, BINOMIAL_3TAP};
use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::{Deserialize, Serialize};

const SHARPEN_KERNEL: [[f32; 3]; 3] = [[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]];

/// Rendering strategy of a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Upscaled raw grayscale.
    Upscaled,
    /// Contrast-stretched and sharpened, gray levels preserved.
    Sharpened,
    /// Mild binomial smoothing.
    Denoised,
    /// Edge-emphasized unsharp mask.
    UnsharpMask,
    /// Polarity inverted, produced only for dark-background cells.
    Inverted,
}

/// Priority weights per variant kind, in `[0, 1]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantWeights {
    pub sharpened: f32,
    pub upscaled: f32,
    pub denoised: f32,
    pub unsharp_mask: f32,
    pub inverted: f32,
}

impl Default for VariantWeights {
    fn default() -> Self {
        Self {
            sharpened: 1.0,
            upscaled: 0.9,
            denoised: 0.8,
            unsharp_mask: 0.75,
            inverted: 0.95,
        }
    }
}

impl VariantWeights {
    pub fn weight(&self, kind: VariantKind) -> f32 {
        match kind {
            VariantKind::Sharpened => self.sharpened,
            VariantKind::Upscaled => self.upscaled,
            VariantKind::Denoised => self.denoised,
            VariantKind::UnsharpMask => self.unsharp_mask,
            VariantKind::Inverted => self.inverted,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// Crops with either side at or below this size are not rendered.
    pub min_side_px: usize,
    /// Upscale so the crop height reaches this many pixels.
    pub target_height_px: usize,
    pub max_scale: f32,
    pub unsharp_amount: f32,
    /// Mean luminance in `[0, 1]` below which the background counts as dark.
    pub dark_mean: f32,
    pub weights: VariantWeights,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            min_side_px: 5,
            target_height_px: 64,
            max_scale: 4.0,
            unsharp_amount: 1.5,
            dark_mean: 0.4,
            weights: VariantWeights::default(),
        }
    }
}

/// One rendering of a cell, ready for a recognizer.
#[derive(Clone, Debug)]
pub struct Variant {
    pub kind: VariantKind,
    pub weight: f32,
    pub image: GrayImage,
}

#[derive(Clone, Debug, Default)]
pub struct CellEnhancer {
    params: EnhanceParams,
}

impl CellEnhancer {
    pub fn new(params: EnhanceParams) -> Self {
        Self { params }
    }

    /// Render the variants of `crop` in priority order.
    ///
    /// Returns an empty list for crops too small to be read; the extraction
    /// engine skips such cells.
    pub fn enhance(&self, crop: &GrayImage) -> Vec<Variant> {
        let p = &self.params;
        let (w, h) = (crop.width() as usize, crop.height() as usize);
        if w <= p.min_side_px || h <= p.min_side_px {
            return Vec::new();
        }

        let upscaled_u8 = self.upscale(crop);
        let base = ImageF32::from_gray(&upscaled_u8);
        let dark = base.mean() < p.dark_mean;

        let mut out = Vec::with_capacity(5);
        if dark {
            out.push(self.variant(VariantKind::Inverted, base.map(|v| 1.0 - v)));
        }
        let sharpened = convolve3x3(&stretch_contrast(&base), &SHARPEN_KERNEL);
        out.push(self.variant(VariantKind::Sharpened, sharpened));
        out.push(Variant {
            kind: VariantKind::Upscaled,
            weight: p.weights.weight(VariantKind::Upscaled),
            image: upscaled_u8,
        });
        out.push(self.variant(VariantKind::Denoised, apply_separable(&BINOMIAL_3TAP, &base)));
        out.push(self.variant(VariantKind::UnsharpMask, unsharp_mask(&base, p.unsharp_amount)));
        out
    }

    fn upscale(&self, crop: &GrayImage) -> GrayImage {
        let h = crop.height().max(1) as f32;
        let scale = (self.params.target_height_px as f32 / h).clamp(1.0, self.params.max_scale);
        if scale <= 1.0 {
            return crop.clone();
        }
        let nw = (crop.width() as f32 * scale).round().max(1.0) as u32;
        let nh = (crop.height() as f32 * scale).round().max(1.0) as u32;
        imageops::resize(crop, nw, nh, FilterType::CatmullRom)
    }

    fn variant(&self, kind: VariantKind, image: ImageF32) -> Variant {
        Variant {
            kind,
            weight: self.params.weights.weight(kind),
            image: image.to_gray(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn crop(w: u32, h: u32, paper: u8, ink: u8) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if x > w / 4 && x < 3 * w / 4 && y > h / 3 && y < 2 * h / 3 {
                Luma([ink])
            } else {
                Luma([paper])
            }
        })
    }

    #[test]
    fn tiny_crops_yield_no_variants() {
        let enhancer = CellEnhancer::default();
        assert!(enhancer.enhance(&crop(5, 5, 255, 0)).is_empty());
        assert!(enhancer.enhance(&crop(40, 4, 255, 0)).is_empty());
        assert!(enhancer.enhance(&GrayImage::new(0, 0)).is_empty());
    }

    #[test]
    fn light_cell_gets_four_upscaled_variants() {
        let variants = CellEnhancer::default().enhance(&crop(60, 20, 240, 60));
        let kinds: Vec<_> = variants.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VariantKind::Sharpened,
                VariantKind::Upscaled,
                VariantKind::Denoised,
                VariantKind::UnsharpMask
            ]
        );
        assert!(variants.iter().all(|v| v.image.height() >= 64));
        assert!(variants.windows(2).all(|p| p[0].weight >= p[1].weight));
    }

    #[test]
    fn dark_cell_is_inverted_first() {
        let variants = CellEnhancer::default().enhance(&crop(60, 20, 30, 220));
        assert_eq!(variants[0].kind, VariantKind::Inverted);
        assert_eq!(variants.len(), 5);
        let corner = variants[0].image.get_pixel(0, 0)[0];
        assert!(corner > 200, "inverted background should be light, got {corner}");
    }
}
