//! Local-mean adaptive threshold with inverted polarity (dark ink → 1).
//!
//! The local mean is read from a summed-area table, so the cost is O(W·H)
//! regardless of the block radius. Windows are clipped at the page borders.

use super::BinaryMask;
use crate::image::{ImageU8, ImageView};
use serde::{Deserialize, Serialize};

/// Parameters of the adaptive threshold.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Half-size of the square averaging window in pixels.
    pub block_radius: usize,
    /// A pixel is ink when it is darker than `local_mean - offset`.
    pub offset: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_radius: 15,
            offset: 10.0,
        }
    }
}

/// Binarize `gray` so that pixels darker than their neighbourhood become 1.
pub fn adaptive_threshold_inv(gray: &ImageU8<'_>, params: ThresholdParams) -> BinaryMask {
    let (w, h) = (gray.w, gray.h);
    let mut mask = BinaryMask::new(w, h);
    if w == 0 || h == 0 {
        return mask;
    }
    let integral = integral_image(gray);
    let iw = w + 1;
    let r = params.block_radius;
    for y in 0..h {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r + 1).min(h);
        let row = gray.row(y);
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r + 1).min(w);
            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0];
            let area = ((x1 - x0) * (y1 - y0)) as f32;
            let mean = sum as f32 / area;
            if (row[x] as f32) < mean - params.offset {
                mask.data[y * w + x] = 1;
            }
        }
    }
    mask
}

/// Summed-area table with a zero first row/column, size `(w+1) × (h+1)`.
fn integral_image(gray: &ImageU8<'_>) -> Vec<u64> {
    let (w, h) = (gray.w, gray.h);
    let iw = w + 1;
    let mut out = vec![0u64; iw * (h + 1)];
    for y in 0..h {
        let row = gray.row(y);
        let mut run = 0u64;
        for x in 0..w {
            run += row[x] as u64;
            out[(y + 1) * iw + x + 1] = out[y * iw + x + 1] + run;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_stroke_on_paper_becomes_foreground() {
        let (w, h) = (40usize, 20usize);
        let mut data = vec![230u8; w * h];
        for x in 0..w {
            data[10 * w + x] = 20;
        }
        let img = ImageU8 {
            w,
            h,
            stride: w,
            data: &data,
        };
        let mask = adaptive_threshold_inv(&img, ThresholdParams::default());
        assert!((0..w).all(|x| mask.get(x, 10)));
        assert_eq!(mask.count(), w);
    }

    #[test]
    fn uniform_page_is_empty() {
        let data = vec![128u8; 16 * 16];
        let img = ImageU8 {
            w: 16,
            h: 16,
            stride: 16,
            data: &data,
        };
        assert_eq!(
            adaptive_threshold_inv(&img, ThresholdParams::default()).count(),
            0
        );
    }
}
