use super::traits::ImageView;
use image::GrayImage;

#[derive(Clone, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// True when the backing slice can hold `h` rows of `stride` bytes.
    pub fn is_well_formed(&self) -> bool {
        self.stride >= self.w
            && self.h > 0
            && self.w > 0
            && self.data.len() >= (self.h - 1) * self.stride + self.w
    }

    /// Copy the rectangle `[x1, x2) × [y1, y2)` into an owned gray image.
    ///
    /// Coordinates are clamped to the view; an empty rectangle yields a
    /// zero-sized image.
    pub fn crop(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> GrayImage {
        let x2 = x2.min(self.w);
        let y2 = y2.min(self.h);
        let cw = x2.saturating_sub(x1);
        let ch = y2.saturating_sub(y1);
        if cw == 0 || ch == 0 {
            return GrayImage::new(0, 0);
        }
        let mut out = Vec::with_capacity(cw * ch);
        for y in y1..y1 + ch {
            let start = y * self.stride + x1;
            out.extend_from_slice(&self.data[start..start + cw]);
        }
        GrayImage::from_raw(cw as u32, ch as u32, out).unwrap_or_else(|| GrayImage::new(0, 0))
    }
}

impl<'a> ImageView for ImageU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_respects_stride_and_clamps() {
        // 4x3 image with stride 5 (one padding byte per row).
        let data: Vec<u8> = (0..15).collect();
        let img = ImageU8 {
            w: 4,
            h: 3,
            stride: 5,
            data: &data,
        };
        let crop = img.crop(1, 1, 10, 10);
        assert_eq!(crop.dimensions(), (3, 2));
        assert_eq!(crop.as_raw(), &vec![6, 7, 8, 11, 12, 13]);
    }
}
