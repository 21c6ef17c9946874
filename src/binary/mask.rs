/// Dense binary mask, one byte per pixel (0 = background, 1 = ink).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub w: usize,
    pub h: usize,
    pub data: Vec<u8>,
}

impl BinaryMask {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0; w * h],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.data[y * self.w + x] = on as u8;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.w..(y + 1) * self.w]
    }

    /// Foreground pixels per row.
    pub fn row_profile(&self) -> Vec<u32> {
        (0..self.h)
            .map(|y| self.row(y).iter().map(|&v| v as u32).sum())
            .collect()
    }

    /// Foreground pixels per column.
    pub fn column_profile(&self) -> Vec<u32> {
        let mut out = vec![0u32; self.w];
        for y in 0..self.h {
            for (acc, &v) in out.iter_mut().zip(self.row(y)) {
                *acc += v as u32;
            }
        }
        out
    }

    /// Number of foreground pixels in `[x1, x2) × [y1, y2)` (clamped).
    pub fn count_in(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> usize {
        let x2 = x2.min(self.w);
        let y2 = y2.min(self.h);
        if x1 >= x2 || y1 >= y2 {
            return 0;
        }
        (y1..y2)
            .map(|y| self.row(y)[x1..x2].iter().filter(|&&v| v != 0).count())
            .sum()
    }

    /// Foreground fraction in `[x1, x2) × [y1, y2)`; 0 for an empty region.
    pub fn ratio_in(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> f32 {
        let area = x2.min(self.w).saturating_sub(x1) * y2.min(self.h).saturating_sub(y1);
        if area == 0 {
            return 0.0;
        }
        self.count_in(x1, y1, x2, y2) as f32 / area as f32
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
