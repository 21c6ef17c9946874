/// Ruled ledger page with one ink blob per cell.
///
/// Rules are 2 px wide and nearly black; paper varies deterministically in
/// 245..=255. Horizontal rules sit at `top + k * row_h`, vertical rules at
/// `left + k * col_w`, and every cell not listed in `blanks` gets a 28x14
/// blob of value 40 at its center.
pub struct LedgerPage {
    pub width: usize,
    pub height: usize,
    pub rows: usize,
    pub columns: usize,
    pub top: usize,
    pub left: usize,
    pub row_h: usize,
    pub col_w: usize,
    pub blanks: Vec<(usize, usize)>,
    pub draw_column_rules: bool,
}

impl Default for LedgerPage {
    fn default() -> Self {
        Self {
            width: 800,
            height: 640,
            rows: 10,
            columns: 10,
            top: 40,
            left: 20,
            row_h: 55,
            col_w: 76,
            blanks: Vec::new(),
            draw_column_rules: true,
        }
    }
}

impl LedgerPage {
    pub fn render(&self) -> Vec<u8> {
        let (w, h) = (self.width, self.height);
        let mut img: Vec<u8> = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                245 + ((x * 7 + y * 13) % 11) as u8
            })
            .collect();
        let right = self.left + self.columns * self.col_w;
        let bottom = self.top + self.rows * self.row_h;

        for k in 0..=self.rows {
            let y = self.top + k * self.row_h;
            for yy in y..(y + 2).min(h) {
                for x in self.left..=right.min(w - 1) {
                    img[yy * w + x] = ((x + yy) % 11) as u8;
                }
            }
        }
        if self.draw_column_rules {
            for k in 0..=self.columns {
                let x = self.left + k * self.col_w;
                for y in self.top..=bottom.min(h - 1) {
                    for xx in x..(x + 2).min(w) {
                        img[y * w + xx] = ((xx + y) % 11) as u8;
                    }
                }
            }
        }
        for r in 0..self.rows {
            for c in 0..self.columns {
                if self.blanks.contains(&(r, c)) {
                    continue;
                }
                let cx = self.left + c * self.col_w + self.col_w / 2;
                let cy = self.top + r * self.row_h + self.row_h / 2;
                for y in cy - 7..cy + 7 {
                    for x in cx - 14..cx + 14 {
                        img[y * w + x] = 40;
                    }
                }
            }
        }
        img
    }
}
