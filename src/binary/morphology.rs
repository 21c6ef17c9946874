use super::BinaryMask;

/// Opening with a horizontal `1 × len` line element.
///
/// Keeps every horizontal foreground run whose length is at least `len`;
/// shorter runs (handwriting, noise) vanish.
pub fn open_horizontal(mask: &BinaryMask, len: usize) -> BinaryMask {
    let len = len.max(1);
    let mut out = BinaryMask::new(mask.w, mask.h);
    for y in 0..mask.h {
        let row = mask.row(y);
        let mut x = 0;
        while x < mask.w {
            if row[x] == 0 {
                x += 1;
                continue;
            }
            let start = x;
            while x < mask.w && row[x] != 0 {
                x += 1;
            }
            if x - start >= len {
                out.data[y * mask.w + start..y * mask.w + x].fill(1);
            }
        }
    }
    out
}

/// Opening with a vertical `len × 1` line element.
pub fn open_vertical(mask: &BinaryMask, len: usize) -> BinaryMask {
    let len = len.max(1);
    let mut out = BinaryMask::new(mask.w, mask.h);
    for x in 0..mask.w {
        let mut y = 0;
        while y < mask.h {
            if !mask.get(x, y) {
                y += 1;
                continue;
            }
            let start = y;
            while y < mask.h && mask.get(x, y) {
                y += 1;
            }
            if y - start >= len {
                for yy in start..y {
                    out.set(x, yy, true);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> BinaryMask {
        let h = rows.len();
        let w = rows[0].len();
        let mut m = BinaryMask::new(w, h);
        for (y, r) in rows.iter().enumerate() {
            for (x, c) in r.chars().enumerate() {
                m.set(x, y, c == '#');
            }
        }
        m
    }

    #[test]
    fn horizontal_opening_keeps_only_long_runs() {
        let m = mask_from(&["##.######", "..##.....", "#########"]);
        let open = open_horizontal(&m, 5);
        assert_eq!(open.row(0), &[0, 0, 0, 1, 1, 1, 1, 1, 1]);
        assert!(open.row(1).iter().all(|&v| v == 0));
        assert!(open.row(2).iter().all(|&v| v == 1));
    }

    #[test]
    fn vertical_opening_keeps_tall_strokes() {
        let m = mask_from(&["#.#", "#..", "#.#", "#.."]);
        let open = open_vertical(&m, 3);
        assert_eq!(open.column_profile(), vec![4, 0, 0]);
    }
}
