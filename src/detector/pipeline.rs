use super::params::{GridParams, GridTarget};
use crate::binary::{adaptive_threshold_inv, open_horizontal, open_vertical, BinaryMask};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::GridStage;
use crate::error::{LedgerError, Result};
use crate::grid::projection::strongest;
use crate::grid::{
    boundaries_from_lines, line_candidates, proportional_split, uniform_split, BoundarySource,
    Grid,
};
use crate::image::ImageU8;
use log::debug;
use std::time::Instant;

/// Result of grid detection: the grid, the ink mask it was derived from (the
/// cell segmenter measures content on it) and the stage diagnostics.
#[derive(Clone, Debug)]
pub struct GridDetection {
    pub grid: Grid,
    pub ink: BinaryMask,
    pub stage: GridStage,
}

/// Recovers row and column boundaries of a ruled ledger page.
#[derive(Clone, Debug, Default)]
pub struct GridDetector {
    params: GridParams,
}

impl GridDetector {
    pub fn new(params: GridParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Run detection on `gray` for the requested target.
    pub fn detect(&self, gray: &ImageU8<'_>, target: GridTarget<'_>) -> Result<GridDetection> {
        let start = Instant::now();
        if !gray.is_well_formed() {
            return Err(LedgerError::InvalidInput(format!(
                "page buffer does not match {}x{} (stride {})",
                gray.w, gray.h, gray.stride
            )));
        }
        if target.columns == 0 {
            return Err(LedgerError::structure("expected column count is zero"));
        }
        let (w, h) = (gray.w, gray.h);
        let p = &self.params;

        let ink = adaptive_threshold_inv(gray, p.threshold);
        let h_len = ((w as f32 * p.horizontal_kernel_ratio).round() as usize).max(2);
        let v_len = ((h as f32 * p.vertical_kernel_ratio).round() as usize).max(2);
        let horizontal = open_horizontal(&ink, h_len);
        let vertical = open_vertical(&ink, v_len);

        // Rows
        let row_min = ((w as f32 * p.row_min_coverage).ceil() as u32).max(1);
        let row_lines = line_candidates(&horizontal.row_profile(), row_min, p.row_merge_px);
        let (ys, rows_source) = if row_lines.len() >= p.min_row_lines {
            let positions: Vec<f32> = row_lines.iter().map(|c| c.pos).collect();
            let ys = boundaries_from_lines(&positions, h, p.row_merge_px);
            if ys.len() > 2 {
                (ys, BoundarySource::Detected)
            } else {
                (self.row_fallback(h, target)?, BoundarySource::Fallback)
            }
        } else {
            debug!(
                "GridDetector::detect only {} row rules (< {}), using row fallback",
                row_lines.len(),
                p.min_row_lines
            );
            (self.row_fallback(h, target)?, BoundarySource::Fallback)
        };

        // Columns. With both table borders drawn, the strongest `columns + 1`
        // rules are the borders plus the separators; the margins outside the
        // borders fold into the first and last column. Without borders only
        // the interior separators compete.
        let edge_guard = (w as f32 * p.edge_margin_ratio).max(p.column_merge_px);
        let column_candidates = line_candidates(&vertical.column_profile(), 1, p.column_merge_px);
        let needed = target.columns - 1;
        let mut selected = 0;
        let separators: Option<Vec<f32>> = if column_candidates.len() > target.columns {
            let kept = strongest(column_candidates.clone(), target.columns + 1);
            selected = kept.len();
            Some(kept[1..kept.len() - 1].iter().map(|c| c.pos).collect())
        } else {
            let interior: Vec<_> = column_candidates
                .iter()
                .copied()
                .filter(|c| c.pos > edge_guard && c.pos < w as f32 - edge_guard)
                .collect();
            if interior.len() >= needed {
                let kept = strongest(interior, needed);
                selected = kept.len();
                Some(kept.iter().map(|c| c.pos).collect())
            } else {
                debug!(
                    "GridDetector::detect {} interior column rules for {} columns, using column fallback",
                    interior.len(),
                    target.columns
                );
                None
            }
        };
        let (xs, cols_source) = match separators {
            Some(positions) => {
                let xs = boundaries_from_lines(&positions, w, 0.0);
                if xs.len() == target.columns + 1 {
                    (xs, BoundarySource::Detected)
                } else {
                    debug!(
                        "GridDetector::detect column rules collapsed to {} boundaries, using column fallback",
                        xs.len()
                    );
                    (self.column_fallback(w, target)?, BoundarySource::Fallback)
                }
            }
            None => (self.column_fallback(w, target)?, BoundarySource::Fallback),
        };

        let grid = Grid {
            ys,
            xs,
            rows_source,
            cols_source,
        };
        grid.validate(w, h).map_err(LedgerError::structure)?;
        if grid.columns() != target.columns {
            return Err(LedgerError::structure(format!(
                "recovered {} columns, expected {}",
                grid.columns(),
                target.columns
            )));
        }

        let stage = GridStage {
            elapsed_ms: elapsed_ms(start),
            ink_pixels: ink.count(),
            horizontal_kernel_px: h_len,
            vertical_kernel_px: v_len,
            row_lines_detected: row_lines.len(),
            column_candidates: column_candidates.len(),
            column_lines_selected: selected,
            rows_source,
            cols_source,
            confidence: grid.confidence(),
        };
        Ok(GridDetection { grid, ink, stage })
    }

    fn row_fallback(&self, height: usize, target: GridTarget<'_>) -> Result<Vec<usize>> {
        if !self.params.allow_fallback {
            return Err(LedgerError::structure("not enough row rules and fallback is disabled"));
        }
        let rows = target
            .rows
            .ok_or_else(|| LedgerError::structure("not enough row rules and no expected row count"))?;
        if rows == 0 || height < rows * self.params.min_cell_px {
            return Err(LedgerError::structure(format!(
                "page height {height} cannot host {rows} rows"
            )));
        }
        uniform_split(height, rows)
            .ok_or_else(|| LedgerError::structure("row fallback produced degenerate rows"))
    }

    fn column_fallback(&self, width: usize, target: GridTarget<'_>) -> Result<Vec<usize>> {
        if !self.params.allow_fallback {
            return Err(LedgerError::structure(
                "not enough column rules and fallback is disabled",
            ));
        }
        let columns = target.columns;
        if width < columns * self.params.min_cell_px {
            return Err(LedgerError::structure(format!(
                "page width {width} cannot host {columns} columns"
            )));
        }
        let split = match target.column_ratios {
            Some(ratios) if ratios.len() == columns => proportional_split(width, ratios),
            _ => uniform_split(width, columns),
        };
        split.ok_or_else(|| LedgerError::structure("column fallback produced degenerate columns"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with ruled lines at the given positions.
    fn ruled(w: usize, h: usize, ys: &[usize], xs: &[usize]) -> Vec<u8> {
        let mut img = vec![245u8; w * h];
        for &y in ys {
            for x in 0..w {
                img[y * w + x] = 10;
            }
        }
        for &x in xs {
            for y in 0..h {
                img[y * w + x] = 10;
            }
        }
        img
    }

    #[test]
    fn ruled_page_yields_detected_grid() {
        let (w, h) = (300usize, 200usize);
        let data = ruled(w, h, &[50, 100, 150], &[100, 200]);
        let img = ImageU8 {
            w,
            h,
            stride: w,
            data: &data,
        };
        let det = GridDetector::default()
            .detect(&img, GridTarget::new(3))
            .expect("grid");
        assert_eq!(det.grid.ys, vec![0, 50, 100, 150, 200]);
        assert_eq!(det.grid.xs, vec![0, 100, 200, 300]);
        assert!(!det.grid.is_lossy());
    }

    #[test]
    fn strongest_column_rules_win() {
        let (w, h) = (300usize, 200usize);
        let mut data = ruled(w, h, &[50, 100, 150], &[100, 200]);
        // A weak vertical stroke (half height) competing with the real rules.
        for y in 0..100 {
            data[y * w + 150] = 10;
        }
        let img = ImageU8 {
            w,
            h,
            stride: w,
            data: &data,
        };
        let det = GridDetector::default()
            .detect(&img, GridTarget::new(3))
            .expect("grid");
        assert_eq!(det.grid.xs, vec![0, 100, 200, 300]);
        assert_eq!(det.stage.column_candidates, 3);
    }

    #[test]
    fn table_borders_inside_margins_fold_into_outer_columns() {
        let (w, h) = (300usize, 200usize);
        // Borders at 30 and 240, separators at 100 and 170.
        let data = ruled(w, h, &[50, 100, 150], &[30, 100, 170, 240]);
        let img = ImageU8 {
            w,
            h,
            stride: w,
            data: &data,
        };
        let det = GridDetector::default()
            .detect(&img, GridTarget::new(3))
            .expect("grid");
        assert_eq!(det.grid.xs, vec![0, 100, 170, 300]);
        assert_eq!(det.stage.cols_source, BoundarySource::Detected);
        assert_eq!(det.stage.column_lines_selected, 4);
    }

    #[test]
    fn short_horizontal_strokes_are_not_rows() {
        let (w, h) = (300usize, 200usize);
        let mut data = ruled(w, h, &[50, 100, 150], &[100, 200]);
        // Underlined word inside a cell: long enough to survive the opening.
        for x in 20..80 {
            data[75 * w + x] = 10;
        }
        let img = ImageU8 {
            w,
            h,
            stride: w,
            data: &data,
        };
        let det = GridDetector::default()
            .detect(&img, GridTarget::new(3))
            .expect("grid");
        assert_eq!(det.grid.ys, vec![0, 50, 100, 150, 200]);
    }

    #[test]
    fn blank_page_falls_back_when_rows_are_known() {
        let data = vec![240u8; 200 * 100];
        let img = ImageU8 {
            w: 200,
            h: 100,
            stride: 200,
            data: &data,
        };
        let ratios = [1.0, 3.0];
        let target = GridTarget::new(2)
            .with_rows(Some(4))
            .with_column_ratios(Some(&ratios));
        let det = GridDetector::default().detect(&img, target).expect("fallback");
        assert_eq!(det.grid.ys, vec![0, 25, 50, 75, 100]);
        assert_eq!(det.grid.xs, vec![0, 50, 200]);
        assert!(det.grid.is_lossy());
        assert_eq!(det.grid.confidence(), 0.25);
    }

    #[test]
    fn blank_page_without_fallback_is_a_structure_failure() {
        let data = vec![240u8; 200 * 100];
        let img = ImageU8 {
            w: 200,
            h: 100,
            stride: 200,
            data: &data,
        };
        let det = GridDetector::new(GridParams {
            allow_fallback: false,
            ..Default::default()
        });
        let err = det.detect(&img, GridTarget::new(2).with_rows(Some(4))).unwrap_err();
        assert!(err.is_structural());

        let err = GridDetector::default()
            .detect(&img, GridTarget::new(2))
            .unwrap_err();
        assert!(err.is_structural(), "row fallback needs an expected row count");
    }
}
