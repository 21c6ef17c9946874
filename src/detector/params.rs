//! Parameter types configuring the grid detector.
//!
//! Defaults are tuned for photographed A3 ledgers at roughly 100–150 dpi
//! with ruled rows and columns. When retargeting to a different register
//! format, start with the kernel ratios and the merge distances.

use crate::binary::ThresholdParams;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub threshold: ThresholdParams,
    /// Horizontal opening element length as a fraction of the page width.
    pub horizontal_kernel_ratio: f32,
    /// Vertical opening element length as a fraction of the page height.
    pub vertical_kernel_ratio: f32,
    /// A pixel row belongs to a horizontal rule only when at least this
    /// fraction of the page width survives the horizontal opening.
    pub row_min_coverage: f32,
    /// Row rule positions closer than this (pixels) collapse to their mean.
    pub row_merge_px: f32,
    /// Column rule positions closer than this (pixels) form one candidate.
    pub column_merge_px: f32,
    /// When the table borders are not both drawn, rules within this fraction
    /// of the page size from an edge are borders.
    pub edge_margin_ratio: f32,
    /// Minimum clustered row rules (borders included) to trust detection.
    pub min_row_lines: usize,
    /// Minimum size of a fallback row/column in pixels.
    pub min_cell_px: usize,
    /// Use the proportional split when an axis lacks rules. When false, such
    /// pages fail with `StructureDetectionFailure`.
    pub allow_fallback: bool,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            threshold: ThresholdParams::default(),
            horizontal_kernel_ratio: 0.05,
            vertical_kernel_ratio: 0.05,
            row_min_coverage: 0.25,
            row_merge_px: 8.0,
            column_merge_px: 8.0,
            edge_margin_ratio: 0.03,
            min_row_lines: 2,
            min_cell_px: 4,
            allow_fallback: true,
        }
    }
}

/// What the caller expects to find on the page.
#[derive(Clone, Copy, Debug)]
pub struct GridTarget<'a> {
    pub columns: usize,
    /// Needed only for the row fallback.
    pub rows: Option<usize>,
    /// Relative column widths for the column fallback; must have `columns`
    /// entries to be used.
    pub column_ratios: Option<&'a [f32]>,
}

impl<'a> GridTarget<'a> {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            rows: None,
            column_ratios: None,
        }
    }

    pub fn with_rows(mut self, rows: Option<usize>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_column_ratios(mut self, ratios: Option<&'a [f32]>) -> Self {
        self.column_ratios = ratios;
        self
    }
}
