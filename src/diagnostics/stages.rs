use crate::grid::BoundarySource;
use serde::Serialize;

/// Grid detection outcome.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStage {
    pub elapsed_ms: f64,
    pub ink_pixels: usize,
    pub horizontal_kernel_px: usize,
    pub vertical_kernel_px: usize,
    /// Clustered horizontal separators (page borders included).
    pub row_lines_detected: usize,
    /// Clustered vertical separators before ranking.
    pub column_candidates: usize,
    /// Interior separators kept after ranking by mass.
    pub column_lines_selected: usize,
    pub rows_source: BoundarySource,
    pub cols_source: BoundarySource,
    pub confidence: f32,
}

/// Cell segmentation outcome.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStage {
    pub elapsed_ms: f64,
    pub candidate_rows: usize,
    /// Rows below the content-ratio threshold (margins, footer slack).
    pub discarded_rows: usize,
    /// Candidate rows folded into their predecessor by proximity grouping.
    pub merged_rows: usize,
    pub rows: usize,
    pub cells: usize,
}

/// Extraction outcome across all cells of the page.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStage {
    pub elapsed_ms: f64,
    pub cells: usize,
    pub recognized: usize,
    pub blank: usize,
    /// Cells below the minimum usable size.
    pub skipped: usize,
    /// Cells where every engine attempt errored or timed out.
    pub failed: usize,
    pub attempts: usize,
    pub timeouts: usize,
    pub engine_errors: usize,
    pub short_circuits: usize,
    pub mean_confidence: f32,
}
