use super::{ExtractionStage, GridStage, SegmentStage, TimingBreakdown};
use crate::layout::SacramentKind;
use serde::Serialize;

/// Report produced next to the tuples of a page.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub grid: GridStage,
    pub segmentation: SegmentStage,
    pub extraction: ExtractionStage,
}

impl PageReport {
    /// Short one-line summary for logs and the demo binary.
    pub fn summary(&self) -> String {
        format!(
            "{}x{} rows={} cells={} recognized={} blank={} failed={} grid={:?}/{:?} total_ms={:.1}",
            self.input.width,
            self.input.height,
            self.segmentation.rows,
            self.extraction.cells,
            self.extraction.recognized,
            self.extraction.blank,
            self.extraction.failed,
            self.grid.rows_source,
            self.grid.cols_source,
            self.timings.total_ms
        )
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub page_id: String,
    pub width: usize,
    pub height: usize,
    pub expected_columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_rows: Option<usize>,
    pub sacrament: SacramentKind,
}
