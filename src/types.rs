use crate::diagnostics::PageReport;
use crate::enhance::VariantKind;
use crate::grid::Grid;
use crate::layout::SacramentKind;
use crate::recognize::CellOutcome;
use serde::Serialize;

/// Normalized reading of one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellValue {
    pub text: String,
    pub confidence: f32,
    pub outcome: CellOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantKind>,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One extracted table row, before review.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleCandidate {
    /// 1-based, top to bottom.
    pub row_number: usize,
    pub cells: Vec<CellValue>,
    /// Fraction of non-empty cells, in `[0, 1]`.
    pub overall_quality: f32,
}

impl TupleCandidate {
    pub fn new(row_number: usize, cells: Vec<CellValue>) -> Self {
        let filled = cells.iter().filter(|c| !c.is_empty()).count();
        let overall_quality = if cells.is_empty() {
            0.0
        } else {
            filled as f32 / cells.len() as f32
        };
        Self {
            row_number,
            cells,
            overall_quality,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.text.clone()).collect()
    }
}

/// Identity of a processed page, as handed to a persistence sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page_id: String,
    pub book_id: i64,
    pub sacrament: SacramentKind,
    pub columns: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub page: PageMeta,
    pub tuples: Vec<TupleCandidate>,
    pub grid: Grid,
    pub report: PageReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> CellValue {
        CellValue {
            text: text.to_string(),
            confidence: 0.0,
            outcome: if text.is_empty() {
                CellOutcome::Blank
            } else {
                CellOutcome::Recognized
            },
            variant: None,
        }
    }

    #[test]
    fn quality_is_fraction_of_filled_cells() {
        let t = TupleCandidate::new(3, vec![cell("A"), cell(""), cell("12"), cell("B")]);
        assert!((t.overall_quality - 0.75).abs() < 1e-6);
        assert_eq!(TupleCandidate::new(1, Vec::new()).overall_quality, 0.0);
    }
}
