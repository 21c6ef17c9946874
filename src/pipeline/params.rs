use crate::cells::SegmentParams;
use crate::detector::GridParams;
use crate::enhance::EnhanceParams;
use crate::layout::{ColumnLayout, SacramentKind};
use crate::normalize::NormalizeParams;
use crate::recognize::ExtractParams;
use serde::Deserialize;

/// Every tunable of the pipeline. All thresholds are configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    pub grid: GridParams,
    pub segment: SegmentParams,
    pub enhance: EnhanceParams,
    pub extract: ExtractParams,
    pub normalize: NormalizeParams,
    /// Layout overrides; sacraments without one use the built-in preset.
    pub layouts: Vec<ColumnLayout>,
}

impl LedgerParams {
    pub fn layout(&self, kind: SacramentKind) -> ColumnLayout {
        self.layouts
            .iter()
            .find(|l| l.kind == kind)
            .cloned()
            .unwrap_or_else(|| ColumnLayout::preset(kind))
    }
}
