use super::types::{CellRect, CellRow};
use crate::binary::BinaryMask;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::SegmentStage;
use crate::grid::Grid;
use log::debug;
use serde::Deserialize;
use std::time::Instant;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Inward padding (pixels) applied on every side of a cell so the ruling
    /// between cells does not bleed into the crop.
    pub padding_px: usize,
    /// Minimum ink fraction over a padded row strip. Rows below it are blank
    /// slack (margins, footer) rather than ruled register rows.
    pub min_content_ratio: f32,
    /// A candidate starts a new row when its top exceeds the current row's top
    /// by more than this fraction of the mean row height.
    pub row_split_factor: f32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            padding_px: 4,
            min_content_ratio: 0.002,
            row_split_factor: 0.55,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Segmentation {
    pub rows: Vec<CellRow>,
    pub stage: SegmentStage,
}

/// Turns a [`Grid`] into padded cell rectangles grouped into rows.
#[derive(Clone, Debug, Default)]
pub struct CellSegmenter {
    params: SegmentParams,
}

impl CellSegmenter {
    pub fn new(params: SegmentParams) -> Self {
        Self { params }
    }

    pub fn segment(&self, grid: &Grid, ink: &BinaryMask) -> Segmentation {
        let start = Instant::now();
        let p = &self.params;
        let mut stage = SegmentStage {
            candidate_rows: grid.rows(),
            ..Default::default()
        };

        // Candidate row strips that carry enough ink.
        let mut strips: Vec<(usize, usize)> = Vec::new();
        for pair in grid.ys.windows(2) {
            let (y1, y2) = (pair[0], pair[1]);
            let (py1, py2) = pad_span(y1, y2, p.padding_px);
            let ratio = ink.ratio_in(0, py1, ink.w, py2);
            if ratio < p.min_content_ratio {
                stage.discarded_rows += 1;
                continue;
            }
            strips.push((y1, y2));
        }
        if stage.discarded_rows > 0 {
            debug!(
                "CellSegmenter::segment discarded {} of {} rows below content ratio {:.4}",
                stage.discarded_rows,
                grid.rows(),
                p.min_content_ratio
            );
        }

        // Proximity grouping tolerates jittery duplicate rules.
        let mean_height = if strips.is_empty() {
            0.0
        } else {
            strips.iter().map(|(a, b)| (b - a) as f32).sum::<f32>() / strips.len() as f32
        };
        let mut grouped: Vec<(usize, usize)> = Vec::with_capacity(strips.len());
        for (y1, y2) in strips {
            match grouped.last_mut() {
                Some(cur) if (y1 as f32) <= cur.0 as f32 + p.row_split_factor * mean_height => {
                    cur.1 = cur.1.max(y2);
                    stage.merged_rows += 1;
                }
                _ => grouped.push((y1, y2)),
            }
        }

        let rows: Vec<CellRow> = grouped
            .into_iter()
            .enumerate()
            .map(|(index, (y1, y2))| {
                let (py1, py2) = pad_span(y1, y2, p.padding_px);
                let cells = grid
                    .xs
                    .windows(2)
                    .enumerate()
                    .map(|(col, pair)| {
                        let (px1, px2) = pad_span(pair[0], pair[1], p.padding_px);
                        CellRect {
                            row: index,
                            col,
                            x1: px1,
                            y1: py1,
                            x2: px2,
                            y2: py2,
                        }
                    })
                    .collect();
                CellRow {
                    index,
                    y1,
                    y2,
                    cells,
                }
            })
            .collect();

        stage.rows = rows.len();
        stage.cells = rows.iter().map(|r| r.cells.len()).sum();
        stage.elapsed_ms = elapsed_ms(start);
        Segmentation { rows, stage }
    }
}

/// Shrink `[a, b)` by `pad` on both sides while keeping at least one pixel.
fn pad_span(a: usize, b: usize, pad: usize) -> (usize, usize) {
    let len = b.saturating_sub(a);
    if len <= 1 {
        return (a, a + 1);
    }
    let pad = pad.min((len - 1) / 2);
    (a + pad, b - pad)
}
