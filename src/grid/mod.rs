//! Table grid: ordered row (`ys`) and column (`xs`) boundaries.
//!
//! Building blocks used by [`crate::detector::GridDetector`]:
//! - [`cluster1d`]: minimum-separation merge of raw line positions.
//! - [`projection`]: line candidates from the profiles of an opened mask.
//! - [`fallback`]: proportional split used when too few lines are found.

pub mod cluster1d;
pub mod fallback;
pub mod projection;

pub use cluster1d::{cluster_1d, Obs};
pub use fallback::{proportional_split, uniform_split};
pub use projection::{line_candidates, LineCandidate};

use serde::Serialize;

/// How an axis of the grid was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundarySource {
    /// Recovered from ruled separators on the page.
    Detected,
    /// Guessed from expected counts or layout ratios. Lossy.
    Fallback,
}

/// Recovered table grid. Both sequences are strictly increasing, start at 0
/// and end at the page edge, so `ys.len() - 1` rows and `xs.len() - 1`
/// columns are described.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub ys: Vec<usize>,
    pub xs: Vec<usize>,
    pub rows_source: BoundarySource,
    pub cols_source: BoundarySource,
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.ys.len().saturating_sub(1)
    }

    pub fn columns(&self) -> usize {
        self.xs.len().saturating_sub(1)
    }

    /// True when any axis came from the proportional fallback.
    pub fn is_lossy(&self) -> bool {
        self.rows_source == BoundarySource::Fallback || self.cols_source == BoundarySource::Fallback
    }

    /// Geometry confidence: halved for each axis that fell back.
    pub fn confidence(&self) -> f32 {
        [self.rows_source, self.cols_source]
            .iter()
            .map(|s| match s {
                BoundarySource::Detected => 1.0,
                BoundarySource::Fallback => 0.5,
            })
            .product()
    }

    /// Check the boundary invariant against the page dimensions.
    pub fn validate(&self, width: usize, height: usize) -> Result<(), String> {
        check_axis("ys", &self.ys, height)?;
        check_axis("xs", &self.xs, width)
    }
}

fn check_axis(name: &str, bounds: &[usize], extent: usize) -> Result<(), String> {
    if bounds.len() < 2 {
        return Err(format!("{name}: need at least two boundaries, got {}", bounds.len()));
    }
    if bounds[0] != 0 || bounds[bounds.len() - 1] != extent {
        return Err(format!(
            "{name}: boundaries must span [0, {extent}], got [{}, {}]",
            bounds[0],
            bounds[bounds.len() - 1]
        ));
    }
    if bounds.windows(2).any(|p| p[0] >= p[1]) {
        return Err(format!("{name}: boundaries are not strictly increasing"));
    }
    Ok(())
}

/// Turn interior line positions into a boundary list that includes both page
/// edges. Positions closer than `edge_guard` to an edge collapse into it and
/// duplicates after rounding are dropped.
pub fn boundaries_from_lines(lines: &[f32], extent: usize, edge_guard: f32) -> Vec<usize> {
    let mut out = vec![0usize];
    let mut interior: Vec<usize> = lines
        .iter()
        .filter(|&&p| p > edge_guard && p < extent as f32 - edge_guard)
        .map(|&p| p.round() as usize)
        .collect();
    interior.sort_unstable();
    for p in interior {
        if p > *out.last().unwrap_or(&0) && p < extent {
            out.push(p);
        }
    }
    out.push(extent);
    out
}
