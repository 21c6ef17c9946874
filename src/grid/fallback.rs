//! Proportional boundary split used when the page does not show enough
//! ruled separators. The result is always flagged as
//! [`BoundarySource::Fallback`](super::BoundarySource) by the caller.

/// Split `[0, extent]` into `count` equal parts.
pub fn uniform_split(extent: usize, count: usize) -> Option<Vec<usize>> {
    if count == 0 {
        return None;
    }
    let ratios = vec![1.0f32; count];
    proportional_split(extent, &ratios)
}

/// Split `[0, extent]` according to relative widths in `ratios`.
///
/// Returns `None` when the ratios are degenerate or when the split would not
/// be strictly increasing (extent too small for the number of parts).
pub fn proportional_split(extent: usize, ratios: &[f32]) -> Option<Vec<usize>> {
    if ratios.is_empty() || ratios.iter().any(|r| !r.is_finite() || *r <= 0.0) {
        return None;
    }
    let total: f32 = ratios.iter().sum();
    let mut out = Vec::with_capacity(ratios.len() + 1);
    out.push(0usize);
    let mut acc = 0.0f32;
    for r in &ratios[..ratios.len() - 1] {
        acc += r / total;
        out.push((acc * extent as f32).round() as usize);
    }
    out.push(extent);
    if out.windows(2).all(|p| p[0] < p[1]) {
        Some(out)
    } else {
        None
    }
}
