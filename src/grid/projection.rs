use super::cluster1d::{cluster_1d, cluster_mass, cluster_mean, Obs};
use serde::Serialize;

/// A candidate separator: mean position and integrated foreground mass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineCandidate {
    pub pos: f32,
    pub mass: f32,
}

/// Cluster the non-empty entries of a line-mask profile into separators.
///
/// `profile[i]` is the number of line pixels at row/column `i`; entries below
/// `min_count` are ignored before clustering with `merge_dist`.
pub fn line_candidates(profile: &[u32], min_count: u32, merge_dist: f32) -> Vec<LineCandidate> {
    let obs: Vec<Obs> = profile
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0 && c >= min_count)
        .map(|(i, &c)| Obs {
            param: i as f32,
            strength: c as f32,
        })
        .collect();
    cluster_1d(obs, merge_dist, 0.0)
        .iter()
        .map(|c| LineCandidate {
            pos: cluster_mean(c),
            mass: cluster_mass(c),
        })
        .collect()
}

/// Keep the `keep` strongest candidates (by mass), returned in position order.
pub fn strongest(mut candidates: Vec<LineCandidate>, keep: usize) -> Vec<LineCandidate> {
    candidates.sort_by(|a, b| {
        b.mass
            .partial_cmp(&a.mass)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(keep);
    candidates.sort_by(|a, b| a.pos.partial_cmp(&b.pos).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}
