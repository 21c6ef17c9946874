/// Observation used for 1D clustering of line positions.
#[derive(Clone, Copy, Debug)]
pub struct Obs {
    pub param: f32,
    pub strength: f32,
}

/// Chain-merge sorted observations: an observation joins the current cluster
/// when it lies within `eps` of the previous member. Clusters whose summed
/// strength is below `min_strength` are dropped.
pub fn cluster_1d(mut obs: Vec<Obs>, eps: f32, min_strength: f32) -> Vec<Vec<Obs>> {
    if obs.is_empty() {
        return Vec::new();
    }
    obs.sort_by(|a, b| {
        a.param
            .partial_cmp(&b.param)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut clusters: Vec<Vec<Obs>> = Vec::new();
    let mut cur: Vec<Obs> = Vec::new();
    for o in obs.into_iter() {
        let joins = cur.last().map_or(true, |last| (o.param - last.param).abs() <= eps);
        if joins {
            cur.push(o);
        } else {
            flush(&mut clusters, std::mem::take(&mut cur), min_strength);
            cur.push(o);
        }
    }
    flush(&mut clusters, cur, min_strength);
    clusters
}

fn flush(clusters: &mut Vec<Vec<Obs>>, cur: Vec<Obs>, min_strength: f32) {
    if cur.is_empty() {
        return;
    }
    let sum_w: f32 = cur.iter().map(|x| x.strength).sum();
    if sum_w >= min_strength {
        clusters.push(cur);
    }
}

/// Unweighted mean position of a cluster.
pub fn cluster_mean(cluster: &[Obs]) -> f32 {
    if cluster.is_empty() {
        return 0.0;
    }
    cluster.iter().map(|o| o.param).sum::<f32>() / cluster.len() as f32
}

/// Total strength (integrated mass) of a cluster.
pub fn cluster_mass(cluster: &[Obs]) -> f32 {
    cluster.iter().map(|o| o.strength).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ps: &[f32]) -> Vec<Obs> {
        ps.iter()
            .map(|&param| Obs {
                param,
                strength: 1.0,
            })
            .collect()
    }

    #[test]
    fn nearby_positions_collapse_to_their_mean() {
        let clusters = cluster_1d(obs(&[41.0, 40.0, 96.0, 95.0, 97.0, 300.0]), 3.0, 0.0);
        let means: Vec<f32> = clusters.iter().map(|c| cluster_mean(c)).collect();
        assert_eq!(means, vec![40.5, 96.0, 300.0]);
    }

    #[test]
    fn weak_clusters_are_dropped() {
        let clusters = cluster_1d(obs(&[10.0, 50.0, 51.0]), 2.0, 2.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(cluster_mass(&clusters[0]), 2.0);
    }
}
