use common::{Candle, SupportCluster};

pub const DEFAULT_LOOKBACK: usize = 36;
pub const DEFAULT_CLUSTER_TOLERANCE_PERCENT: f64 = 0.5;

/// Clusters recent candle lows into support levels.
///
/// Clustering is a single greedy pass: each low joins the first existing
/// cluster whose running mean is within tolerance, or starts a new cluster.
/// The result depends on input order and is reproduced exactly; it is not a
/// global optimum.
#[derive(Debug, Clone)]
pub struct SupportClusterer {
    pub lookback: usize,
    pub cluster_tolerance_percent: f64,
}

impl Default for SupportClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK, DEFAULT_CLUSTER_TOLERANCE_PERCENT)
    }
}

impl SupportClusterer {
    pub fn new(lookback: usize, cluster_tolerance_percent: f64) -> Self {
        Self {
            lookback,
            cluster_tolerance_percent,
        }
    }

    pub fn detect(&self, candles: &[Candle]) -> Vec<f64> {
        detect_supports(candles, self.lookback, self.cluster_tolerance_percent)
    }
}

/// Means of all clusters with at least two members, in creation order.
/// Fewer than `lookback` candles yields no levels.
pub fn detect_supports(
    candles: &[Candle],
    lookback: usize,
    cluster_tolerance_percent: f64,
) -> Vec<f64> {
    if lookback == 0 || candles.len() < lookback {
        return Vec::new();
    }
    let lows: Vec<f64> = candles[candles.len() - lookback..]
        .iter()
        .map(|c| c.low)
        .collect();
    let avg_low = lows.iter().sum::<f64>() / lows.len() as f64;
    let tolerance = cluster_tolerance_percent / 100.0 * avg_low;

    cluster_lows(&lows, tolerance)
        .into_iter()
        .filter(|c| c.member_count >= 2)
        .map(|c| c.mean)
        .collect()
}

/// First-fit clustering of `lows` with an absolute `tolerance`. Returns every
/// cluster, singletons included.
pub fn cluster_lows(lows: &[f64], tolerance: f64) -> Vec<SupportCluster> {
    // (members, mean); the mean is recomputed from members after each join.
    let mut clusters: Vec<(Vec<f64>, f64)> = Vec::new();

    for &low in lows {
        match clusters
            .iter_mut()
            .find(|(_, mean)| (mean - low).abs() <= tolerance)
        {
            Some((members, mean)) => {
                members.push(low);
                *mean = members.iter().sum::<f64>() / members.len() as f64;
            }
            None => clusters.push((vec![low], low)),
        }
    }

    clusters
        .into_iter()
        .map(|(members, mean)| SupportCluster {
            mean,
            member_count: members.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_lows(lows: &[f64]) -> Vec<Candle> {
        lows.iter()
            .enumerate()
            .map(|(i, &l)| Candle::new(i as i64 * 900, l + 1.0, l + 2.0, l, l + 1.0))
            .collect()
    }

    #[test]
    fn twenty_near_hundred_and_sixteen_singletons() {
        let mut lows = Vec::new();
        let near = [0.0, 0.3, -0.3, 0.1, -0.1, 0.2, -0.2, 0.05, -0.05, 0.25];
        for i in 0..20 {
            lows.push(100.0 + near[i % near.len()]);
            if i < 16 {
                lows.push(110.0 + 10.0 * i as f64);
            }
        }
        assert_eq!(lows.len(), 36);

        let levels = detect_supports(&with_lows(&lows), 36, 0.5);
        assert_eq!(levels.len(), 1, "levels: {levels:?}");
        assert!((levels[0] - 100.0).abs() < 0.1, "level {}", levels[0]);
    }

    #[test]
    fn insufficient_data_yields_nothing() {
        let candles = with_lows(&[100.0; 35]);
        assert!(detect_supports(&candles, 36, 0.5).is_empty());
    }

    #[test]
    fn first_fit_uses_running_mean() {
        // 100 starts a cluster, 100.4 joins (mean 100.2), 100.6 joins via the
        // updated mean although it is 0.6 away from the first member.
        let clusters = cluster_lows(&[100.0, 100.4, 100.6], 0.45);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].member_count, 3);
        assert!((clusters[0].mean - 100.333_333).abs() < 1e-5);
    }

    #[test]
    fn order_dependence_is_preserved() {
        let a = cluster_lows(&[100.0, 100.5, 101.0], 0.5);
        let b = cluster_lows(&[101.0, 100.0, 100.5], 0.5);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].member_count, 2);
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].member_count, 2);
        assert_ne!(a[0].mean, b[0].mean);
    }

    #[test]
    fn singletons_are_dropped_and_order_kept() {
        let mut lows = vec![50.0; 30];
        lows.extend([80.0, 80.0, 90.0, 200.0, 200.1, 10.0]);
        let levels = detect_supports(&with_lows(&lows), 36, 0.5);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], 50.0);
        assert_eq!(levels[1], 80.0);
        assert!((levels[2] - 200.05).abs() < 1e-9);
    }
}
