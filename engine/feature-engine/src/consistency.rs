//! Statistical consistency metrics over one player-season

use serde::{Deserialize, Serialize};

/// Default number of games before metrics are computed
pub const DEFAULT_MIN_GAMES: usize = 10;

/// Consistency snapshot for one player-season
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    /// Higher is better: rewards average and floor, penalizes volatility
    pub consistency_score: f64,
    /// 10th percentile
    pub floor: f64,
    /// 90th percentile
    pub ceiling: f64,
    pub avg_fp: f64,
    pub median_fp: f64,
    /// Population standard deviation
    pub std_fp: f64,
    pub coef_variation: f64,
    pub iqr_ratio: f64,
    pub games_played: usize,
}

impl ConsistencyMetrics {
    /// All-zero record signalling an insufficient sample
    pub fn insufficient(games_played: usize) -> Self {
        Self {
            consistency_score: 0.0,
            floor: 0.0,
            ceiling: 0.0,
            avg_fp: 0.0,
            median_fp: 0.0,
            std_fp: 0.0,
            coef_variation: 0.0,
            iqr_ratio: 0.0,
            games_played,
        }
    }
}

/// Computes consistency metrics from fantasy point values
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyAnalyzer {
    min_games: usize,
}

impl Default for ConsistencyAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_GAMES)
    }
}

impl ConsistencyAnalyzer {
    pub fn new(min_games: usize) -> Self {
        Self { min_games }
    }

    pub fn min_games(&self) -> usize {
        self.min_games
    }

    /// Analyze one player-season's fantasy points
    ///
    /// The result depends only on the multiset of values, not their order.
    pub fn analyze(&self, fantasy_points: &[f64]) -> ConsistencyMetrics {
        let n = fantasy_points.len();
        if n < self.min_games || n == 0 {
            return ConsistencyMetrics::insufficient(n);
        }

        let mut sorted = fantasy_points.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let avg_fp = mean(&sorted);
        let std_fp = population_std(&sorted, avg_fp);
        let coef_variation = if avg_fp > 0.0 { std_fp / avg_fp } else { 0.0 };

        let floor = percentile(&sorted, 10.0);
        let ceiling = percentile(&sorted, 90.0);
        let median_fp = percentile(&sorted, 50.0);

        let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
        let iqr_ratio = if median_fp > 0.0 { iqr / median_fp } else { 0.0 };

        let consistency_score = avg_fp * 0.5 + floor * 0.3 - coef_variation * avg_fp * 0.2;

        ConsistencyMetrics {
            consistency_score,
            floor,
            ceiling,
            avg_fp,
            median_fp,
            std_fp,
            coef_variation,
            iqr_ratio,
            games_played: n,
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile with linear interpolation between closest ranks
///
/// `sorted` must be ascending and non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = p / 100.0 * last as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(last);
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_insufficient_sample_is_all_zero() {
        let analyzer = ConsistencyAnalyzer::default();
        let metrics = analyzer.analyze(&[30.0, 25.0, 40.0, 35.0, 20.0, 28.0, 31.0, 33.0, 29.0]);

        assert_eq!(metrics, ConsistencyMetrics::insufficient(9));
        assert_eq!(metrics.games_played, 9);
        assert_eq!(metrics.consistency_score, 0.0);
    }

    #[test]
    fn test_empty_sequence() {
        let metrics = ConsistencyAnalyzer::new(1).analyze(&[]);
        assert_eq!(metrics, ConsistencyMetrics::insufficient(0));
    }

    #[test]
    fn test_known_values() {
        // 1..=10: mean 5.5, population std sqrt(8.25)
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let metrics = ConsistencyAnalyzer::default().analyze(&values);

        assert!(close(metrics.avg_fp, 5.5));
        assert!(close(metrics.std_fp, 8.25f64.sqrt()));
        assert!(close(metrics.floor, 1.9));
        assert!(close(metrics.ceiling, 9.1));
        assert!(close(metrics.median_fp, 5.5));
        // p75 = 7.75, p25 = 3.25
        assert!(close(metrics.iqr_ratio, 4.5 / 5.5));
        assert!(close(metrics.coef_variation, 8.25f64.sqrt() / 5.5));

        let expected = 5.5 * 0.5 + 1.9 * 0.3 - metrics.coef_variation * 5.5 * 0.2;
        assert!(close(metrics.consistency_score, expected));
        assert_eq!(metrics.games_played, 10);
    }

    #[test]
    fn test_non_positive_mean_guards() {
        let values = vec![-5.0, -3.0, 0.0, -1.0, -2.0, -4.0, 0.0, -1.0, -2.0, -3.0];
        let metrics = ConsistencyAnalyzer::default().analyze(&values);

        assert_eq!(metrics.coef_variation, 0.0);
        assert_eq!(metrics.iqr_ratio, 0.0);
        assert!(metrics.std_fp > 0.0);
    }

    #[test]
    fn test_constant_sequence() {
        let metrics = ConsistencyAnalyzer::default().analyze(&[20.0; 12]);
        assert!(close(metrics.std_fp, 0.0));
        assert!(close(metrics.floor, 20.0));
        assert!(close(metrics.ceiling, 20.0));
        assert!(close(metrics.iqr_ratio, 0.0));
        assert!(close(metrics.consistency_score, 20.0 * 0.5 + 20.0 * 0.3));
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            values in prop::collection::vec(0.0f64..80.0, 0..40),
            seed in any::<u64>(),
        ) {
            let analyzer = ConsistencyAnalyzer::default();
            let mut shuffled = values.clone();
            // Deterministic permutation from the seed
            let len = shuffled.len();
            if len > 1 {
                let mut state = seed;
                for i in (1..len).rev() {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    let j = (state >> 33) as usize % (i + 1);
                    shuffled.swap(i, j);
                }
            }
            prop_assert_eq!(analyzer.analyze(&values), analyzer.analyze(&shuffled));
        }

        #[test]
        fn prop_short_sequences_are_degenerate(
            values in prop::collection::vec(0.0f64..80.0, 0..10)
        ) {
            let metrics = ConsistencyAnalyzer::default().analyze(&values);
            prop_assert_eq!(metrics, ConsistencyMetrics::insufficient(values.len()));
        }
    }
}
