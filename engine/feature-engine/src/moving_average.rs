//! Regression-optimized moving averages
//!
//! For one player and one stat, lag features over the previous `L` games are
//! regressed on the stat using only games before a training cutoff. The fitted
//! weights are then applied to every game, so later games are averaged with
//! weights learned from history alone. When there is not enough pre-cutoff
//! history, or the fit is numerically degenerate, exponential smoothing with
//! span `L` is used instead.

use crate::error::RegressionError;
use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a moving-average sequence was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AverageMethod {
    /// Fewer games than the look-back window; every value is zero
    InsufficientHistory,
    /// Least-squares weights over lags 1..=L plus intercept
    Regression { weights: Vec<f64>, intercept: f64 },
    /// Exponential smoothing with `alpha = 2 / (L + 1)`
    Smoothing { alpha: f64 },
}

/// Moving-average sequence aligned with its input
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverage {
    pub values: Vec<f64>,
    pub method: AverageMethod,
}

impl MovingAverage {
    /// Value for the most recent game, 0.0 for an empty input
    pub fn latest(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    pub fn is_regression(&self) -> bool {
        matches!(self.method, AverageMethod::Regression { .. })
    }

    pub fn is_smoothing(&self) -> bool {
        matches!(self.method, AverageMethod::Smoothing { .. })
    }
}

/// Fits lag weights per player and stat with a temporal holdout
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageOptimizer {
    look_back: usize,
    train_cutoff: NaiveDate,
}

impl MovingAverageOptimizer {
    pub fn new(look_back: usize, train_cutoff: NaiveDate) -> Self {
        Self { look_back, train_cutoff }
    }

    /// Produce the optimized moving average for a date-ordered series
    pub fn optimize(&self, series: &[(NaiveDate, f64)]) -> MovingAverage {
        let n = series.len();
        let look_back = self.look_back;

        if n < look_back {
            return MovingAverage {
                values: vec![0.0; n],
                method: AverageMethod::InsufficientHistory,
            };
        }

        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let lags = lag_features(&values, look_back);

        let train_rows: Vec<usize> =
            (0..n).filter(|&i| series[i].0 < self.train_cutoff).collect();

        if train_rows.len() > look_back {
            let x_train = lags.select_rows(train_rows.iter());
            let y_train =
                DVector::from_iterator(train_rows.len(), train_rows.iter().map(|&i| values[i]));

            match fit_least_squares(&x_train, &y_train) {
                Ok(model) => {
                    let predicted = &lags * &model.weights;
                    let out: Vec<f64> = predicted.iter().map(|p| p + model.intercept).collect();
                    debug!(
                        look_back,
                        train_rows = train_rows.len(),
                        intercept = model.intercept,
                        "fitted moving-average weights"
                    );
                    return MovingAverage {
                        values: out,
                        method: AverageMethod::Regression {
                            weights: model.weights.iter().copied().collect(),
                            intercept: model.intercept,
                        },
                    };
                }
                Err(e) => {
                    warn!(look_back, error = %e, "moving-average fit failed, using smoothing");
                }
            }
        }

        let alpha = smoothing_alpha(look_back);
        MovingAverage {
            values: exponential_smoothing(&values, alpha),
            method: AverageMethod::Smoothing { alpha },
        }
    }
}

/// Decay for an exponential average with the given span
pub fn smoothing_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// `ema[0] = x[0]`, `ema[t] = alpha * x[t] + (1 - alpha) * ema[t-1]`
pub fn exponential_smoothing(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev = None;
    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Row `i`, column `k - 1` holds the value `k` games back, zero when unavailable
fn lag_features(values: &[f64], look_back: usize) -> DMatrix<f64> {
    DMatrix::from_fn(values.len(), look_back, |i, col| {
        let lag = col + 1;
        if i >= lag {
            values[i - lag]
        } else {
            0.0
        }
    })
}

struct LinearModel {
    weights: DVector<f64>,
    intercept: f64,
}

/// Ordinary least squares with intercept
///
/// The intercept is recovered from column means after solving the centered
/// problem through an SVD. Rank-deficient designs are rejected.
fn fit_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<LinearModel, RegressionError> {
    if x.nrows() != y.len() {
        return Err(RegressionError::DimensionMismatch { expected: x.nrows(), got: y.len() });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(RegressionError::NonFinite);
    }

    let columns = x.ncols();
    let x_mean = DVector::from_iterator(columns, x.column_iter().map(|c| c.mean()));
    let y_mean = y.mean();

    let mut centered = x.clone();
    for (mut column, mean) in centered.column_iter_mut().zip(x_mean.iter()) {
        column.add_scalar_mut(-mean);
    }
    let y_centered = y.add_scalar(-y_mean);

    let svd = centered.svd(true, true);
    let largest = svd.singular_values.max();
    let eps = largest * (x.nrows().max(columns) as f64) * f64::EPSILON;

    let rank = svd.rank(eps);
    if largest <= 0.0 || rank < columns {
        return Err(RegressionError::SingularMatrix { rank, columns });
    }

    let weights = svd.solve(&y_centered, eps).map_err(RegressionError::Decomposition)?;
    let intercept = y_mean - x_mean.dot(&weights);

    if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
        return Err(RegressionError::NonFinite);
    }

    Ok(LinearModel { weights, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn series(start: NaiveDate, values: &[f64]) -> Vec<(NaiveDate, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(2 * i as i64), *v))
            .collect()
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_short_series_is_zero_filled() {
        let optimizer = MovingAverageOptimizer::new(5, cutoff());
        let start = NaiveDate::from_ymd_opt(2023, 10, 25).unwrap();
        let result = optimizer.optimize(&series(start, &[10.0, 12.0, 14.0]));

        assert_eq!(result.values, vec![0.0; 3]);
        assert_eq!(result.method, AverageMethod::InsufficientHistory);
        assert_eq!(result.latest(), 0.0);
    }

    #[test]
    fn test_empty_series() {
        let optimizer = MovingAverageOptimizer::new(3, cutoff());
        let result = optimizer.optimize(&[]);
        assert!(result.values.is_empty());
        assert_eq!(result.latest(), 0.0);
    }

    #[test]
    fn test_all_post_cutoff_falls_back_to_smoothing() {
        let optimizer = MovingAverageOptimizer::new(3, cutoff());
        let start = NaiveDate::from_ymd_opt(2024, 10, 22).unwrap();
        let values = [10.0, 20.0, 30.0, 20.0, 10.0];
        let result = optimizer.optimize(&series(start, &values));

        assert!(result.is_smoothing());
        // alpha = 0.5
        assert_eq!(result.values, vec![10.0, 15.0, 22.5, 21.25, 15.625]);
    }

    #[test]
    fn test_training_set_equal_to_window_uses_smoothing() {
        let optimizer = MovingAverageOptimizer::new(4, cutoff());
        // Exactly 4 games before the cutoff
        let start = NaiveDate::from_ymd_opt(2023, 12, 24).unwrap();
        let values = [12.0, 18.0, 9.0, 22.0, 15.0, 17.0, 30.0];
        let result = optimizer.optimize(&series(start, &values));

        assert!(result.is_smoothing());
        assert_eq!(result.values, exponential_smoothing(&values, smoothing_alpha(4)));
    }

    #[test]
    fn test_regression_on_autoregressive_series() {
        // x[t] = 5 + 0.5 * x[t-1] + 0.25 * x[t-2], seeded with distinct values
        let mut values = vec![40.0, 10.0];
        for t in 2..60 {
            let next = 5.0 + 0.5 * values[t - 1] + 0.25 * values[t - 2];
            values.push(next);
        }
        // Perturb so the design is not collinear
        for (t, v) in values.iter_mut().enumerate() {
            *v += ((t * 7919) % 13) as f64 * 0.01;
        }

        let start = NaiveDate::from_ymd_opt(2022, 10, 20).unwrap();
        let optimizer = MovingAverageOptimizer::new(2, cutoff());
        let data = series(start, &values);
        let result = optimizer.optimize(&data);

        assert!(result.is_regression());
        assert!(result.values.iter().all(|v| v.is_finite()));
        assert_eq!(result.values.len(), values.len());
        if let AverageMethod::Regression { weights, .. } = &result.method {
            assert_eq!(weights.len(), 2);
        }
    }

    #[test]
    fn test_regression_applies_weights_past_cutoff() {
        // Deterministic noisy series straddling the cutoff
        let values: Vec<f64> = (0..40).map(|i| 20.0 + ((i * 37) % 11) as f64 - 5.0).collect();
        let start = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let data = series(start, &values);
        let optimizer = MovingAverageOptimizer::new(3, cutoff());
        let result = optimizer.optimize(&data);

        let (weights, intercept) = match &result.method {
            AverageMethod::Regression { weights, intercept } => (weights.clone(), *intercept),
            other => panic!("expected regression, got {other:?}"),
        };

        // The last value is the fitted combination of the three previous games
        let n = values.len();
        let expected = intercept
            + weights[0] * values[n - 2]
            + weights[1] * values[n - 3]
            + weights[2] * values[n - 4];
        assert!((result.latest() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_singular_design_falls_back_to_smoothing() {
        // All-zero history before the cutoff leaves every lag column empty
        let mut values = vec![0.0; 30];
        values.extend([10.0, 14.0, 9.0]);
        let start = NaiveDate::from_ymd_opt(2023, 11, 3).unwrap();
        let data = series(start, &values);
        let optimizer = MovingAverageOptimizer::new(3, cutoff());
        let result = optimizer.optimize(&data);

        assert!(result.is_smoothing());
        assert_eq!(result.values, exponential_smoothing(&values, smoothing_alpha(3)));
    }

    #[test]
    fn test_exponential_smoothing_recurrence() {
        let alpha = smoothing_alpha(20);
        assert!((alpha - 2.0 / 21.0).abs() < 1e-12);

        let ema = exponential_smoothing(&[4.0, 8.0], 0.25);
        assert_eq!(ema, vec![4.0, 5.0]);
    }

    proptest! {
        #[test]
        fn prop_output_length_matches_input(
            values in prop::collection::vec(0.0f64..60.0, 0..50),
            look_back in 1usize..25,
            offset in 0i64..200,
        ) {
            let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap() + Duration::days(offset);
            let data = series(start, &values);
            let result = MovingAverageOptimizer::new(look_back, cutoff()).optimize(&data);
            prop_assert_eq!(result.values.len(), values.len());
        }
    }
}
