use serde::Serialize;

use super::{ModelError, Regressor, WeatherFeatures};

/// Regression scores of one model on a held-out set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub explained_variance: f64,
    pub max_error: f64,
    pub mean_squared_error: f64,
    pub mean_absolute_error: f64,
    pub r2: f64,
    pub median_absolute_error: f64,
}

impl RegressionMetrics {
    pub fn compute(predicted: &[f64], actual: &[f64]) -> Result<Self, ModelError> {
        if predicted.is_empty() || predicted.len() != actual.len() {
            return Err(ModelError::EmptyDataset);
        }

        let n = actual.len() as f64;
        let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(y, p)| y - p).collect();
        let mut abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        abs.sort_by(f64::total_cmp);

        let mean_actual = actual.iter().sum::<f64>() / n;
        let ss_tot: f64 = actual.iter().map(|y| (y - mean_actual).powi(2)).sum();
        let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
        let mean_residual = residuals.iter().sum::<f64>() / n;
        let var_residual = residuals.iter().map(|r| (r - mean_residual).powi(2)).sum::<f64>() / n;

        let median = if abs.len() % 2 == 1 {
            abs[abs.len() / 2]
        } else {
            (abs[abs.len() / 2 - 1] + abs[abs.len() / 2]) / 2.0
        };

        Ok(Self {
            explained_variance: score(var_residual, ss_tot / n),
            max_error: abs.last().copied().unwrap_or_default(),
            mean_squared_error: ss_res / n,
            mean_absolute_error: abs.iter().sum::<f64>() / n,
            r2: score(ss_res, ss_tot),
            median_absolute_error: median,
        })
    }

    pub fn evaluate(model: &dyn Regressor, features: &[WeatherFeatures], actual: &[f64]) -> Result<Self, ModelError> {
        let predicted: Vec<f64> = features.iter().map(|f| model.predict(f)).collect();
        Self::compute(&predicted, actual)
    }
}

/// `1 - unexplained / total`; a constant target scores 1 when matched exactly
/// and 0 otherwise.
fn score(unexplained: f64, total: f64) -> f64 {
    if total == 0.0 {
        if unexplained == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - unexplained / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn perfect_predictions_score_one() {
        let y = [1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &y).unwrap();
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.explained_variance, 1.0);
        assert_eq!(m.max_error, 0.0);
        assert_eq!(m.mean_squared_error, 0.0);
    }

    #[test]
    fn scores_known_residuals() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        let m = RegressionMetrics::compute(&predicted, &actual).unwrap();

        assert_abs_diff_eq!(m.mean_squared_error, 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(m.mean_absolute_error, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.max_error, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.median_absolute_error, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.r2, 0.948_608_137_044_967_9, epsilon = 1e-9);
        assert_abs_diff_eq!(m.explained_variance, 0.957_173_447_537_473_2, epsilon = 1e-9);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(RegressionMetrics::compute(&[1.0], &[1.0, 2.0]).is_err());
        assert!(RegressionMetrics::compute(&[], &[]).is_err());
    }
}
