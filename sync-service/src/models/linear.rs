use linfa::{traits::Fit, Dataset};
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{ModelError, Regressor, WeatherFeatures};

/// Ordinary least squares with intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn fit(records: &Array2<f64>, targets: &Array1<f64>) -> Result<Self, ModelError> {
        if records.nrows() == 0 {
            return Err(ModelError::EmptyDataset);
        }

        let dataset = Dataset::new(records.clone(), targets.clone());
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        Ok(Self {
            intercept: fitted.intercept(),
            coefficients: fitted.params().to_vec(),
        })
    }
}

impl LinearModel {
    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &WeatherFeatures) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_array())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn recovers_exact_linear_relation() {
        let records = array![
            [85.0, 70.0, 65.0, 0.0],
            [80.0, 62.0, 60.0, 0.1],
            [92.0, 75.0, 70.0, 0.0],
            [70.0, 55.0, 50.0, 0.8],
            [65.0, 50.0, 45.0, 0.3],
            [88.0, 71.0, 66.0, 0.2],
            [75.0, 60.0, 58.0, 1.2],
            [95.0, 78.0, 72.0, 0.0],
            [60.0, 41.0, 35.0, 0.5],
        ];
        let truth = |r: ndarray::ArrayView1<f64>| 2.0 + 0.5 * r[0] - 0.3 * r[1] + 1.0 * r[2] + 4.0 * r[3];
        let targets: Array1<f64> = records.rows().into_iter().map(truth).collect();

        let model = LinearModel::fit(&records, &targets).unwrap();

        assert_abs_diff_eq!(model.intercept, 2.0, epsilon = 1e-6);
        for (got, want) in model.coefficients.iter().zip([0.5, -0.3, 1.0, 4.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
        let prediction = model.predict(&WeatherFeatures::new(85.0, 70.0, 65.0, 0.0));
        assert_abs_diff_eq!(prediction, 2.0 + 42.5 - 21.0 + 65.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let res = LinearModel::fit(&Array2::zeros((0, 4)), &Array1::zeros(0));
        assert!(matches!(res, Err(ModelError::EmptyDataset)));
    }
}
