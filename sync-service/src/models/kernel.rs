use linfa::{
    traits::{Fit, Predict},
    Dataset,
};
use linfa_svm::Svm;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{ModelError, Regressor, WeatherFeatures};

/// Per-column standardisation (population standard deviation). Constant
/// columns keep a scale of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(records: &Array2<f64>) -> Result<Self, ModelError> {
        let mean = records.mean_axis(Axis(0)).ok_or(ModelError::EmptyDataset)?;
        let scale = records
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    pub fn transform(&self, records: &Array2<f64>) -> Array2<f64> {
        let mut out = records.to_owned();
        for mut row in out.rows_mut() {
            for ((x, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                *x = (*x - mean) / scale;
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvrParams {
    /// Regularisation strength.
    pub c: f64,
    /// Width of the epsilon-insensitive tube.
    pub epsilon: f64,
    /// RBF kernel coefficient: `k(x, y) = exp(-gamma * |x - y|^2)`.
    pub gamma: f64,
}

impl Default for SvrParams {
    fn default() -> Self {
        Self {
            c: 11.0,
            epsilon: 1.0,
            gamma: 3.0,
        }
    }
}

/// Epsilon-SVR with a Gaussian kernel behind a standard scaler.
#[derive(Clone, Serialize, Deserialize)]
pub struct KernelModel {
    pub scaler: StandardScaler,
    pub svm: Svm<f64, f64>,
}

impl KernelModel {
    pub fn fit(records: &Array2<f64>, targets: &Array1<f64>, params: SvrParams) -> Result<Self, ModelError> {
        if records.nrows() == 0 {
            return Err(ModelError::EmptyDataset);
        }
        if !(params.gamma > 0.0) {
            return Err(ModelError::Fit(format!("gamma must be positive, got {}", params.gamma)));
        }

        let scaler = StandardScaler::fit(records)?;
        let dataset = Dataset::new(scaler.transform(records), targets.clone());

        // linfa's Gaussian kernel is exp(-|x - y|^2 / eps).
        let svm = Svm::<f64, f64>::params()
            .c_svr(params.c, Some(params.epsilon))
            .gaussian_kernel(1.0 / params.gamma)
            .fit(&dataset)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        Ok(Self { scaler, svm })
    }
}

impl Regressor for KernelModel {
    fn predict(&self, features: &WeatherFeatures) -> f64 {
        let row = Array2::from(vec![features.as_array()]);
        let predicted: Array1<f64> = self.svm.predict(&self.scaler.transform(&row));
        predicted[0]
    }
}
