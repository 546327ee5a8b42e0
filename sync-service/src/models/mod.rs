//! Daily consumption regressors over four weather features.
//!
//! Both models are fitted by the training pipeline, persisted as JSON and
//! loaded once at startup; callers only see them through [`Regressor`].

pub mod evaluation;
pub mod kernel;
pub mod linear;
pub mod training;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use twin_client::WeatherAggregates;

use crate::config::ModelsConfig;

pub use evaluation::RegressionMetrics;
pub use kernel::{KernelModel, StandardScaler, SvrParams};
pub use linear::LinearModel;

pub const FEATURE_NAMES: [&str; 4] = ["Temp_max", "Temp_min", "Dew_max", "Precipit"];

/// Model input: `[Temp_max, Temp_min, Dew_max, Precipit]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherFeatures([f64; 4]);

impl WeatherFeatures {
    pub const fn new(temp_max: f64, temp_min: f64, dew_max: f64, precipitation: f64) -> Self {
        Self([temp_max, temp_min, dew_max, precipitation])
    }

    pub const fn as_array(&self) -> [f64; 4] {
        self.0
    }
}

impl From<&WeatherAggregates> for WeatherFeatures {
    fn from(w: &WeatherAggregates) -> Self {
        Self::new(w.temp_max, w.temp_min, w.dew_max, w.precipitation)
    }
}

impl From<[f64; 4]> for WeatherFeatures {
    fn from(values: [f64; 4]) -> Self {
        Self(values)
    }
}

pub trait Regressor: Send + Sync {
    fn predict(&self, features: &WeatherFeatures) -> f64;
}

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {path}: expected {expected} features, found {found}")]
    Shape {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error("model fit failed: {0}")]
    Fit(String),
    #[error("empty training dataset")]
    EmptyDataset,
}

/// The two fitted regressors, shared by handle.
#[derive(Clone)]
pub struct Models {
    pub linear: Arc<dyn Regressor>,
    pub kernel: Arc<dyn Regressor>,
}

impl Models {
    pub fn new(linear: Arc<dyn Regressor>, kernel: Arc<dyn Regressor>) -> Self {
        Self { linear, kernel }
    }

    pub fn load(cfg: &ModelsConfig) -> Result<Self, ModelError> {
        let linear: LinearModel = load_json(&cfg.linear_path)?;
        check_width(&cfg.linear_path, linear.feature_count())?;
        let kernel: KernelModel = load_json(&cfg.kernel_path)?;
        check_width(&cfg.kernel_path, kernel.scaler.mean.len())?;
        check_width(&cfg.kernel_path, kernel.scaler.scale.len())?;
        tracing::info!(
            linear = %cfg.linear_path.display(),
            kernel = %cfg.kernel_path.display(),
            "loaded model artifacts"
        );
        Ok(Self::new(Arc::new(linear), Arc::new(kernel)))
    }
}

/// Artifacts are only usable with the fixed four-feature input.
fn check_width(path: &Path, found: usize) -> Result<(), ModelError> {
    if found == FEATURE_NAMES.len() {
        return Ok(());
    }
    Err(ModelError::Shape {
        path: path.to_path_buf(),
        expected: FEATURE_NAMES.len(),
        found,
    })
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    let io_err = |source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}
