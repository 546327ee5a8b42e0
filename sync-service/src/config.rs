use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DittoConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub thing_id: String,
    pub policy_id: String,
    pub feature_prefix: String,
    /// Per-request timeout; unset means requests wait indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for DittoConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/2".to_string(),
            username: "ditto".to_string(),
            password: "ditto".to_string(),
            thing_id: "mycompany:device01".to_string(),
            policy_id: "mycompany:device01".to_string(),
            feature_prefix: "sensor_".to_string(),
            request_timeout_ms: None,
        }
    }
}

impl DittoConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Ditto,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub power_csv: PathBuf,
    pub weather_csv: PathBuf,
    pub interval_ms: u64,
    pub reset_thing: bool,
    pub store: StoreKind,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            power_csv: "./dataset/test/power.csv".into(),
            weather_csv: "./dataset/test/weather.csv".into(),
            interval_ms: 2_000,
            reset_thing: true,
            store: StoreKind::Ditto,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub linear_path: PathBuf,
    pub kernel_path: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            linear_path: "./static/result/linear_regression_model.json".into(),
            kernel_path: "./static/result/svr_pipeline_model.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub power_csv: PathBuf,
    pub weather_csv: PathBuf,
    pub test_ratio: f64,
    pub svr_c: f64,
    pub svr_epsilon: f64,
    pub svr_gamma: f64,
    pub report_path: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            power_csv: "./dataset/train/power.csv".into(),
            weather_csv: "./dataset/train/weather.csv".into(),
            test_ratio: 0.3,
            svr_c: 11.0,
            svr_epsilon: 1.0,
            svr_gamma: 3.0,
            report_path: "./static/result/evaluation_metrics.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8085".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ditto: DittoConfig,
    pub sync: SyncConfig,
    pub models: ModelsConfig,
    pub training: TrainingConfig,
    pub dashboard: DashboardConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Loads the file named by `TWIN_SYNC_CONFIG` (default `twin-sync.toml`).
    /// A missing default file yields the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var("TWIN_SYNC_CONFIG") {
            Ok(path) => Self::load_from(path),
            Err(_) => {
                let path = Path::new("twin-sync.toml");
                if path.exists() {
                    Self::load_from(path)
                } else {
                    tracing::info!("no twin-sync.toml found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.ditto.base_url, "http://localhost:8080/api/2");
        assert_eq!(cfg.ditto.feature_prefix, "sensor_");
        assert_eq!(cfg.sync.interval(), Duration::from_secs(2));
        assert_eq!(cfg.sync.store, StoreKind::Ditto);
        assert!(cfg.ditto.request_timeout().is_none());
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.training.svr_c, 11.0);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [ditto]
            base_url = "http://ditto:8080/api/2"
            thing_id = "plant:meter7"
            request_timeout_ms = 1500

            [sync]
            interval_ms = 0
            store = "memory"

            [metrics]
            bind_addr = "127.0.0.1:9100"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.ditto.thing_id, "plant:meter7");
        assert_eq!(cfg.ditto.username, "ditto");
        assert_eq!(cfg.ditto.request_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(cfg.sync.interval(), Duration::ZERO);
        assert_eq!(cfg.sync.store, StoreKind::Memory);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9100");
    }
}
