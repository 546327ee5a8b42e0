use std::sync::Arc;

use anyhow::{Context, Result};
use sync_service::{
    config::AppConfig,
    metrics_server,
    models::Models,
    observability,
    pipeline::Pipeline,
    predict::PredictionMemoizer,
    sinks::FeatureSyncSink,
    sources::{PowerCsvFileSource, WeatherIndex},
    store::AnyStore,
    transform,
};
use twin_client::{FeatureStore, PowerReading};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let models = Models::load(&cfg.models).context("loading model artifacts")?;
    let weather = WeatherIndex::load(&cfg.sync.weather_csv)
        .with_context(|| format!("loading weather CSV {}", cfg.sync.weather_csv.display()))?;
    let source = PowerCsvFileSource::open(&cfg.sync.power_csv)?;

    let store = Arc::new(AnyStore::from_config(&cfg)?);
    if cfg.sync.reset_thing {
        store.reset().await.context("resetting device thing")?;
        tracing::info!(thing = %cfg.ditto.thing_id, "device thing reset");
    }

    let sink = FeatureSyncSink::new(
        store,
        cfg.ditto.feature_prefix.clone(),
        weather,
        PredictionMemoizer::new(models),
        cfg.sync.interval(),
    );
    let pipeline: Pipeline<_, PowerReading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::PowerReadingValidation)],
        sink,
    };

    tracing::info!(
        power_csv = %cfg.sync.power_csv.display(),
        interval_ms = cfg.sync.interval_ms,
        "starting sync"
    );
    let summary = pipeline.run().await?;
    tracing::info!(rows = summary.rows_synced, "all rows sent and analyzed");

    Ok(())
}
