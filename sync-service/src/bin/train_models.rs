use anyhow::{Context, Result};
use sync_service::{
    config::AppConfig,
    models::{
        save_json,
        training::{self, join_weather, load_daily_usage},
        RegressionMetrics, SvrParams,
    },
    observability,
    sources::{PowerCsvFileSource, WeatherIndex},
};

fn log_metrics(model: &str, m: &RegressionMetrics) {
    tracing::info!(
        model,
        explained_variance = m.explained_variance,
        max_error = m.max_error,
        mse = m.mean_squared_error,
        mae = m.mean_absolute_error,
        r2 = m.r2,
        median_absolute_error = m.median_absolute_error,
        "evaluation"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let tc = &cfg.training;

    let days = load_daily_usage(PowerCsvFileSource::open(&tc.power_csv)?)
        .await
        .with_context(|| format!("loading power CSV {}", tc.power_csv.display()))?;
    let weather = WeatherIndex::load(&tc.weather_csv)?;
    let (set, dropped) = join_weather(&days, &weather);
    if dropped > 0 {
        tracing::warn!(dropped, "days without weather left out of training");
    }

    let params = SvrParams {
        c: tc.svr_c,
        epsilon: tc.svr_epsilon,
        gamma: tc.svr_gamma,
    };
    let trained = training::train(&set, dropped, tc.test_ratio, params)?;

    let report = &trained.report;
    tracing::info!(train = report.train_rows, test = report.test_rows, "models fitted");
    if let Some(m) = &report.linear {
        log_metrics("linear", m);
    }
    if let Some(m) = &report.kernel {
        log_metrics("svr", m);
    }

    save_json(&cfg.models.linear_path, &trained.linear)?;
    save_json(&cfg.models.kernel_path, &trained.kernel)?;
    save_json(&tc.report_path, report)?;
    tracing::info!(
        linear = %cfg.models.linear_path.display(),
        kernel = %cfg.models.kernel_path.display(),
        report = %tc.report_path.display(),
        "artifacts written"
    );

    Ok(())
}
