use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use sync_service::{
    api::{self, ReadApi},
    config::AppConfig,
    metrics_server,
    observability,
    store::AnyStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let addr: SocketAddr = cfg
        .dashboard
        .bind_addr
        .parse()
        .with_context(|| format!("invalid dashboard.bind_addr '{}'", cfg.dashboard.bind_addr))?;

    let store = Arc::new(AnyStore::from_config(&cfg)?);
    let app = api::router(Arc::new(ReadApi::new(store, cfg.ditto.feature_prefix.clone())));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "serving dashboard");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
