use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::time::{Interval, MissedTickBehavior};
use twin_client::{FeatureKey, FeatureStore, HourlyRecord, PowerReading, StoreError};

use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    predict::{PredictionMemoizer, Resolution},
    sources::WeatherIndex,
};

/// What happened to one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOutcome {
    /// Every step ran; writes may still have failed and are counted.
    Synced { store_errors: usize, resolution: Resolution },
    /// A read failed, so the stored entry was left as it was.
    Aborted { store_errors: usize },
}

impl RowOutcome {
    pub fn store_errors(&self) -> usize {
        match self {
            Self::Synced { store_errors, .. } | Self::Aborted { store_errors } => *store_errors,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub rows_synced: usize,
    /// Rows rejected upstream (parse or validation errors).
    pub rows_skipped: usize,
    pub rows_aborted: usize,
    pub store_errors: usize,
    pub predictions_computed: usize,
    pub predictions_reused: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: RowOutcome) {
        self.store_errors += outcome.store_errors();
        match outcome {
            RowOutcome::Synced { resolution, .. } => {
                self.rows_synced += 1;
                match resolution {
                    Resolution::Computed(_) => self.predictions_computed += 1,
                    Resolution::Cached(_) => self.predictions_reused += 1,
                    Resolution::NoWeather => {}
                }
            }
            RowOutcome::Aborted { .. } => self.rows_aborted += 1,
        }
    }
}

/// Pushes each power reading into its per-date feature on the device twin and
/// keeps that date's predictions filled in.
///
/// Rows are processed one at a time, paced to one row per `interval`.
pub struct FeatureSyncSink<S> {
    store: Arc<S>,
    prefix: String,
    weather: WeatherIndex,
    memoizer: PredictionMemoizer,
    interval: Duration,
}

impl<S: FeatureStore> FeatureSyncSink<S> {
    pub fn new(
        store: Arc<S>,
        prefix: impl Into<String>,
        weather: WeatherIndex,
        memoizer: PredictionMemoizer,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            weather,
            memoizer,
            interval,
        }
    }

    fn pacer(&self) -> Option<Interval> {
        if self.interval.is_zero() {
            return None;
        }
        let mut ticker = tokio::time::interval(self.interval);
        // A late row re-anchors the schedule instead of triggering a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(ticker)
    }

    pub async fn process_row(&self, reading: &PowerReading) -> RowOutcome {
        let key = FeatureKey::new(&self.prefix, reading.ts.date());
        let weather = self.weather.get(key.date());
        let hourly = HourlyRecord::from(reading);
        let mut store_errors = 0;

        if let Err(e) = self.store.ensure_exists(&key).await {
            store_errors += 1;
            store_failure(&key, "ensure_exists", &e);
        }

        let mut entry = match self.store.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                store_failure(&key, "get", &e);
                return RowOutcome::Aborted {
                    store_errors: store_errors + 1,
                };
            }
        };
        entry.merge(weather, hourly);
        if let Err(e) = self.store.put(&key, &entry).await {
            store_errors += 1;
            store_failure(&key, "put", &e);
        }

        let mut entry = match self.store.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                store_failure(&key, "get", &e);
                return RowOutcome::Aborted {
                    store_errors: store_errors + 1,
                };
            }
        };
        let resolution = self.memoizer.resolve(&mut entry.daily_data);
        match resolution {
            Resolution::Computed(p) | Resolution::Cached(p) => {
                tracing::debug!(feature = %key, linear = p.linear, kernel = p.kernel, "daily predictions");
            }
            Resolution::NoWeather => {
                tracing::warn!(feature = %key, "no weather data for date, predictions skipped");
            }
        }
        if let Err(e) = self.store.put(&key, &entry).await {
            store_errors += 1;
            store_failure(&key, "put", &e);
        }

        tracing::info!(
            feature = %key,
            time = %hourly.timestamp,
            kwh = hourly.kwh,
            hourly_records = entry.hourly_data.len(),
            "row synced"
        );
        RowOutcome::Synced {
            store_errors,
            resolution,
        }
    }
}

fn store_failure(key: &FeatureKey, op: &'static str, e: &StoreError) {
    metrics::counter!("feature_store_errors_total", "op" => op).increment(1);
    tracing::error!(feature = %key, op, status = ?e.status(), error = %e, "feature store call failed");
}

#[async_trait::async_trait]
impl<S: FeatureStore + 'static> Sink<PowerReading> for FeatureSyncSink<S> {
    type Output = SyncSummary;

    async fn run<St>(&self, mut input: St) -> Result<SyncSummary, PipelineError>
    where
        St: futures::Stream<Item = Result<Envelope<PowerReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut pacer = self.pacer();
        let mut summary = SyncSummary::default();

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    summary.rows_skipped += 1;
                    metrics::counter!("sync_rows_skipped_total").increment(1);
                    tracing::warn!(error = %e, "skipping rejected row");
                    continue;
                }
            };

            if let Some(pacer) = pacer.as_mut() {
                pacer.tick().await;
            }

            let outcome = self.process_row(&env.payload).await;
            if matches!(outcome, RowOutcome::Synced { .. }) {
                metrics::counter!("sync_rows_sent_total").increment(1);
            }
            if let Ok(dur) = std::time::SystemTime::now().duration_since(env.received_at) {
                metrics::histogram!("sync_row_latency_seconds").record(dur.as_secs_f64());
            }
            summary.record(outcome);
        }

        tracing::info!(
            rows_synced = summary.rows_synced,
            rows_skipped = summary.rows_skipped,
            rows_aborted = summary.rows_aborted,
            store_errors = summary.store_errors,
            predictions_computed = summary.predictions_computed,
            predictions_reused = summary.predictions_reused,
            "sync finished"
        );
        Ok(summary)
    }
}
