//! Read-only HTTP view of the synced feature entries, plus the dashboard page
//! that renders them.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use time::Date;
use twin_client::{
    domain::feature_key::{format_iso_date, parse_iso_date},
    FeatureEntry, FeatureKey, FeatureStore, StoreError,
};

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

pub struct ReadApi<S> {
    store: Arc<S>,
    prefix: String,
}

impl<S: FeatureStore> ReadApi<S> {
    pub fn new(store: Arc<S>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Dates that have a feature on the thing, ascending. Ids that are not
    /// exactly `<prefix><YYYY-MM-DD>` are ignored; a store failure reads as no
    /// dates.
    pub async fn dates(&self) -> Vec<Date> {
        let ids = match self.store.feature_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(status = ?e.status(), error = %e, "failed to list features");
                return Vec::new();
            }
        };

        let mut dates: Vec<Date> = ids
            .iter()
            .filter_map(|id| FeatureKey::parse(&self.prefix, id))
            .map(|key| key.date())
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// `None` when no feature exists for `date`.
    pub async fn entry(&self, date: Date) -> Result<Option<FeatureEntry>, StoreError> {
        self.store.fetch(&FeatureKey::new(&self.prefix, date)).await
    }
}

pub fn router<S: FeatureStore + 'static>(api: Arc<ReadApi<S>>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/dates", get(list_dates::<S>))
        .route("/api/date/:date", get(date_entry::<S>))
        .with_state(api)
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn list_dates<S: FeatureStore + 'static>(State(api): State<Arc<ReadApi<S>>>) -> Json<Vec<String>> {
    metrics::counter!("read_api_requests_total", "route" => "dates").increment(1);
    Json(api.dates().await.into_iter().map(format_iso_date).collect())
}

async fn date_entry<S: FeatureStore + 'static>(
    State(api): State<Arc<ReadApi<S>>>,
    Path(raw): Path<String>,
) -> Response {
    metrics::counter!("read_api_requests_total", "route" => "date").increment(1);

    let Some(date) = parse_iso_date(&raw) else {
        tracing::debug!(date = %raw, "malformed date requested");
        return not_found();
    };

    match api.entry(date).await {
        Ok(Some(entry)) => Json(entry).into_response(),
        Ok(None) => not_found(),
        Err(e) => {
            tracing::error!(date = %raw, status = ?e.status(), error = %e, "failed to read feature");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Data not found"}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use twin_client::InMemoryStore;

    fn api_with(ids: &[&str]) -> ReadApi<InMemoryStore> {
        let store = InMemoryStore::new();
        for id in ids {
            store.insert_raw(id, FeatureEntry::default());
        }
        ReadApi::new(Arc::new(store), "sensor_")
    }

    #[tokio::test]
    async fn dates_keep_only_exact_keys_sorted() {
        let api = api_with(&[
            "sensor_2024-02-03",
            "sensor_2024-02-01",
            "sensor_2024-2-02",
            "sensor_2024-02-30",
            "other_2024-02-02",
            "sensor_2024-02-01x",
            "status",
        ]);

        assert_eq!(api.dates().await, vec![date!(2024-02-01), date!(2024-02-03)]);
    }

    #[tokio::test]
    async fn empty_entry_is_distinct_from_missing() {
        let api = api_with(&["sensor_2024-02-01"]);

        let present = api.entry(date!(2024-02-01)).await.unwrap();
        assert_eq!(present, Some(FeatureEntry::default()));
        assert_eq!(api.entry(date!(2099-01-01)).await.unwrap(), None);
    }

    #[test]
    fn dashboard_reads_both_endpoints() {
        assert!(DASHBOARD_HTML.contains("/api/dates"));
        assert!(DASHBOARD_HTML.contains("/api/date/"));
    }
}
