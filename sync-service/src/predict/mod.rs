//! Memoized daily predictions.
//!
//! Predictions are cached on the stored daily record itself, so a date that
//! has both `lr_prediction` and `svr_prediction` is never scored again.

use twin_client::DailyRecord;

use crate::models::{Models, WeatherFeatures};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predictions {
    pub linear: f64,
    pub kernel: f64,
}

/// Outcome of [`PredictionMemoizer::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Both predictions were already stored.
    Cached(Predictions),
    /// Both models ran and the record was updated.
    Computed(Predictions),
    /// The record carries no weather to predict from.
    NoWeather,
}

impl Resolution {
    pub fn predictions(&self) -> Option<Predictions> {
        match self {
            Self::Cached(p) | Self::Computed(p) => Some(*p),
            Self::NoWeather => None,
        }
    }
}

#[derive(Clone)]
pub struct PredictionMemoizer {
    models: Models,
}

impl PredictionMemoizer {
    pub fn new(models: Models) -> Self {
        Self { models }
    }

    /// Fills in missing predictions on `record` in place.
    ///
    /// A record holding only one of the two predictions is scored again by
    /// both models.
    pub fn resolve(&self, record: &mut DailyRecord) -> Resolution {
        if let (Some(linear), Some(kernel)) = (record.lr_prediction, record.svr_prediction) {
            metrics::counter!("predictions_cached_total").increment(1);
            return Resolution::Cached(Predictions { linear, kernel });
        }

        let Some(weather) = record.weather.as_ref() else {
            return Resolution::NoWeather;
        };

        let features = WeatherFeatures::from(weather);
        let predictions = Predictions {
            linear: self.models.linear.predict(&features),
            kernel: self.models.kernel.predict(&features),
        };
        record.lr_prediction = Some(predictions.linear);
        record.svr_prediction = Some(predictions.kernel);
        metrics::counter!("predictions_computed_total").increment(1);

        Resolution::Computed(predictions)
    }
}
