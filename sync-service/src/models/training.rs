use std::collections::BTreeMap;

use futures::StreamExt;
use ndarray::{Array1, Array2};
use serde::Serialize;
use time::Date;
use twin_client::PowerReading;

use super::{KernelModel, LinearModel, ModelError, RegressionMetrics, Regressor, SvrParams, WeatherFeatures};
use crate::{
    pipeline::{PipelineError, Source},
    sources::{PowerCsvFileSource, WeatherIndex},
};

/// Power usage summed over one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyUsage {
    pub date: Date,
    pub kwh: f64,
    /// Mean of the hourly indicator.
    pub day_of_week: f64,
    pub notes: Option<String>,
    pub readings: usize,
}

pub fn aggregate_daily<I: IntoIterator<Item = PowerReading>>(readings: I) -> Vec<DailyUsage> {
    let mut by_date: BTreeMap<Date, DailyUsage> = BTreeMap::new();
    for r in readings {
        let day = by_date.entry(r.ts.date()).or_insert_with(|| DailyUsage {
            date: r.ts.date(),
            kwh: 0.0,
            day_of_week: 0.0,
            notes: None,
            readings: 0,
        });
        day.kwh += r.kwh;
        day.day_of_week += r.day_of_week;
        day.readings += 1;
        if day.notes.is_none() {
            day.notes = r.notes;
        }
    }

    by_date
        .into_values()
        .map(|mut day| {
            day.day_of_week /= day.readings as f64;
            day
        })
        .collect()
}

/// Features and targets in matching row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<WeatherFeatures>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn records(&self) -> Array2<f64> {
        Array2::from(self.features.iter().map(WeatherFeatures::as_array).collect::<Vec<_>>())
    }

    pub fn target_array(&self) -> Array1<f64> {
        Array1::from(self.targets.clone())
    }

    /// Deterministic hold-out: test rows are spread evenly through the set so
    /// that `test_ratio` of them end up in the second half of the pair.
    pub fn split(&self, test_ratio: f64) -> (TrainingSet, TrainingSet) {
        let ratio = test_ratio.clamp(0.0, 1.0);
        let mut train = TrainingSet::default();
        let mut test = TrainingSet::default();
        for (i, (f, y)) in self.features.iter().zip(&self.targets).enumerate() {
            let is_test = ((i + 1) as f64 * ratio).floor() > (i as f64 * ratio).floor();
            let part = if is_test { &mut test } else { &mut train };
            part.features.push(*f);
            part.targets.push(*y);
        }
        (train, test)
    }
}

/// Pairs each day's usage with that day's weather. Days without weather are
/// dropped; the count of dropped days is returned alongside.
pub fn join_weather(days: &[DailyUsage], weather: &WeatherIndex) -> (TrainingSet, usize) {
    let mut set = TrainingSet::default();
    let mut dropped = 0;
    for day in days {
        match weather.get(day.date) {
            Some(w) => {
                set.features.push(WeatherFeatures::from(&w));
                set.targets.push(day.kwh);
            }
            None => dropped += 1,
        }
    }
    (set, dropped)
}

/// Reads a power CSV, skipping unusable rows, and aggregates it per day.
pub async fn load_daily_usage(source: PowerCsvFileSource) -> Result<Vec<DailyUsage>, PipelineError> {
    let mut stream = source.stream().await;
    let mut readings = Vec::new();
    while let Some(item) = stream.next().await {
        if let Ok(env) = item {
            readings.push(env.payload);
        }
    }
    if readings.is_empty() {
        return Err(PipelineError::Source("power CSV holds no usable rows".to_string()));
    }
    Ok(aggregate_daily(readings))
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub dropped_days: usize,
    pub linear: Option<RegressionMetrics>,
    pub kernel: Option<RegressionMetrics>,
}

pub struct TrainedModels {
    pub linear: LinearModel,
    pub kernel: KernelModel,
    pub report: TrainingReport,
}

/// Fits both models on the training part of `set` and scores them on the rest.
/// Metrics are absent when the test part is empty.
pub fn train(
    set: &TrainingSet,
    dropped_days: usize,
    test_ratio: f64,
    params: SvrParams,
) -> Result<TrainedModels, ModelError> {
    let (train, test) = set.split(test_ratio);
    if train.is_empty() {
        return Err(ModelError::EmptyDataset);
    }

    let records = train.records();
    let targets = train.target_array();

    let linear = LinearModel::fit(&records, &targets)?;
    tracing::info!(
        intercept = linear.intercept,
        coefficients = ?linear.coefficients,
        "fitted linear regression"
    );
    let kernel = KernelModel::fit(&records, &targets, params)?;
    tracing::info!(c = params.c, epsilon = params.epsilon, gamma = params.gamma, "fitted SVR");

    let score = |model: &dyn Regressor| {
        if test.is_empty() {
            Ok(None)
        } else {
            RegressionMetrics::evaluate(model, &test.features, &test.targets).map(Some)
        }
    };
    let report = TrainingReport {
        train_rows: train.len(),
        test_rows: test.len(),
        dropped_days,
        linear: score(&linear)?,
        kernel: score(&kernel)?,
    };

    Ok(TrainedModels {
        linear,
        kernel,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use time::macros::{date, datetime};
    use twin_client::{WeatherAggregates, WeatherDay};

    fn reading(ts: time::PrimitiveDateTime, kwh: f64, notes: Option<&str>) -> PowerReading {
        PowerReading {
            ts,
            kwh,
            day_of_week: 1.0,
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn aggregates_per_calendar_day() {
        let mut readings = Vec::new();
        for hour in 0..24u8 {
            let ts = date!(2016-06-01).with_hms(hour, 0, 0).unwrap();
            readings.push(reading(ts, 0.5, if hour == 0 { Some("weekday") } else { None }));
        }
        readings.push(PowerReading {
            day_of_week: 0.0,
            ..reading(datetime!(2016-06-02 00:00:00), 2.0, Some("weekend"))
        });

        let days = aggregate_daily(readings);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date!(2016-06-01));
        assert_abs_diff_eq!(days[0].kwh, 12.0, epsilon = 1e-12);
        assert_eq!(days[0].day_of_week, 1.0);
        assert_eq!(days[0].readings, 24);
        assert_eq!(days[0].notes.as_deref(), Some("weekday"));
        assert_eq!(days[1].kwh, 2.0);
        assert_eq!(days[1].day_of_week, 0.0);
        assert_eq!(days[1].notes.as_deref(), Some("weekend"));
    }

    #[test]
    fn join_drops_days_without_weather() {
        let days = aggregate_daily([
            reading(datetime!(2016-06-01 00:00:00), 10.0, None),
            reading(datetime!(2016-06-02 00:00:00), 20.0, None),
        ]);
        let weather = WeatherIndex::from_days([WeatherDay {
            date: date!(2016-06-02),
            aggregates: WeatherAggregates {
                temp_max: 85.0,
                temp_min: 70.0,
                dew_max: 65.0,
                ..Default::default()
            },
        }]);

        let (set, dropped) = join_weather(&days, &weather);
        assert_eq!(dropped, 1);
        assert_eq!(set.targets, vec![20.0]);
        assert_eq!(set.features[0].as_array(), [85.0, 70.0, 65.0, 0.0]);
    }

    fn synthetic_set(n: usize) -> TrainingSet {
        let mut set = TrainingSet::default();
        for i in 0..n {
            let t = i as f64;
            let f = WeatherFeatures::new(60.0 + t, 45.0 + 0.7 * t, 40.0 + 0.5 * (t % 7.0), (i % 3) as f64 * 0.2);
            let [a, b, c, d] = f.as_array();
            set.features.push(f);
            set.targets.push(5.0 + 0.4 * a + 0.1 * b - 0.2 * c + 3.0 * d);
        }
        set
    }

    #[test]
    fn split_is_deterministic_and_proportional() {
        let set = synthetic_set(10);
        let (train, test) = set.split(0.3);
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(set.split(0.3), (train, test));

        let (all_train, none) = set.split(0.0);
        assert_eq!(all_train.len(), 10);
        assert!(none.is_empty());
    }

    #[test]
    fn trains_both_models_and_scores_them() {
        let set = synthetic_set(30);
        let trained = train(&set, 2, 0.3, SvrParams::default()).unwrap();

        assert_eq!(trained.report.train_rows, 21);
        assert_eq!(trained.report.test_rows, 9);
        assert_eq!(trained.report.dropped_days, 2);

        let linear = trained.report.linear.expect("linear metrics");
        assert!(linear.r2 > 0.999, "linear r2 {}", linear.r2);
        let kernel = trained.report.kernel.expect("kernel metrics");
        assert!(kernel.mean_squared_error.is_finite());
    }

    #[test]
    fn training_without_rows_fails() {
        let res = train(&TrainingSet::default(), 0, 0.3, SvrParams::default());
        assert!(matches!(res, Err(ModelError::EmptyDataset)));
    }
}
