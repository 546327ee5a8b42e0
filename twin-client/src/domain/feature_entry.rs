use serde::{Deserialize, Serialize};
use time::Time;

use super::{PowerReading, WeatherAggregates};

time::serde::format_description!(clock_time, Time, "[hour]:[minute]:[second]");

/// Per-date aggregates plus the cached model predictions.
///
/// Serialized as one flat object (`dailyData`): the weather columns when a
/// weather row matched the date, and `lr_prediction` / `svr_prediction` once
/// computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(flatten)]
    pub weather: Option<WeatherAggregates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr_prediction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svr_prediction: Option<f64>,
}

impl DailyRecord {
    pub fn is_empty(&self) -> bool {
        self.weather.is_none() && self.lr_prediction.is_none() && self.svr_prediction.is_none()
    }

    /// Replaces the weather part. Predictions are left untouched.
    pub fn merge_weather(&mut self, weather: WeatherAggregates) {
        self.weather = Some(weather);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(with = "clock_time")]
    pub timestamp: Time,
    #[serde(rename = "Value_kWh")]
    pub kwh: f64,
    pub day_of_week: f64,
}

impl From<&PowerReading> for HourlyRecord {
    fn from(reading: &PowerReading) -> Self {
        Self {
            timestamp: reading.ts.time(),
            kwh: reading.kwh,
            day_of_week: reading.day_of_week,
        }
    }
}

/// Properties of one per-date feature on the device thing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEntry {
    #[serde(default)]
    pub daily_data: DailyRecord,
    #[serde(default)]
    pub hourly_data: Vec<HourlyRecord>,
}

impl FeatureEntry {
    pub fn is_empty(&self) -> bool {
        self.daily_data.is_empty() && self.hourly_data.is_empty()
    }

    /// Folds one incoming row into the entry: the hourly record is appended, the
    /// weather (if any) replaces the stored aggregates.
    pub fn merge(&mut self, weather: Option<WeatherAggregates>, hourly: HourlyRecord) {
        if let Some(weather) = weather {
            self.daily_data.merge_weather(weather);
        }
        self.hourly_data.push(hourly);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::time;

    fn weather() -> WeatherAggregates {
        WeatherAggregates {
            temp_max: 85.0,
            temp_min: 70.0,
            dew_max: 65.0,
            precipitation: 0.0,
            ..Default::default()
        }
    }

    fn hourly(t: Time, kwh: f64) -> HourlyRecord {
        HourlyRecord {
            timestamp: t,
            kwh,
            day_of_week: 3.0,
        }
    }

    #[test]
    fn empty_properties_decode_as_empty_entry() {
        let entry: FeatureEntry = serde_json::from_value(json!({})).unwrap();
        assert!(entry.is_empty());

        let entry: FeatureEntry =
            serde_json::from_value(json!({"dailyData": {}, "hourlyData": []})).unwrap();
        assert!(entry.is_empty());
        assert!(entry.daily_data.weather.is_none());
    }

    #[test]
    fn wire_shape_uses_dataset_column_names() {
        let mut entry = FeatureEntry::default();
        entry.merge(Some(weather()), hourly(time!(01:00:00), 0.8));
        entry.daily_data.lr_prediction = Some(41.5);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["dailyData"]["Temp_max"], json!(85.0));
        assert_eq!(value["dailyData"]["Precipit"], json!(0.0));
        assert_eq!(value["dailyData"]["lr_prediction"], json!(41.5));
        assert!(value["dailyData"].get("svr_prediction").is_none());
        assert_eq!(
            value["hourlyData"],
            json!([{"timestamp": "01:00:00", "Value_kWh": 0.8, "day_of_week": 3.0}])
        );

        let decoded: FeatureEntry = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn daily_data_without_weather_serializes_only_predictions() {
        let record = DailyRecord {
            weather: None,
            lr_prediction: Some(1.0),
            svr_prediction: Some(2.0),
        };
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value, json!({"lr_prediction": 1.0, "svr_prediction": 2.0}));
    }

    #[test]
    fn merge_keeps_predictions_and_appends_in_order() {
        let mut entry = FeatureEntry::default();
        entry.merge(Some(weather()), hourly(time!(00:00:00), 1.2));
        entry.daily_data.lr_prediction = Some(10.0);
        entry.daily_data.svr_prediction = Some(11.0);

        let mut warmer = weather();
        warmer.temp_max = 90.0;
        entry.merge(Some(warmer), hourly(time!(01:00:00), 0.8));
        entry.merge(None, hourly(time!(02:00:00), 0.5));

        assert_eq!(entry.daily_data.weather.map(|w| w.temp_max), Some(90.0));
        assert_eq!(entry.daily_data.lr_prediction, Some(10.0));
        assert_eq!(entry.daily_data.svr_prediction, Some(11.0));
        let times: Vec<_> = entry.hourly_data.iter().map(|h| h.timestamp).collect();
        assert_eq!(times, [time!(00:00:00), time!(01:00:00), time!(02:00:00)]);
    }

    #[test]
    fn integer_weather_values_are_accepted() {
        let entry: FeatureEntry = serde_json::from_value(json!({
            "dailyData": {
                "day_of_week": 3, "Temp_max": 85, "Temp_min": 70, "Temp_avg": 77,
                "Dew_max": 65, "Dew_min": 60, "Dew_avg": 62, "Hum_max": 90,
                "Hum_min": 40, "Hum_avg": 60, "Wind_max": 12, "Wind_min": 0,
                "Wind_avg": 5, "Press_max": 30, "Press_min": 29, "Press_avg": 29.5,
                "Precipit": 0
            }
        }))
        .unwrap();
        assert_eq!(entry.daily_data.weather.map(|w| w.dew_max), Some(65.0));
    }

    #[test]
    fn malformed_hourly_timestamp_is_a_schema_error() {
        let res: Result<FeatureEntry, _> = serde_json::from_value(json!({
            "hourlyData": [{"timestamp": "25 o'clock", "Value_kWh": 1.0, "day_of_week": 0.0}]
        }));
        assert!(res.is_err());
    }
}
