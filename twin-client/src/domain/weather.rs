use serde::{Deserialize, Serialize};
use time::Date;

/// Daily weather aggregates, named after the weather dataset columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherAggregates {
    pub day_of_week: f64,
    #[serde(rename = "Temp_max")]
    pub temp_max: f64,
    #[serde(rename = "Temp_min")]
    pub temp_min: f64,
    #[serde(rename = "Temp_avg")]
    pub temp_avg: f64,
    #[serde(rename = "Dew_max")]
    pub dew_max: f64,
    #[serde(rename = "Dew_min")]
    pub dew_min: f64,
    #[serde(rename = "Dew_avg")]
    pub dew_avg: f64,
    #[serde(rename = "Hum_max")]
    pub hum_max: f64,
    #[serde(rename = "Hum_min")]
    pub hum_min: f64,
    #[serde(rename = "Hum_avg")]
    pub hum_avg: f64,
    #[serde(rename = "Wind_max")]
    pub wind_max: f64,
    #[serde(rename = "Wind_min")]
    pub wind_min: f64,
    #[serde(rename = "Wind_avg")]
    pub wind_avg: f64,
    #[serde(rename = "Press_max")]
    pub press_max: f64,
    #[serde(rename = "Press_min")]
    pub press_min: f64,
    #[serde(rename = "Press_avg")]
    pub press_avg: f64,
    #[serde(rename = "Precipit")]
    pub precipitation: f64,
}

impl WeatherAggregates {
    /// Column names in dataset order.
    pub const COLUMNS: [&'static str; 17] = [
        "day_of_week",
        "Temp_max",
        "Temp_min",
        "Temp_avg",
        "Dew_max",
        "Dew_min",
        "Dew_avg",
        "Hum_max",
        "Hum_min",
        "Hum_avg",
        "Wind_max",
        "Wind_min",
        "Wind_avg",
        "Press_max",
        "Press_min",
        "Press_avg",
        "Precipit",
    ];

    /// Builds aggregates from values given in [`Self::COLUMNS`] order.
    pub fn from_columns(values: [f64; 17]) -> Self {
        let [day_of_week, temp_max, temp_min, temp_avg, dew_max, dew_min, dew_avg, hum_max, hum_min, hum_avg, wind_max, wind_min, wind_avg, press_max, press_min, press_avg, precipitation] =
            values;
        Self {
            day_of_week,
            temp_max,
            temp_min,
            temp_avg,
            dew_max,
            dew_min,
            dew_avg,
            hum_max,
            hum_min,
            hum_avg,
            wind_max,
            wind_min,
            wind_avg,
            press_max,
            press_min,
            press_avg,
            precipitation,
        }
    }
}

/// One row of the daily weather dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherDay {
    pub date: Date,
    pub aggregates: WeatherAggregates,
}
