use std::{collections::BTreeMap, fs::File, path::Path};

use csv::StringRecord;
use time::Date;
use twin_client::{WeatherAggregates, WeatherDay};

use super::columns::{parse_date, Columns};
use crate::pipeline::PipelineError;

fn record_to_weather_day(record: &StringRecord, cols: &Columns) -> Result<WeatherDay, PipelineError> {
    let date = parse_date(cols.require(record, "Date")?)?;

    // Absent or empty columns read as 0.0.
    let mut values = [0.0; 17];
    for (value, name) in values.iter_mut().zip(WeatherAggregates::COLUMNS) {
        *value = cols.f64_or(record, name, 0.0)?;
    }

    Ok(WeatherDay {
        date,
        aggregates: WeatherAggregates::from_columns(values),
    })
}

/// Reads a daily weather CSV (`Date` plus the aggregate columns).
///
/// Rows that fail to parse are logged and skipped; only an unreadable file or
/// header is an error.
pub fn read_weather_csv(path: &Path) -> Result<Vec<WeatherDay>, PipelineError> {
    let file = File::open(path)
        .map_err(|e| PipelineError::Source(format!("failed to open weather CSV {}: {e}", path.display())))?;
    let mut rdr = csv::Reader::from_reader(file);
    let cols = Columns::new(
        rdr.headers()
            .map_err(|e| PipelineError::Source(format!("failed to read weather CSV headers: {e}")))?,
    );

    let mut days = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let parsed = result
            .map_err(|e| PipelineError::Source(format!("failed to read weather CSV record: {e}")))
            .and_then(|record| record_to_weather_day(&record, &cols));
        match parsed {
            Ok(day) => days.push(day),
            Err(e) => {
                metrics::counter!("weather_csv_parse_errors_total").increment(1);
                tracing::warn!(row = line, error = %e, "skipping weather CSV row");
            }
        }
    }

    Ok(days)
}

/// Same-day weather lookup. When the dataset holds several rows for one
/// calendar date, the first one wins.
#[derive(Debug, Clone, Default)]
pub struct WeatherIndex {
    by_date: BTreeMap<Date, WeatherAggregates>,
}

impl WeatherIndex {
    pub fn from_days<I: IntoIterator<Item = WeatherDay>>(days: I) -> Self {
        let mut by_date = BTreeMap::new();
        for day in days {
            by_date.entry(day.date).or_insert(day.aggregates);
        }
        Self { by_date }
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let index = Self::from_days(read_weather_csv(path)?);
        tracing::info!(path = %path.display(), days = index.len(), "loaded weather data");
        Ok(index)
    }

    pub fn get(&self, date: Date) -> Option<WeatherAggregates> {
        self.by_date.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use time::macros::date;

    #[test]
    fn reads_columns_and_defaults_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Date,Temp_max,Temp_min,Dew_max,Precipit,Hum_avg\n\
             2024-02-01,85,70,65,0.0,\n\
             2024-02-02,bad,70,65,0.0,55\n\
             2024-02-03,80,60,50,0.2,55\n"
        )
        .unwrap();

        let days = read_weather_csv(file.path()).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date!(2024-02-01));
        assert_eq!(days[0].aggregates.temp_max, 85.0);
        assert_eq!(days[0].aggregates.dew_max, 65.0);
        assert_eq!(days[0].aggregates.hum_avg, 0.0);
        assert_eq!(days[0].aggregates.press_avg, 0.0);
        assert_eq!(days[1].date, date!(2024-02-03));
        assert_eq!(days[1].aggregates.precipitation, 0.2);
    }

    #[test]
    fn non_finite_cell_drops_the_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Date,Temp_max,Temp_min,Dew_max,Precipit,Hum_avg\n\
             2024-02-01,85,70,65,0.0,NaN\n\
             2024-02-02,80,60,50,inf,55\n\
             2024-02-03,80,60,50,0.2,55\n"
        )
        .unwrap();

        let index = WeatherIndex::load(file.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get(date!(2024-02-01)).is_none());
        assert!(index.get(date!(2024-02-03)).is_some());
    }

    #[test]
    fn first_row_per_date_wins_and_unknown_dates_are_absent() {
        let day = |d: Date, temp_max: f64| WeatherDay {
            date: d,
            aggregates: WeatherAggregates {
                temp_max,
                ..Default::default()
            },
        };
        let index = WeatherIndex::from_days([
            day(date!(2024-02-01), 85.0),
            day(date!(2024-02-01), 10.0),
            day(date!(2024-02-02), 80.0),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(date!(2024-02-01)).map(|w| w.temp_max), Some(85.0));
        assert!(index.get(date!(2099-01-01)).is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(WeatherIndex::load(Path::new("/nonexistent/weather.csv")).is_err());
    }
}
