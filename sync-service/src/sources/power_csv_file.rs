use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use csv::StringRecord;
use twin_client::PowerReading;

use super::columns::{parse_f64, parse_timestamp, Columns};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// CSV source for hourly `PowerReading`s.
///
/// Expected header columns (by name):
/// - StartDate
/// - Value (kWh)
/// - day_of_week (optional, defaults to 0)
/// - notes (optional)
///
/// The file and its header are read by [`PowerCsvFileSource::open`], so an
/// unreadable input fails before any row is synced. Afterwards a row that fails
/// to parse is yielded as an error and reading continues. The rows can be
/// streamed once.
pub struct PowerCsvFileSource {
    path: PathBuf,
    reader: Mutex<Option<(csv::Reader<File>, Columns)>>,
}

impl PowerCsvFileSource {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, PipelineError> {
        let path = path.into();
        let file = File::open(&path)
            .map_err(|e| PipelineError::Source(format!("failed to open power CSV {}: {e}", path.display())))?;
        let mut rdr = csv::Reader::from_reader(file);
        let cols = rdr
            .headers()
            .map(Columns::new)
            .map_err(|e| PipelineError::Source(format!("failed to read power CSV headers: {e}")))?;

        Ok(Self {
            path,
            reader: Mutex::new(Some((rdr, cols))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn record_to_power_reading(record: &StringRecord, cols: &Columns) -> Result<PowerReading, PipelineError> {
    let ts = parse_timestamp(cols.require(record, "StartDate")?)?;
    let kwh = parse_f64("Value (kWh)", cols.require(record, "Value (kWh)")?)?;
    let day_of_week = cols.f64_or(record, "day_of_week", 0.0)?;
    let notes = cols.get(record, "notes").map(str::to_string);

    Ok(PowerReading {
        ts,
        kwh,
        day_of_week,
        notes,
    })
}

#[async_trait::async_trait]
impl Source<PowerReading> for PowerCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<PowerReading> {
        let taken = self.reader.lock().unwrap_or_else(|p| p.into_inner()).take();
        let path = self.path.clone();

        // Blocking CSV reads inside a single async task; the files are small.
        let s = async_stream::stream! {
            let Some((mut rdr, cols)) = taken else {
                yield Err(PipelineError::Source(format!(
                    "power CSV {} already consumed", path.display()
                )));
                return;
            };

            for (line, result) in rdr.records().enumerate() {
                let parsed = result
                    .map_err(|e| PipelineError::Source(format!("failed to read power CSV record: {e}")))
                    .and_then(|record| record_to_power_reading(&record, &cols));

                match parsed {
                    Ok(reading) => yield Ok(Envelope::now(reading)),
                    Err(e) => {
                        metrics::counter!("power_csv_parse_errors_total").increment(1);
                        tracing::warn!(row = line, error = %e, "skipping power CSV row");
                        yield Err(e);
                    }
                }
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use time::macros::datetime;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn parses_rows_and_reports_bad_ones_without_stopping() {
        let file = csv_file(
            "StartDate,Value (kWh),day_of_week,notes\n\
             2024-02-01 00:00:00,1.2,3,weekday\n\
             not a date,0.5,3,weekday\n\
             2024-02-01 01:00:00,0.8,,\n",
        );
        let source = PowerCsvFileSource::open(file.path()).unwrap();
        let items: Vec<_> = source.stream().await.collect().await;

        assert_eq!(items.len(), 3);
        let first = &items[0].as_ref().unwrap().payload;
        assert_eq!(first.ts, datetime!(2024-02-01 00:00:00));
        assert_eq!(first.kwh, 1.2);
        assert_eq!(first.day_of_week, 3.0);
        assert_eq!(first.notes.as_deref(), Some("weekday"));

        assert!(matches!(items[1], Err(PipelineError::Source(_))));

        let third = &items[2].as_ref().unwrap().payload;
        assert_eq!(third.kwh, 0.8);
        assert_eq!(third.day_of_week, 0.0);
        assert!(third.notes.is_none());
    }

    #[test]
    fn missing_file_fails_to_open() {
        assert!(matches!(
            PowerCsvFileSource::open("/nonexistent/power.csv"),
            Err(PipelineError::Source(_))
        ));
    }

    #[tokio::test]
    async fn rows_stream_once() {
        let file = csv_file("StartDate,Value (kWh)\n2024-02-01 00:00:00,1.0\n");
        let source = PowerCsvFileSource::open(file.path()).unwrap();

        assert_eq!(source.stream().await.count().await, 1);
        let again: Vec<_> = source.stream().await.collect().await;
        assert_eq!(again.len(), 1);
        assert!(again[0].is_err());
    }
}
