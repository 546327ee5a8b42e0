use std::path::Path;

use time::Date;

use super::columns::{parse_date, Columns};
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitCounts {
    pub train: usize,
    pub test: usize,
    pub skipped: usize,
}

/// Splits a CSV by calendar date: rows dated strictly before `cutoff` go to
/// `train_out`, the rest to `test_out`. Both outputs keep the header.
pub fn split_csv_by_date(
    input: &Path,
    date_column: &str,
    cutoff: Date,
    train_out: &Path,
    test_out: &Path,
) -> Result<SplitCounts, PipelineError> {
    let src = |e: csv::Error| PipelineError::Source(e.to_string());
    let sink = |e: csv::Error| PipelineError::Sink(e.to_string());

    let mut rdr = csv::Reader::from_path(input).map_err(src)?;
    let headers = rdr.headers().map_err(src)?.clone();
    let cols = Columns::new(&headers);
    if cols.position(date_column).is_none() {
        return Err(PipelineError::Source(format!(
            "column '{date_column}' not found in {}",
            input.display()
        )));
    }

    let mut train = csv::Writer::from_path(train_out).map_err(sink)?;
    let mut test = csv::Writer::from_path(test_out).map_err(sink)?;
    train.write_record(&headers).map_err(sink)?;
    test.write_record(&headers).map_err(sink)?;

    let mut counts = SplitCounts::default();
    for result in rdr.records() {
        let record = result.map_err(src)?;
        let date = match cols.require(&record, date_column).and_then(parse_date) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "skipping row without a usable date");
                counts.skipped += 1;
                continue;
            }
        };

        if date < cutoff {
            train.write_record(&record).map_err(sink)?;
            counts.train += 1;
        } else {
            test.write_record(&record).map_err(sink)?;
            counts.test += 1;
        }
    }

    train.flush().map_err(|e| PipelineError::Sink(e.to_string()))?;
    test.flush().map_err(|e| PipelineError::Sink(e.to_string()))?;

    Ok(counts)
}
