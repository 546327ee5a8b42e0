//! Header-addressed access to CSV records and the date formats found in the
//! power and weather datasets.

use csv::StringRecord;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime, Time};

use crate::pipeline::PipelineError;

const DATETIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]:[second]"),
    format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]"),
];

const DATE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
];

pub struct Columns {
    headers: StringRecord,
}

impl Columns {
    pub fn new(headers: &StringRecord) -> Self {
        let headers = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        Self { headers }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Trimmed cell value; `None` when the column is absent or the cell is empty.
    pub fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.position(name)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn require<'r>(&self, record: &'r StringRecord, name: &str) -> Result<&'r str, PipelineError> {
        self.get(record, name)
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    }

    pub fn f64_or(&self, record: &StringRecord, name: &str, default: f64) -> Result<f64, PipelineError> {
        match self.get(record, name) {
            Some(s) => parse_f64(name, s),
            None => Ok(default),
        }
    }
}

/// Parses a numeric cell. `NaN` and infinities are rejected: they do not
/// survive a JSON round trip.
pub fn parse_f64(name: &str, s: &str) -> Result<f64, PipelineError> {
    let value: f64 = s
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid {name} '{s}': {e}")))?;
    if !value.is_finite() {
        return Err(PipelineError::Source(format!("non-finite {name} '{s}'")));
    }
    Ok(value)
}

/// Parses a reading timestamp. A bare date means midnight.
pub fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, PipelineError> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| PrimitiveDateTime::parse(s, *fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| Date::parse(s, *fmt).ok())
                .map(|d| d.with_time(Time::MIDNIGHT))
        })
        .ok_or_else(|| PipelineError::Source(format!("invalid timestamp '{s}'")))
}

/// Parses a calendar date; timestamps are truncated to their date.
pub fn parse_date(s: &str) -> Result<Date, PipelineError> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| Date::parse(s, *fmt).ok())
        .or_else(|| parse_timestamp(s).ok().map(|ts| ts.date()))
        .ok_or_else(|| PipelineError::Source(format!("invalid date '{s}'")))
}
