use std::fmt;

use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Identifier of one per-date feature on the device thing: `<prefix><YYYY-MM-DD>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    id: String,
    date: Date,
}

impl FeatureKey {
    pub fn new(prefix: &str, date: Date) -> Self {
        Self {
            id: format!("{prefix}{}", format_iso_date(date)),
            date,
        }
    }

    /// Parses a remote feature id. Only ids made of exactly `prefix` followed by a
    /// valid ISO calendar date are accepted.
    pub fn parse(prefix: &str, id: &str) -> Option<Self> {
        let date = parse_iso_date(id.strip_prefix(prefix)?)?;
        Some(Self {
            id: id.to_string(),
            date,
        })
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Strict `YYYY-MM-DD` parsing: four-digit year, two-digit month and day.
pub fn parse_iso_date(s: &str) -> Option<Date> {
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    Date::parse(s, ISO_DATE).ok()
}

pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
