//! Acquisition date windows.

use chrono::{DateTime, NaiveDate};
use std::fmt;
use thiserror::Error;

/// Errors building a [`DateRange`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("Invalid date '{0}' (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
    Unparseable(String),

    #[error("Date range ends ({end}) before it starts ({start})")]
    Reversed { start: NaiveDate, end: NaiveDate },

    #[error("Date range needs a start and an end, got {0} value(s)")]
    WrongArity(usize),
}

/// Calendar window `[start, end)` used to filter acquisitions.
///
/// `start <= end` always holds; `start == end` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from request strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Parse a `[start, end]` pair as sent in requests.
    pub fn from_pair<S: AsRef<str>>(pair: &[S]) -> Result<Self, DateRangeError> {
        match pair {
            [start, end] => Self::parse(start.as_ref(), end.as_ref()),
            other => Err(DateRangeError::WrongArity(other.len())),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether an acquisition on `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of days in the window.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Accepts a plain calendar date or an RFC 3339 timestamp (date part kept).
pub fn parse_date(value: &str) -> Result<NaiveDate, DateRangeError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| DateRangeError::Unparseable(value.to_string()))
}
