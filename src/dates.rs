// src/dates.rs
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{EeiError, Result};

/// First day of the supported archive
pub fn archive_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Last day of the supported archive
pub fn archive_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Inclusive acquisition-date filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let invalid = |reason: &str| EeiError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
            reason: reason.to_string(),
        };

        if start > end {
            return Err(invalid("start is after end"));
        }
        if start < archive_start() || end > archive_end() {
            return Err(invalid(&format!(
                "bounds must fall within {}..{}",
                archive_start(),
                archive_end()
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| EeiError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
                reason: format!("cannot parse {s}: {e}"),
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// The full 1990-2024 archive
    pub fn archive() -> Self {
        Self {
            start: archive_start(),
            end: archive_end(),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::archive()
    }
}
