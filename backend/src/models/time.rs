//! Month-granularity date ranges.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};

/// Half-open `[start, end)` interval covering exactly one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Range for the given calendar month.
    ///
    /// Months outside `1..=12` are rejected rather than wrapped into a
    /// neighbouring year.
    pub fn for_month(year: i32, month: i32) -> PipelineResult<Self> {
        let invalid = |reason: &str| PipelineError::InvalidDateRange {
            year,
            month,
            reason: reason.to_string(),
        };
        if !(1..=12).contains(&month) {
            return Err(invalid("month must be between 1 and 12"));
        }
        let start = NaiveDate::from_ymd_opt(year, month as u32, 1)
            .ok_or_else(|| invalid("year out of supported range"))?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| invalid("year out of supported range"))?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive upper bound (first day of the following month).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
