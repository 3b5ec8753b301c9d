use std::fmt;

use chrono::{Datelike, NaiveDate};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};

use crate::error::{FundError, FundResult};

/// Calendar month encoded as `YYYYMM`.
///
/// Dues and repayment entries are keyed by this value; the encoding keeps the
/// natural integer ordering so range queries stay index-friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthYear(i32);

impl MonthYear {
    pub const MIN_YEAR: i32 = 2000;
    pub const MAX_YEAR: i32 = 2100;

    pub fn new(year: i32, month: u32) -> FundResult<Self> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(FundError::validation(
                "month_year",
                format!("year {year} outside [{}, {}]", Self::MIN_YEAR, Self::MAX_YEAR),
            ));
        }
        if !(1..=12).contains(&month) {
            return Err(FundError::validation(
                "month_year",
                format!("month {month} outside [1, 12]"),
            ));
        }
        Ok(MonthYear(year * 100 + month as i32))
    }

    pub fn from_yyyymm(value: i32) -> FundResult<Self> {
        Self::new(value / 100, (value % 100) as u32)
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0 / 100
    }

    pub fn month(self) -> u32 {
        (self.0 % 100) as u32
    }

    pub fn next(self) -> Self {
        if self.month() == 12 {
            MonthYear((self.year() + 1) * 100 + 1)
        } else {
            MonthYear(self.0 + 1)
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // Safe: month is validated on construction
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
            .expect("validated month-year always maps to a date")
    }

    pub fn last_day(self) -> NaiveDate {
        let next = self.next();
        next.first_day() - chrono::Duration::days(1)
    }

    /// Date at `day_of_month` within this month. Callers pass fund config
    /// values constrained to [1, 28], which every month has.
    pub fn day(self, day_of_month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year(), self.month(), day_of_month)
            .unwrap_or_else(|| self.last_day())
    }

    pub fn containing(date: NaiveDate) -> Self {
        MonthYear(date.year() * 100 + date.month() as i32)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// Build a bounded string, surfacing overflow as a validation error.
pub fn bounded<const N: usize>(field: &'static str, value: &str) -> FundResult<HeaplessString<N>> {
    HeaplessString::try_from(value).map_err(|_| FundError::Validation {
        field: field.to_string(),
        message: format!("value exceeds {N} characters"),
    })
}
