use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::constants::{SCHOOL_YEAR_END_DAY, SCHOOL_YEAR_END_MONTH};
use crate::errors::{Error, ValidationError};

/// A school year written as `YYYY-YYYY`, e.g. `2024-2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchoolYear {
    start: i32,
    end: i32,
}

impl SchoolYear {
    pub fn start_year(&self) -> i32 {
        self.start
    }

    pub fn end_year(&self) -> i32 {
        self.end
    }

    /// Last day of the school year: May 31 of the second year.
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end, SCHOOL_YEAR_END_MONTH, SCHOOL_YEAR_END_DAY)
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn has_ended(&self, today: NaiveDate) -> bool {
        today > self.end_date()
    }
}

impl FromStr for SchoolYear {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Validation(ValidationError::SchoolYear(s.to_string()));

        let (first, second) = s.trim().split_once('-').ok_or_else(invalid)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(invalid());
        }
        let start: i32 = first.parse().map_err(|_| invalid())?;
        let end: i32 = second.parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
