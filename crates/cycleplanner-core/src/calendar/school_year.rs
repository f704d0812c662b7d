//! School year labels such as `2025-2026`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

/// A school year spanning two consecutive calendar years.
///
/// Serialized as its label (`"2025-2026"`), which is also the key every
/// per-year record is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchoolYear {
    start_year: i32,
}

impl SchoolYear {
    /// Start years with a four-digit label on both ends.
    pub const START_YEARS: std::ops::RangeInclusive<i32> = 1000..=9998;

    /// School year starting in `start_year` and ending the following year.
    /// The start is clamped to [`Self::START_YEARS`].
    pub fn starting(start_year: i32) -> Self {
        Self {
            start_year: start_year.clamp(*Self::START_YEARS.start(), *Self::START_YEARS.end()),
        }
    }

    /// Build from both years; the end must be exactly one after the start.
    pub fn new(start_year: i32, end_year: i32) -> Result<Self, PlannerError> {
        if !Self::START_YEARS.contains(&start_year) {
            return Err(PlannerError::validation(
                "school_year",
                format!("start year {start_year} is outside 1000-9998"),
            ));
        }
        if end_year != start_year + 1 {
            return Err(PlannerError::validation(
                "school_year",
                format!("{start_year}-{end_year} must span exactly one year"),
            ));
        }
        Ok(Self { start_year })
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start_year, self.end_year())
    }

    /// Calendar year a 0-based month index falls in for this school year.
    ///
    /// Months at or after the anchor month (1-based, e.g. 8 for August)
    /// belong to the start year; earlier months to the end year.
    pub fn calendar_year_for_month(&self, month_index: u32, anchor_month: u32) -> i32 {
        if month_index + 1 >= anchor_month {
            self.start_year
        } else {
            self.end_year()
        }
    }
}

impl Default for SchoolYear {
    fn default() -> Self {
        Self::starting(2025)
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year())
    }
}

impl FromStr for SchoolYear {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PlannerError::validation("school_year", format!("expected YYYY-YYYY, got '{s}'"));
        let (start, end) = s.trim().split_once('-').ok_or_else(malformed)?;
        let start: i32 = start.parse().map_err(|_| malformed())?;
        let end: i32 = end.parse().map_err(|_| malformed())?;
        Self::new(start, end)
    }
}

impl TryFrom<String> for SchoolYear {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchoolYear> for String {
    fn from(value: SchoolYear) -> Self {
        value.label()
    }
}
