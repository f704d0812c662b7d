//! Per-school-year set of non-instructional dates (holidays, closures).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PlannerError;

/// A date on which no classes are held, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonInstructionalDay {
    pub date: NaiveDate,
    pub reason: String,
}

/// The non-instructional days of one school year, unique per date.
///
/// Persisted as a date-ordered list of [`NonInstructionalDay`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NonInstructionalDay>", into = "Vec<NonInstructionalDay>")]
pub struct NonInstructionalCalendar {
    days: BTreeMap<NaiveDate, String>,
}

impl NonInstructionalCalendar {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn reason(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }

    /// Flag a date. The reason must be non-blank and the date not yet flagged.
    pub fn add(&mut self, date: NaiveDate, reason: &str) -> Result<(), PlannerError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PlannerError::validation("reason", "must not be empty"));
        }
        if self.days.contains_key(&date) {
            return Err(PlannerError::Duplicate {
                entity: "non-instructional day",
                key: date.to_string(),
            });
        }
        self.days.insert(date, reason.to_string());
        Ok(())
    }

    /// Unflag a date, returning the removed record.
    pub fn remove(&mut self, date: NaiveDate) -> Result<NonInstructionalDay, PlannerError> {
        self.days
            .remove(&date)
            .map(|reason| NonInstructionalDay { date, reason })
            .ok_or_else(|| PlannerError::not_found("non-instructional day", date.to_string()))
    }

    /// All flagged days in date order.
    pub fn list(&self) -> Vec<NonInstructionalDay> {
        self.days
            .iter()
            .map(|(date, reason)| NonInstructionalDay {
                date: *date,
                reason: reason.clone(),
            })
            .collect()
    }

    /// Flagged dates within the closed range `[from, to]`.
    pub fn dates_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.range(from..=to).map(|(date, _)| *date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl From<Vec<NonInstructionalDay>> for NonInstructionalCalendar {
    fn from(value: Vec<NonInstructionalDay>) -> Self {
        // Later duplicates of a date win, matching how the list was appended.
        Self {
            days: value.into_iter().map(|d| (d.date, d.reason)).collect(),
        }
    }
}

impl From<NonInstructionalCalendar> for Vec<NonInstructionalDay> {
    fn from(value: NonInstructionalCalendar) -> Self {
        value.list()
    }
}
