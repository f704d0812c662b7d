//! Cycle-day numbering.
//!
//! Classes are not scheduled on calendar weekdays but on a repeating
//! six-day cycle ("Day 1" .. "Day 6") that only advances on instructional
//! days. [`engine`] maps calendar dates onto that cycle for a school year.

pub mod engine;

pub use engine::{CycleConfig, CycleContext, CycleDates, CycleSettings};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

/// Number of days in one cycle.
pub const CYCLE_LENGTH: u8 = 6;

/// One of the six recurring instructional slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CycleDay(u8);

impl CycleDay {
    pub const FIRST: CycleDay = CycleDay(1);
    pub const LAST: CycleDay = CycleDay(CYCLE_LENGTH);

    pub fn new(value: u8) -> Result<Self, PlannerError> {
        if (1..=CYCLE_LENGTH).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PlannerError::validation(
                "cycle_day",
                format!("{value} is outside 1..={CYCLE_LENGTH}"),
            ))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The following cycle day; Day 6 wraps to Day 1.
    pub fn next(self) -> Self {
        if self.0 == CYCLE_LENGTH {
            Self::FIRST
        } else {
            Self(self.0 + 1)
        }
    }

    /// Cycle day for a zero-based signed ordinal of instructional days,
    /// where ordinal 0 is Day 1 and negative ordinals count backwards.
    pub fn from_ordinal(ordinal: i64) -> Self {
        Self(ordinal.rem_euclid(CYCLE_LENGTH as i64) as u8 + 1)
    }

    /// Days 1 through 6 in order.
    pub fn all() -> impl Iterator<Item = CycleDay> {
        (1..=CYCLE_LENGTH).map(CycleDay)
    }
}

impl fmt::Display for CycleDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CycleDay {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| PlannerError::validation("cycle_day", format!("'{s}' is not a number")))?;
        Self::new(value)
    }
}

impl TryFrom<u8> for CycleDay {
    type Error = PlannerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CycleDay> for u8 {
    fn from(value: CycleDay) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_enforced() {
        assert!(CycleDay::new(0).is_err());
        assert!(CycleDay::new(7).is_err());
        assert_eq!(CycleDay::new(6).unwrap(), CycleDay::LAST);
        assert!("x".parse::<CycleDay>().is_err());
        assert_eq!(" 3 ".parse::<CycleDay>().unwrap().get(), 3);
    }

    #[test]
    fn next_wraps_after_six() {
        assert_eq!(CycleDay::LAST.next(), CycleDay::FIRST);
        assert_eq!(CycleDay::FIRST.next().get(), 2);
    }

    #[test]
    fn ordinals_wrap_in_both_directions() {
        assert_eq!(CycleDay::from_ordinal(0).get(), 1);
        assert_eq!(CycleDay::from_ordinal(5).get(), 6);
        assert_eq!(CycleDay::from_ordinal(6).get(), 1);
        assert_eq!(CycleDay::from_ordinal(-1).get(), 6);
        assert_eq!(CycleDay::from_ordinal(-6).get(), 1);
    }

    #[test]
    fn serializes_as_number_and_map_key() {
        use std::collections::BTreeMap;

        assert_eq!(serde_json::to_string(&CycleDay::new(4).unwrap()).unwrap(), "4");
        let mut map = BTreeMap::new();
        map.insert(CycleDay::new(2).unwrap(), "2025-08-04");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2":"2025-08-04"}"#);
        let back: BTreeMap<CycleDay, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert!(serde_json::from_str::<CycleDay>("9").is_err());
    }
}
