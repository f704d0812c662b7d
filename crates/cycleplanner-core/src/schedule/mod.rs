//! Schedule types: class entries, their slot key and validation policy.
//!
//! The [`ScheduleRegistry`] in [`registry`] owns the entries and enforces
//! slot uniqueness.

pub mod registry;

pub use registry::{
    CycleGrid, GridCell, ImportFailure, ImportReport, Reactivation, RegistryStats, ScheduleRegistry,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cycle::CycleDay;
use crate::error::PlannerError;

/// School grade, 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
    pub fn new(value: u8) -> Result<Self, PlannerError> {
        if (1..=6).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PlannerError::validation("grade", format!("{value} is outside 1..=6")))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Grades 1 and 2.
    pub fn is_lower(self) -> bool {
        self.0 <= 2
    }

    pub fn all() -> impl Iterator<Item = Grade> {
        (1..=6).map(Grade)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Grade {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| PlannerError::validation("grade", format!("'{s}' is not a number")))?;
        Self::new(value)
    }
}

impl TryFrom<u8> for Grade {
    type Error = PlannerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Grade> for u8 {
    fn from(value: Grade) -> Self {
        value.0
    }
}

/// One of the six fixed daily periods. Ordered P1 < P2 < ... < P6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::P1,
        Period::P2,
        Period::P3,
        Period::P4,
        Period::P5,
        Period::P6,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::P1 => "P1",
            Period::P2 => "P2",
            Period::P3 => "P3",
            Period::P4 => "P4",
            Period::P5 => "P5",
            Period::P6 => "P6",
        }
    }

    /// Bell times of the period.
    pub fn time_range(self) -> &'static str {
        match self {
            Period::P1 => "7:55 AM - 8:50 AM",
            Period::P2 => "9:20 AM - 10:15 AM",
            Period::P3 => "10:20 AM - 11:15 AM",
            Period::P4 => "11:20 AM - 12:15 PM",
            Period::P5 => "1:00 PM - 1:55 PM",
            Period::P6 => "2:00 PM - 2:50 PM",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlannerError::validation("period", format!("'{s}' is not one of P1..P6")))
    }
}

/// Homeroom of a grade, optionally narrowed to a numbered sub-group
/// (`"A"`, `"B-2"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Group {
    homeroom: String,
    subgroup: Option<String>,
}

impl Group {
    pub fn new(homeroom: &str, subgroup: Option<&str>) -> Result<Self, PlannerError> {
        let homeroom = homeroom.trim();
        if homeroom.is_empty() {
            return Err(PlannerError::validation("homeroom", "must not be empty"));
        }
        if homeroom.contains('-') {
            return Err(PlannerError::validation("homeroom", "must not contain '-'"));
        }
        let subgroup = subgroup.map(str::trim).filter(|s| !s.is_empty());
        Ok(Self {
            homeroom: homeroom.to_string(),
            subgroup: subgroup.map(str::to_string),
        })
    }

    pub fn homeroom(&self) -> &str {
        &self.homeroom
    }

    pub fn subgroup(&self) -> Option<&str> {
        self.subgroup.as_deref()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subgroup {
            Some(sub) => write!(f, "{}-{}", self.homeroom, sub),
            None => f.write_str(&self.homeroom),
        }
    }
}

impl FromStr for Group {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((homeroom, sub)) => Self::new(homeroom, Some(sub)),
            None => Self::new(s, None),
        }
    }
}

impl TryFrom<String> for Group {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Group> for String {
    fn from(value: Group) -> Self {
        value.to_string()
    }
}

/// The slot a class occupies. No two active entries may share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub grade: Grade,
    pub group: Group,
    pub period: Period,
    pub cycle_day: CycleDay,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grade {} group {} {} day {}",
            self.grade, self.group, self.period, self.cycle_day
        )
    }
}

/// A planned class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub id: String,
    pub grade: Grade,
    pub group: Group,
    pub subject: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    pub date: NaiveDate,
    pub cycle_day: CycleDay,
    pub period: Period,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ClassEntry {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            grade: self.grade,
            group: self.group.clone(),
            period: self.period,
            cycle_day: self.cycle_day,
        }
    }
}

/// Candidate for a new class entry. Every `Option` field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDraft {
    pub grade: Option<Grade>,
    pub homeroom: String,
    pub subgroup: Option<String>,
    pub subject: String,
    pub topic: String,
    pub description: String,
    pub notes: String,
    pub date: Option<NaiveDate>,
    pub cycle_day: Option<CycleDay>,
    pub period: Option<Period>,
}

/// Field merge for an existing entry; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassPatch {
    pub grade: Option<Grade>,
    pub group: Option<Group>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
    pub cycle_day: Option<CycleDay>,
    pub period: Option<Period>,
}

impl ClassPatch {
    pub fn is_empty(&self) -> bool {
        *self == ClassPatch::default()
    }

    fn touches_slot(&self) -> bool {
        self.grade.is_some() || self.group.is_some() || self.period.is_some() || self.cycle_day.is_some()
    }
}

/// Conjunctive filter over the active entries; `None` means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub grade: Option<Grade>,
    pub group: Option<Group>,
    pub period: Option<Period>,
    pub cycle_day: Option<CycleDay>,
}

impl ScheduleFilter {
    pub fn matches(&self, entry: &ClassEntry) -> bool {
        self.grade.map_or(true, |g| entry.grade == g)
            && self.group.as_ref().map_or(true, |g| &entry.group == g)
            && self.period.map_or(true, |p| entry.period == p)
            && self.cycle_day.map_or(true, |c| entry.cycle_day == c)
    }
}

/// Extra field rules on top of the required-field checks.
///
/// Relaxed by default. `strict` enables the homeroom and subject rules the
/// first planner enforced: grades 1-2 choose from `lower_grade_homerooms`,
/// grades 3-6 from `upper_grade_homerooms`, and grades 3-6 must use
/// `upper_grade_subject` when it is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_lower_grade_homerooms")]
    pub lower_grade_homerooms: Vec<String>,
    #[serde(default = "default_upper_grade_homerooms")]
    pub upper_grade_homerooms: Vec<String>,
    #[serde(default)]
    pub upper_grade_subject: Option<String>,
}

fn default_lower_grade_homerooms() -> Vec<String> {
    vec!["A".into(), "B".into(), "C".into()]
}

fn default_upper_grade_homerooms() -> Vec<String> {
    vec!["A".into(), "B".into()]
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            strict: false,
            lower_grade_homerooms: default_lower_grade_homerooms(),
            upper_grade_homerooms: default_upper_grade_homerooms(),
            upper_grade_subject: None,
        }
    }
}

impl ValidationPolicy {
    /// Check the grade/group/subject combination of an entry.
    pub fn check(&self, grade: Grade, group: &Group, subject: &str) -> Result<(), PlannerError> {
        if subject.trim().is_empty() {
            return Err(PlannerError::validation("subject", "must not be empty"));
        }
        if !self.strict {
            return Ok(());
        }

        let allowed = if grade.is_lower() {
            &self.lower_grade_homerooms
        } else {
            &self.upper_grade_homerooms
        };
        if !allowed.iter().any(|h| h == group.homeroom()) {
            return Err(PlannerError::validation(
                "homeroom",
                format!(
                    "grade {grade} only has homerooms {}",
                    allowed.join(", ")
                ),
            ));
        }

        if let Some(required) = &self.upper_grade_subject {
            if !grade.is_lower() && subject.trim() != required {
                return Err(PlannerError::validation(
                    "subject",
                    format!("grade {grade} classes must be '{required}'"),
                ));
            }
        }
        Ok(())
    }
}
