//! Cycle mapping engine.
//!
//! Owns, per school year, the configured cycle start, explicit per-date
//! overrides, per-month anchors and the derived "current window"
//! (`cycle_dates`: one calendar date per cycle day).
//!
//! Two operations derive the window and they are deliberately separate:
//!
//! - [`CycleConfig::recompute_cycle_dates`] rebuilds the whole window from
//!   the year's anchor date.
//! - [`CycleConfig::compute_month_cycle_dates`] re-anchors one month and
//!   overwrites only the slots that month's walk reaches. It is a partial,
//!   scoped override of the former, so the resulting window depends on
//!   which of the two ran last.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CycleDay, CYCLE_LENGTH};
use crate::calendar::{self, NonInstructionalCalendar, SchoolYear};
use crate::error::PlannerError;

/// Cycle day -> calendar date for the current cycle window.
pub type CycleDates = BTreeMap<CycleDay, NaiveDate>;

/// Highest accepted `start_day` (day of the anchor month).
pub const MAX_START_DAY: u32 = 6;

/// Engine knobs shared by every school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    /// Calendar month (1-12) the school year's cycle is anchored in.
    pub anchor_month: u32,
    /// Upper bound, in calendar days, on any forward scan for instructional days.
    pub scan_window_days: i64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            anchor_month: 8,
            scan_window_days: 62,
        }
    }
}

/// Everything outside the cycle config that a computation reads.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext<'a> {
    pub school_year: SchoolYear,
    pub non_instructional: &'a NonInstructionalCalendar,
    pub settings: CycleSettings,
}

impl CycleContext<'_> {
    fn is_instructional(&self, date: NaiveDate) -> bool {
        calendar::is_instructional_day(date, self.non_instructional)
    }
}

/// Cycle configuration of one school year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Day of the anchor month the cycle starts counting from (1..=6).
    pub start_day: u32,
    /// Explicit per-date assignments; they win over computed values.
    #[serde(default)]
    pub overrides: BTreeMap<NaiveDate, CycleDay>,
    /// 0-based month index -> cycle day that month starts on.
    #[serde(default)]
    pub month_first_cycle_day: BTreeMap<u32, CycleDay>,
    /// Derived current window.
    #[serde(default)]
    pub cycle_dates: CycleDates,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            start_day: 1,
            overrides: BTreeMap::new(),
            month_first_cycle_day: BTreeMap::new(),
            cycle_dates: BTreeMap::new(),
        }
    }
}

fn validate_month(month: u32) -> Result<(), PlannerError> {
    if month < 12 {
        Ok(())
    } else {
        Err(PlannerError::validation(
            "month",
            format!("{month} is outside 0..=11"),
        ))
    }
}

impl CycleConfig {
    /// Calendar date named by `start_day` in the anchor month, before any
    /// skipping of non-instructional days.
    fn raw_start_date(&self, ctx: &CycleContext<'_>) -> Result<NaiveDate, PlannerError> {
        NaiveDate::from_ymd_opt(
            ctx.school_year.start_year(),
            ctx.settings.anchor_month,
            self.start_day,
        )
        .ok_or_else(|| {
            PlannerError::Configuration(format!(
                "no calendar date for start day {} of month {} in {}",
                self.start_day, ctx.settings.anchor_month, ctx.school_year
            ))
        })
    }

    /// The instructional date that is Day 1 of the year's cycle: the start
    /// date itself, or the first instructional day after it.
    pub fn anchor_date(&self, ctx: &CycleContext<'_>) -> Result<NaiveDate, PlannerError> {
        let start = self.raw_start_date(ctx)?;
        calendar::next_instructional_day(start, ctx.non_instructional, ctx.settings.scan_window_days)
            .ok_or_else(|| {
                PlannerError::Configuration(format!(
                    "no instructional day within {} days of {start}",
                    ctx.settings.scan_window_days
                ))
            })
    }

    /// Cycle day of any calendar date.
    ///
    /// Overrides win. Otherwise the cycle is the count of instructional
    /// days elapsed since the anchor, modulo six: closures are simply not
    /// counted, they never shift the cycle. A non-instructional date
    /// reports the cycle day of the latest instructional day before it.
    pub fn cycle_day_for_date(
        &self,
        date: NaiveDate,
        ctx: &CycleContext<'_>,
    ) -> Result<CycleDay, PlannerError> {
        if let Some(day) = self.overrides.get(&date) {
            return Ok(*day);
        }

        let anchor = self.anchor_date(ctx)?;
        let ordinal = if date >= anchor {
            calendar::instructional_days_between(anchor, date, ctx.non_instructional) - 1
        } else {
            let between = calendar::instructional_days_between(
                date + Duration::days(1),
                anchor - Duration::days(1),
                ctx.non_instructional,
            );
            -between - 1
        };
        Ok(CycleDay::from_ordinal(ordinal))
    }

    /// Rebuild the current window from the anchor date: the first six
    /// instructional dates get Days 1..6.
    ///
    /// The scan is bounded by `scan_window_days`; if fewer than six
    /// instructional days fit, the previous window is left untouched.
    pub fn recompute_cycle_dates(
        &mut self,
        ctx: &CycleContext<'_>,
    ) -> Result<&CycleDates, PlannerError> {
        let start = self.raw_start_date(ctx)?;
        let mut next = CycleDates::new();
        let mut day = CycleDay::FIRST;

        for offset in 0..ctx.settings.scan_window_days {
            let date = start + Duration::days(offset);
            if !ctx.is_instructional(date) {
                continue;
            }
            next.insert(day, date);
            if day == CycleDay::LAST {
                break;
            }
            day = day.next();
        }

        if next.len() < CYCLE_LENGTH as usize {
            return Err(PlannerError::Configuration(format!(
                "only {} of {CYCLE_LENGTH} cycle days fit within {} days of {start}",
                next.len(),
                ctx.settings.scan_window_days
            )));
        }

        tracing::debug!(
            school_year = %ctx.school_year,
            first = %next[&CycleDay::FIRST],
            last = %next[&CycleDay::LAST],
            "recomputed cycle dates"
        );
        self.cycle_dates = next;
        Ok(&self.cycle_dates)
    }

    /// Walk every instructional day of one month, starting at
    /// `first_cycle_day` and cycling 1..6, and write each assignment into
    /// the window. Later dates overwrite earlier ones for the same slot.
    ///
    /// `month` is a 0-based index; the calendar year follows the school
    /// year (months before the anchor month fall in the end year).
    pub fn compute_month_cycle_dates(
        &mut self,
        month: u32,
        first_cycle_day: CycleDay,
        ctx: &CycleContext<'_>,
    ) -> Result<&CycleDates, PlannerError> {
        let assignments = self.walk_month(month, first_cycle_day, ctx, usize::MAX)?;
        if assignments.is_empty() {
            return Err(PlannerError::Configuration(format!(
                "month {month} of {} has no instructional days",
                ctx.school_year
            )));
        }

        let mut next = self.cycle_dates.clone();
        for (day, date) in assignments {
            next.insert(day, date);
        }
        self.cycle_dates = next;
        Ok(&self.cycle_dates)
    }

    /// The first six assignments a month walk would make, without touching
    /// the window.
    pub fn preview_month_cycle(
        &self,
        month: u32,
        first_cycle_day: CycleDay,
        ctx: &CycleContext<'_>,
    ) -> Result<CycleDates, PlannerError> {
        let assignments = self.walk_month(month, first_cycle_day, ctx, CYCLE_LENGTH as usize)?;
        Ok(assignments.into_iter().collect())
    }

    fn walk_month(
        &self,
        month: u32,
        first_cycle_day: CycleDay,
        ctx: &CycleContext<'_>,
        limit: usize,
    ) -> Result<Vec<(CycleDay, NaiveDate)>, PlannerError> {
        validate_month(month)?;
        let year = ctx
            .school_year
            .calendar_year_for_month(month, ctx.settings.anchor_month);
        let first = NaiveDate::from_ymd_opt(year, month + 1, 1)
            .ok_or_else(|| PlannerError::validation("month", format!("{month} has no first day")))?;
        let last = calendar::last_day_of_month(year, month + 1)
            .ok_or_else(|| PlannerError::validation("month", format!("{month} has no last day")))?;

        let mut day = first_cycle_day;
        let mut out = Vec::new();
        for date in first.iter_days().take_while(|d| *d <= last) {
            if out.len() >= limit {
                break;
            }
            if ctx.is_instructional(date) {
                out.push((day, date));
                day = day.next();
            }
        }
        Ok(out)
    }

    /// Store a month anchor and re-anchor that month's window.
    pub fn set_month_first_cycle_day(
        &mut self,
        month: u32,
        first_cycle_day: CycleDay,
        ctx: &CycleContext<'_>,
    ) -> Result<&CycleDates, PlannerError> {
        validate_month(month)?;
        let previous = self.month_first_cycle_day.insert(month, first_cycle_day);
        if let Err(err) = self.compute_month_cycle_dates(month, first_cycle_day, ctx) {
            match previous {
                Some(day) => self.month_first_cycle_day.insert(month, day),
                None => self.month_first_cycle_day.remove(&month),
            };
            return Err(err);
        }
        Ok(&self.cycle_dates)
    }

    /// Change the start day and recompute; on failure the old start day
    /// and window stay in place.
    pub fn set_start_day(
        &mut self,
        start_day: u32,
        ctx: &CycleContext<'_>,
    ) -> Result<&CycleDates, PlannerError> {
        if !(1..=MAX_START_DAY).contains(&start_day) {
            return Err(PlannerError::validation(
                "start_day",
                format!("{start_day} is outside 1..={MAX_START_DAY}"),
            ));
        }
        let previous = self.start_day;
        self.start_day = start_day;
        if let Err(err) = self.recompute_cycle_dates(ctx) {
            self.start_day = previous;
            return Err(err);
        }
        Ok(&self.cycle_dates)
    }

    /// Manually pin one slot of the current window to a date.
    pub fn set_cycle_date(
        &mut self,
        day: CycleDay,
        date: NaiveDate,
        ctx: &CycleContext<'_>,
    ) -> Result<(), PlannerError> {
        if !ctx.is_instructional(date) {
            return Err(PlannerError::validation(
                "date",
                format!("{date} is not an instructional day"),
            ));
        }
        self.cycle_dates.insert(day, date);
        Ok(())
    }

    pub fn set_override(
        &mut self,
        date: NaiveDate,
        day: CycleDay,
        ctx: &CycleContext<'_>,
    ) -> Result<(), PlannerError> {
        if !ctx.is_instructional(date) {
            return Err(PlannerError::validation(
                "date",
                format!("{date} is not an instructional day"),
            ));
        }
        self.overrides.insert(date, day);
        Ok(())
    }

    pub fn clear_override(&mut self, date: NaiveDate) -> Result<CycleDay, PlannerError> {
        self.overrides
            .remove(&date)
            .ok_or_else(|| PlannerError::not_found("cycle override", date.to_string()))
    }

    /// Drop overrides sitting on dates that are no longer instructional.
    /// Returns the dropped dates.
    pub fn prune_overrides(&mut self, non_instructional: &NonInstructionalCalendar) -> Vec<NaiveDate> {
        let stale: Vec<NaiveDate> = self
            .overrides
            .keys()
            .copied()
            .filter(|d| !calendar::is_instructional_day(*d, non_instructional))
            .collect();
        for date in &stale {
            self.overrides.remove(date);
        }
        stale
    }

    /// Compute the window only if it has never been computed.
    pub fn ensure_cycle_dates(&mut self, ctx: &CycleContext<'_>) -> Result<bool, PlannerError> {
        if !self.cycle_dates.is_empty() {
            return Ok(false);
        }
        self.recompute_cycle_dates(ctx)?;
        Ok(true)
    }
}
