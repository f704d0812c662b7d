//! Planner state container.
//!
//! Owns every school year's calendar and cycle configuration, the class
//! registry, the event bus and the outbox of remote writes. Callers hold a
//! `Planner` and pass it where it is needed; there is no global instance.
//!
//! Every mutation either applies completely, publishes a [`PlannerEvent`]
//! and queues the matching [`RemoteOp`], or returns an error and leaves
//! the planner as it was.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{self, NonInstructionalCalendar, NonInstructionalDay, SchoolYear};
use crate::cycle::{CycleConfig, CycleContext, CycleDates, CycleDay, CycleSettings};
use crate::error::PlannerError;
use crate::events::{EventBus, PlannerEvent, SubscriptionId};
use crate::schedule::{
    ClassDraft, ClassEntry, ClassPatch, CycleGrid, ImportFailure, ImportReport, Reactivation,
    RegistryStats, ScheduleFilter, ScheduleRegistry, ValidationPolicy,
};
use crate::sync::{filters, MonthCycleRow, NonSchoolDayRow, RemoteOp, RemoteTable, SchoolYearRow};

/// Settings the planner is built with, taken from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerSettings {
    pub default_school_year: SchoolYear,
    pub cycle: CycleSettings,
    pub validation: ValidationPolicy,
}

/// Per-school-year state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearState {
    pub non_instructional: NonInstructionalCalendar,
    pub cycle: CycleConfig,
}

/// The persisted records, one field per storage key. Per-year records are
/// keyed by school-year label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
    #[serde(default)]
    pub completed_classes: Vec<ClassEntry>,
    #[serde(default)]
    pub school_years: Vec<SchoolYear>,
    #[serde(default)]
    pub current_school_year: Option<SchoolYear>,
    #[serde(default)]
    pub non_instructional_days: BTreeMap<SchoolYear, NonInstructionalCalendar>,
    #[serde(default)]
    pub cycle_overrides: BTreeMap<SchoolYear, BTreeMap<NaiveDate, CycleDay>>,
    #[serde(default)]
    pub cycle_start_days: BTreeMap<SchoolYear, u32>,
    #[serde(default)]
    pub cycle_dates: BTreeMap<SchoolYear, CycleDates>,
    #[serde(default)]
    pub month_cycle_config: BTreeMap<SchoolYear, BTreeMap<u32, CycleDay>>,
}

pub struct Planner {
    settings: PlannerSettings,
    school_years: Vec<SchoolYear>,
    current: SchoolYear,
    years: BTreeMap<SchoolYear, YearState>,
    registry: ScheduleRegistry,
    events: EventBus,
    outbox: Vec<RemoteOp>,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("current", &self.current)
            .field("school_years", &self.school_years)
            .field("classes", &self.registry.len())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

impl Planner {
    /// Fresh planner holding only the default school year, with its cycle
    /// window computed.
    pub fn new(settings: PlannerSettings) -> Result<Self, PlannerError> {
        Self::from_snapshot(PlannerSnapshot::default(), settings)
    }

    /// Rebuild from persisted records. Missing records fall back to
    /// defaults; the current year's window is computed if it was never
    /// stored.
    pub fn from_snapshot(
        snapshot: PlannerSnapshot,
        settings: PlannerSettings,
    ) -> Result<Self, PlannerError> {
        let PlannerSnapshot {
            classes,
            completed_classes,
            mut school_years,
            current_school_year,
            mut non_instructional_days,
            mut cycle_overrides,
            mut cycle_start_days,
            mut cycle_dates,
            mut month_cycle_config,
        } = snapshot;

        let current = current_school_year.unwrap_or(settings.default_school_year);
        if !school_years.contains(&current) {
            school_years.push(current);
        }

        let mut years = BTreeMap::new();
        for year in &school_years {
            let cycle = CycleConfig {
                start_day: cycle_start_days.remove(year).unwrap_or(1),
                overrides: cycle_overrides.remove(year).unwrap_or_default(),
                month_first_cycle_day: month_cycle_config.remove(year).unwrap_or_default(),
                cycle_dates: cycle_dates.remove(year).unwrap_or_default(),
            };
            let state = YearState {
                non_instructional: non_instructional_days.remove(year).unwrap_or_default(),
                cycle,
            };
            years.insert(*year, state);
        }

        let mut planner = Self {
            registry: ScheduleRegistry::from_parts(
                classes,
                completed_classes,
                settings.validation.clone(),
            ),
            settings,
            school_years,
            current,
            years,
            events: EventBus::new(),
            outbox: Vec::new(),
        };
        planner.with_current_cycle(|cycle, ctx| cycle.ensure_cycle_dates(ctx))?;
        // loading is not a user change
        planner.events.drain();
        planner.outbox.clear();
        Ok(planner)
    }

    /// The persisted form of the current state.
    pub fn snapshot(&self) -> PlannerSnapshot {
        let mut snapshot = PlannerSnapshot {
            classes: self.registry.active().to_vec(),
            completed_classes: self.registry.completed().to_vec(),
            school_years: self.school_years.clone(),
            current_school_year: Some(self.current),
            ..PlannerSnapshot::default()
        };
        for (year, state) in &self.years {
            snapshot
                .non_instructional_days
                .insert(*year, state.non_instructional.clone());
            snapshot
                .cycle_overrides
                .insert(*year, state.cycle.overrides.clone());
            snapshot
                .cycle_start_days
                .insert(*year, state.cycle.start_day);
            snapshot
                .cycle_dates
                .insert(*year, state.cycle.cycle_dates.clone());
            snapshot
                .month_cycle_config
                .insert(*year, state.cycle.month_first_cycle_day.clone());
        }
        snapshot
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ScheduleRegistry {
        &self.registry
    }

    pub fn current_school_year(&self) -> SchoolYear {
        self.current
    }

    pub fn school_years(&self) -> &[SchoolYear] {
        &self.school_years
    }

    pub fn year_state(&self, year: SchoolYear) -> Option<&YearState> {
        self.years.get(&year)
    }

    pub fn cycle_config(&self) -> Result<&CycleConfig, PlannerError> {
        Ok(&self.current_state()?.cycle)
    }

    pub fn cycle_dates(&self) -> Result<&CycleDates, PlannerError> {
        Ok(&self.current_state()?.cycle.cycle_dates)
    }

    // ---- events and outbox ----

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlannerEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn drain_events(&mut self) -> Vec<PlannerEvent> {
        self.events.drain()
    }

    pub fn pending_remote_ops(&self) -> &[RemoteOp] {
        &self.outbox
    }

    /// Hand the queued remote writes over, in the order they were made.
    pub fn take_remote_ops(&mut self) -> Vec<RemoteOp> {
        std::mem::take(&mut self.outbox)
    }

    // ---- school years ----

    pub fn create_school_year(&mut self, year: SchoolYear) -> Result<(), PlannerError> {
        if self.years.contains_key(&year) {
            return Err(PlannerError::Duplicate {
                entity: "school year",
                key: year.label(),
            });
        }
        self.years.insert(year, YearState::default());
        self.school_years.push(year);
        tracing::info!(school_year = %year, "created school year");

        self.queue(RemoteOp::upsert(RemoteTable::SchoolYears, &SchoolYearRow::from(year)));
        self.events.publish(PlannerEvent::SchoolYearCreated {
            school_year: year,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Make `year` current, computing its window on first use. On failure
    /// the previous year stays current.
    pub fn switch_school_year(&mut self, year: SchoolYear) -> Result<CycleDates, PlannerError> {
        if !self.years.contains_key(&year) {
            return Err(PlannerError::not_found("school year", year.label()));
        }
        let previous = self.current;
        self.current = year;
        if let Err(err) = self.with_current_cycle(|cycle, ctx| cycle.ensure_cycle_dates(ctx)) {
            self.current = previous;
            return Err(err);
        }
        tracing::info!(school_year = %year, "switched school year");
        self.events.publish(PlannerEvent::SchoolYearSwitched {
            school_year: year,
            at: Utc::now(),
        });
        Ok(self.cycle_dates()?.clone())
    }

    // ---- calendar ----

    pub fn is_instructional_day(&self, date: NaiveDate) -> Result<bool, PlannerError> {
        Ok(calendar::is_instructional_day(
            date,
            &self.current_state()?.non_instructional,
        ))
    }

    pub fn non_instructional_days(&self) -> Result<Vec<NonInstructionalDay>, PlannerError> {
        Ok(self.current_state()?.non_instructional.list())
    }

    /// Flag a date for the current year, drop overrides on it and recompute
    /// the window. Nothing changes if the recompute fails.
    pub fn add_non_instructional_day(
        &mut self,
        date: NaiveDate,
        reason: &str,
    ) -> Result<CycleDates, PlannerError> {
        let year = self.current;
        let settings = self.settings.cycle;
        let state = self.current_state_mut()?;

        state.non_instructional.add(date, reason)?;
        let previous = state.cycle.cycle_dates.clone();
        let overrides = state.cycle.overrides.clone();
        state.cycle.prune_overrides(&state.non_instructional);

        let ctx = CycleContext {
            school_year: year,
            non_instructional: &state.non_instructional,
            settings,
        };
        if let Err(err) = state.cycle.recompute_cycle_dates(&ctx).map(|_| ()) {
            state.cycle.overrides = overrides;
            state.non_instructional.remove(date)?;
            tracing::warn!(%date, error = %err, "non-instructional day rolled back");
            return Err(err);
        }
        let current = state.cycle.cycle_dates.clone();
        let reason = state.non_instructional.reason(date).unwrap_or_default().to_string();

        tracing::info!(school_year = %year, %date, "added non-instructional day");
        let row = NonSchoolDayRow {
            school_year: year.label(),
            date,
            reason: reason.clone(),
        };
        self.queue(RemoteOp::upsert(RemoteTable::NonSchoolDays, &row));
        self.events.publish(PlannerEvent::NonInstructionalDayAdded {
            school_year: year,
            date,
            reason,
            at: Utc::now(),
        });
        self.after_window_change(year, &previous, &current);
        Ok(current)
    }

    /// Unflag a date for the current year and recompute the window.
    pub fn remove_non_instructional_day(
        &mut self,
        date: NaiveDate,
    ) -> Result<CycleDates, PlannerError> {
        let year = self.current;
        let settings = self.settings.cycle;
        let state = self.current_state_mut()?;

        let removed = state.non_instructional.remove(date)?;
        let previous = state.cycle.cycle_dates.clone();
        let ctx = CycleContext {
            school_year: year,
            non_instructional: &state.non_instructional,
            settings,
        };
        if let Err(err) = state.cycle.recompute_cycle_dates(&ctx).map(|_| ()) {
            state.non_instructional.add(removed.date, &removed.reason)?;
            return Err(err);
        }
        state.cycle.prune_overrides(&state.non_instructional);
        let current = state.cycle.cycle_dates.clone();

        tracing::info!(school_year = %year, %date, "removed non-instructional day");
        self.queue(Ok(RemoteOp::Delete {
            table: RemoteTable::NonSchoolDays,
            filters: filters([("school_year", year.label()), ("date", date.to_string())]),
        }));
        self.events.publish(PlannerEvent::NonInstructionalDayRemoved {
            school_year: year,
            date,
            at: Utc::now(),
        });
        self.after_window_change(year, &previous, &current);
        Ok(current)
    }

    // ---- cycle ----

    pub fn cycle_day_for_date(&self, date: NaiveDate) -> Result<CycleDay, PlannerError> {
        self.cycle_day_in(self.current, date)
    }

    pub fn cycle_day_in(&self, year: SchoolYear, date: NaiveDate) -> Result<CycleDay, PlannerError> {
        let state = self
            .years
            .get(&year)
            .ok_or_else(|| PlannerError::not_found("school year", year.label()))?;
        let ctx = CycleContext {
            school_year: year,
            non_instructional: &state.non_instructional,
            settings: self.settings.cycle,
        };
        state.cycle.cycle_day_for_date(date, &ctx)
    }

    /// Rebuild the whole window from the year's anchor.
    pub fn recompute_cycle_dates(&mut self) -> Result<CycleDates, PlannerError> {
        self.with_current_cycle(|cycle, ctx| cycle.recompute_cycle_dates(ctx).cloned())
    }

    /// Re-anchor a single month; overrides only the window slots it reaches.
    pub fn compute_month_cycle_dates(
        &mut self,
        month: u32,
        first_cycle_day: CycleDay,
    ) -> Result<CycleDates, PlannerError> {
        self.with_current_cycle(|cycle, ctx| {
            cycle
                .compute_month_cycle_dates(month, first_cycle_day, ctx)
                .cloned()
        })
    }

    pub fn preview_month_cycle(
        &self,
        month: u32,
        first_cycle_day: CycleDay,
    ) -> Result<CycleDates, PlannerError> {
        let state = self.current_state()?;
        let ctx = CycleContext {
            school_year: self.current,
            non_instructional: &state.non_instructional,
            settings: self.settings.cycle,
        };
        state.cycle.preview_month_cycle(month, first_cycle_day, &ctx)
    }

    pub fn set_month_first_cycle_day(
        &mut self,
        month: u32,
        first_cycle_day: CycleDay,
    ) -> Result<CycleDates, PlannerError> {
        let dates = self.with_current_cycle(|cycle, ctx| {
            cycle
                .set_month_first_cycle_day(month, first_cycle_day, ctx)
                .cloned()
        })?;
        let year = self.current;
        let row = MonthCycleRow {
            school_year: year.label(),
            month,
            first_cycle_day,
        };
        self.queue(RemoteOp::upsert(RemoteTable::MonthCycleConfig, &row));
        self.events.publish(PlannerEvent::MonthAnchorSet {
            school_year: year,
            month,
            first_cycle_day,
            at: Utc::now(),
        });
        Ok(dates)
    }

    pub fn set_start_day(&mut self, start_day: u32) -> Result<CycleDates, PlannerError> {
        let dates =
            self.with_current_cycle(|cycle, ctx| cycle.set_start_day(start_day, ctx).cloned())?;
        tracing::info!(school_year = %self.current, start_day, "changed cycle start day");
        self.events.publish(PlannerEvent::StartDayChanged {
            school_year: self.current,
            start_day,
            at: Utc::now(),
        });
        Ok(dates)
    }

    pub fn set_cycle_date(&mut self, day: CycleDay, date: NaiveDate) -> Result<CycleDates, PlannerError> {
        self.with_current_cycle(|cycle, ctx| {
            cycle.set_cycle_date(day, date, ctx)?;
            Ok(cycle.cycle_dates.clone())
        })
    }

    pub fn set_override(&mut self, date: NaiveDate, day: CycleDay) -> Result<(), PlannerError> {
        self.with_current_cycle(|cycle, ctx| cycle.set_override(date, day, ctx))?;
        self.events.publish(PlannerEvent::OverrideSet {
            school_year: self.current,
            date,
            cycle_day: day,
            at: Utc::now(),
        });
        Ok(())
    }

    pub fn clear_override(&mut self, date: NaiveDate) -> Result<CycleDay, PlannerError> {
        let day = self.with_current_cycle(|cycle, _| cycle.clear_override(date))?;
        self.events.publish(PlannerEvent::OverrideCleared {
            school_year: self.current,
            date,
            at: Utc::now(),
        });
        Ok(day)
    }

    // ---- classes ----

    pub fn add_class(&mut self, draft: ClassDraft) -> Result<ClassEntry, PlannerError> {
        let entry = self.registry.add_class(draft)?;
        self.class_changed(&entry, PlannerEvent::ClassAdded {
            id: entry.id.clone(),
            at: Utc::now(),
        });
        Ok(entry)
    }

    /// Weekly-grid path: the date comes from the current window.
    pub fn schedule_class(
        &mut self,
        draft: ClassDraft,
        today: NaiveDate,
    ) -> Result<ClassEntry, PlannerError> {
        let dates = self.current_state()?.cycle.cycle_dates.clone();
        let entry = self.registry.schedule_class(draft, &dates, today)?;
        self.class_changed(&entry, PlannerEvent::ClassAdded {
            id: entry.id.clone(),
            at: Utc::now(),
        });
        Ok(entry)
    }

    pub fn update_class(&mut self, id: &str, patch: ClassPatch) -> Result<ClassEntry, PlannerError> {
        let entry = self.registry.update_class(id, patch)?;
        self.class_changed(&entry, PlannerEvent::ClassUpdated {
            id: entry.id.clone(),
            at: Utc::now(),
        });
        Ok(entry)
    }

    pub fn edit_notes(&mut self, id: &str, notes: &str) -> Result<ClassEntry, PlannerError> {
        let entry = self.registry.edit_notes(id, notes)?;
        self.queue(Ok(RemoteOp::Update {
            table: RemoteTable::Classes,
            filters: filters([("id", entry.id.clone())]),
            patch: serde_json::json!({
                "notes": entry.notes,
                "last_updated": entry.last_updated,
            }),
        }));
        self.events.publish(PlannerEvent::ClassUpdated {
            id: entry.id.clone(),
            at: Utc::now(),
        });
        Ok(entry)
    }

    pub fn toggle_completion(&mut self, id: &str) -> Result<ClassEntry, PlannerError> {
        let entry = self.registry.toggle_completion(id)?;
        self.class_changed(&entry, PlannerEvent::ClassCompletionToggled {
            id: entry.id.clone(),
            completed: entry.completed,
            at: Utc::now(),
        });
        Ok(entry)
    }

    pub fn reactivate_all(&mut self) -> Reactivation {
        let outcome = self.registry.reactivate_all();
        let year = self.current;
        for id in &outcome.reactivated {
            if let Some(entry) = self.registry.get(id) {
                let op = RemoteOp::upsert_class(entry, year);
                self.queue(op);
            }
        }
        self.events.publish(PlannerEvent::ClassesReactivated {
            count: outcome.reactivated.len(),
            at: Utc::now(),
        });
        outcome
    }

    pub fn delete_class(&mut self, id: &str) -> Result<ClassEntry, PlannerError> {
        let entry = self.registry.delete_class(id)?;
        self.queue(Ok(RemoteOp::delete_class(&entry.id)));
        self.events.publish(PlannerEvent::ClassDeleted {
            id: entry.id.clone(),
            at: Utc::now(),
        });
        Ok(entry)
    }

    /// Every class entry, active first, in the shape `import_classes`
    /// reads back.
    pub fn export_classes(&self) -> Vec<ClassEntry> {
        self.registry
            .active()
            .iter()
            .chain(self.registry.completed())
            .cloned()
            .collect()
    }

    /// Merge exported entries into the registry one by one. Entries that do
    /// not parse, fail validation or hit a taken slot are reported and
    /// skipped; the rest are kept.
    pub fn import_classes(&mut self, items: Vec<serde_json::Value>) -> ImportReport {
        let mut report = ImportReport::default();
        for (index, item) in items.into_iter().enumerate() {
            let merged = serde_json::from_value::<ClassEntry>(item)
                .map_err(|e| e.to_string())
                .and_then(|entry| self.registry.import_entry(entry).map_err(|e| e.to_string()));
            match merged {
                Ok(entry) => {
                    self.queue(RemoteOp::upsert_class(&entry, self.current));
                    report.imported.push(entry.id);
                }
                Err(error) => {
                    tracing::warn!(index, %error, "skipping imported class");
                    report.failed.push(ImportFailure { index, error });
                }
            }
        }
        self.events.publish(PlannerEvent::ClassesImported {
            count: report.imported.len(),
            at: Utc::now(),
        });
        report
    }

    pub fn get_class(&self, id: &str) -> Option<&ClassEntry> {
        self.registry.get(id)
    }

    pub fn filtered_view(&self, filter: &ScheduleFilter) -> Vec<&ClassEntry> {
        self.registry.filtered_view(filter)
    }

    pub fn classes_on(&self, date: NaiveDate) -> Vec<&ClassEntry> {
        self.registry.classes_on(date)
    }

    pub fn cycle_grid(&self) -> Result<CycleGrid, PlannerError> {
        Ok(self.registry.cycle_grid(self.cycle_dates()?))
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    // ---- internals ----

    fn current_state(&self) -> Result<&YearState, PlannerError> {
        self.years
            .get(&self.current)
            .ok_or_else(|| PlannerError::not_found("school year", self.current.label()))
    }

    fn current_state_mut(&mut self) -> Result<&mut YearState, PlannerError> {
        let label = self.current.label();
        self.years
            .get_mut(&self.current)
            .ok_or_else(|| PlannerError::not_found("school year", label))
    }

    /// Run a cycle operation on the current year, then follow any change of
    /// the window through to the registry.
    fn with_current_cycle<T>(
        &mut self,
        op: impl FnOnce(&mut CycleConfig, &CycleContext<'_>) -> Result<T, PlannerError>,
    ) -> Result<T, PlannerError> {
        let year = self.current;
        let settings = self.settings.cycle;
        let state = self.current_state_mut()?;
        let previous = state.cycle.cycle_dates.clone();
        let ctx = CycleContext {
            school_year: year,
            non_instructional: &state.non_instructional,
            settings,
        };
        let out = op(&mut state.cycle, &ctx)?;
        let current = state.cycle.cycle_dates.clone();
        self.after_window_change(year, &previous, &current);
        Ok(out)
    }

    fn after_window_change(&mut self, year: SchoolYear, previous: &CycleDates, current: &CycleDates) {
        if previous == current {
            return;
        }
        self.events.publish(PlannerEvent::CycleDatesChanged {
            school_year: year,
            cycle_dates: current.clone(),
            at: Utc::now(),
        });

        let moved = self.registry.realign_dates(previous, current);
        if moved.is_empty() {
            return;
        }
        for id in &moved {
            if let Some(entry) = self.registry.get(id) {
                let op = RemoteOp::upsert_class(entry, year);
                self.queue(op);
            }
        }
        self.events.publish(PlannerEvent::ClassesRealigned {
            ids: moved,
            at: Utc::now(),
        });
    }

    fn class_changed(&mut self, entry: &ClassEntry, event: PlannerEvent) {
        self.queue(RemoteOp::upsert_class(entry, self.current));
        self.events.publish(event);
    }

    /// Queue a remote write. An op that cannot be encoded is logged and
    /// dropped; the local change stands.
    fn queue(&mut self, op: Result<RemoteOp, crate::sync::SyncError>) {
        match op {
            Ok(op) => self.outbox.push(op),
            Err(err) => tracing::warn!(error = %err, "dropping remote operation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Grade, Period};
    use chrono::Datelike;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cd(n: u8) -> CycleDay {
        CycleDay::new(n).unwrap()
    }

    fn planner() -> Planner {
        Planner::new(PlannerSettings::default()).unwrap()
    }

    fn draft(day: u8, date: NaiveDate) -> ClassDraft {
        ClassDraft {
            grade: Some(Grade::new(3).unwrap()),
            homeroom: "A".into(),
            subject: "Technology".into(),
            date: Some(date),
            cycle_day: Some(cd(day)),
            period: Some(Period::P1),
            ..ClassDraft::default()
        }
    }

    #[test]
    fn new_planner_has_default_year_and_window() {
        let p = planner();
        assert_eq!(p.current_school_year().label(), "2025-2026");
        let dates = p.cycle_dates().unwrap();
        assert_eq!(dates.len(), 6);
        // Aug 1 2025 is a Friday
        assert_eq!(dates[&cd(1)], d(2025, 8, 1));
        assert_eq!(dates[&cd(6)], d(2025, 8, 8));
        assert!(p.pending_remote_ops().is_empty());
    }

    #[test]
    fn duplicate_year_is_rejected() {
        let mut p = planner();
        let err = p.create_school_year(SchoolYear::starting(2025)).unwrap_err();
        assert!(err.is_conflict());
        p.create_school_year(SchoolYear::starting(2026)).unwrap();
        assert_eq!(p.school_years().len(), 2);
        assert!(matches!(
            p.switch_school_year(SchoolYear::starting(2030)),
            Err(PlannerError::NotFound { .. })
        ));
    }

    #[test]
    fn switching_computes_the_new_years_window() {
        let mut p = planner();
        p.create_school_year(SchoolYear::starting(2026)).unwrap();
        let dates = p.switch_school_year(SchoolYear::starting(2026)).unwrap();
        // Aug 3 2026 is a Monday
        assert_eq!(dates[&cd(1)], d(2026, 8, 3));
        assert_eq!(p.current_school_year().start_year(), 2026);
    }

    #[test]
    fn holiday_shifts_window_and_realigns_pinned_classes() {
        let mut p = planner();
        let day3 = p.cycle_dates().unwrap()[&cd(3)];
        assert_eq!(day3, d(2025, 8, 5));
        let pinned = p.add_class(draft(3, day3)).unwrap();
        p.take_remote_ops();
        p.drain_events();

        let dates = p.add_non_instructional_day(day3, "Staff training").unwrap();
        assert_eq!(dates[&cd(3)], d(2025, 8, 6));
        assert_eq!(dates[&cd(2)], d(2025, 8, 4));
        assert_eq!(p.get_class(&pinned.id).unwrap().date, d(2025, 8, 6));

        let events = p.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlannerEvent::ClassesRealigned { ids, .. } if ids == &vec![pinned.id.clone()])));
        let ops = p.take_remote_ops();
        assert_eq!(ops[0].table(), RemoteTable::NonSchoolDays);
        assert!(ops.iter().any(|op| op.table() == RemoteTable::Classes));

        let dates = p.remove_non_instructional_day(day3).unwrap();
        assert_eq!(dates[&cd(3)], day3);
        assert_eq!(p.get_class(&pinned.id).unwrap().date, day3);
    }

    #[test]
    fn failed_recompute_rolls_holiday_back() {
        let settings = PlannerSettings {
            cycle: CycleSettings {
                anchor_month: 8,
                scan_window_days: 11,
            },
            ..PlannerSettings::default()
        };
        let mut p = Planner::new(settings).unwrap();

        // Aug 1..11 holds seven weekdays; one holiday still leaves six
        p.add_non_instructional_day(d(2025, 8, 4), "a").unwrap();
        let before = p.cycle_dates().unwrap().clone();
        assert_eq!(before[&cd(6)], d(2025, 8, 11));

        let err = p.add_non_instructional_day(d(2025, 8, 1), "b").unwrap_err();
        assert!(matches!(err, PlannerError::Configuration(_)));
        assert!(p.is_instructional_day(d(2025, 8, 1)).unwrap());
        assert_eq!(p.cycle_dates().unwrap(), &before);
        assert_eq!(p.non_instructional_days().unwrap().len(), 1);
    }

    #[test]
    fn holiday_prunes_overrides_on_that_date() {
        let mut p = planner();
        p.set_override(d(2025, 9, 1), cd(5)).unwrap();
        assert_eq!(p.cycle_day_for_date(d(2025, 9, 1)).unwrap(), cd(5));
        p.add_non_instructional_day(d(2025, 9, 1), "Labor Day").unwrap();
        assert!(p.cycle_config().unwrap().overrides.is_empty());
    }

    #[test]
    fn month_anchor_is_stored_and_queued() {
        let mut p = planner();
        p.take_remote_ops();
        // September 2025 starts on Monday the 1st
        let dates = p.set_month_first_cycle_day(8, cd(4)).unwrap();
        assert_eq!(p.cycle_config().unwrap().month_first_cycle_day[&8], cd(4));
        assert!(dates.values().all(|date| date.month() == 9));
        let ops = p.take_remote_ops();
        assert!(ops.iter().any(|op| op.table() == RemoteTable::MonthCycleConfig));

        let preview = p.preview_month_cycle(8, cd(1)).unwrap();
        assert_eq!(preview[&cd(1)], d(2025, 9, 1));
        assert_eq!(p.cycle_config().unwrap().month_first_cycle_day[&8], cd(4));
    }

    #[test]
    fn snapshot_round_trips_through_from_snapshot() {
        let mut p = planner();
        p.add_non_instructional_day(d(2025, 9, 16), "Independence Day").unwrap();
        p.set_start_day(4).unwrap();
        let entry = p.add_class(draft(2, d(2025, 8, 5))).unwrap();
        p.toggle_completion(&entry.id).unwrap();

        let snapshot = p.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PlannerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);

        let restored = Planner::from_snapshot(back, PlannerSettings::default()).unwrap();
        assert_eq!(restored.cycle_dates().unwrap(), p.cycle_dates().unwrap());
        assert_eq!(restored.cycle_config().unwrap().start_day, 4);
        assert_eq!(restored.registry().completed().len(), 1);
        assert!(!restored.is_instructional_day(d(2025, 9, 16)).unwrap());
    }

    #[test]
    fn subscribers_are_notified_of_class_changes() {
        use std::sync::{Arc, Mutex};

        let mut p = planner();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        p.subscribe(move |_| *sink.lock().unwrap() += 1);

        let entry = p.add_class(draft(2, d(2025, 8, 4))).unwrap();
        p.edit_notes(&entry.id, "bring tablets").unwrap();
        p.delete_class(&entry.id).unwrap();
        assert_eq!(*count.lock().unwrap(), 3);

        let kinds: Vec<_> = p.take_remote_ops().iter().map(|op| op.kind()).collect();
        assert_eq!(kinds, vec!["upsert", "update", "delete"]);
    }
}
