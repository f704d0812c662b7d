//! Class entry registry: slot uniqueness and the active/completed split.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    ClassDraft, ClassEntry, ClassPatch, Grade, Group, Period, ScheduleFilter, SlotKey,
    ValidationPolicy,
};
use crate::cycle::{CycleDates, CycleDay};
use crate::error::PlannerError;

/// Totals over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub active: usize,
    pub completed: usize,
    /// Active entries per grade.
    pub per_grade: BTreeMap<Grade, usize>,
}

/// One period/cycle-day cell of the weekly grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub period: Period,
    pub cycle_day: CycleDay,
    pub date: Option<NaiveDate>,
    pub classes: Vec<ClassEntry>,
}

/// Six periods by six cycle days of the current window, period-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleGrid {
    pub dates: CycleDates,
    pub cells: Vec<GridCell>,
}

impl CycleGrid {
    pub fn cell(&self, period: Period, cycle_day: CycleDay) -> Option<&GridCell> {
        self.cells
            .iter()
            .find(|c| c.period == period && c.cycle_day == cycle_day)
    }
}

/// Result of a year-end reactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactivation {
    pub reactivated: Vec<String>,
    /// Completed entries left in place because their slot is taken.
    pub skipped: Vec<String>,
}

/// One entry of an import that was not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    /// Position in the imported array.
    pub index: usize,
    pub error: String,
}

/// Result of merging an exported class list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Active,
    Completed,
}

/// Owns every class entry.
///
/// List-path and imported entries are unique per `(grade, group, period,
/// cycle day)` slot. Grid-path entries are unique per slot and resolved
/// window date. Completed entries do not hold a slot.
#[derive(Debug, Clone, Default)]
pub struct ScheduleRegistry {
    active: Vec<ClassEntry>,
    completed: Vec<ClassEntry>,
    policy: ValidationPolicy,
}

impl ScheduleRegistry {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self {
            active: Vec::new(),
            completed: Vec::new(),
            policy,
        }
    }

    /// Rebuild from persisted sets. `completed` flags are normalized to the
    /// set each entry was stored in.
    pub fn from_parts(
        active: Vec<ClassEntry>,
        completed: Vec<ClassEntry>,
        policy: ValidationPolicy,
    ) -> Self {
        let active = active
            .into_iter()
            .map(|mut e| {
                e.completed = false;
                e
            })
            .collect();
        let completed = completed
            .into_iter()
            .map(|mut e| {
                e.completed = true;
                e
            })
            .collect();
        Self {
            active,
            completed,
            policy,
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: ValidationPolicy) {
        self.policy = policy;
    }

    pub fn active(&self) -> &[ClassEntry] {
        &self.active
    }

    pub fn completed(&self) -> &[ClassEntry] {
        &self.completed
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<&ClassEntry> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .find(|e| e.id == id)
    }

    /// Add a class from the list path: the slot key is grade, group,
    /// period and cycle day.
    pub fn add_class(&mut self, draft: ClassDraft) -> Result<ClassEntry, PlannerError> {
        let date = draft
            .date
            .ok_or_else(|| PlannerError::validation("date", "is required"))?;
        let entry = self.build_entry(draft, date)?;
        self.ensure_free(&entry.slot(), None, None)?;
        self.insert(entry)
    }

    /// Add a class from the weekly grid: the date is the window's date for
    /// the cycle day, and an entry only conflicts when it sits on that date
    /// too. Without a window date any entry in the slot conflicts, and the
    /// class is stored on `today`.
    pub fn schedule_class(
        &mut self,
        draft: ClassDraft,
        cycle_dates: &CycleDates,
        today: NaiveDate,
    ) -> Result<ClassEntry, PlannerError> {
        let cycle_day = draft
            .cycle_day
            .ok_or_else(|| PlannerError::validation("cycle_day", "is required"))?;
        let window_date = cycle_dates.get(&cycle_day).copied();
        let entry = self.build_entry(draft, window_date.unwrap_or(today))?;
        self.ensure_free(&entry.slot(), window_date, None)?;
        self.insert(entry)
    }

    /// Merge `patch` into an entry. The merged slot is re-checked against
    /// every other active entry.
    pub fn update_class(&mut self, id: &str, patch: ClassPatch) -> Result<ClassEntry, PlannerError> {
        let (partition, index) = self.locate(id)?;
        let current = match partition {
            Partition::Active => &self.active[index],
            Partition::Completed => &self.completed[index],
        };

        let mut merged = current.clone();
        if let Some(grade) = patch.grade {
            merged.grade = grade;
        }
        if let Some(group) = &patch.group {
            merged.group = group.clone();
        }
        if let Some(subject) = &patch.subject {
            merged.subject = subject.trim().to_string();
        }
        if let Some(topic) = &patch.topic {
            merged.topic = topic.clone();
        }
        if let Some(description) = &patch.description {
            merged.description = description.clone();
        }
        if let Some(notes) = &patch.notes {
            merged.notes = notes.clone();
        }
        if let Some(date) = patch.date {
            merged.date = date;
        }
        if let Some(cycle_day) = patch.cycle_day {
            merged.cycle_day = cycle_day;
        }
        if let Some(period) = patch.period {
            merged.period = period;
        }

        self.policy.check(merged.grade, &merged.group, &merged.subject)?;
        if partition == Partition::Active && patch.touches_slot() {
            self.ensure_free(&merged.slot(), None, Some(id))?;
        }

        merged.last_updated = Utc::now();
        match partition {
            Partition::Active => self.active[index] = merged.clone(),
            Partition::Completed => self.completed[index] = merged.clone(),
        }
        tracing::info!(id, "updated class");
        Ok(merged)
    }

    pub fn edit_notes(&mut self, id: &str, notes: &str) -> Result<ClassEntry, PlannerError> {
        let entry = self.get_mut(id)?;
        entry.notes = notes.to_string();
        entry.last_updated = Utc::now();
        Ok(entry.clone())
    }

    /// Move an entry between the active and completed sets.
    ///
    /// Reactivation fails with a conflict when another active entry has
    /// taken the slot in the meantime.
    pub fn toggle_completion(&mut self, id: &str) -> Result<ClassEntry, PlannerError> {
        let (partition, index) = self.locate(id)?;
        match partition {
            Partition::Active => {
                let mut entry = self.active.remove(index);
                entry.completed = true;
                entry.last_updated = Utc::now();
                self.completed.push(entry.clone());
                tracing::info!(id, "class completed");
                Ok(entry)
            }
            Partition::Completed => {
                self.ensure_free(&self.completed[index].slot(), None, None)?;
                let mut entry = self.completed.remove(index);
                entry.completed = false;
                entry.last_updated = Utc::now();
                self.active.push(entry.clone());
                tracing::info!(id, "class reactivated");
                Ok(entry)
            }
        }
    }

    /// Move every completed entry back to the active set, oldest first.
    /// Entries whose slot is already taken stay completed.
    pub fn reactivate_all(&mut self) -> Reactivation {
        let now = Utc::now();
        let mut outcome = Reactivation::default();
        let mut kept = Vec::new();

        for mut entry in std::mem::take(&mut self.completed) {
            if self.ensure_free(&entry.slot(), None, None).is_err() {
                outcome.skipped.push(entry.id.clone());
                kept.push(entry);
                continue;
            }
            entry.completed = false;
            entry.last_updated = now;
            outcome.reactivated.push(entry.id.clone());
            self.active.push(entry);
        }
        self.completed = kept;

        tracing::info!(
            reactivated = outcome.reactivated.len(),
            skipped = outcome.skipped.len(),
            "reactivated completed classes"
        );
        outcome
    }

    /// Merge one exported entry. It is validated like a new class; active
    /// entries must find their slot free. The id is kept unless another
    /// entry already uses it.
    pub fn import_entry(&mut self, mut entry: ClassEntry) -> Result<ClassEntry, PlannerError> {
        self.policy.check(entry.grade, &entry.group, &entry.subject)?;
        entry.subject = entry.subject.trim().to_string();
        if !entry.completed {
            self.ensure_free(&entry.slot(), None, None)?;
        }
        if entry.id.trim().is_empty() || self.get(&entry.id).is_some() {
            entry.id = Uuid::new_v4().to_string();
        }
        entry.last_updated = Utc::now();

        tracing::info!(id = %entry.id, slot = %entry.slot(), "imported class");
        if entry.completed {
            self.completed.push(entry.clone());
        } else {
            self.active.push(entry.clone());
        }
        Ok(entry)
    }

    pub fn delete_class(&mut self, id: &str) -> Result<ClassEntry, PlannerError> {
        let (partition, index) = self.locate(id)?;
        let entry = match partition {
            Partition::Active => self.active.remove(index),
            Partition::Completed => self.completed.remove(index),
        };
        tracing::info!(id, "deleted class");
        Ok(entry)
    }

    /// Active entries matching every set filter, by cycle day then period.
    pub fn filtered_view(&self, filter: &ScheduleFilter) -> Vec<&ClassEntry> {
        let mut view: Vec<&ClassEntry> = self.active.iter().filter(|e| filter.matches(e)).collect();
        view.sort_by_key(|e| (e.cycle_day, e.period));
        view
    }

    /// Active entries dated `date`, by period.
    pub fn classes_on(&self, date: NaiveDate) -> Vec<&ClassEntry> {
        let mut view: Vec<&ClassEntry> = self.active.iter().filter(|e| e.date == date).collect();
        view.sort_by_key(|e| e.period);
        view
    }

    /// Active entries pinned to the current window, laid out by period and
    /// cycle day.
    pub fn cycle_grid(&self, cycle_dates: &CycleDates) -> CycleGrid {
        let mut cells = Vec::with_capacity(Period::ALL.len() * 6);
        for period in Period::ALL {
            for cycle_day in CycleDay::all() {
                let date = cycle_dates.get(&cycle_day).copied();
                let classes = self
                    .active
                    .iter()
                    .filter(|e| {
                        e.period == period && e.cycle_day == cycle_day && Some(e.date) == date
                    })
                    .cloned()
                    .collect();
                cells.push(GridCell {
                    period,
                    cycle_day,
                    date,
                    classes,
                });
            }
        }
        CycleGrid {
            dates: cycle_dates.clone(),
            cells,
        }
    }

    pub fn stats(&self) -> RegistryStats {
        let mut per_grade = BTreeMap::new();
        for entry in &self.active {
            *per_grade.entry(entry.grade).or_insert(0) += 1;
        }
        RegistryStats {
            active: self.active.len(),
            completed: self.completed.len(),
            per_grade,
        }
    }

    /// Move active entries that sat on the previous window's date for their
    /// cycle day onto the current window's date. Returns the moved ids.
    pub fn realign_dates(&mut self, previous: &CycleDates, current: &CycleDates) -> Vec<String> {
        let now = Utc::now();
        let mut moved = Vec::new();
        for entry in &mut self.active {
            let (Some(old), Some(new)) = (previous.get(&entry.cycle_day), current.get(&entry.cycle_day)) else {
                continue;
            };
            if entry.date == *old && old != new {
                entry.date = *new;
                entry.last_updated = now;
                moved.push(entry.id.clone());
            }
        }
        if !moved.is_empty() {
            tracing::debug!(count = moved.len(), "realigned class dates to new cycle window");
        }
        moved
    }

    /// Decompose into `(active, completed)` for persistence.
    pub fn into_parts(self) -> (Vec<ClassEntry>, Vec<ClassEntry>) {
        (self.active, self.completed)
    }

    fn build_entry(&self, draft: ClassDraft, date: NaiveDate) -> Result<ClassEntry, PlannerError> {
        let grade = draft
            .grade
            .ok_or_else(|| PlannerError::validation("grade", "is required"))?;
        let group = Group::new(&draft.homeroom, draft.subgroup.as_deref())?;
        let cycle_day = draft
            .cycle_day
            .ok_or_else(|| PlannerError::validation("cycle_day", "is required"))?;
        let period = draft
            .period
            .ok_or_else(|| PlannerError::validation("period", "is required"))?;
        self.policy.check(grade, &group, &draft.subject)?;

        let now = Utc::now();
        Ok(ClassEntry {
            id: Uuid::new_v4().to_string(),
            grade,
            group,
            subject: draft.subject.trim().to_string(),
            topic: draft.topic,
            description: draft.description,
            notes: draft.notes,
            date,
            cycle_day,
            period,
            completed: false,
            created_at: now,
            last_updated: now,
        })
    }

    fn insert(&mut self, entry: ClassEntry) -> Result<ClassEntry, PlannerError> {
        tracing::info!(id = %entry.id, slot = %entry.slot(), date = %entry.date, "added class");
        self.active.push(entry.clone());
        Ok(entry)
    }

    fn ensure_free(
        &self,
        slot: &SlotKey,
        date: Option<NaiveDate>,
        exclude: Option<&str>,
    ) -> Result<(), PlannerError> {
        let taken = self.active.iter().find(|e| {
            exclude != Some(e.id.as_str())
                && e.slot() == *slot
                && date.map_or(true, |d| e.date == d)
        });
        match taken {
            Some(existing) => Err(PlannerError::Conflict {
                slot: slot.clone(),
                existing_id: existing.id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn locate(&self, id: &str) -> Result<(Partition, usize), PlannerError> {
        if let Some(index) = self.active.iter().position(|e| e.id == id) {
            return Ok((Partition::Active, index));
        }
        if let Some(index) = self.completed.iter().position(|e| e.id == id) {
            return Ok((Partition::Completed, index));
        }
        Err(PlannerError::not_found("class", id))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut ClassEntry, PlannerError> {
        let (partition, index) = self.locate(id)?;
        Ok(match partition {
            Partition::Active => &mut self.active[index],
            Partition::Completed => &mut self.completed[index],
        })
    }
}
