use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::SchoolYear;
use crate::cycle::{CycleDates, CycleDay};

/// Every applied state change produces an event.
/// The presentation layer subscribes to them or polls with [`EventBus::drain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlannerEvent {
    SchoolYearCreated {
        school_year: SchoolYear,
        at: DateTime<Utc>,
    },
    SchoolYearSwitched {
        school_year: SchoolYear,
        at: DateTime<Utc>,
    },
    NonInstructionalDayAdded {
        school_year: SchoolYear,
        date: NaiveDate,
        reason: String,
        at: DateTime<Utc>,
    },
    NonInstructionalDayRemoved {
        school_year: SchoolYear,
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    /// The current cycle window changed, by either recompute path.
    CycleDatesChanged {
        school_year: SchoolYear,
        cycle_dates: CycleDates,
        at: DateTime<Utc>,
    },
    StartDayChanged {
        school_year: SchoolYear,
        start_day: u32,
        at: DateTime<Utc>,
    },
    OverrideSet {
        school_year: SchoolYear,
        date: NaiveDate,
        cycle_day: CycleDay,
        at: DateTime<Utc>,
    },
    OverrideCleared {
        school_year: SchoolYear,
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    MonthAnchorSet {
        school_year: SchoolYear,
        month: u32,
        first_cycle_day: CycleDay,
        at: DateTime<Utc>,
    },
    ClassAdded {
        id: String,
        at: DateTime<Utc>,
    },
    ClassUpdated {
        id: String,
        at: DateTime<Utc>,
    },
    ClassCompletionToggled {
        id: String,
        completed: bool,
        at: DateTime<Utc>,
    },
    ClassDeleted {
        id: String,
        at: DateTime<Utc>,
    },
    ClassesReactivated {
        count: usize,
        at: DateTime<Utc>,
    },
    ClassesImported {
        count: usize,
        at: DateTime<Utc>,
    },
    /// Class dates followed a cycle window change.
    ClassesRealigned {
        ids: Vec<String>,
        at: DateTime<Utc>,
    },
}

impl PlannerEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            PlannerEvent::SchoolYearCreated { at, .. }
            | PlannerEvent::SchoolYearSwitched { at, .. }
            | PlannerEvent::NonInstructionalDayAdded { at, .. }
            | PlannerEvent::NonInstructionalDayRemoved { at, .. }
            | PlannerEvent::CycleDatesChanged { at, .. }
            | PlannerEvent::StartDayChanged { at, .. }
            | PlannerEvent::OverrideSet { at, .. }
            | PlannerEvent::OverrideCleared { at, .. }
            | PlannerEvent::MonthAnchorSet { at, .. }
            | PlannerEvent::ClassAdded { at, .. }
            | PlannerEvent::ClassUpdated { at, .. }
            | PlannerEvent::ClassCompletionToggled { at, .. }
            | PlannerEvent::ClassDeleted { at, .. }
            | PlannerEvent::ClassesReactivated { at, .. }
            | PlannerEvent::ClassesImported { at, .. }
            | PlannerEvent::ClassesRealigned { at, .. } => *at,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PlannerEvent) + Send>;

/// Observer registry plus a pending list for polling consumers.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    pending: Vec<PlannerEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlannerEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn publish(&mut self, event: PlannerEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        self.pending.push(event);
    }

    /// Take every event published since the last drain.
    pub fn drain(&mut self) -> Vec<PlannerEvent> {
        std::mem::take(&mut self.pending)
    }
}
