//! # Cycleplanner Core Library
//!
//! Core logic of a class planner for schools that schedule on a repeating
//! six-day instructional cycle instead of calendar weekdays. All operations
//! are available through the standalone `cycleplanner` CLI, which is a thin
//! layer over this library.
//!
//! ## Architecture
//!
//! - **Calendar**: weekends, per-school-year non-instructional days and
//!   instructional-day arithmetic
//! - **Cycle engine**: maps calendar dates to cycle days 1-6 and keeps the
//!   current cycle window in sync with its inputs
//! - **Schedule registry**: class entries, slot uniqueness and the
//!   active/completed split
//! - **Planner**: the state container tying the above together, emitting
//!   events and queueing remote writes
//! - **Storage**: SQLite records and TOML configuration
//! - **Sync**: optional remote store with an offline queue
//!
//! ## Key Components
//!
//! - [`Planner`]: state container every operation goes through
//! - [`CycleConfig`]: per-year cycle configuration and its computations
//! - [`ScheduleRegistry`]: class entries and their consistency rules
//! - [`Database`]: local persistence of [`PlannerSnapshot`]
//! - [`Config`]: application configuration management
//! - [`SyncEngine`]: pushes planner writes to a [`RemoteStore`]

pub mod calendar;
pub mod cycle;
pub mod error;
pub mod events;
pub mod planner;
pub mod schedule;
pub mod storage;
pub mod sync;

pub use calendar::{NonInstructionalCalendar, NonInstructionalDay, SchoolYear};
pub use cycle::{CycleConfig, CycleContext, CycleDates, CycleDay, CycleSettings};
pub use error::{ConfigError, CoreError, DatabaseError, PlannerError};
pub use events::{EventBus, PlannerEvent};
pub use planner::{Planner, PlannerSettings, PlannerSnapshot, YearState};
pub use schedule::{
    ClassDraft, ClassEntry, ClassPatch, CycleGrid, Grade, Group, ImportFailure, ImportReport,
    Period, Reactivation, RegistryStats, ScheduleFilter, ScheduleRegistry, SlotKey,
    ValidationPolicy,
};
pub use storage::{Config, Database};
pub use sync::{
    OfflineQueue, RemoteOp, RemoteStore, RestRemote, SyncEngine, SyncError, SyncStatus,
};
