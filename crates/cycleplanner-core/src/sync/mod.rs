//! Remote synchronization layer.
//!
//! Pushes planner writes to an optional remote store (PostgREST-style HTTP
//! API) and queues them while offline. Local SQLite stays authoritative.

pub mod remote;
pub mod sync_engine;
pub mod sync_queue;
pub mod types;

pub use remote::{RemoteStore, RestRemote};
pub use sync_engine::{migration_ops, SyncEngine};
pub use sync_queue::{OfflineQueue, QueuedOp};
pub use types::{
    filters, ClassRow, Filters, MonthCycleRow, NonSchoolDayRow, RemoteOp, RemoteSnapshot,
    RemoteTable, SchoolYearRow, SyncError, SyncStatus,
};
