//! Offline queue of remote writes.
//!
//! Strict FIFO without deduplication: the same operation queued twice is
//! replayed twice, which the remote store tolerates because every write is
//! an idempotent upsert or delete, or a create it is fine to repeat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::DatabaseError;
use crate::storage::Database;
use crate::sync::types::RemoteOp;

/// A queued write with the time it was deferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOp {
    pub op: RemoteOp,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct OfflineQueue {
    pending: VecDeque<QueuedOp>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted queue.
    pub fn load(db: &Database) -> Result<Self, DatabaseError> {
        Ok(Self {
            pending: db.load_remote_queue()?.into(),
        })
    }

    /// Replace the persisted queue with the in-memory one.
    pub fn persist(&self, db: &Database) -> Result<(), DatabaseError> {
        let ops: Vec<QueuedOp> = self.pending.iter().cloned().collect();
        db.replace_remote_queue(&ops)
    }

    pub fn enqueue(&mut self, op: RemoteOp) {
        self.pending.push_back(QueuedOp {
            op,
            queued_at: Utc::now(),
        });
    }

    pub fn front(&self) -> Option<&QueuedOp> {
        self.pending.front()
    }

    pub fn pop_front(&mut self) -> Option<QueuedOp> {
        self.pending.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedOp> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
