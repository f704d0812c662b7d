//! Sync engine: pushes local writes to the remote store.
//!
//! Local state is always the source of truth. A write that cannot reach the
//! remote store is logged and queued, never reported as a failure of the
//! local change that produced it.

use chrono::{DateTime, Utc};

use crate::calendar::SchoolYear;
use crate::planner::PlannerSnapshot;
use crate::sync::remote::RemoteStore;
use crate::sync::sync_queue::OfflineQueue;
use crate::sync::types::{
    filters, ClassRow, MonthCycleRow, NonSchoolDayRow, RemoteOp, RemoteSnapshot, RemoteTable,
    SchoolYearRow, SyncError, SyncStatus,
};

pub struct SyncEngine<R> {
    remote: R,
    queue: OfflineQueue,
    online: bool,
    last_sync_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl<R: RemoteStore> SyncEngine<R> {
    /// New engine, online, with an empty queue.
    pub fn new(remote: R) -> Self {
        Self::with_queue(remote, OfflineQueue::new())
    }

    /// New engine resuming a persisted queue.
    pub fn with_queue(remote: R, queue: OfflineQueue) -> Self {
        Self {
            remote,
            queue,
            online: true,
            last_sync_at: None,
            last_error: None,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Mark connectivity lost or regained. Regaining does not replay; call
    /// [`SyncEngine::reconnect`] for that.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Send one write. Offline, failed, or behind already-queued writes, it
    /// is queued instead.
    pub async fn submit(&mut self, op: RemoteOp) {
        if !self.online {
            tracing::debug!(table = %op.table(), kind = op.kind(), "offline, queueing remote write");
            self.queue.enqueue(op);
            return;
        }
        if !self.queue.is_empty() {
            self.queue.enqueue(op);
            self.flush().await;
            return;
        }
        if let Err(err) = self.remote.apply(&op).await {
            tracing::warn!(table = %op.table(), kind = op.kind(), error = %err, "remote write failed, queued for retry");
            self.last_error = Some(err.to_string());
            self.queue.enqueue(op);
            return;
        }
        self.last_sync_at = Some(Utc::now());
    }

    pub async fn submit_all(&mut self, ops: impl IntoIterator<Item = RemoteOp>) {
        for op in ops {
            self.submit(op).await;
        }
    }

    /// Go online and replay the queue in original order. Returns how many
    /// writes went through; the first failure stops the replay and leaves
    /// it and everything behind it queued.
    pub async fn reconnect(&mut self) -> usize {
        self.online = true;
        self.flush().await
    }

    async fn flush(&mut self) -> usize {
        let mut sent = 0;
        while let Some(next) = self.queue.front() {
            match self.remote.apply(&next.op).await {
                Ok(()) => {
                    self.queue.pop_front();
                    sent += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        remaining = self.queue.len(),
                        "queue replay stopped"
                    );
                    self.last_error = Some(err.to_string());
                    return sent;
                }
            }
        }
        if sent > 0 {
            tracing::info!(sent, "remote queue drained");
        }
        self.last_sync_at = Some(Utc::now());
        self.last_error = None;
        sent
    }

    /// Read back the year-scoped tables.
    pub async fn pull(&self, year: SchoolYear) -> Result<RemoteSnapshot, SyncError> {
        if !self.online {
            return Err(SyncError::Offline);
        }
        let scope = filters([("school_year", year.label())]);
        let classes = self.remote.fetch(RemoteTable::Classes, &scope).await?;
        let days = self.remote.fetch(RemoteTable::NonSchoolDays, &scope).await?;
        let months = self.remote.fetch(RemoteTable::MonthCycleConfig, &scope).await?;

        Ok(RemoteSnapshot {
            classes: decode_rows(classes)?,
            non_school_days: decode_rows(days)?,
            month_cycle_config: decode_rows(months)?,
        })
    }

    /// Copy a whole local snapshot into the remote store under `year`,
    /// letting the store assign class ids. Returns the number of rows sent.
    pub async fn migrate_snapshot(
        &self,
        snapshot: &PlannerSnapshot,
        year: SchoolYear,
    ) -> Result<usize, SyncError> {
        if !self.online {
            return Err(SyncError::Offline);
        }
        let ops = migration_ops(snapshot, year)?;
        let mut rows = 0;
        for op in &ops {
            if let RemoteOp::Create { rows: batch, .. } = op {
                rows += batch.len();
            }
            self.remote.apply(op).await?;
        }
        tracing::info!(school_year = %year, rows, "migrated local snapshot");
        Ok(rows)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            online: self.online,
            pending_count: self.queue.len(),
            last_sync_at: self.last_sync_at,
            last_error: self.last_error.clone(),
        }
    }

    pub fn into_queue(self) -> OfflineQueue {
        self.queue
    }
}

fn decode_rows<T: serde::de::DeserializeOwned>(
    rows: Vec<serde_json::Value>,
) -> Result<Vec<T>, SyncError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(SyncError::from))
        .collect()
}

/// The school-year row, then bulk inserts for that year's classes,
/// non-instructional days and month anchors. Empty tables are skipped.
pub fn migration_ops(snapshot: &PlannerSnapshot, year: SchoolYear) -> Result<Vec<RemoteOp>, SyncError> {
    let mut ops = vec![RemoteOp::upsert(
        RemoteTable::SchoolYears,
        &SchoolYearRow::from(year),
    )?];

    let classes = snapshot
        .classes
        .iter()
        .chain(snapshot.completed_classes.iter())
        .map(|entry| serde_json::to_value(ClassRow::from_entry(entry, year).without_id()))
        .collect::<Result<Vec<_>, _>>()?;
    if !classes.is_empty() {
        ops.push(RemoteOp::Create {
            table: RemoteTable::Classes,
            rows: classes,
        });
    }

    if let Some(calendar) = snapshot.non_instructional_days.get(&year) {
        let days = calendar
            .list()
            .iter()
            .map(|day| serde_json::to_value(NonSchoolDayRow::new(day, year)))
            .collect::<Result<Vec<_>, _>>()?;
        if !days.is_empty() {
            ops.push(RemoteOp::Create {
                table: RemoteTable::NonSchoolDays,
                rows: days,
            });
        }
    }

    if let Some(months) = snapshot.month_cycle_config.get(&year) {
        let rows = months
            .iter()
            .map(|(month, day)| {
                serde_json::to_value(MonthCycleRow {
                    school_year: year.label(),
                    month: *month,
                    first_cycle_day: *day,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if !rows.is_empty() {
            ops.push(RemoteOp::Create {
                table: RemoteTable::MonthCycleConfig,
                rows,
            });
        }
    }

    Ok(ops)
}
