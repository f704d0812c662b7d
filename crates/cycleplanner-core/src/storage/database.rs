//! SQLite-backed local store.
//!
//! Provides persistent storage for:
//! - The planner records, one JSON value per key in the `kv` table
//! - The offline queue of remote writes

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError};
use crate::planner::PlannerSnapshot;
use crate::sync::{QueuedOp, RemoteOp};

/// Record keys of the `kv` table.
pub mod keys {
    pub const CLASSES: &str = "classes";
    pub const COMPLETED_CLASSES: &str = "completed_classes";
    pub const SCHOOL_YEARS: &str = "school_years";
    pub const CURRENT_SCHOOL_YEAR: &str = "current_school_year";
    pub const NON_INSTRUCTIONAL_DAYS: &str = "non_instructional_days";
    pub const CYCLE_OVERRIDES: &str = "cycle_overrides";
    pub const CYCLE_START_DAYS: &str = "cycle_start_days";
    pub const CYCLE_DATES: &str = "cycle_dates";
    pub const MONTH_CYCLE_CONFIG: &str = "month_cycle_config";
}

/// SQLite database for planner state.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/cycleplanner.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("cycleplanner.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        kv_put(&self.conn, key, value)
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    /// Decode a JSON record, `None` when the key is absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DatabaseError::CorruptRecord {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Write every planner record in one transaction.
    pub fn save_snapshot(&self, snapshot: &PlannerSnapshot) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        put_json(&tx, keys::CLASSES, &snapshot.classes)?;
        put_json(&tx, keys::COMPLETED_CLASSES, &snapshot.completed_classes)?;
        put_json(&tx, keys::SCHOOL_YEARS, &snapshot.school_years)?;
        if let Some(current) = &snapshot.current_school_year {
            put_json(&tx, keys::CURRENT_SCHOOL_YEAR, current)?;
        }
        put_json(&tx, keys::NON_INSTRUCTIONAL_DAYS, &snapshot.non_instructional_days)?;
        put_json(&tx, keys::CYCLE_OVERRIDES, &snapshot.cycle_overrides)?;
        put_json(&tx, keys::CYCLE_START_DAYS, &snapshot.cycle_start_days)?;
        put_json(&tx, keys::CYCLE_DATES, &snapshot.cycle_dates)?;
        put_json(&tx, keys::MONTH_CYCLE_CONFIG, &snapshot.month_cycle_config)?;
        tx.commit()?;
        tracing::debug!(
            classes = snapshot.classes.len(),
            completed = snapshot.completed_classes.len(),
            "saved planner snapshot"
        );
        Ok(())
    }

    /// Read every planner record; absent keys come back empty.
    pub fn load_snapshot(&self) -> Result<PlannerSnapshot, DatabaseError> {
        Ok(PlannerSnapshot {
            classes: self.get_json(keys::CLASSES)?.unwrap_or_default(),
            completed_classes: self.get_json(keys::COMPLETED_CLASSES)?.unwrap_or_default(),
            school_years: self.get_json(keys::SCHOOL_YEARS)?.unwrap_or_default(),
            current_school_year: self.get_json(keys::CURRENT_SCHOOL_YEAR)?,
            non_instructional_days: self
                .get_json(keys::NON_INSTRUCTIONAL_DAYS)?
                .unwrap_or_default(),
            cycle_overrides: self.get_json(keys::CYCLE_OVERRIDES)?.unwrap_or_default(),
            cycle_start_days: self.get_json(keys::CYCLE_START_DAYS)?.unwrap_or_default(),
            cycle_dates: self.get_json(keys::CYCLE_DATES)?.unwrap_or_default(),
            month_cycle_config: self.get_json(keys::MONTH_CYCLE_CONFIG)?.unwrap_or_default(),
        })
    }

    /// Queued remote writes in replay order.
    pub fn load_remote_queue(&self) -> Result<Vec<QueuedOp>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT op, queued_at FROM remote_queue ORDER BY seq")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut ops = Vec::new();
        for row in rows {
            let (raw, queued_at) = row?;
            let corrupt = |message: String| DatabaseError::CorruptRecord {
                key: "remote_queue".into(),
                message,
            };
            let op: RemoteOp = serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;
            let queued_at = DateTime::parse_from_rfc3339(&queued_at)
                .map_err(|e| corrupt(e.to_string()))?
                .with_timezone(&Utc);
            ops.push(QueuedOp { op, queued_at });
        }
        Ok(ops)
    }

    /// Replace the stored queue.
    pub fn replace_remote_queue(&self, ops: &[QueuedOp]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM remote_queue", [])?;
        for queued in ops {
            let raw = serde_json::to_string(&queued.op).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            tx.execute(
                "INSERT INTO remote_queue (op, queued_at) VALUES (?1, ?2)",
                params![raw, queued.queued_at.to_rfc3339()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn kv_put(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
        params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn put_json<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<(), DatabaseError> {
    let raw = serde_json::to_string(value).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    kv_put(conn, key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::SchoolYear;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        assert!(db.kv_delete("test").unwrap());
        assert!(!db.kv_delete("test").unwrap());
    }

    #[test]
    fn empty_database_loads_empty_snapshot() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load_snapshot().unwrap(), PlannerSnapshot::default());
    }

    #[test]
    fn snapshot_keys_are_written_individually() {
        let db = Database::open_memory().unwrap();
        let year = SchoolYear::starting(2025);
        let mut snapshot = PlannerSnapshot {
            school_years: vec![year],
            current_school_year: Some(year),
            ..PlannerSnapshot::default()
        };
        snapshot.cycle_start_days.insert(year, 3);
        db.save_snapshot(&snapshot).unwrap();

        assert_eq!(
            db.kv_get(keys::CURRENT_SCHOOL_YEAR).unwrap().as_deref(),
            Some("\"2025-2026\"")
        );
        assert_eq!(
            db.kv_get(keys::CYCLE_START_DAYS).unwrap().as_deref(),
            Some(r#"{"2025-2026":3}"#)
        );
        assert_eq!(db.load_snapshot().unwrap(), snapshot);
    }

    #[test]
    fn corrupt_record_is_reported_with_its_key() {
        let db = Database::open_memory().unwrap();
        db.kv_set(keys::CYCLE_DATES, "{not json").unwrap();
        match db.load_snapshot() {
            Err(DatabaseError::CorruptRecord { key, .. }) => assert_eq!(key, keys::CYCLE_DATES),
            other => panic!("expected corrupt record, got {other:?}"),
        }
    }
}
