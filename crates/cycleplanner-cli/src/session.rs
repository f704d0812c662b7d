//! Load-operate-save cycle shared by the state-changing commands.

use std::error::Error;

use cycleplanner_core::{Config, Database, OfflineQueue, Planner, RemoteOp, RestRemote, SyncEngine};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

pub struct Session {
    pub config: Config,
    pub db: Database,
    pub planner: Planner,
}

impl Session {
    /// Open the data directory and rebuild the planner from it.
    pub fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let settings = config.planner_settings()?;
        let db = Database::open()?;
        let snapshot = db.load_snapshot()?;
        let planner = Planner::from_snapshot(snapshot, settings)?;
        Ok(Self { config, db, planner })
    }

    /// Persist the planner and hand its queued writes to the remote store.
    ///
    /// Remote failures never fail the command; the writes stay in the
    /// offline queue for `sync push`.
    pub fn commit(mut self) -> CliResult {
        self.db.save_snapshot(&self.planner.snapshot())?;
        for event in self.planner.drain_events() {
            tracing::debug!(?event, "planner event");
        }

        let ops = self.planner.take_remote_ops();
        if ops.is_empty() || !self.config.remote.enabled {
            return Ok(());
        }
        let queue = OfflineQueue::load(&self.db)?;
        let queue = push(&self.config, queue, ops)?;
        queue.persist(&self.db)?;
        Ok(())
    }
}

fn push(config: &Config, mut queue: OfflineQueue, ops: Vec<RemoteOp>) -> CliResult<OfflineQueue> {
    let remote = match remote_from(config) {
        Ok(remote) => remote,
        Err(e) => {
            tracing::warn!(error = %e, "remote store unavailable, queueing writes");
            for op in ops {
                queue.enqueue(op);
            }
            return Ok(queue);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let queue = runtime.block_on(async move {
        let mut engine = SyncEngine::with_queue(remote, queue);
        engine.submit_all(ops).await;
        engine.into_queue()
    });
    Ok(queue)
}

pub fn remote_from(config: &Config) -> Result<RestRemote, cycleplanner_core::SyncError> {
    if !config.remote.enabled || config.remote.base_url.is_empty() {
        return Err(cycleplanner_core::SyncError::NotConfigured);
    }
    RestRemote::new(
        &config.remote.base_url,
        &config.remote.api_key,
        config.remote.timeout(),
    )
}

/// Print a value as pretty JSON.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
