//! Sync subcommand for the remote store.
//!
//! Local data stays authoritative; these commands replay queued writes,
//! read back remote rows, and copy a local snapshot into an empty remote.

use clap::Subcommand;
use cycleplanner_core::{OfflineQueue, SchoolYear, SyncEngine};

use crate::session::{print_json, remote_from, CliResult, Session};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Replay queued writes in order
    Push,
    /// Fetch remote rows of a school year (defaults to the current one)
    Pull {
        #[arg(long)]
        year: Option<SchoolYear>,
    },
    /// Show queue length and remote settings
    Status,
    /// Copy local classes, non-instructional days and month anchors to the
    /// remote store
    Migrate {
        #[arg(long)]
        year: Option<SchoolYear>,
    },
}

pub fn run(action: SyncAction) -> CliResult {
    let session = Session::open()?;

    if let SyncAction::Status = action {
        let queue = OfflineQueue::load(&session.db)?;
        println!(
            "remote: {}",
            if session.config.remote.enabled {
                session.config.remote.base_url.as_str()
            } else {
                "disabled"
            }
        );
        println!("pending writes: {}", queue.len());
        if let Some(oldest) = queue.front() {
            println!("oldest queued: {}", oldest.queued_at.to_rfc3339());
        }
        return Ok(());
    }

    let remote = remote_from(&session.config)?;
    let queue = OfflineQueue::load(&session.db)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let mut engine = SyncEngine::with_queue(remote, queue);
    let year = |year: Option<SchoolYear>| year.unwrap_or_else(|| session.planner.current_school_year());

    match action {
        SyncAction::Push => {
            let pending = engine.queue().len();
            let sent = runtime.block_on(engine.reconnect());
            println!("sent {sent} of {pending} queued writes");
            let status = engine.status();
            engine.into_queue().persist(&session.db)?;
            if let Some(error) = status.last_error {
                return Err(format!("replay stopped: {error}").into());
            }
        }
        SyncAction::Pull { year: requested } => {
            let snapshot = runtime.block_on(engine.pull(year(requested)))?;
            print_json(&snapshot)?;
        }
        SyncAction::Migrate { year: requested } => {
            let year = year(requested);
            let snapshot = session.planner.snapshot();
            let rows = runtime.block_on(engine.migrate_snapshot(&snapshot, year))?;
            println!("migrated {rows} rows to {year}");
        }
        SyncAction::Status => {}
    }
    Ok(())
}
