//! Connection bootstrap.
//!
//! # Invariants
//! - Returned connections enforce foreign keys.
//! - Returned connections wait up to `BUSY_TIMEOUT` for a competing writer
//!   before failing with `SQLITE_BUSY`.
//! - Returned connections are at the latest schema version.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the ledger database at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    ready(Connection::open(path), "file")
}

/// Opens a private in-memory ledger database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    ready(Connection::open_in_memory(), "memory")
}

fn ready(opened: rusqlite::Result<Connection>, mode: &str) -> DbResult<Connection> {
    let started_at = Instant::now();
    let outcome: DbResult<Connection> = opened.map_err(DbError::from).and_then(|mut conn| {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    });

    let duration_ms = started_at.elapsed().as_millis();
    match &outcome {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error={err}"
        ),
    }
    outcome
}
