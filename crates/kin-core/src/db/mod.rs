//! SQLite storage for trees, persons and relationships.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers never block the single writer
//! - `busy_timeout` (5s unless configured) for transient lock contention
//! - `foreign_keys = ON` so person and tree deletes cascade

pub mod migrations;
pub mod person;
pub mod relationship;
pub mod schema;
pub mod tree;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used when the project config does not override it.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the database, apply runtime pragmas, and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_db(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open database {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply schema migrations")?;

    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Fresh migrated in-memory database.
///
/// # Errors
///
/// Returns an error if configuring or migrating fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply schema migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
