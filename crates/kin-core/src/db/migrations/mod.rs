//! Versioned schema upgrades.
//!
//! A database records its version twice: `PRAGMA user_version` drives the
//! upgrade loop and the `kin_meta` row mirrors it for readers that only look
//! at tables. Every step commits on its own, so an interrupted upgrade picks
//! up at the first missing step.

use super::schema;
use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::debug;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: [Step; 2] = [
    Step {
        version: 1,
        name: "trees, persons and relationships",
        sql: schema::MIGRATION_V1_SQL,
    },
    Step {
        version: 2,
        name: "candidate and graph indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Latest schema version understood by this build.
pub const LATEST_SCHEMA_VERSION: u32 = STEPS[STEPS.len() - 1].version;

/// The version stamped in `PRAGMA user_version`; 0 for a blank database.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read or is negative.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    u32::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, raw))
}

/// Bring `conn` up to [`LATEST_SCHEMA_VERSION`] and return that version.
///
/// # Errors
///
/// Fails when the database was written by a newer build, or when a step
/// cannot be applied. A failed step leaves the earlier ones committed.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let found = current_schema_version(conn).context("read schema version")?;
    if found > LATEST_SCHEMA_VERSION {
        bail!("database schema v{found} is newer than this build supports (v{LATEST_SCHEMA_VERSION})");
    }

    for step in STEPS.iter().filter(|step| step.version > found) {
        apply(conn, step)
            .with_context(|| format!("schema v{} ({})", step.version, step.name))?;
        debug!(version = step.version, name = step.name, "applied schema migration");
    }

    Ok(LATEST_SCHEMA_VERSION)
}

fn apply(conn: &mut Connection, step: &Step) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.execute(
        "UPDATE kin_meta SET schema_version = ?1 WHERE id = 1",
        [step.version],
    )?;
    tx.pragma_update(None, "user_version", step.version)?;
    tx.commit()
}
