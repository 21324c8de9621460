//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register ledger schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "notes",
        sql: include_str!("0002_notes.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Fails with [`DbError::UnsupportedSchemaVersion`] when the database was
/// written by a newer binary; nothing is touched in that case. Fails with
/// [`DbError::Migration`] naming the first script that did not apply; the
/// batch is rolled back and `user_version` keeps its previous value.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        run_migration(&tx, migration).map_err(|source| {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={source}",
                migration.version, migration.name
            );
            DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            }
        })?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={current_version} to={latest}");
    Ok(())
}

fn run_migration(conn: &Connection, migration: &Migration) -> rusqlite::Result<()> {
    conn.execute_batch(migration.sql)?;
    conn.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
