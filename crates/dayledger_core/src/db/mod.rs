//! Ledger storage: connection bootstrap and schema versioning.
//!
//! # Responsibility
//! - Hand out connections that are configured and fully migrated.
//! - Report storage failures with enough context to act on them: which
//!   migration broke, or which schema version the file carries.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A failed migration leaves the file at its previous version.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Connection-level SQLite failure (open, pragma, query).
    Sqlite(rusqlite::Error),
    /// Migration `version` failed; the whole batch was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a newer binary and is left untouched.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Migration version that failed, if this is a migration failure.
    pub fn failed_migration(&self) -> Option<u32> {
        match self {
            Self::Migration { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite",
            Self::Migration { .. } => "db_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version:04}_{name} failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "ledger schema version {db_version} is newer than this build ({latest_supported}); upgrade dayledger"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
