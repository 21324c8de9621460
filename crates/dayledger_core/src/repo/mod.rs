//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per record kind.
//! - Isolate SQL details from the lifecycle engine and other services.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every list query declares an explicit ordering.
//! - Repositories return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::entry::EntryValidationError;
use crate::model::profile::ProfileValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod activity_repo;
pub mod entry_repo;
pub mod note_repo;
pub mod profile_repo;
mod schema_guard;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record families stored by the core, used to label `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Profile,
    Entry,
    Activity,
    Note,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Entry => "entry",
            Self::Activity => "activity event",
            Self::Note => "note",
        }
    }
}

/// Repository error shared by all ledger repositories.
#[derive(Debug)]
pub enum RepoError {
    EntryValidation(EntryValidationError),
    ProfileValidation(ProfileValidationError),
    Db(DbError),
    NotFound { kind: RecordKind, id: Uuid },
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub(crate) fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntryValidation(err) => write!(f, "{err}"),
            Self::ProfileValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "ledger repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "ledger repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "ledger repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EntryValidation(err) => Some(err),
            Self::ProfileValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::EntryValidation(value)
    }
}

impl From<ProfileValidationError> for RepoError {
    fn from(value: ProfileValidationError) -> Self {
        Self::ProfileValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
