//! Core domain logic for DayLedger.
//! This crate is the single source of truth for ledger invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{ActivityEvent, ActivityEventType, ActivityId};
pub use model::entry::{
    Entry, EntryBody, EntryId, EntryType, EntryValidationError, TaskPriority, TaskState,
    TaskStatus, DAY_MS,
};
pub use model::note::{Note, NoteId};
pub use model::profile::{Profile, ProfileId, ProfileValidationError};
pub use repo::{RecordKind, RepoError, RepoResult};
pub use service::entry_service::{EntryPatch, EntryService, EntryServiceError, NewEntry};
pub use service::note_service::{NoteService, NoteServiceError};
pub use service::profile_service::{ProfileService, ProfileServiceError};
pub use service::today_service::{triage_tasks, DayWindow, TodayService, TodayTriage};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
