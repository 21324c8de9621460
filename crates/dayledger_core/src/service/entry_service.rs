//! Entry lifecycle engine.
//!
//! # Responsibility
//! - Validate and apply create/update/archive/complete/defer/block
//!   transitions on entries.
//! - Append exactly one activity event per successful mutation.
//! - Serve profile-scoped entry and activity listings.
//!
//! # Invariants
//! - Validation and task-only checks run before any write.
//! - The entry write and its activity event share one immediate
//!   transaction; a failed mutation leaves no row behind.
//! - Entry kind and owning profile never change after creation.

use crate::clock::{Clock, SystemClock};
use crate::model::activity::{ActivityEvent, ActivityEventType};
use crate::model::entry::{
    Entry, EntryBody, EntryId, EntryType, EntryValidationError, TaskPriority, TaskState,
    TaskStatus,
};
use crate::model::profile::ProfileId;
use crate::repo::activity_repo::SqliteActivityRepository;
use crate::repo::entry_repo::{EntryListQuery, EntryRepository, SqliteEntryRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::{RecordKind, RepoError};
use crate::service::activity_log::ActivityLogger;
use crate::service::tx::with_immediate_tx;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from entry lifecycle operations.
#[derive(Debug)]
pub enum EntryServiceError {
    /// Input violates an entry invariant (e.g. blank title).
    Validation(EntryValidationError),
    EntryNotFound(EntryId),
    ProfileNotFound(ProfileId),
    /// Task-only operation attempted on a non-task entry.
    NotATask {
        entry_id: EntryId,
        entry_type: EntryType,
        operation: &'static str,
    },
    Repo(RepoError),
}

impl Display for EntryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::ProfileNotFound(id) => write!(f, "profile not found: {id}"),
            Self::NotATask {
                entry_id,
                entry_type,
                operation,
            } => write!(
                f,
                "cannot {operation} entry {entry_id}: only task entries support it (type={entry_type})"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EntryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                kind: RecordKind::Entry,
                id,
            } => Self::EntryNotFound(id),
            RepoError::NotFound {
                kind: RecordKind::Profile,
                id,
            } => Self::ProfileNotFound(id),
            RepoError::EntryValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<EntryValidationError> for EntryServiceError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for EntryServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Create request for one entry.
///
/// Task-only fields (`status`, `priority`, `due_at`, `blocked`,
/// `blocked_reason`) are dropped for non-task kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub profile_id: ProfileId,
    pub kind: EntryType,
    pub title: String,
    pub content: Option<String>,
    pub project: Option<String>,
    /// Defaults to `Todo` for tasks.
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_at: Option<i64>,
    /// Defaults to `false`.
    pub blocked: Option<bool>,
    pub blocked_reason: Option<String>,
    pub carry_over: bool,
    /// Defaults to empty.
    pub tags: Option<Vec<String>>,
}

impl NewEntry {
    pub fn new(profile_id: ProfileId, kind: EntryType, title: impl Into<String>) -> Self {
        Self {
            profile_id,
            kind,
            title: title.into(),
            content: None,
            project: None,
            status: None,
            priority: None,
            due_at: None,
            blocked: None,
            blocked_reason: None,
            carry_over: false,
            tags: None,
        }
    }
}

/// Field-by-field patch; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub project: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_at: Option<i64>,
    pub blocked: Option<bool>,
    pub blocked_reason: Option<String>,
    pub carry_over: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl EntryPatch {
    fn touches_task_fields(&self) -> bool {
        self.status.is_some()
            || self.priority.is_some()
            || self.due_at.is_some()
            || self.blocked.is_some()
            || self.blocked_reason.is_some()
    }
}

/// Entry lifecycle service bound to one connection.
pub struct EntryService<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> EntryService<'conn, SystemClock> {
    /// Creates a service reading time from the wall clock.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, EntryServiceError> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> EntryService<'conn, C> {
    /// Creates a service after checking that the connection is migrated.
    pub fn with_clock(conn: &'conn Connection, clock: C) -> Result<Self, EntryServiceError> {
        SqliteProfileRepository::try_new(conn)?;
        SqliteEntryRepository::try_new(conn)?;
        SqliteActivityRepository::try_new(conn)?;
        Ok(Self { conn, clock })
    }

    /// Creates one entry and logs `created`.
    ///
    /// # Errors
    /// - `Validation(EmptyTitle)` when the title trims to empty.
    /// - `ProfileNotFound` when the owner does not exist.
    pub fn create(&self, request: NewEntry) -> Result<EntryId, EntryServiceError> {
        ensure_title(&request.title)?;

        self.mutate("create", |scope| {
            if scope.profiles.get_profile(request.profile_id)?.is_none() {
                return Err(EntryServiceError::ProfileNotFound(request.profile_id));
            }

            let body = EntryBody::for_type(request.kind, initial_task_state(&request, scope.now));
            let mut entry = Entry::new(request.profile_id, body, &request.title, scope.now)?;
            entry.content = request.content;
            entry.project = request.project;
            entry.carry_over = request.carry_over;
            entry.tags = request.tags.unwrap_or_default();

            scope.entries.insert_entry(&entry)?;
            scope
                .activity
                .append(&entry, ActivityEventType::Created, None, scope.now)?;
            Ok(entry.id)
        })
    }

    /// Applies a generic field patch and logs `updated`.
    ///
    /// Status changes keep `completed_at` in step, and a patch that leaves
    /// the task unblocked drops any `blocked_reason`.
    ///
    /// # Errors
    /// - `Validation(EmptyTitle)` for a blank replacement title.
    /// - `NotATask` when task-only fields target a non-task entry.
    pub fn update(&self, entry_id: EntryId, patch: EntryPatch) -> Result<(), EntryServiceError> {
        if let Some(title) = patch.title.as_deref() {
            ensure_title(title)?;
        }

        self.mutate("update", |scope| {
            let mut entry = scope.load_entry(entry_id)?;
            if patch.touches_task_fields() && entry.task().is_none() {
                return Err(not_a_task(&entry, "update task fields of"));
            }

            if let Some(title) = patch.title {
                entry.title = title.trim().to_string();
            }
            if let Some(content) = patch.content {
                entry.content = Some(content);
            }
            if let Some(project) = patch.project {
                entry.project = Some(project);
            }
            if let Some(carry_over) = patch.carry_over {
                entry.carry_over = carry_over;
            }
            if let Some(tags) = patch.tags {
                entry.tags = tags;
            }

            if let Some(task) = entry.task_mut() {
                if let Some(status) = patch.status {
                    task.set_status(status, scope.now);
                }
                if let Some(priority) = patch.priority {
                    task.priority = Some(priority);
                }
                if let Some(due_at) = patch.due_at {
                    task.due_at = Some(due_at);
                }
                if let Some(blocked) = patch.blocked {
                    task.blocked = blocked;
                }
                if let Some(reason) = patch.blocked_reason {
                    task.blocked_reason = Some(reason);
                }
                if !task.blocked {
                    task.blocked_reason = None;
                }
            }

            scope.save(entry, ActivityEventType::Updated, None)
        })
    }

    /// Archives (`true`) or unarchives (`false`) an entry.
    pub fn archive(&self, entry_id: EntryId, archived: bool) -> Result<(), EntryServiceError> {
        self.mutate(if archived { "archive" } else { "unarchive" }, |scope| {
            let mut entry = scope.load_entry(entry_id)?;
            entry.set_archived(archived, scope.now);
            let event = if archived {
                ActivityEventType::Archived
            } else {
                ActivityEventType::Unarchived
            };
            scope.save(entry, event, None)
        })
    }

    /// Completes (`true`) or reopens (`false`) a task.
    ///
    /// Both directions clear carry-over and blocking state.
    pub fn complete_task(&self, entry_id: EntryId, done: bool) -> Result<(), EntryServiceError> {
        let operation = if done { "complete" } else { "reopen" };
        self.mutate(operation, |scope| {
            let mut entry = scope.load_task(entry_id, operation)?;
            if let Some(task) = entry.task_mut() {
                if done {
                    task.complete(scope.now);
                } else {
                    task.reopen();
                }
            }
            entry.carry_over = false;
            let event = if done {
                ActivityEventType::Completed
            } else {
                ActivityEventType::Reopened
            };
            scope.save(entry, event, None)
        })
    }

    /// Pushes a task `days` (at least one, default one) days past now and
    /// marks it carry-over. A finished task is reopened.
    ///
    /// Returns the effective number of days.
    pub fn defer_task(
        &self,
        entry_id: EntryId,
        days: Option<i64>,
    ) -> Result<i64, EntryServiceError> {
        self.mutate("defer", |scope| {
            let mut entry = scope.load_task(entry_id, "defer")?;
            let days = match entry.task_mut() {
                Some(task) => task.defer(days, scope.now),
                None => return Err(not_a_task(&entry, "defer")),
            };
            entry.carry_over = true;
            scope.save(
                entry,
                ActivityEventType::Deferred,
                Some(format!("{days} day defer")),
            )?;
            Ok(days)
        })
    }

    /// Blocks or unblocks a task.
    ///
    /// Blocking forces `InProgress`; unblocking discards the reason and
    /// leaves status alone. The supplied reason becomes the event note.
    pub fn set_blocked(
        &self,
        entry_id: EntryId,
        blocked: bool,
        reason: Option<String>,
    ) -> Result<(), EntryServiceError> {
        let operation = if blocked { "block" } else { "unblock" };
        self.mutate(operation, |scope| {
            let mut entry = scope.load_task(entry_id, operation)?;
            if let Some(task) = entry.task_mut() {
                if blocked {
                    task.block(reason.clone(), scope.now);
                } else {
                    task.unblock();
                }
            }
            let event = if blocked {
                ActivityEventType::Blocked
            } else {
                ActivityEventType::Unblocked
            };
            scope.save(entry, event, reason)
        })
    }

    pub fn get(&self, entry_id: EntryId) -> Result<Entry, EntryServiceError> {
        SqliteEntryRepository::new_unchecked(self.conn)
            .get_entry(entry_id)?
            .ok_or(EntryServiceError::EntryNotFound(entry_id))
    }

    /// Entries of a profile, newest first.
    pub fn list_by_profile(
        &self,
        profile_id: ProfileId,
        include_archived: bool,
    ) -> Result<Vec<Entry>, EntryServiceError> {
        let query = EntryListQuery::for_profile(profile_id).including_archived(include_archived);
        Ok(SqliteEntryRepository::new_unchecked(self.conn).list_entries(&query)?)
    }

    /// Non-archived entries of one kind, newest first.
    pub fn list_by_type(
        &self,
        profile_id: ProfileId,
        kind: EntryType,
    ) -> Result<Vec<Entry>, EntryServiceError> {
        let query = EntryListQuery::for_profile(profile_id).of_type(kind);
        Ok(SqliteEntryRepository::new_unchecked(self.conn).list_entries(&query)?)
    }

    /// Recent activity for one entry, newest first (default 20 events).
    pub fn activity(
        &self,
        entry_id: EntryId,
        limit: Option<u32>,
    ) -> Result<Vec<ActivityEvent>, EntryServiceError> {
        Ok(self.logger().list_by_entry(entry_id, limit)?)
    }

    /// Recent activity across a profile, newest first.
    pub fn profile_activity(
        &self,
        profile_id: ProfileId,
        limit: Option<u32>,
    ) -> Result<Vec<ActivityEvent>, EntryServiceError> {
        Ok(self.logger().list_by_profile(profile_id, limit)?)
    }

    fn logger(&self) -> ActivityLogger<SqliteActivityRepository<'conn>> {
        ActivityLogger::new(SqliteActivityRepository::new_unchecked(self.conn))
    }

    fn mutate<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&MutationScope<'_>) -> Result<T, EntryServiceError>,
    ) -> Result<T, EntryServiceError> {
        let started_at = Instant::now();
        let now = self.clock.now_ms();
        let result = with_immediate_tx(self.conn, |conn| {
            let scope = MutationScope {
                entries: SqliteEntryRepository::new_unchecked(conn),
                profiles: SqliteProfileRepository::new_unchecked(conn),
                activity: ActivityLogger::new(SqliteActivityRepository::new_unchecked(conn)),
                now,
            };
            f(&scope)
        });

        match &result {
            Ok(_) => info!(
                "event=entry_mutation module=entry status=ok op={operation} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=entry_mutation module=entry status=error op={operation} duration_ms={} error_code={}",
                started_at.elapsed().as_millis(),
                error_code(err)
            ),
        }
        result
    }
}

/// Repositories bound to one open mutation transaction.
struct MutationScope<'tx> {
    entries: SqliteEntryRepository<'tx>,
    profiles: SqliteProfileRepository<'tx>,
    activity: ActivityLogger<SqliteActivityRepository<'tx>>,
    now: i64,
}

impl MutationScope<'_> {
    fn load_entry(&self, entry_id: EntryId) -> Result<Entry, EntryServiceError> {
        self.entries
            .get_entry(entry_id)?
            .ok_or(EntryServiceError::EntryNotFound(entry_id))
    }

    fn load_task(
        &self,
        entry_id: EntryId,
        operation: &'static str,
    ) -> Result<Entry, EntryServiceError> {
        let entry = self.load_entry(entry_id)?;
        if entry.task().is_none() {
            return Err(not_a_task(&entry, operation));
        }
        Ok(entry)
    }

    /// Persists `entry` and appends its activity event.
    fn save(
        &self,
        mut entry: Entry,
        event: ActivityEventType,
        note: Option<String>,
    ) -> Result<(), EntryServiceError> {
        entry.updated_at = self.now;
        self.entries.update_entry(&entry)?;
        self.activity.append(&entry, event, note, self.now)?;
        Ok(())
    }
}

fn ensure_title(title: &str) -> Result<(), EntryServiceError> {
    if title.trim().is_empty() {
        return Err(EntryValidationError::EmptyTitle.into());
    }
    Ok(())
}

fn initial_task_state(request: &NewEntry, now: i64) -> TaskState {
    let mut task = TaskState::new(TaskStatus::Todo);
    task.set_status(request.status.unwrap_or(TaskStatus::Todo), now);
    task.priority = request.priority;
    task.due_at = request.due_at;
    task.blocked = request.blocked.unwrap_or(false);
    if task.blocked {
        task.blocked_reason = request.blocked_reason.clone();
    }
    task
}

fn not_a_task(entry: &Entry, operation: &'static str) -> EntryServiceError {
    EntryServiceError::NotATask {
        entry_id: entry.id,
        entry_type: entry.entry_type(),
        operation,
    }
}

fn error_code(err: &EntryServiceError) -> &'static str {
    match err {
        EntryServiceError::Validation(_) => "validation",
        EntryServiceError::EntryNotFound(_) => "entry_not_found",
        EntryServiceError::ProfileNotFound(_) => "profile_not_found",
        EntryServiceError::NotATask { .. } => "not_a_task",
        EntryServiceError::Repo(_) => "repo_failure",
    }
}
