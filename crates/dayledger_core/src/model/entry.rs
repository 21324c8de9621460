//! Entry domain model.
//!
//! # Responsibility
//! - Define the profile-scoped entry record and its five kinds.
//! - Carry task-only lifecycle fields in a nested [`TaskState`] so that
//!   "status present iff task" holds by construction.
//! - Provide the pure task transitions used by the lifecycle engine.
//!
//! # Invariants
//! - `title` is trimmed and never empty.
//! - `blocked_reason` is `None` whenever `blocked` is `false`.
//! - `completed_at` is `Some` iff `status == Done`.
//! - `profile_id` and the entry kind never change after creation.

use crate::model::profile::ProfileId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one entry.
pub type EntryId = Uuid;

/// One day in epoch milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Discriminant of [`EntryBody`], used for filtering and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Task,
    Note,
    Link,
    Snippet,
    Secret,
}

impl EntryType {
    pub const ALL: [EntryType; 5] = [
        EntryType::Task,
        EntryType::Note,
        EntryType::Link,
        EntryType::Snippet,
        EntryType::Secret,
    ];

    /// Stable lowercase label used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
            Self::Link => "link",
            Self::Snippet => "snippet",
            Self::Secret => "secret",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Task-only lifecycle fields.
///
/// `blocked` is an overlay orthogonal to `status`, except that blocking
/// forces `InProgress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    /// Epoch milliseconds.
    pub due_at: Option<i64>,
    pub blocked: bool,
    /// Only meaningful while `blocked` is set.
    pub blocked_reason: Option<String>,
    /// Epoch milliseconds; set iff `status == Done`.
    pub completed_at: Option<i64>,
}

impl TaskState {
    /// Creates an unblocked task state with no due date or priority.
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            priority: None,
            due_at: None,
            blocked: false,
            blocked_reason: None,
            completed_at: None,
        }
    }

    /// Returns whether the task still needs work.
    pub fn is_active(&self) -> bool {
        self.status != TaskStatus::Done
    }

    /// Moves to `status`, keeping `completed_at` in step.
    ///
    /// Entering `Done` stamps `now`; staying in `Done` keeps the first
    /// completion time; leaving `Done` clears it.
    pub fn set_status(&mut self, status: TaskStatus, now: i64) {
        match (self.status, status) {
            (TaskStatus::Done, TaskStatus::Done) => {}
            (_, TaskStatus::Done) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    /// Marks the task done and drops any blocking state.
    pub fn complete(&mut self, now: i64) {
        self.status = TaskStatus::Done;
        self.completed_at = Some(now);
        self.unblock();
    }

    /// Reopens the task as `Todo` and drops any blocking state.
    pub fn reopen(&mut self) {
        self.status = TaskStatus::Todo;
        self.completed_at = None;
        self.unblock();
    }

    /// Blocks the task; a blocked task is always `InProgress`.
    pub fn block(&mut self, reason: Option<String>, now: i64) {
        self.blocked = true;
        self.blocked_reason = reason;
        self.set_status(TaskStatus::InProgress, now);
    }

    /// Clears the blocked overlay; status is left untouched.
    pub fn unblock(&mut self) {
        self.blocked = false;
        self.blocked_reason = None;
    }

    /// Pushes the due date `days` (at least one) days past `now`.
    ///
    /// A finished task is reopened. Returns the effective day count.
    pub fn defer(&mut self, days: Option<i64>, now: i64) -> i64 {
        let days = days.unwrap_or(1).max(1);
        self.due_at = Some(now.saturating_add(days.saturating_mul(DAY_MS)));
        if self.status == TaskStatus::Done {
            self.set_status(TaskStatus::Todo, now);
        }
        days
    }
}

/// Kind-specific payload of an entry.
///
/// Only tasks carry lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "task", rename_all = "snake_case")]
pub enum EntryBody {
    Task(TaskState),
    Note,
    Link,
    Snippet,
    Secret,
}

impl EntryBody {
    /// Builds the body for `kind`, using `task` only when `kind` is a task.
    ///
    /// Non-task kinds silently drop task fields.
    pub fn for_type(kind: EntryType, task: TaskState) -> Self {
        match kind {
            EntryType::Task => Self::Task(task),
            EntryType::Note => Self::Note,
            EntryType::Link => Self::Link,
            EntryType::Snippet => Self::Snippet,
            EntryType::Secret => Self::Secret,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::Task(_) => EntryType::Task,
            Self::Note => EntryType::Note,
            Self::Link => EntryType::Link,
            Self::Snippet => EntryType::Snippet,
            Self::Secret => EntryType::Secret,
        }
    }
}

/// Validation errors for entry invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    NilId,
    NilProfileId,
    EmptyTitle,
    CompletedAtMismatch { status: TaskStatus },
    ReasonWithoutBlock,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "entry id must not be nil"),
            Self::NilProfileId => write!(f, "entry profile id must not be nil"),
            Self::EmptyTitle => write!(f, "entry title cannot be empty"),
            Self::CompletedAtMismatch { status } => write!(
                f,
                "completed_at must be set iff status is done (status={})",
                status.as_str()
            ),
            Self::ReasonWithoutBlock => {
                write!(f, "blocked_reason requires blocked=true")
            }
        }
    }
}

impl Error for EntryValidationError {}

/// A profile-scoped record of one of five kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub profile_id: ProfileId,
    pub body: EntryBody,
    pub title: String,
    pub content: Option<String>,
    pub project: Option<String>,
    /// Order is preserved but carries no meaning.
    pub tags: Vec<String>,
    /// Roll forward into today's review regardless of due date.
    pub carry_over: bool,
    /// Presence means archived.
    pub archived_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entry {
    /// Creates a new entry with a generated id.
    ///
    /// The title is trimmed; an empty result is rejected.
    pub fn new(
        profile_id: ProfileId,
        body: EntryBody,
        title: &str,
        now: i64,
    ) -> Result<Self, EntryValidationError> {
        Self::with_id(Uuid::new_v4(), profile_id, body, title, now)
    }

    /// Creates an entry with a caller-provided id.
    pub fn with_id(
        id: EntryId,
        profile_id: ProfileId,
        body: EntryBody,
        title: &str,
        now: i64,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            id,
            profile_id,
            body,
            title: title.trim().to_string(),
            content: None,
            project: None,
            tags: Vec::new(),
            carry_over: false,
            archived_at: None,
            created_at: now,
            updated_at: now,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn entry_type(&self) -> EntryType {
        self.body.entry_type()
    }

    pub fn task(&self) -> Option<&TaskState> {
        match &self.body {
            EntryBody::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn task_mut(&mut self) -> Option<&mut TaskState> {
        match &mut self.body {
            EntryBody::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Sets or clears the archive marker.
    pub fn set_archived(&mut self, archived: bool, now: i64) {
        self.archived_at = archived.then_some(now);
    }

    /// Checks all record-level invariants.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.id.is_nil() {
            return Err(EntryValidationError::NilId);
        }
        if self.profile_id.is_nil() {
            return Err(EntryValidationError::NilProfileId);
        }
        if self.title.trim().is_empty() {
            return Err(EntryValidationError::EmptyTitle);
        }
        if let Some(task) = self.task() {
            if task.completed_at.is_some() != (task.status == TaskStatus::Done) {
                return Err(EntryValidationError::CompletedAtMismatch {
                    status: task.status,
                });
            }
            if !task.blocked && task.blocked_reason.is_some() {
                return Err(EntryValidationError::ReasonWithoutBlock);
            }
        }
        Ok(())
    }
}
