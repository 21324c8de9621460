//! Activity event model.
//!
//! Events are append-only audit records of one state-changing operation on
//! an entry. `profile_id` is copied from the entry at write time and must
//! never diverge from it; entries are never reparented.

use crate::model::entry::EntryId;
use crate::model::profile::ProfileId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ActivityId = Uuid;

/// Kind of state change recorded by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventType {
    Created,
    Updated,
    Archived,
    Unarchived,
    Completed,
    Reopened,
    Deferred,
    Blocked,
    Unblocked,
}

impl ActivityEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Archived => "archived",
            Self::Unarchived => "unarchived",
            Self::Completed => "completed",
            Self::Reopened => "reopened",
            Self::Deferred => "deferred",
            Self::Blocked => "blocked",
            Self::Unblocked => "unblocked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "archived" => Some(Self::Archived),
            "unarchived" => Some(Self::Unarchived),
            "completed" => Some(Self::Completed),
            "reopened" => Some(Self::Reopened),
            "deferred" => Some(Self::Deferred),
            "blocked" => Some(Self::Blocked),
            "unblocked" => Some(Self::Unblocked),
            _ => None,
        }
    }
}

impl Display for ActivityEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: ActivityId,
    pub entry_id: EntryId,
    pub profile_id: ProfileId,
    pub event_type: ActivityEventType,
    /// Optional free-text detail, e.g. `"3 day defer"`.
    pub note: Option<String>,
    pub created_at: i64,
}
