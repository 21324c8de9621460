//! Activity logger.
//!
//! # Responsibility
//! - Append one immutable event per successful entry mutation.
//! - Serve bounded newest-first reads per entry and per profile.
//!
//! # Invariants
//! - `profile_id` is copied from the entry being logged, never taken from
//!   caller input.
//! - `append` runs inside the caller's transaction, after the entry write.

use crate::model::activity::{ActivityEvent, ActivityEventType};
use crate::model::entry::{Entry, EntryId};
use crate::model::profile::ProfileId;
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::RepoResult;
use uuid::Uuid;

pub const ACTIVITY_DEFAULT_LIMIT: u32 = 20;
pub const ACTIVITY_LIMIT_MAX: u32 = 200;

/// Append/read facade over an activity repository.
pub struct ActivityLogger<R: ActivityRepository> {
    repo: R,
}

impl<R: ActivityRepository> ActivityLogger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records `event_type` for `entry` at `now`.
    pub fn append(
        &self,
        entry: &Entry,
        event_type: ActivityEventType,
        note: Option<String>,
        now: i64,
    ) -> RepoResult<ActivityEvent> {
        let event = ActivityEvent {
            id: Uuid::new_v4(),
            entry_id: entry.id,
            profile_id: entry.profile_id,
            event_type,
            note,
            created_at: now,
        };
        self.repo.append_event(&event)?;
        Ok(event)
    }

    /// Most recent events for one entry, newest first.
    pub fn list_by_entry(
        &self,
        entry_id: EntryId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<ActivityEvent>> {
        self.repo
            .list_for_entry(entry_id, normalize_activity_limit(limit))
    }

    /// Most recent events across a profile, newest first.
    pub fn list_by_profile(
        &self,
        profile_id: ProfileId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<ActivityEvent>> {
        self.repo
            .list_for_profile(profile_id, normalize_activity_limit(limit))
    }
}

/// Normalizes an activity read limit: default 20, capped at 200.
pub fn normalize_activity_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => ACTIVITY_DEFAULT_LIMIT,
        Some(value) => value.min(ACTIVITY_LIMIT_MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_activity_limit;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(normalize_activity_limit(None), 20);
        assert_eq!(normalize_activity_limit(Some(0)), 20);
        assert_eq!(normalize_activity_limit(Some(5)), 5);
        assert_eq!(normalize_activity_limit(Some(10_000)), 200);
    }
}
