//! Profile manager.
//!
//! # Responsibility
//! - List, look up and create profiles.
//! - Switch the single active profile.
//! - Seed the first-run prototype data set.
//!
//! # Invariants
//! - At most one profile is active after every call; the flip runs in one
//!   immediate transaction.
//! - `bootstrap_prototype` is idempotent and leaves exactly one active
//!   profile whenever any profile exists.

use crate::clock::{Clock, SystemClock};
use crate::model::activity::ActivityEventType;
use crate::model::entry::{
    Entry, EntryBody, EntryValidationError, TaskPriority, TaskState, TaskStatus,
};
use crate::model::profile::{
    is_valid_profile_key, profile_key_from_name, Profile, ProfileId, ProfileValidationError,
};
use crate::repo::activity_repo::SqliteActivityRepository;
use crate::repo::entry_repo::{EntryRepository, SqliteEntryRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::{RecordKind, RepoError};
use crate::service::activity_log::ActivityLogger;
use crate::service::tx::with_immediate_tx;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Errors from profile operations.
#[derive(Debug)]
pub enum ProfileServiceError {
    Validation(ProfileValidationError),
    ProfileNotFound(ProfileId),
    DuplicateKey(String),
    Repo(RepoError),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProfileNotFound(id) => write!(f, "profile not found: {id}"),
            Self::DuplicateKey(key) => write!(f, "profile key already in use: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                kind: RecordKind::Profile,
                id,
            } => Self::ProfileNotFound(id),
            RepoError::ProfileValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ProfileValidationError> for ProfileServiceError {
    fn from(value: ProfileValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<EntryValidationError> for ProfileServiceError {
    fn from(value: EntryValidationError) -> Self {
        Self::Repo(value.into())
    }
}

impl From<rusqlite::Error> for ProfileServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Profile manager bound to one connection.
pub struct ProfileService<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> ProfileService<'conn, SystemClock> {
    pub fn try_new(conn: &'conn Connection) -> Result<Self, ProfileServiceError> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> ProfileService<'conn, C> {
    pub fn with_clock(conn: &'conn Connection, clock: C) -> Result<Self, ProfileServiceError> {
        SqliteProfileRepository::try_new(conn)?;
        SqliteEntryRepository::try_new(conn)?;
        SqliteActivityRepository::try_new(conn)?;
        Ok(Self { conn, clock })
    }

    /// All profiles by rank.
    pub fn list(&self) -> Result<Vec<Profile>, ProfileServiceError> {
        Ok(self.repo().list_profiles()?)
    }

    pub fn get(&self, profile_id: ProfileId) -> Result<Profile, ProfileServiceError> {
        self.repo()
            .get_profile(profile_id)?
            .ok_or(ProfileServiceError::ProfileNotFound(profile_id))
    }

    pub fn get_by_key(&self, key: &str) -> Result<Option<Profile>, ProfileServiceError> {
        Ok(self.repo().get_profile_by_key(key)?)
    }

    /// The active profile, if any.
    pub fn get_active(&self) -> Result<Option<Profile>, ProfileServiceError> {
        Ok(self.repo().list_active_profiles()?.into_iter().next())
    }

    /// Makes `profile_id` the only active profile.
    pub fn set_active(&self, profile_id: ProfileId) -> Result<(), ProfileServiceError> {
        let result = with_immediate_tx(self.conn, |conn| {
            SqliteProfileRepository::new_unchecked(conn).activate_exclusive(profile_id)?;
            Ok::<_, ProfileServiceError>(())
        });
        match &result {
            Ok(()) => info!("event=profile_set_active module=profile status=ok profile_id={profile_id}"),
            Err(err) => warn!(
                "event=profile_set_active module=profile status=error profile_id={profile_id} error={err}"
            ),
        }
        result
    }

    /// Creates an inactive profile ranked after all existing ones.
    ///
    /// `key` defaults to a slug derived from `name`.
    ///
    /// # Errors
    /// - `Validation` for a blank name or an invalid key.
    /// - `DuplicateKey` when the key is already taken.
    pub fn create_profile(
        &self,
        name: &str,
        key: Option<&str>,
        description: &str,
    ) -> Result<Profile, ProfileServiceError> {
        if name.trim().is_empty() {
            return Err(ProfileValidationError::EmptyName.into());
        }
        let key = match key {
            Some(key) => key.trim().to_string(),
            None => profile_key_from_name(name)
                .ok_or_else(|| ProfileValidationError::InvalidKey(name.trim().to_string()))?,
        };
        if !is_valid_profile_key(&key) {
            return Err(ProfileValidationError::InvalidKey(key).into());
        }

        let now = self.clock.now_ms();
        let profile = with_immediate_tx(self.conn, |conn| {
            let repo = SqliteProfileRepository::new_unchecked(conn);
            if repo.get_profile_by_key(&key)?.is_some() {
                return Err(ProfileServiceError::DuplicateKey(key.clone()));
            }
            let profile = Profile::new(name, &key, description, repo.next_sort_order()?, now)?;
            repo.insert_profile(&profile)?;
            Ok(profile)
        })?;

        info!(
            "event=profile_create module=profile status=ok profile_id={} sort_order={}",
            profile.id, profile.sort_order
        );
        Ok(profile)
    }

    /// Seeds the prototype profiles and demo entries on first run.
    ///
    /// With existing profiles nothing is seeded: the active profile is
    /// returned, activating the first by rank when none is active.
    pub fn bootstrap_prototype(&self) -> Result<ProfileId, ProfileServiceError> {
        let now = self.clock.now_ms();
        let result: Result<_, ProfileServiceError> = with_immediate_tx(self.conn, |conn| {
            let profiles = SqliteProfileRepository::new_unchecked(conn);
            let existing = profiles.list_profiles()?;

            if let Some(active) = existing.iter().find(|profile| profile.is_active) {
                return Ok((active.id, BootstrapOutcome::Existing));
            }
            if let Some(first) = existing.first() {
                profiles.activate_exclusive(first.id)?;
                return Ok((first.id, BootstrapOutcome::Healed));
            }

            let seeded = seed_prototype(conn, now)?;
            Ok((seeded, BootstrapOutcome::Seeded))
        });

        match &result {
            Ok((profile_id, outcome)) => info!(
                "event=bootstrap module=profile status=ok outcome={} profile_id={profile_id}",
                outcome.as_str()
            ),
            Err(err) => warn!("event=bootstrap module=profile status=error error={err}"),
        }
        result.map(|(profile_id, _)| profile_id)
    }

    fn repo(&self) -> SqliteProfileRepository<'conn> {
        SqliteProfileRepository::new_unchecked(self.conn)
    }
}

#[derive(Debug, Clone, Copy)]
enum BootstrapOutcome {
    Existing,
    Healed,
    Seeded,
}

impl BootstrapOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Healed => "healed",
            Self::Seeded => "seeded",
        }
    }
}

/// Demo entry used by the first-run seed.
struct SeedEntry {
    title: &'static str,
    content: Option<&'static str>,
    task: Option<TaskState>,
    carry_over: bool,
    tags: &'static [&'static str],
}

impl SeedEntry {
    fn note(
        title: &'static str,
        content: &'static str,
        tags: &'static [&'static str],
    ) -> Self {
        Self {
            title,
            content: Some(content),
            task: None,
            carry_over: false,
            tags,
        }
    }

    fn task(
        title: &'static str,
        content: Option<&'static str>,
        task: TaskState,
        carry_over: bool,
        tags: &'static [&'static str],
    ) -> Self {
        Self {
            title,
            content,
            task: Some(task),
            carry_over,
            tags,
        }
    }
}

fn seed_prototype(conn: &Connection, now: i64) -> Result<ProfileId, ProfileServiceError> {
    let profiles = SqliteProfileRepository::new_unchecked(conn);
    let entries = SqliteEntryRepository::new_unchecked(conn);
    let activity = ActivityLogger::new(SqliteActivityRepository::new_unchecked(conn));

    let work = Profile::new("Work", "work", "Client projects and team delivery", 0, now)?;
    let personal = Profile::new("Personal", "personal", "Life admin and personal routines", 1, now)?;
    profiles.insert_profile(&work)?;
    profiles.insert_profile(&personal)?;
    profiles.activate_exclusive(work.id)?;

    let mut staging = TaskState::new(TaskStatus::Todo);
    staging.priority = Some(TaskPriority::High);
    staging.due_at = Some(now + 3 * HOUR_MS / 2);

    let mut jwt = TaskState::new(TaskStatus::InProgress);
    jwt.priority = Some(TaskPriority::High);
    jwt.due_at = Some(now + 6 * HOUR_MS);
    jwt.blocked = true;
    jwt.blocked_reason = Some("Token signature mismatch".to_string());

    let mut book = TaskState::new(TaskStatus::Todo);
    book.priority = Some(TaskPriority::Medium);

    let seed = [
        (
            work.id,
            SeedEntry::task(
                "Update client staging environment",
                Some("Quick patch and smoke test before standup."),
                staging,
                true,
                &["client", "infra"],
            ),
        ),
        (
            work.id,
            SeedEntry::task(
                "Investigate JWT issue in auth module",
                Some("Pair with Priya and unblock team deadline."),
                jwt,
                true,
                &["auth", "team"],
            ),
        ),
        (
            work.id,
            SeedEntry::note(
                "Client API migration notes",
                "Remember to rotate key after endpoint verification.",
                &["client", "api"],
            ),
        ),
        (
            personal.id,
            SeedEntry::task(
                "Order the book from last week's note",
                None,
                book,
                false,
                &["reading"],
            ),
        ),
        (
            personal.id,
            SeedEntry::note(
                "Weekend itinerary",
                "Saturday morning trail, lunch at Cedar Cafe, evening movie.",
                &["weekend"],
            ),
        ),
    ];

    for (profile_id, seed_entry) in seed {
        let body = match seed_entry.task {
            Some(task) => EntryBody::Task(task),
            None => EntryBody::Note,
        };
        let mut entry = Entry::new(profile_id, body, seed_entry.title, now)?;
        entry.content = seed_entry.content.map(str::to_string);
        entry.carry_over = seed_entry.carry_over;
        entry.tags = seed_entry.tags.iter().map(|tag| tag.to_string()).collect();
        entries.insert_entry(&entry)?;
        activity.append(&entry, ActivityEventType::Created, None, now)?;
    }

    Ok(work.id)
}
