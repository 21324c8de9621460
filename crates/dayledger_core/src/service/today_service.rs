//! Today triage: the daily review queue for one profile.
//!
//! # Responsibility
//! - Load active (non-archived, not done) tasks of a profile.
//! - Bucket them into carry-over, overdue, due-today and quick wins.
//!
//! # Invariants
//! - Read-only; never writes.
//! - Tasks are enumerated newest first (`created_at DESC`); quick wins keep
//!   the first three in that order.
//! - Buckets may overlap; a carry-over task is never also overdue.

use crate::clock::{Clock, SystemClock};
use crate::model::entry::{Entry, EntryType, TaskPriority, DAY_MS};
use crate::model::profile::ProfileId;
use crate::repo::entry_repo::{EntryListQuery, EntryRepository, SqliteEntryRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::service::entry_service::EntryServiceError;
use chrono::{Duration, Local, NaiveTime, TimeZone};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;

pub const QUICK_WIN_LIMIT: usize = 3;

/// Half-open local-day window `[start_ms, end_ms)` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DayWindow {
    /// Window of the local day containing `now_ms` in `tz`.
    ///
    /// `end_ms` is always `start_ms + 24h`.
    pub fn containing<Tz: TimeZone>(now_ms: i64, tz: &Tz) -> Self {
        let start_ms = local_midnight_ms(now_ms, tz)
            .unwrap_or_else(|| now_ms - now_ms.rem_euclid(DAY_MS));
        Self {
            start_ms,
            end_ms: start_ms + DAY_MS,
        }
    }

    pub fn contains(&self, instant_ms: i64) -> bool {
        self.start_ms <= instant_ms && instant_ms < self.end_ms
    }
}

/// Triage payload. Membership in several buckets is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodayTriage {
    pub carry_over: Vec<Entry>,
    pub overdue: Vec<Entry>,
    pub due_today: Vec<Entry>,
    pub quick_wins: Vec<Entry>,
}

/// Buckets `tasks` for the day described by `window`.
///
/// Non-task, archived and done entries are ignored, so callers may pass a
/// broader listing; input order is preserved inside every bucket.
pub fn triage_tasks(tasks: &[Entry], window: DayWindow) -> TodayTriage {
    let active = tasks.iter().filter(|entry| {
        !entry.is_archived() && entry.task().is_some_and(|task| task.is_active())
    });

    let mut triage = TodayTriage::default();
    for entry in active {
        let Some(task) = entry.task() else {
            continue;
        };

        if entry.carry_over {
            triage.carry_over.push(entry.clone());
        }
        if let Some(due_at) = task.due_at {
            if due_at < window.start_ms && !entry.carry_over {
                triage.overdue.push(entry.clone());
            }
            if window.contains(due_at) {
                triage.due_today.push(entry.clone());
            }
        }
        if task.priority == Some(TaskPriority::Low)
            && !task.blocked
            && triage.quick_wins.len() < QUICK_WIN_LIMIT
        {
            triage.quick_wins.push(entry.clone());
        }
    }
    triage
}

/// Store-backed triage queries.
pub struct TodayService<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> TodayService<'conn, SystemClock> {
    pub fn try_new(conn: &'conn Connection) -> Result<Self, EntryServiceError> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> TodayService<'conn, C> {
    pub fn with_clock(conn: &'conn Connection, clock: C) -> Result<Self, EntryServiceError> {
        SqliteProfileRepository::try_new(conn)?;
        SqliteEntryRepository::try_new(conn)?;
        Ok(Self { conn, clock })
    }

    /// Triage for the current instant in the system time zone.
    pub fn today(&self, profile_id: ProfileId) -> Result<TodayTriage, EntryServiceError> {
        self.today_at(profile_id, self.clock.now_ms())
    }

    /// Triage for `now_ms` in the system time zone.
    pub fn today_at(
        &self,
        profile_id: ProfileId,
        now_ms: i64,
    ) -> Result<TodayTriage, EntryServiceError> {
        self.today_in(profile_id, now_ms, &Local)
    }

    /// Triage for `now_ms`, with "today" taken in `tz`.
    ///
    /// # Errors
    /// - `ProfileNotFound` when the profile does not exist.
    pub fn today_in<Tz: TimeZone>(
        &self,
        profile_id: ProfileId,
        now_ms: i64,
        tz: &Tz,
    ) -> Result<TodayTriage, EntryServiceError> {
        let profiles = SqliteProfileRepository::new_unchecked(self.conn);
        if profiles.get_profile(profile_id)?.is_none() {
            return Err(EntryServiceError::ProfileNotFound(profile_id));
        }

        let query = EntryListQuery::for_profile(profile_id).of_type(EntryType::Task);
        let tasks = SqliteEntryRepository::new_unchecked(self.conn).list_entries(&query)?;
        let window = DayWindow::containing(now_ms, tz);
        let triage = triage_tasks(&tasks, window);

        debug!(
            "event=today_triage module=today status=ok tasks={} carry_over={} overdue={} due_today={} quick_wins={}",
            tasks.len(),
            triage.carry_over.len(),
            triage.overdue.len(),
            triage.due_today.len(),
            triage.quick_wins.len()
        );
        Ok(triage)
    }
}

fn local_midnight_ms<Tz: TimeZone>(now_ms: i64, tz: &Tz) -> Option<i64> {
    let local_date = tz.timestamp_millis_opt(now_ms).single()?.date_naive();
    let midnight = local_date.and_time(NaiveTime::MIN);
    // A DST gap can swallow midnight; the day then starts at the first
    // representable instant after it.
    let start = tz.from_local_datetime(&midnight).earliest().or_else(|| {
        tz.from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
    })?;
    Some(start.timestamp_millis())
}
