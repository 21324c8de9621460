//! Activity event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append immutable audit events to `entry_activity`.
//! - Read recent events per entry or per profile.
//!
//! # Invariants
//! - Rows are never updated or deleted (also enforced by triggers).
//! - Reads are ordered `created_at DESC, seq DESC`, so same-millisecond
//!   events keep reverse insertion order.

use crate::model::activity::{ActivityEvent, ActivityEventType, ActivityId};
use crate::model::entry::EntryId;
use crate::model::profile::ProfileId;
use crate::repo::schema_guard::{ensure_connection_ready, TableRequirement};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    uuid,
    entry_uuid,
    profile_uuid,
    event_type,
    note,
    created_at
FROM entry_activity";

const ACTIVITY_REQUIREMENTS: &[TableRequirement] = &[TableRequirement {
    table: "entry_activity",
    columns: &[
        "seq",
        "uuid",
        "entry_uuid",
        "profile_uuid",
        "event_type",
        "note",
        "created_at",
    ],
}];

/// Repository interface for the append-only activity log.
pub trait ActivityRepository {
    fn append_event(&self, event: &ActivityEvent) -> RepoResult<ActivityId>;
    fn list_for_entry(&self, entry_id: EntryId, limit: u32) -> RepoResult<Vec<ActivityEvent>>;
    fn list_for_profile(
        &self,
        profile_id: ProfileId,
        limit: u32,
    ) -> RepoResult<Vec<ActivityEvent>>;
    fn count_for_entry(&self, entry_id: EntryId) -> RepoResult<u64>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ACTIVITY_REQUIREMENTS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn list_where(&self, column: &str, id: String, limit: u32) -> RepoResult<Vec<ActivityEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL}
             WHERE {column} = ?1
             ORDER BY created_at DESC, seq DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![id, i64::from(limit)])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_activity_row(row)?);
        }
        Ok(events)
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn append_event(&self, event: &ActivityEvent) -> RepoResult<ActivityId> {
        self.conn.execute(
            "INSERT INTO entry_activity (
                uuid,
                entry_uuid,
                profile_uuid,
                event_type,
                note,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.id.to_string(),
                event.entry_id.to_string(),
                event.profile_id.to_string(),
                event.event_type.as_str(),
                event.note.as_deref(),
                event.created_at,
            ],
        )?;
        Ok(event.id)
    }

    fn list_for_entry(&self, entry_id: EntryId, limit: u32) -> RepoResult<Vec<ActivityEvent>> {
        self.list_where("entry_uuid", entry_id.to_string(), limit)
    }

    fn list_for_profile(
        &self,
        profile_id: ProfileId,
        limit: u32,
    ) -> RepoResult<Vec<ActivityEvent>> {
        self.list_where("profile_uuid", profile_id.to_string(), limit)
    }

    fn count_for_entry(&self, entry_id: EntryId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entry_activity WHERE entry_uuid = ?1;",
            [entry_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ActivityEvent> {
    let uuid_text: String = row.get("uuid")?;
    let entry_text: String = row.get("entry_uuid")?;
    let profile_text: String = row.get("profile_uuid")?;
    let type_text: String = row.get("event_type")?;
    let event_type = ActivityEventType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid event type `{type_text}` in entry_activity.event_type"
        ))
    })?;

    Ok(ActivityEvent {
        id: parse_uuid(&uuid_text, "entry_activity.uuid")?,
        entry_id: parse_uuid(&entry_text, "entry_activity.entry_uuid")?,
        profile_id: parse_uuid(&profile_text, "entry_activity.profile_uuid")?,
        event_type,
        note: row.get("note")?,
        created_at: row.get("created_at")?,
    })
}
