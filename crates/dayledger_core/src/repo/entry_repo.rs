//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist entries and their nested task state in the `entries` table.
//! - Provide the profile-scoped scans used by listings and triage.
//!
//! # Invariants
//! - Write paths call `Entry::validate()` before SQL mutations.
//! - `profile_uuid`, `type` and `created_at` are never rewritten by updates.
//! - Listings are ordered newest first: `created_at DESC, seq DESC`.

use crate::model::entry::{
    Entry, EntryBody, EntryId, EntryType, TaskPriority, TaskState, TaskStatus,
};
use crate::model::profile::ProfileId;
use crate::repo::schema_guard::{ensure_connection_ready, TableRequirement};
use crate::repo::{bool_to_int, parse_flag, parse_uuid, RecordKind, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ENTRY_SELECT_SQL: &str = "SELECT
    uuid,
    profile_uuid,
    type,
    title,
    content,
    project,
    tags_json,
    carry_over,
    archived_at,
    task_status,
    priority,
    due_at,
    blocked,
    blocked_reason,
    completed_at,
    created_at,
    updated_at
FROM entries";

const ENTRY_REQUIREMENTS: &[TableRequirement] = &[TableRequirement {
    table: "entries",
    columns: &[
        "seq",
        "uuid",
        "profile_uuid",
        "type",
        "title",
        "content",
        "project",
        "tags_json",
        "carry_over",
        "archived_at",
        "task_status",
        "priority",
        "due_at",
        "blocked",
        "blocked_reason",
        "completed_at",
        "created_at",
        "updated_at",
    ],
}];

/// Filter for profile-scoped entry scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListQuery {
    pub profile_id: ProfileId,
    pub kind: Option<EntryType>,
    pub include_archived: bool,
}

impl EntryListQuery {
    /// Non-archived entries of every kind for `profile_id`.
    pub fn for_profile(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            kind: None,
            include_archived: false,
        }
    }

    pub fn of_type(mut self, kind: EntryType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn including_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }
}

/// Repository interface for entry persistence.
pub trait EntryRepository {
    fn insert_entry(&self, entry: &Entry) -> RepoResult<EntryId>;
    /// Rewrites every mutable column of an existing entry.
    fn update_entry(&self, entry: &Entry) -> RepoResult<()>;
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>>;
    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<Entry>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Creates a repository after checking the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ENTRY_REQUIREMENTS)?;
        Ok(Self { conn })
    }

    /// Creates a repository on a connection already checked by the caller.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert_entry(&self, entry: &Entry) -> RepoResult<EntryId> {
        entry.validate()?;
        let task = entry.task();

        self.conn.execute(
            "INSERT INTO entries (
                uuid,
                profile_uuid,
                type,
                title,
                content,
                project,
                tags_json,
                carry_over,
                archived_at,
                task_status,
                priority,
                due_at,
                blocked,
                blocked_reason,
                completed_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
            params![
                entry.id.to_string(),
                entry.profile_id.to_string(),
                entry.entry_type().as_str(),
                entry.title.as_str(),
                entry.content.as_deref(),
                entry.project.as_deref(),
                encode_tags(&entry.tags)?,
                bool_to_int(entry.carry_over),
                entry.archived_at,
                task.map(|task| task.status.as_str()),
                task.and_then(|task| task.priority).map(TaskPriority::as_str),
                task.and_then(|task| task.due_at),
                task.map(|task| bool_to_int(task.blocked)),
                task.and_then(|task| task.blocked_reason.as_deref()),
                task.and_then(|task| task.completed_at),
                entry.created_at,
                entry.updated_at,
            ],
        )?;

        Ok(entry.id)
    }

    fn update_entry(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;
        let task = entry.task();

        let changed = self.conn.execute(
            "UPDATE entries
             SET
                title = ?2,
                content = ?3,
                project = ?4,
                tags_json = ?5,
                carry_over = ?6,
                archived_at = ?7,
                task_status = ?8,
                priority = ?9,
                due_at = ?10,
                blocked = ?11,
                blocked_reason = ?12,
                completed_at = ?13,
                updated_at = ?14
             WHERE uuid = ?1
               AND type = ?15;",
            params![
                entry.id.to_string(),
                entry.title.as_str(),
                entry.content.as_deref(),
                entry.project.as_deref(),
                encode_tags(&entry.tags)?,
                bool_to_int(entry.carry_over),
                entry.archived_at,
                task.map(|task| task.status.as_str()),
                task.and_then(|task| task.priority).map(TaskPriority::as_str),
                task.and_then(|task| task.due_at),
                task.map(|task| bool_to_int(task.blocked)),
                task.and_then(|task| task.blocked_reason.as_deref()),
                task.and_then(|task| task.completed_at),
                entry.updated_at,
                entry.entry_type().as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Entry, entry.id));
        }

        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<Entry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE profile_uuid = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.profile_id.to_string())];

        if !query.include_archived {
            sql.push_str(" AND archived_at IS NULL");
        }

        if let Some(kind) = query.kind {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, seq DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "entries.uuid")?;
    let profile_text: String = row.get("profile_uuid")?;
    let profile_id = parse_uuid(&profile_text, "entries.profile_uuid")?;

    let type_text: String = row.get("type")?;
    let kind = EntryType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid entry type `{type_text}` in entries.type"))
    })?;

    let body = match kind {
        EntryType::Task => EntryBody::Task(parse_task_columns(row)?),
        other => {
            if row.get::<_, Option<String>>("task_status")?.is_some() {
                return Err(RepoError::InvalidData(format!(
                    "non-task entry `{uuid_text}` of type `{other}` carries a task status"
                )));
            }
            EntryBody::for_type(other, TaskState::new(TaskStatus::Todo))
        }
    };

    let tags_text: String = row.get("tags_json")?;
    let entry = Entry {
        id,
        profile_id,
        body,
        title: row.get("title")?,
        content: row.get("content")?,
        project: row.get("project")?,
        tags: decode_tags(&tags_text)?,
        carry_over: parse_flag(row.get("carry_over")?, "entries.carry_over")?,
        archived_at: row.get("archived_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    entry.validate()?;
    Ok(entry)
}

fn parse_task_columns(row: &Row<'_>) -> RepoResult<TaskState> {
    let status_text: Option<String> = row.get("task_status")?;
    let status = status_text
        .as_deref()
        .and_then(TaskStatus::parse)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid task status `{}` in entries.task_status",
                status_text.as_deref().unwrap_or("NULL")
            ))
        })?;

    let priority = match row.get::<_, Option<String>>("priority")? {
        Some(value) => Some(TaskPriority::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid priority `{value}` in entries.priority"))
        })?),
        None => None,
    };

    let blocked = match row.get::<_, Option<i64>>("blocked")? {
        Some(value) => parse_flag(value, "entries.blocked")?,
        None => false,
    };

    Ok(TaskState {
        status,
        priority,
        due_at: row.get("due_at")?,
        blocked,
        blocked_reason: row.get("blocked_reason")?,
        completed_at: row.get("completed_at")?,
    })
}

fn encode_tags(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode entry tags: {err}")))
}

fn decode_tags(value: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(value).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags `{value}` in entries.tags_json: {err}"))
    })
}
