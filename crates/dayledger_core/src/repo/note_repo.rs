//! Scratch note repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing order is `updated_at DESC, uuid ASC`.
//! - Updates never touch `created_at`.

use crate::model::note::{Note, NoteId};
use crate::repo::schema_guard::{ensure_connection_ready, TableRequirement};
use crate::repo::{parse_uuid, RecordKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_REQUIREMENTS: &[TableRequirement] = &[TableRequirement {
    table: "notes",
    columns: &["uuid", "content", "created_at", "updated_at"],
}];

/// Repository interface for scratch notes.
pub trait NoteRepository {
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId>;
    fn update_note_content(&self, id: NoteId, content: &str, updated_at: i64) -> RepoResult<()>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, NOTE_REQUIREMENTS)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (uuid, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                note.id.to_string(),
                note.content.as_str(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(note.id)
    }

    fn update_note_content(&self, id: NoteId, content: &str, updated_at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET content = ?2,
                 updated_at = ?3
             WHERE uuid = ?1;",
            params![id.to_string(), content, updated_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Note, id));
        }
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.conn
            .query_row(
                "SELECT uuid, content, created_at, updated_at
                 FROM notes
                 WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok(parse_note_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, content, created_at, updated_at
             FROM notes
             ORDER BY updated_at DESC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Note {
        id: parse_uuid(&uuid_text, "notes.uuid")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
