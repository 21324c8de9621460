//! Scratch note use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/list APIs for free-form notes.
//!
//! # Invariants
//! - `update` uses full content replacement semantics.
//! - Note list is always sorted by `updated_at DESC, uuid ASC`.

use crate::clock::{Clock, SystemClock};
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::{RecordKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    NoteNotFound(NoteId),
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                kind: RecordKind::Note,
                id,
            } => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: NoteRepository> NoteService<R, SystemClock> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: NoteRepository, C: Clock> NoteService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Newest-updated notes first.
    pub fn list(&self) -> Result<Vec<Note>, NoteServiceError> {
        Ok(self.repo.list_notes()?)
    }

    /// Creates one note; missing content is stored as an empty string.
    pub fn create(&self, content: Option<String>) -> Result<Note, NoteServiceError> {
        let note = Note::new(content.unwrap_or_default(), self.clock.now_ms());
        self.repo.insert_note(&note)?;
        Ok(note)
    }

    /// Replaces note content fully and bumps `updated_at`.
    pub fn update(
        &self,
        note_id: NoteId,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let content = content.into();
        self.repo
            .update_note_content(note_id, content.as_str(), self.clock.now_ms())?;
        self.get(note_id)
    }

    pub fn get(&self, note_id: NoteId) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))
    }
}
