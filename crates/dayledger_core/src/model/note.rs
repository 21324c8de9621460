//! Free-form scratch note model.
//!
//! Notes are independent of profiles and entries: plain content with
//! creation/update timestamps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// May be empty.
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    pub fn new(content: impl Into<String>, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
