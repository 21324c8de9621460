//! Ledger domain model.
//!
//! # Responsibility
//! - Define the canonical records persisted by the core: profiles, entries,
//!   activity events and free-form notes.
//! - Keep task lifecycle transitions next to the data they mutate.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - Entries are archived (soft-deleted), never hard-deleted.
//! - Activity events are immutable once written.

pub mod activity;
pub mod entry;
pub mod note;
pub mod profile;
