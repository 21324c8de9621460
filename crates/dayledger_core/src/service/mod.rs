//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the ledger's read/write operations.
//! - Own transaction boundaries: every mutation commits its record change
//!   and its activity event together or not at all.
//!
//! # See also
//! - `repo` for persistence contracts.

pub mod activity_log;
pub mod entry_service;
pub mod note_service;
pub mod profile_service;
pub mod today_service;
mod tx;
