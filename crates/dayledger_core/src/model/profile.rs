//! Profile domain model.
//!
//! # Responsibility
//! - Define the operator's working contexts ("Work", "Personal", ...).
//! - Validate and derive human slugs used as unique profile keys.
//!
//! # Invariants
//! - At most one profile is active across the store (enforced by the
//!   profile service and a partial unique index).
//! - `key` is a lowercase slug: `[a-z0-9]` runs joined by single `-`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one profile.
pub type ProfileId = Uuid;

static PROFILE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid profile key regex"));
static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    /// Unique human slug.
    pub key: String,
    pub description: String,
    pub is_active: bool,
    /// Display rank, ascending.
    pub sort_order: i64,
    pub created_at: i64,
}

/// Validation errors for profile records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    NilId,
    EmptyName,
    InvalidKey(String),
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "profile id must not be nil"),
            Self::EmptyName => write!(f, "profile name cannot be empty"),
            Self::InvalidKey(key) => write!(
                f,
                "invalid profile key `{key}`; expected lowercase words joined by `-`"
            ),
        }
    }
}

impl Error for ProfileValidationError {}

impl Profile {
    /// Creates an inactive profile with a generated id.
    ///
    /// `name` and `description` are trimmed; `key` must already be a slug.
    pub fn new(
        name: &str,
        key: &str,
        description: &str,
        sort_order: i64,
        now: i64,
    ) -> Result<Self, ProfileValidationError> {
        let profile = Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            key: key.to_string(),
            description: description.trim().to_string(),
            is_active: false,
            sort_order,
            created_at: now,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if self.id.is_nil() {
            return Err(ProfileValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ProfileValidationError::EmptyName);
        }
        if !is_valid_profile_key(&self.key) {
            return Err(ProfileValidationError::InvalidKey(self.key.clone()));
        }
        Ok(())
    }
}

/// Returns whether `key` is an acceptable profile slug.
pub fn is_valid_profile_key(key: &str) -> bool {
    PROFILE_KEY_RE.is_match(key)
}

/// Derives a profile slug from a display name.
///
/// Returns `None` when the name has no ASCII letters or digits.
pub fn profile_key_from_name(name: &str) -> Option<String> {
    let lowered = name.trim().to_lowercase();
    let slug = NON_SLUG_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_profile_key, profile_key_from_name, Profile, ProfileValidationError};

    #[test]
    fn key_from_name_collapses_separators() {
        assert_eq!(
            profile_key_from_name("  Side Projects / 2026 ").as_deref(),
            Some("side-projects-2026")
        );
        assert_eq!(profile_key_from_name("!!!"), None);
    }

    #[test]
    fn key_validation_rejects_uppercase_and_dangling_dashes() {
        assert!(is_valid_profile_key("work"));
        assert!(is_valid_profile_key("client-a"));
        assert!(!is_valid_profile_key("Work"));
        assert!(!is_valid_profile_key("-work"));
        assert!(!is_valid_profile_key("work--a"));
    }

    #[test]
    fn new_rejects_blank_name() {
        let err = Profile::new("   ", "blank", "", 0, 1).unwrap_err();
        assert_eq!(err, ProfileValidationError::EmptyName);
    }
}
