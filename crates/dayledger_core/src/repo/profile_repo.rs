//! Profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist profiles and expose rank/key/active lookups.
//! - Flip the active flag with a two-phase update.
//!
//! # Invariants
//! - Listing order is `sort_order ASC, created_at ASC, uuid ASC`.
//! - `activate_exclusive` clears other active rows before setting the target,
//!   so the partial unique index on `is_active` is never violated. Callers
//!   run it inside a transaction.

use crate::model::profile::{Profile, ProfileId};
use crate::repo::schema_guard::{ensure_connection_ready, TableRequirement};
use crate::repo::{bool_to_int, parse_flag, parse_uuid, RecordKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    key,
    description,
    is_active,
    sort_order,
    created_at
FROM profiles";

const PROFILE_REQUIREMENTS: &[TableRequirement] = &[TableRequirement {
    table: "profiles",
    columns: &[
        "uuid",
        "name",
        "key",
        "description",
        "is_active",
        "sort_order",
        "created_at",
    ],
}];

/// Repository interface for profiles.
pub trait ProfileRepository {
    fn insert_profile(&self, profile: &Profile) -> RepoResult<ProfileId>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    fn get_profile_by_key(&self, key: &str) -> RepoResult<Option<Profile>>;
    fn list_profiles(&self) -> RepoResult<Vec<Profile>>;
    fn list_active_profiles(&self) -> RepoResult<Vec<Profile>>;
    fn next_sort_order(&self) -> RepoResult<i64>;
    /// Makes `id` the only active profile.
    fn activate_exclusive(&self, id: ProfileId) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, PROFILE_REQUIREMENTS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_profiles(&self, sql: &str) -> RepoResult<Vec<Profile>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn insert_profile(&self, profile: &Profile) -> RepoResult<ProfileId> {
        profile.validate()?;
        self.conn.execute(
            "INSERT INTO profiles (
                uuid,
                name,
                key,
                description,
                is_active,
                sort_order,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                profile.id.to_string(),
                profile.name.as_str(),
                profile.key.as_str(),
                profile.description.as_str(),
                bool_to_int(profile.is_active),
                profile.sort_order,
                profile.created_at,
            ],
        )?;
        Ok(profile.id)
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        self.conn
            .query_row(
                &format!("{PROFILE_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_profile_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn get_profile_by_key(&self, key: &str) -> RepoResult<Option<Profile>> {
        self.conn
            .query_row(
                &format!("{PROFILE_SELECT_SQL} WHERE key = ?1;"),
                [key],
                |row| Ok(parse_profile_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_profiles(&self) -> RepoResult<Vec<Profile>> {
        self.query_profiles(&format!(
            "{PROFILE_SELECT_SQL} ORDER BY sort_order ASC, created_at ASC, uuid ASC;"
        ))
    }

    fn list_active_profiles(&self) -> RepoResult<Vec<Profile>> {
        self.query_profiles(&format!(
            "{PROFILE_SELECT_SQL}
             WHERE is_active = 1
             ORDER BY sort_order ASC, created_at ASC, uuid ASC;"
        ))
    }

    fn next_sort_order(&self) -> RepoResult<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM profiles;",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    fn activate_exclusive(&self, id: ProfileId) -> RepoResult<()> {
        let id_text = id.to_string();
        self.conn.execute(
            "UPDATE profiles
             SET is_active = 0
             WHERE is_active = 1
               AND uuid <> ?1;",
            [id_text.as_str()],
        )?;
        let changed = self.conn.execute(
            "UPDATE profiles SET is_active = 1 WHERE uuid = ?1;",
            [id_text.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Profile, id));
        }
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let uuid_text: String = row.get("uuid")?;
    let profile = Profile {
        id: parse_uuid(&uuid_text, "profiles.uuid")?,
        name: row.get("name")?,
        key: row.get("key")?,
        description: row.get("description")?,
        is_active: parse_flag(row.get("is_active")?, "profiles.is_active")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
    };
    profile.validate()?;
    Ok(profile)
}
