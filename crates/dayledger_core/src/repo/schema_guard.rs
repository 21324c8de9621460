//! Connection readiness checks shared by repository constructors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Table and column set a repository relies on.
pub(crate) struct TableRequirement {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// Fails unless `conn` is migrated and exposes every required column.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    requirements: &[TableRequirement],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for requirement in requirements {
        if !table_exists(conn, requirement.table)? {
            return Err(RepoError::MissingRequiredTable(requirement.table));
        }
        let present = table_columns(conn, requirement.table)?;
        for column in requirement.columns {
            if !present.iter().any(|name| name.as_str() == *column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: requirement.table,
                    column: *column,
                });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
