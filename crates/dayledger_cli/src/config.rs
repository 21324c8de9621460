//! Runtime configuration for the `dayledger` binary.
//!
//! Each setting resolves as: command-line flag, then environment variable,
//! then built-in default. Blank values count as unset.

use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DAYLEDGER_DB_PATH";
pub const LOG_DIR_ENV: &str = "DAYLEDGER_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "DAYLEDGER_LOG_LEVEL";

const DEFAULT_DB_FILE: &str = "dayledger.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl CliConfig {
    /// Resolves settings from flags and the process environment.
    pub fn resolve(
        db: Option<String>,
        log_dir: Option<String>,
        log_level: Option<String>,
    ) -> Self {
        Self::resolve_with(db, log_dir, log_level, |name| std::env::var(name).ok())
    }

    /// Resolves settings with an injectable environment lookup.
    pub fn resolve_with(
        db: Option<String>,
        log_dir: Option<String>,
        log_level: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let pick = |flag: Option<String>, name: &str| non_blank(flag).or_else(|| non_blank(env(name)));

        let db_path = pick(db, DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE));
        let log_dir = pick(log_dir, LOG_DIR_ENV).map(PathBuf::from);
        let log_level = pick(log_level, LOG_LEVEL_ENV)
            .unwrap_or_else(|| dayledger_core::default_log_level().to_string());

        Self {
            db_path,
            log_dir,
            log_level,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
