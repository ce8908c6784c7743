//! Runtime configuration for the CLI.
//!
//! # Invariants
//! - Precedence is flag > environment > default for every setting.
//! - Blank flag or environment values count as absent.

use crate::error::CliError;
use massledger_core::{default_log_level, CelebrantId};
use std::path::PathBuf;
use uuid::Uuid;

pub const DB_PATH_ENV: &str = "MASSLEDGER_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "MASSLEDGER_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "MASSLEDGER_LOG_DIR";
pub const CELEBRANT_ENV: &str = "MASSLEDGER_CELEBRANT";

const DEFAULT_DB_FILE_NAME: &str = "massledger.sqlite3";

/// Settings given on the command line; `None` defers to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFlags {
    pub db: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub celebrant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays disabled when absent.
    pub log_dir: Option<PathBuf>,
    celebrant: Option<String>,
}

impl CliConfig {
    /// Resolves configuration from `flags` and the process environment.
    pub fn from_env(flags: ConfigFlags) -> Self {
        Self::resolve(flags, |key| std::env::var(key).ok())
    }

    /// Resolves configuration from `flags` and an environment lookup.
    pub fn resolve(flags: ConfigFlags, env: impl Fn(&str) -> Option<String>) -> Self {
        let from_env = |key: &str| env(key).and_then(non_blank);

        let db_path = flags
            .db
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| from_env(DB_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_level = flags
            .log_level
            .and_then(non_blank)
            .or_else(|| from_env(LOG_LEVEL_ENV))
            .unwrap_or_else(|| default_log_level().as_str().to_string());
        let log_dir = flags
            .log_dir
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| from_env(LOG_DIR_ENV).map(PathBuf::from));
        let celebrant = flags
            .celebrant
            .and_then(non_blank)
            .or_else(|| from_env(CELEBRANT_ENV));

        Self {
            db_path,
            log_level,
            log_dir,
            celebrant,
        }
    }

    /// Celebrant every ledger command acts for.
    pub fn celebrant(&self) -> Result<CelebrantId, CliError> {
        let raw = self.celebrant.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "celebrant id required: pass --celebrant or set {CELEBRANT_ENV}"
            ))
        })?;
        let id = Uuid::parse_str(raw)
            .map_err(|err| CliError::Config(format!("invalid celebrant id `{raw}`: {err}")))?;
        if id.is_nil() {
            return Err(CliError::Config("celebrant id must not be nil".to_string()));
        }
        Ok(id)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
