//! CLI-level failure wrapping core errors with stable reason codes.

use massledger_core::db::DbError;
use massledger_core::{LedgerError, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CliError {
    /// Missing or malformed configuration.
    Config(String),
    /// Import sheet could not be read or decoded.
    Input(String),
    Ledger(LedgerError),
    Db(DbError),
    Output(serde_json::Error),
}

impl CliError {
    /// Code printed as `error[<code>]`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Input(_) => "invalid_input",
            Self::Ledger(err) => err.reason_code(),
            Self::Db(_) => "storage_failure",
            Self::Output(_) => "output_failure",
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) | Self::Input(message) => f.write_str(message),
            Self::Ledger(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "database open failed: {err}"),
            Self::Output(err) => write!(f, "output encoding failed: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(_) | Self::Input(_) => None,
            Self::Ledger(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<LedgerError> for CliError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Ledger(value.into())
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
