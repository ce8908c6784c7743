//! Service-facing error shared by lifecycle, merger, dashboard and import.
//!
//! # Invariants
//! - Every variant maps to one stable `reason_code()`.
//! - No variant is retried internally.

use crate::model::intention::IntentionId;
use crate::repo::obligation_store::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors returned to callers of core use-cases.
#[derive(Debug)]
pub enum LedgerError {
    /// Intention is absent, owned by another celebrant, or of the wrong kind.
    NotFound(IntentionId),
    /// Single-shot intention already fulfilled.
    AlreadyFulfilled(IntentionId),
    /// Bulk intention has no remaining count.
    Exhausted(IntentionId),
    /// Malformed caller input.
    InvalidInput(String),
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl LedgerError {
    /// Stable machine-readable failure reason.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyFulfilled(_) => "already_fulfilled",
            Self::Exhausted(_) => "exhausted",
            Self::InvalidInput(_) => "invalid_input",
            Self::Storage(_) => "storage_failure",
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "intention not found: {id}"),
            Self::AlreadyFulfilled(id) => write!(f, "intention already fulfilled: {id}"),
            Self::Exhausted(id) => write!(f, "bulk intention has no remaining count: {id}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Storage(other),
        }
    }
}
