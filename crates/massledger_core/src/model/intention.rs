//! Intention domain model.
//!
//! # Responsibility
//! - Define the obligation record shared by the three intention kinds.
//! - Keep kind-specific state in one closed sum type.
//!
//! # Invariants
//! - `id` is stable and never reused for another intention.
//! - An intention is owned by exactly one celebrant.
//! - Periodic `month` is within `1..=12`.
//! - Bulk `remaining <= total`.
//! - A fixed-date reschedule reason requires a reschedule date.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one intention.
pub type IntentionId = Uuid;

/// Stable identifier of the celebrant owning intentions and events.
pub type CelebrantId = Uuid;

/// Kind discriminant, used for storage, filtering and log metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionKindTag {
    Periodic,
    FixedDate,
    Bulk,
}

impl IntentionKindTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::FixedDate => "fixed_date",
            Self::Bulk => "bulk",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "periodic" => Some(Self::Periodic),
            "fixed_date" => Some(Self::FixedDate),
            "bulk" => Some(Self::Bulk),
            _ => None,
        }
    }
}

impl Display for IntentionKindTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One required occurrence within a `(month, year)` period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicState {
    pub month: u32,
    pub year: i32,
    /// `None` while the obligation is outstanding.
    pub fulfilled_on: Option<NaiveDate>,
}

/// One obligation bound to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDateState {
    /// Never changes after creation, reschedules included.
    pub original_date: NaiveDate,
    pub rescheduled_date: Option<NaiveDate>,
    pub reschedule_reason: Option<String>,
    pub fulfilled: bool,
}

/// A counted series consumed one fulfillment at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkState {
    pub total: u32,
    pub remaining: u32,
    pub start_date: NaiveDate,
    /// Pausing never alters `remaining`.
    pub paused: bool,
    pub last_fulfilled_on: Option<NaiveDate>,
}

impl BulkState {
    /// Creates a fresh series with `remaining == total`.
    pub fn new(total: u32, start_date: NaiveDate) -> Self {
        Self {
            total,
            remaining: total,
            start_date,
            paused: false,
            last_fulfilled_on: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Closed set of intention kinds with their kind-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentionKind {
    Periodic(PeriodicState),
    FixedDate(FixedDateState),
    Bulk(BulkState),
}

impl IntentionKind {
    pub fn tag(&self) -> IntentionKindTag {
        match self {
            Self::Periodic(_) => IntentionKindTag::Periodic,
            Self::FixedDate(_) => IntentionKindTag::FixedDate,
            Self::Bulk(_) => IntentionKindTag::Bulk,
        }
    }

    /// Whether no further fulfillment can be recorded against this state.
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Periodic(state) => state.fulfilled_on.is_some(),
            Self::FixedDate(state) => state.fulfilled,
            Self::Bulk(state) => state.is_exhausted(),
        }
    }
}

/// Model-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentionValidationError {
    NilId,
    NilCelebrant,
    BlankTitle,
    MonthOutOfRange(u32),
    RemainingExceedsTotal { remaining: u32, total: u32 },
    RescheduleReasonWithoutDate,
}

impl Display for IntentionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "intention id must not be nil"),
            Self::NilCelebrant => write!(f, "celebrant id must not be nil"),
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::MonthOutOfRange(month) => {
                write!(f, "month must be within 1..=12, got {month}")
            }
            Self::RemainingExceedsTotal { remaining, total } => write!(
                f,
                "remaining count {remaining} must not exceed total count {total}"
            ),
            Self::RescheduleReasonWithoutDate => {
                write!(f, "reschedule reason requires a reschedule date")
            }
        }
    }
}

impl Error for IntentionValidationError {}

/// Obligation owned by one celebrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intention {
    pub id: IntentionId,
    pub celebrant: CelebrantId,
    pub title: String,
    pub description: Option<String>,
    /// Who requested the intention, free text.
    pub source: Option<String>,
    #[serde(flatten)]
    pub kind: IntentionKind,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Intention {
    /// Creates a new intention with a generated id and current timestamps.
    pub fn new(celebrant: CelebrantId, title: impl Into<String>, kind: IntentionKind) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            celebrant,
            title: title.into(),
            description: None,
            source: None,
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks model invariants before persistence.
    pub fn validate(&self) -> Result<(), IntentionValidationError> {
        if self.id.is_nil() {
            return Err(IntentionValidationError::NilId);
        }
        if self.celebrant.is_nil() {
            return Err(IntentionValidationError::NilCelebrant);
        }
        if self.title.trim().is_empty() {
            return Err(IntentionValidationError::BlankTitle);
        }

        match &self.kind {
            IntentionKind::Periodic(state) => {
                if !(1..=12).contains(&state.month) {
                    return Err(IntentionValidationError::MonthOutOfRange(state.month));
                }
            }
            IntentionKind::FixedDate(state) => {
                if state.reschedule_reason.is_some() && state.rescheduled_date.is_none() {
                    return Err(IntentionValidationError::RescheduleReasonWithoutDate);
                }
            }
            IntentionKind::Bulk(state) => {
                if state.remaining > state.total {
                    return Err(IntentionValidationError::RemainingExceedsTotal {
                        remaining: state.remaining,
                        total: state.total,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn kind_tag(&self) -> IntentionKindTag {
        self.kind.tag()
    }

    pub fn as_bulk(&self) -> Option<&BulkState> {
        match &self.kind {
            IntentionKind::Bulk(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_periodic(&self) -> Option<&PeriodicState> {
        match &self.kind {
            IntentionKind::Periodic(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_fixed_date(&self) -> Option<&FixedDateState> {
        match &self.kind {
            IntentionKind::FixedDate(state) => Some(state),
            _ => None,
        }
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
