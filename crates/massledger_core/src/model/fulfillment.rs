//! Fulfillment audit trail and per-day summary records.
//!
//! # Invariants
//! - A `FulfillmentEvent` is immutable after creation.
//! - At most one `DailyRecord` exists per `(celebrant, date)`.

use crate::model::intention::{now_epoch_ms, CelebrantId, IntentionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one fulfillment event.
pub type FulfillmentEventId = Uuid;

/// Immutable record of an intention being fulfilled on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentEvent {
    pub id: FulfillmentEventId,
    pub celebrant: CelebrantId,
    pub intention_id: IntentionId,
    pub date: NaiveDate,
    /// Empty when the caller supplied no notes.
    pub notes: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl FulfillmentEvent {
    pub fn new(
        celebrant: CelebrantId,
        intention_id: IntentionId,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            celebrant,
            intention_id,
            date,
            notes: notes.into(),
            created_at: now_epoch_ms(),
        }
    }
}

/// Whether the celebrant met an obligation on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub celebrant: CelebrantId,
    pub date: NaiveDate,
    pub met: bool,
    /// Why the obligation was not met. Kept as-is when a day is later
    /// upgraded to met.
    pub reason: Option<String>,
}

impl DailyRecord {
    pub fn met(celebrant: CelebrantId, date: NaiveDate) -> Self {
        Self {
            celebrant,
            date,
            met: true,
            reason: None,
        }
    }

    pub fn not_met(celebrant: CelebrantId, date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            celebrant,
            date,
            met: false,
            reason: Some(reason.into()),
        }
    }
}
