//! Intention lifecycle use-case service.
//!
//! # Responsibility
//! - Create intentions of each kind.
//! - Apply the fulfillment protocol per intention kind.
//! - Manage bulk pause state and fixed-date reschedules.
//!
//! # Invariants
//! - Every mutation runs in one `ObligationStore::atomically` unit; a
//!   failed step leaves no event, daily record or state change behind.
//! - Periodic and fixed-date intentions are fulfilled at most once.
//! - Bulk `remaining` decreases by exactly one per successful fulfillment
//!   and never below zero.
//! - Fulfilling a periodic or fixed-date intention pauses every unpaused
//!   bulk series of the same celebrant; fulfilling a bulk series resumes
//!   that series only.

use crate::model::fulfillment::{DailyRecord, FulfillmentEvent};
use crate::model::intention::{
    now_epoch_ms, BulkState, CelebrantId, FixedDateState, Intention, IntentionId, IntentionKind,
    IntentionKindTag, PeriodicState,
};
use crate::repo::obligation_store::{ObligationRecords, ObligationStore};
use crate::service::clock::{Clock, SystemClock};
use crate::service::daily_record;
use crate::service::error::{LedgerError, LedgerResult};
use chrono::NaiveDate;
use log::{info, warn};
use std::time::Instant;

/// Optional parameters of a fulfillment request.
///
/// - `date` defaults to the service clock's current date.
/// - `notes` defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FulfillmentRequest {
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl FulfillmentRequest {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            notes: None,
        }
    }
}

/// Fields shared by every intention kind at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIntention {
    pub title: String,
    pub description: Option<String>,
    pub source: Option<String>,
}

impl NewIntention {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn into_intention(self, celebrant: CelebrantId, kind: IntentionKind) -> Intention {
        let mut intention = Intention::new(celebrant, self.title.trim(), kind);
        intention.description = self.description;
        intention.source = self.source;
        intention
    }
}

/// Cross-kind consequence of one applied fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentEffect {
    /// Only the fulfilled intention changes.
    None,
    /// Every unpaused bulk series of the celebrant must be paused.
    PauseAllBulk,
}

/// Applies the kind-specific fulfillment rule to `kind` in place.
///
/// # Errors
/// - `AlreadyFulfilled` for a periodic or fixed-date intention that is
///   already fulfilled.
/// - `Exhausted` for a bulk series with `remaining == 0`.
pub fn apply_fulfillment(
    id: IntentionId,
    kind: &mut IntentionKind,
    date: NaiveDate,
) -> LedgerResult<FulfillmentEffect> {
    if kind.is_complete() {
        return Err(match kind {
            IntentionKind::Bulk(_) => LedgerError::Exhausted(id),
            _ => LedgerError::AlreadyFulfilled(id),
        });
    }
    match kind {
        IntentionKind::Periodic(state) => {
            state.fulfilled_on = Some(date);
            Ok(FulfillmentEffect::PauseAllBulk)
        }
        IntentionKind::FixedDate(state) => {
            state.fulfilled = true;
            Ok(FulfillmentEffect::PauseAllBulk)
        }
        IntentionKind::Bulk(state) => {
            state.remaining -= 1;
            state.last_fulfilled_on = Some(date);
            state.paused = false;
            Ok(FulfillmentEffect::None)
        }
    }
}

/// Lifecycle engine facade over an obligation store.
pub struct LifecycleService<S: ObligationStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: ObligationStore> LifecycleService<S, SystemClock> {
    /// Creates a service that reads "today" from the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ObligationStore, C: Clock> LifecycleService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates one periodic intention for `(month, year)`, outstanding.
    pub fn create_periodic(
        &mut self,
        celebrant: CelebrantId,
        details: NewIntention,
        month: u32,
        year: i32,
    ) -> LedgerResult<Intention> {
        let kind = IntentionKind::Periodic(PeriodicState {
            month,
            year,
            fulfilled_on: None,
        });
        self.create(details.into_intention(celebrant, kind))
    }

    /// Creates one fixed-date intention, unfulfilled and not rescheduled.
    pub fn create_fixed_date(
        &mut self,
        celebrant: CelebrantId,
        details: NewIntention,
        original_date: NaiveDate,
    ) -> LedgerResult<Intention> {
        let kind = IntentionKind::FixedDate(FixedDateState {
            original_date,
            rescheduled_date: None,
            reschedule_reason: None,
            fulfilled: false,
        });
        self.create(details.into_intention(celebrant, kind))
    }

    /// Creates one bulk series with `remaining == total`.
    ///
    /// `start_date` defaults to the clock's current date.
    pub fn create_bulk(
        &mut self,
        celebrant: CelebrantId,
        details: NewIntention,
        total: u32,
        start_date: Option<NaiveDate>,
    ) -> LedgerResult<Intention> {
        let start_date = start_date.unwrap_or_else(|| self.clock.today());
        let kind = IntentionKind::Bulk(BulkState::new(total, start_date));
        self.create(details.into_intention(celebrant, kind))
    }

    /// Records one fulfillment of `intention_id`.
    ///
    /// Steps, all in one unit of work:
    /// 1. load the intention owned by `celebrant`;
    /// 2. append the fulfillment event;
    /// 3. mark the daily record of the date as met;
    /// 4. apply the kind-specific rule, then the cross-kind bulk pause when
    ///    a periodic or fixed-date intention was fulfilled.
    ///
    /// # Errors
    /// `NotFound`, `AlreadyFulfilled`, `Exhausted`, or `Storage`.
    pub fn record_fulfillment(
        &mut self,
        celebrant: CelebrantId,
        intention_id: IntentionId,
        request: FulfillmentRequest,
    ) -> LedgerResult<FulfillmentEvent> {
        let started_at = Instant::now();
        let date = request.date.unwrap_or_else(|| self.clock.today());
        let notes = request.notes.unwrap_or_default();

        let result: LedgerResult<_> = self.store.atomically(|records| {
            let mut intention = load_owned(records, celebrant, intention_id)?;

            let event = FulfillmentEvent::new(celebrant, intention_id, date, notes);
            records.append_event(&event)?;
            daily_record::mark_met(records, celebrant, date)?;

            let effect = apply_fulfillment(intention_id, &mut intention.kind, date)?;
            intention.updated_at = now_epoch_ms();
            records.save_intention_state(&intention)?;

            let paused = match effect {
                FulfillmentEffect::PauseAllBulk => records.pause_active_bulk(celebrant)?,
                FulfillmentEffect::None => 0,
            };
            Ok((event, intention.kind_tag(), paused))
        });

        match result {
            Ok((event, kind, paused)) => {
                info!(
                    "event=fulfillment_record module=lifecycle status=ok intention_id={} kind={} bulk_paused={} duration_ms={}",
                    intention_id,
                    kind,
                    paused,
                    started_at.elapsed().as_millis()
                );
                Ok(event)
            }
            Err(err) => {
                warn!(
                    "event=fulfillment_record module=lifecycle status=error intention_id={} duration_ms={} error_code={}",
                    intention_id,
                    started_at.elapsed().as_millis(),
                    err.reason_code()
                );
                Err(err)
            }
        }
    }

    /// Sets the paused flag of one bulk series. No cross-kind effects.
    ///
    /// Returns the resulting paused state.
    pub fn set_bulk_paused(
        &mut self,
        celebrant: CelebrantId,
        intention_id: IntentionId,
        paused: bool,
    ) -> LedgerResult<bool> {
        self.update_bulk_pause(celebrant, intention_id, |_| paused)
    }

    /// Flips the paused flag of one bulk series.
    pub fn toggle_bulk_paused(
        &mut self,
        celebrant: CelebrantId,
        intention_id: IntentionId,
    ) -> LedgerResult<bool> {
        self.update_bulk_pause(celebrant, intention_id, |current| !current)
    }

    /// Moves an unfulfilled fixed-date intention to `new_date`.
    ///
    /// The original date is kept; only the reschedule fields change.
    pub fn reschedule_fixed_date(
        &mut self,
        celebrant: CelebrantId,
        intention_id: IntentionId,
        new_date: NaiveDate,
        reason: Option<String>,
    ) -> LedgerResult<Intention> {
        let result: LedgerResult<Intention> = self.store.atomically(|records| {
            let mut intention = load_owned(records, celebrant, intention_id)?;
            let IntentionKind::FixedDate(state) = &mut intention.kind else {
                return Err(LedgerError::NotFound(intention_id));
            };
            if state.fulfilled {
                return Err(LedgerError::AlreadyFulfilled(intention_id));
            }
            state.rescheduled_date = Some(new_date);
            state.reschedule_reason = reason.filter(|value| !value.trim().is_empty());
            intention.updated_at = now_epoch_ms();
            records.save_intention_state(&intention)?;
            Ok(intention)
        });

        if let Err(err) = &result {
            warn!(
                "event=fixed_date_reschedule module=lifecycle status=error intention_id={} error_code={}",
                intention_id,
                err.reason_code()
            );
        } else {
            info!(
                "event=fixed_date_reschedule module=lifecycle status=ok intention_id={}",
                intention_id
            );
        }
        result
    }

    /// Manual-entry path: records that no obligation was met on a date.
    ///
    /// `date` defaults to the clock's current date.
    pub fn mark_not_met(
        &mut self,
        celebrant: CelebrantId,
        date: Option<NaiveDate>,
        reason: &str,
    ) -> LedgerResult<DailyRecord> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::InvalidInput(
                "reason must not be blank".to_string(),
            ));
        }
        let date = date.unwrap_or_else(|| self.clock.today());
        self.store.atomically(|records| {
            daily_record::mark_not_met(records, celebrant, date, reason).map_err(Into::into)
        })
    }

    /// Gets one intention owned by `celebrant`.
    pub fn get_intention(
        &self,
        celebrant: CelebrantId,
        intention_id: IntentionId,
    ) -> LedgerResult<Intention> {
        load_owned(&self.store, celebrant, intention_id)
    }

    /// Lists intentions of `celebrant`, optionally of one kind.
    pub fn list_intentions(
        &self,
        celebrant: CelebrantId,
        kind: Option<IntentionKindTag>,
    ) -> LedgerResult<Vec<Intention>> {
        Ok(self.store.list_intentions(celebrant, kind)?)
    }

    /// Lists fulfillment events, optionally of one intention.
    pub fn list_events(
        &self,
        celebrant: CelebrantId,
        intention_id: Option<IntentionId>,
    ) -> LedgerResult<Vec<FulfillmentEvent>> {
        Ok(self.store.list_events(celebrant, intention_id)?)
    }

    pub fn list_daily_records(&self, celebrant: CelebrantId) -> LedgerResult<Vec<DailyRecord>> {
        Ok(self.store.list_daily_records(celebrant)?)
    }

    fn create(&mut self, intention: Intention) -> LedgerResult<Intention> {
        let kind = intention.kind_tag();
        let result: LedgerResult<()> = self.store.atomically(|records| {
            records.insert_intention(&intention)?;
            Ok(())
        });

        match result {
            Ok(()) => {
                info!(
                    "event=intention_create module=lifecycle status=ok intention_id={} kind={}",
                    intention.id, kind
                );
                Ok(intention)
            }
            Err(err) => {
                warn!(
                    "event=intention_create module=lifecycle status=error kind={} error_code={}",
                    kind,
                    err.reason_code()
                );
                Err(err)
            }
        }
    }

    fn update_bulk_pause(
        &mut self,
        celebrant: CelebrantId,
        intention_id: IntentionId,
        next: impl FnOnce(bool) -> bool,
    ) -> LedgerResult<bool> {
        let result: LedgerResult<bool> = self.store.atomically(|records| {
            let mut intention = load_owned(records, celebrant, intention_id)?;
            let IntentionKind::Bulk(state) = &mut intention.kind else {
                return Err(LedgerError::NotFound(intention_id));
            };
            state.paused = next(state.paused);
            let paused = state.paused;
            intention.updated_at = now_epoch_ms();
            records.save_intention_state(&intention)?;
            Ok(paused)
        });

        match &result {
            Ok(paused) => info!(
                "event=bulk_pause_set module=lifecycle status=ok intention_id={} paused={}",
                intention_id, paused
            ),
            Err(err) => warn!(
                "event=bulk_pause_set module=lifecycle status=error intention_id={} error_code={}",
                intention_id,
                err.reason_code()
            ),
        }
        result
    }
}

fn load_owned<R: ObligationRecords + ?Sized>(
    records: &R,
    celebrant: CelebrantId,
    intention_id: IntentionId,
) -> LedgerResult<Intention> {
    records
        .get_intention(celebrant, intention_id)?
        .ok_or(LedgerError::NotFound(intention_id))
}
