//! Dashboard aggregation service.
//!
//! # Responsibility
//! - Produce a point-in-time snapshot of outstanding obligations.
//! - Derive forward projections and ordered alerts from current counts.
//!
//! # Invariants
//! - Read-only: never mutates the store.
//! - Alert order: periodic threshold, then bulk alerts in `active_bulk`
//!   order, then fixed-date alerts in `upcoming_fixed_date` order.

use crate::model::fulfillment::DailyRecord;
use crate::model::intention::{CelebrantId, Intention, IntentionKind};
use crate::repo::obligation_store::ObligationRecords;
use crate::service::clock::{Clock, SystemClock};
use crate::service::error::LedgerResult;
use chrono::{Datelike, Days, NaiveDate};
use log::debug;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Minimum periodic obligations expected per month.
pub const MIN_PERIODIC_PER_MONTH: u32 = 3;
/// Bulk series at or below this remaining count raise a completion alert.
pub const BULK_NEARLY_COMPLETE_THRESHOLD: u32 = 10;
/// Maximum fixed-date intentions listed as upcoming.
pub const UPCOMING_FIXED_DATE_LIMIT: u32 = 5;

/// Bulk series annotated with its linear completion projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveBulk {
    pub intention: Intention,
    /// `as_of + remaining` days; `None` while paused.
    pub estimated_end_date: Option<NaiveDate>,
}

/// Human-readable dashboard alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardAlert {
    PeriodicPending { pending: u32 },
    BulkNearlyComplete { title: String, remaining: u32 },
    FixedDateToday { title: String },
    FixedDateTomorrow { title: String },
}

impl Display for DashboardAlert {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeriodicPending { pending } => write!(
                f,
                "You have {pending} personal masses pending for this month."
            ),
            Self::BulkNearlyComplete { title, remaining } => write!(
                f,
                "Bulk mass '{title}' is about to complete ({remaining} left)."
            ),
            Self::FixedDateToday { title } => {
                write!(f, "Fixed-date mass '{title}' is scheduled for today!")
            }
            Self::FixedDateTomorrow { title } => {
                write!(f, "Fixed-date mass '{title}' is scheduled for tomorrow.")
            }
        }
    }
}

/// Point-in-time dashboard for one celebrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub as_of: NaiveDate,
    pub today_status: Option<DailyRecord>,
    pub periodic_fulfilled_count: u32,
    pub periodic_details: Vec<Intention>,
    pub active_bulk: Vec<ActiveBulk>,
    pub upcoming_fixed_date: Vec<Intention>,
    pub alerts: Vec<DashboardAlert>,
}

impl DashboardView {
    /// Alert texts in display order.
    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts.iter().map(ToString::to_string).collect()
    }
}

/// Dashboard aggregator over read-only record access.
pub struct DashboardService<R: ObligationRecords, C: Clock = SystemClock> {
    records: R,
    clock: C,
}

impl<R: ObligationRecords> DashboardService<R, SystemClock> {
    pub fn new(records: R) -> Self {
        Self::with_clock(records, SystemClock)
    }
}

impl<R: ObligationRecords, C: Clock> DashboardService<R, C> {
    pub fn with_clock(records: R, clock: C) -> Self {
        Self { records, clock }
    }

    /// Builds the dashboard of `celebrant` as of `as_of` (default: today).
    pub fn snapshot(
        &self,
        celebrant: CelebrantId,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<DashboardView> {
        let started_at = Instant::now();
        let as_of = as_of.unwrap_or_else(|| self.clock.today());

        let today_status = self.records.get_daily_record(celebrant, as_of)?;
        let periodic_details =
            self.records
                .list_periodic_for_month(celebrant, as_of.month(), as_of.year())?;
        let open_bulk = self.records.list_open_bulk(celebrant)?;
        let upcoming_fixed_date =
            self.records
                .list_upcoming_fixed_date(celebrant, as_of, UPCOMING_FIXED_DATE_LIMIT)?;

        let view = assemble_view(
            as_of,
            today_status,
            periodic_details,
            open_bulk,
            upcoming_fixed_date,
        );
        debug!(
            "event=dashboard_snapshot module=dashboard status=ok alerts={} duration_ms={}",
            view.alerts.len(),
            started_at.elapsed().as_millis()
        );
        Ok(view)
    }
}

/// Derives counts, projections and alerts from loaded records.
pub fn assemble_view(
    as_of: NaiveDate,
    today_status: Option<DailyRecord>,
    periodic_details: Vec<Intention>,
    open_bulk: Vec<Intention>,
    upcoming_fixed_date: Vec<Intention>,
) -> DashboardView {
    let periodic_fulfilled_count = periodic_details
        .iter()
        .filter_map(Intention::as_periodic)
        .filter(|state| state.fulfilled_on.is_some())
        .count() as u32;

    let active_bulk = open_bulk
        .into_iter()
        .filter_map(|intention| {
            let state = intention.as_bulk()?;
            if state.remaining == 0 {
                return None;
            }
            let estimated_end_date = if state.paused {
                None
            } else {
                as_of.checked_add_days(Days::new(u64::from(state.remaining)))
            };
            Some(ActiveBulk {
                intention,
                estimated_end_date,
            })
        })
        .collect::<Vec<_>>();

    let alerts = build_alerts(
        as_of,
        periodic_fulfilled_count,
        &active_bulk,
        &upcoming_fixed_date,
    );

    DashboardView {
        as_of,
        today_status,
        periodic_fulfilled_count,
        periodic_details,
        active_bulk,
        upcoming_fixed_date,
        alerts,
    }
}

fn build_alerts(
    as_of: NaiveDate,
    periodic_fulfilled_count: u32,
    active_bulk: &[ActiveBulk],
    upcoming_fixed_date: &[Intention],
) -> Vec<DashboardAlert> {
    let mut alerts = Vec::new();

    if periodic_fulfilled_count < MIN_PERIODIC_PER_MONTH {
        alerts.push(DashboardAlert::PeriodicPending {
            pending: MIN_PERIODIC_PER_MONTH - periodic_fulfilled_count,
        });
    }

    for bulk in active_bulk {
        if let IntentionKind::Bulk(state) = &bulk.intention.kind {
            if state.remaining > 0 && state.remaining <= BULK_NEARLY_COMPLETE_THRESHOLD {
                alerts.push(DashboardAlert::BulkNearlyComplete {
                    title: bulk.intention.title.clone(),
                    remaining: state.remaining,
                });
            }
        }
    }

    let tomorrow = as_of.succ_opt();
    for intention in upcoming_fixed_date {
        let Some(state) = intention.as_fixed_date() else {
            continue;
        };
        if state.original_date == as_of {
            alerts.push(DashboardAlert::FixedDateToday {
                title: intention.title.clone(),
            });
        } else if Some(state.original_date) == tomorrow {
            alerts.push(DashboardAlert::FixedDateTomorrow {
                title: intention.title.clone(),
            });
        }
    }

    alerts
}
