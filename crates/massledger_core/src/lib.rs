//! Core domain logic for MassLedger.
//! Tracks mass intentions owned by a celebrant and the daily record of
//! whether the obligation to celebrate was met.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::fulfillment::{DailyRecord, FulfillmentEvent, FulfillmentEventId};
pub use model::intention::{
    BulkState, CelebrantId, FixedDateState, Intention, IntentionId, IntentionKind,
    IntentionKindTag, IntentionValidationError, PeriodicState,
};
pub use repo::obligation_store::{
    ObligationRecords, ObligationStore, RepoError, RepoResult, SqliteObligationStore,
    SqliteRecords,
};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::dashboard_service::{
    ActiveBulk, DashboardAlert, DashboardService, DashboardView, BULK_NEARLY_COMPLETE_THRESHOLD,
    MIN_PERIODIC_PER_MONTH, UPCOMING_FIXED_DATE_LIMIT,
};
pub use service::error::{LedgerError, LedgerResult};
pub use service::import_service::{
    HistoricalImportService, HistoricalRow, ImportReport, ImportSkip, YearBounds,
    DEFAULT_IMPORT_START_YEAR,
};
pub use service::lifecycle_service::{
    apply_fulfillment, FulfillmentEffect, FulfillmentRequest, LifecycleService, NewIntention,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
