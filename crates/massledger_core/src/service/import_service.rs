//! Historical record import.
//!
//! # Responsibility
//! - Validate raw historical rows and create pre-fulfilled intentions.
//! - Run row-by-row batches, skipping invalid rows with a reason.
//!
//! # Invariants
//! - Each accepted row is one unit of work: intention, fulfillment event
//!   and daily record are written together or not at all.
//! - Only `InvalidInput` is skipped; any other failure aborts the batch.
//! - Import never pauses or resumes bulk series.

use crate::model::intention::{
    BulkState, CelebrantId, FixedDateState, Intention, IntentionKind, IntentionKindTag,
    PeriodicState,
};
use crate::model::fulfillment::FulfillmentEvent;
use crate::repo::obligation_store::ObligationStore;
use crate::service::daily_record;
use crate::service::error::{LedgerError, LedgerResult};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// First year accepted when the caller gives no lower bound.
pub const DEFAULT_IMPORT_START_YEAR: i32 = 2000;

const IMPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// One raw historical row, as read from an external sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRow {
    /// Kind label: `personal`/`periodic`, `fixed-date`, or `bulk`.
    pub kind: Option<String>,
    pub title: Option<String>,
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub bulk_total: Option<i64>,
    pub bulk_remaining: Option<i64>,
}

/// Inclusive range of accepted years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    start_year: i32,
    end_year: i32,
}

impl YearBounds {
    pub fn new(start_year: i32, end_year: i32) -> LedgerResult<Self> {
        if start_year > end_year {
            return Err(LedgerError::InvalidInput(format!(
                "start year {start_year} is after end year {end_year}"
            )));
        }
        Ok(Self {
            start_year,
            end_year,
        })
    }

    /// Bounds from `DEFAULT_IMPORT_START_YEAR` up to `end_year`.
    pub fn until(end_year: i32) -> LedgerResult<Self> {
        Self::new(DEFAULT_IMPORT_START_YEAR, end_year)
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSkip {
    /// 1-based position of the row within the batch.
    pub row: usize,
    pub reason_code: &'static str,
    pub message: String,
}

/// Outcome of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub accepted: u32,
    pub skipped: Vec<ImportSkip>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedRow {
    kind: IntentionKind,
    title: String,
    date: NaiveDate,
    source: String,
    notes: Option<String>,
}

/// Historical import use-case service.
pub struct HistoricalImportService<S: ObligationStore> {
    store: S,
}

impl<S: ObligationStore> HistoricalImportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Imports one row as an already-fulfilled (or partly consumed) intention.
    ///
    /// # Errors
    /// - `InvalidInput` for missing fields, unparseable or out-of-range
    ///   dates, unknown kinds and inconsistent bulk counts.
    pub fn import_record(
        &mut self,
        celebrant: CelebrantId,
        row: &HistoricalRow,
        bounds: YearBounds,
    ) -> LedgerResult<Intention> {
        let parsed = parse_row(row, bounds)?;
        let date = parsed.date;
        let notes = parsed.notes.clone().unwrap_or_default();

        let mut intention = Intention::new(celebrant, parsed.title, parsed.kind);
        intention.description = parsed.notes;
        intention.source = Some(parsed.source);

        self.store.atomically(|records| {
            records.insert_intention(&intention)?;
            let event = FulfillmentEvent::new(celebrant, intention.id, date, notes);
            records.append_event(&event)?;
            daily_record::mark_met(records, celebrant, date)?;
            Ok::<_, LedgerError>(())
        })?;

        info!(
            "event=historical_import_row module=import status=ok intention_id={} kind={}",
            intention.id,
            intention.kind_tag()
        );
        Ok(intention)
    }

    /// Imports `rows` one by one, skipping rows rejected as invalid input.
    ///
    /// # Errors
    /// Storage failures abort the batch; rows imported before the failure
    /// stay committed.
    pub fn import_batch(
        &mut self,
        celebrant: CelebrantId,
        rows: &[HistoricalRow],
        bounds: YearBounds,
    ) -> LedgerResult<ImportReport> {
        self.run_batch(celebrant, rows.iter().map(Ok), bounds)
    }

    /// Like `import_batch`, for sheets whose rows were decoded one by one.
    ///
    /// An `Err` entry carries the decode failure of that row and is
    /// reported as a skipped `invalid_input` row.
    pub fn import_sheet(
        &mut self,
        celebrant: CelebrantId,
        rows: &[Result<HistoricalRow, String>],
        bounds: YearBounds,
    ) -> LedgerResult<ImportReport> {
        let rows = rows.iter().map(|row| row.as_ref().map_err(String::as_str));
        self.run_batch(celebrant, rows, bounds)
    }

    fn run_batch<'a>(
        &mut self,
        celebrant: CelebrantId,
        rows: impl Iterator<Item = Result<&'a HistoricalRow, &'a str>>,
        bounds: YearBounds,
    ) -> LedgerResult<ImportReport> {
        let started_at = Instant::now();
        let mut report = ImportReport::default();

        for (index, row) in rows.enumerate() {
            let outcome = row
                .map_err(|message| LedgerError::InvalidInput(format!("malformed row: {message}")))
                .and_then(|row| self.import_record(celebrant, row, bounds));
            match outcome {
                Ok(_) => report.accepted += 1,
                Err(err @ LedgerError::InvalidInput(_)) => {
                    warn!(
                        "event=historical_import_row module=import status=skipped row={} error_code={}",
                        index + 1,
                        err.reason_code()
                    );
                    report.skipped.push(ImportSkip {
                        row: index + 1,
                        reason_code: err.reason_code(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        "event=historical_import_batch module=import status=error row={} error_code={}",
                        index + 1,
                        err.reason_code()
                    );
                    return Err(err);
                }
            }
        }

        info!(
            "event=historical_import_batch module=import status=ok accepted={} skipped={} duration_ms={}",
            report.accepted,
            report.skipped.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

fn parse_row(row: &HistoricalRow, bounds: YearBounds) -> LedgerResult<ParsedRow> {
    let date_text = required_field(&row.date, "date")?;
    let title = required_field(&row.title, "title")?;
    let source = required_field(&row.source, "source")?;
    let kind_label = required_field(&row.kind, "kind")?;

    let date = NaiveDate::parse_from_str(date_text, IMPORT_DATE_FORMAT)
        .map_err(|_| LedgerError::InvalidInput(format!("invalid date `{date_text}`")))?;
    if !bounds.contains(date.year()) {
        return Err(LedgerError::InvalidInput(format!(
            "date year {} outside accepted range {}..={}",
            date.year(),
            bounds.start_year,
            bounds.end_year
        )));
    }

    let kind = match parse_kind_label(kind_label)? {
        IntentionKindTag::Periodic => IntentionKind::Periodic(PeriodicState {
            month: date.month(),
            year: date.year(),
            fulfilled_on: Some(date),
        }),
        IntentionKindTag::FixedDate => IntentionKind::FixedDate(FixedDateState {
            original_date: date,
            rescheduled_date: None,
            reschedule_reason: None,
            fulfilled: true,
        }),
        IntentionKindTag::Bulk => {
            let total = bulk_count(row.bulk_total, "bulk_total")?;
            let remaining = bulk_count(row.bulk_remaining, "bulk_remaining")?;
            if remaining > total {
                return Err(LedgerError::InvalidInput(format!(
                    "bulk_remaining {remaining} exceeds bulk_total {total}"
                )));
            }
            IntentionKind::Bulk(BulkState {
                total,
                remaining,
                start_date: date,
                paused: false,
                last_fulfilled_on: Some(date),
            })
        }
    };

    Ok(ParsedRow {
        kind,
        title: title.to_string(),
        date,
        source: source.to_string(),
        notes: row
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
    })
}

fn parse_kind_label(label: &str) -> LedgerResult<IntentionKindTag> {
    let normalized = label.to_ascii_lowercase().replace(['_', ' '], "-");
    match normalized.as_str() {
        "personal" | "periodic" => Ok(IntentionKindTag::Periodic),
        "fixed-date" | "fixed" => Ok(IntentionKindTag::FixedDate),
        "bulk" => Ok(IntentionKindTag::Bulk),
        _ => Err(LedgerError::InvalidInput(format!(
            "unknown intention kind `{label}`"
        ))),
    }
}

fn required_field<'a>(value: &'a Option<String>, field: &str) -> LedgerResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LedgerError::InvalidInput(format!("missing required field `{field}`")))
}

fn bulk_count(value: Option<i64>, field: &str) -> LedgerResult<u32> {
    let value = value.ok_or_else(|| {
        LedgerError::InvalidInput(format!("bulk rows require `{field}`"))
    })?;
    u32::try_from(value)
        .map_err(|_| LedgerError::InvalidInput(format!("`{field}` must be non-negative, got {value}")))
}
