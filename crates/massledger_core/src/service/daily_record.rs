//! Daily record merger.
//!
//! # Responsibility
//! - Derive the per-day fulfillment summary from fulfillment activity.
//!
//! # Invariants
//! - Exactly one record per `(celebrant, date)`; calls upsert, never duplicate.
//! - `mark_met` keeps an existing reason untouched.
//! - Callers run these inside the unit of work of the triggering operation.

use crate::model::fulfillment::DailyRecord;
use crate::model::intention::CelebrantId;
use crate::repo::obligation_store::{ObligationRecords, RepoResult};
use chrono::NaiveDate;
use log::debug;

/// Marks the obligation of `date` as met. Idempotent.
pub fn mark_met(
    records: &dyn ObligationRecords,
    celebrant: CelebrantId,
    date: NaiveDate,
) -> RepoResult<DailyRecord> {
    let record = match records.get_daily_record(celebrant, date)? {
        Some(existing) if existing.met => return Ok(existing),
        Some(existing) => DailyRecord {
            met: true,
            ..existing
        },
        None => DailyRecord::met(celebrant, date),
    };
    records.put_daily_record(&record)?;
    debug!("event=daily_record_mark module=merger status=ok met=true");
    Ok(record)
}

/// Marks the obligation of `date` as not met with `reason`.
pub fn mark_not_met(
    records: &dyn ObligationRecords,
    celebrant: CelebrantId,
    date: NaiveDate,
    reason: &str,
) -> RepoResult<DailyRecord> {
    let record = DailyRecord::not_met(celebrant, date, reason);
    records.put_daily_record(&record)?;
    debug!("event=daily_record_mark module=merger status=ok met=false");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::{mark_met, mark_not_met};
    use crate::db::open_db_in_memory;
    use crate::repo::obligation_store::{ObligationRecords, SqliteRecords};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn mark_met_twice_keeps_one_record() {
        let conn = open_db_in_memory().unwrap();
        let records = SqliteRecords::try_new(&conn).unwrap();
        let celebrant = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 4, 4).unwrap();

        let first = mark_met(&records, celebrant, day).unwrap();
        let second = mark_met(&records, celebrant, day).unwrap();
        assert_eq!(first, second);
        assert_eq!(records.list_daily_records(celebrant).unwrap().len(), 1);
    }

    #[test]
    fn mark_met_upgrades_not_met_and_keeps_reason() {
        let conn = open_db_in_memory().unwrap();
        let records = SqliteRecords::try_new(&conn).unwrap();
        let celebrant = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

        mark_not_met(&records, celebrant, day, "travel").unwrap();
        let record = mark_met(&records, celebrant, day).unwrap();
        assert!(record.met);
        assert_eq!(record.reason.as_deref(), Some("travel"));
    }
}
