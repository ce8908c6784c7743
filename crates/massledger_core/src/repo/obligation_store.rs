//! Obligation store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide record-level read/write APIs over intentions, fulfillment
//!   events and daily records.
//! - Provide one atomic unit of work for multi-record mutations.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every query is scoped by celebrant; rows of other celebrants are
//!   invisible.
//! - Write paths call `Intention::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `atomically` runs inside an IMMEDIATE transaction, so concurrent
//!   writers against the same database are serialized.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::fulfillment::{DailyRecord, FulfillmentEvent};
use crate::model::intention::{
    now_epoch_ms, BulkState, CelebrantId, FixedDateState, Intention, IntentionId,
    IntentionKind, IntentionKindTag, IntentionValidationError, PeriodicState,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Params, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

const INTENTION_SELECT_SQL: &str = "SELECT
    i.uuid,
    i.celebrant_uuid,
    i.kind,
    i.title,
    i.description,
    i.source,
    i.created_at,
    i.updated_at,
    p.month,
    p.year,
    p.fulfilled_on,
    f.original_date,
    f.rescheduled_date,
    f.reschedule_reason,
    f.is_fulfilled,
    b.total_count,
    b.remaining_count,
    b.start_date,
    b.is_paused,
    b.last_fulfilled_on
FROM intentions i
LEFT JOIN periodic_intentions p ON p.intention_uuid = i.uuid
LEFT JOIN fixed_date_intentions f ON f.intention_uuid = i.uuid
LEFT JOIN bulk_intentions b ON b.intention_uuid = i.uuid";

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    celebrant_uuid,
    intention_uuid,
    fulfilled_on,
    notes,
    created_at
FROM fulfillment_events";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for obligation persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(IntentionValidationError),
    Db(DbError),
    NotFound(IntentionId),
    /// Connection schema is not at the migrated version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "intention not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "obligation store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted obligation data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<IntentionValidationError> for RepoError {
    fn from(value: IntentionValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record-level operations shared by plain reads and transactional writes.
pub trait ObligationRecords {
    /// Inserts one intention with its kind-specific state.
    fn insert_intention(&self, intention: &Intention) -> RepoResult<()>;
    /// Loads one intention owned by `celebrant`.
    fn get_intention(
        &self,
        celebrant: CelebrantId,
        id: IntentionId,
    ) -> RepoResult<Option<Intention>>;
    /// Persists kind-specific state and `updated_at` of an existing intention.
    fn save_intention_state(&self, intention: &Intention) -> RepoResult<()>;
    /// Lists intentions ordered by `created_at ASC, uuid ASC`.
    fn list_intentions(
        &self,
        celebrant: CelebrantId,
        kind: Option<IntentionKindTag>,
    ) -> RepoResult<Vec<Intention>>;
    /// Lists periodic intentions bound to one `(month, year)`.
    fn list_periodic_for_month(
        &self,
        celebrant: CelebrantId,
        month: u32,
        year: i32,
    ) -> RepoResult<Vec<Intention>>;
    /// Lists bulk intentions with `remaining > 0`, by start date.
    fn list_open_bulk(&self, celebrant: CelebrantId) -> RepoResult<Vec<Intention>>;
    /// Lists unfulfilled fixed-date intentions with original date on or
    /// after `from`, ordered by `original_date ASC, uuid ASC`.
    fn list_upcoming_fixed_date(
        &self,
        celebrant: CelebrantId,
        from: NaiveDate,
        limit: u32,
    ) -> RepoResult<Vec<Intention>>;
    /// Sets `paused` on every unpaused bulk intention of `celebrant`.
    ///
    /// Returns the number of series that changed state.
    fn pause_active_bulk(&self, celebrant: CelebrantId) -> RepoResult<usize>;
    /// Appends one fulfillment event.
    fn append_event(&self, event: &FulfillmentEvent) -> RepoResult<()>;
    /// Lists events ordered by `date ASC, created_at ASC`.
    fn list_events(
        &self,
        celebrant: CelebrantId,
        intention_id: Option<IntentionId>,
    ) -> RepoResult<Vec<FulfillmentEvent>>;
    fn get_daily_record(
        &self,
        celebrant: CelebrantId,
        date: NaiveDate,
    ) -> RepoResult<Option<DailyRecord>>;
    /// Inserts or replaces the record keyed by `(celebrant, date)`.
    fn put_daily_record(&self, record: &DailyRecord) -> RepoResult<()>;
    /// Lists daily records ordered by date.
    fn list_daily_records(&self, celebrant: CelebrantId) -> RepoResult<Vec<DailyRecord>>;
}

/// Store with an all-or-nothing unit of work over `ObligationRecords`.
pub trait ObligationStore: ObligationRecords {
    /// Runs `work` atomically.
    ///
    /// Mutations made through the provided records handle are committed
    /// only when `work` returns `Ok`; any error rolls all of them back.
    fn atomically<T, E>(
        &mut self,
        work: impl FnOnce(&dyn ObligationRecords) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>;
}

/// SQLite record access over a borrowed connection or transaction.
pub struct SqliteRecords<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecords<'conn> {
    /// Constructs read access from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_intentions<P: Params>(&self, clause: &str, params: P) -> RepoResult<Vec<Intention>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INTENTION_SELECT_SQL} {clause}"))?;
        let mut rows = stmt.query(params)?;
        let mut intentions = Vec::new();
        while let Some(row) = rows.next()? {
            intentions.push(parse_intention_row(row)?);
        }
        Ok(intentions)
    }
}

impl ObligationRecords for SqliteRecords<'_> {
    fn insert_intention(&self, intention: &Intention) -> RepoResult<()> {
        intention.validate()?;
        let uuid = intention.id.to_string();

        self.conn.execute(
            "INSERT INTO intentions (
                uuid,
                celebrant_uuid,
                kind,
                title,
                description,
                source,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                uuid,
                intention.celebrant.to_string(),
                intention.kind_tag().as_str(),
                intention.title.as_str(),
                intention.description.as_deref(),
                intention.source.as_deref(),
                intention.created_at,
                intention.updated_at,
            ],
        )?;

        match &intention.kind {
            IntentionKind::Periodic(state) => {
                self.conn.execute(
                    "INSERT INTO periodic_intentions (intention_uuid, month, year, fulfilled_on)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        uuid,
                        state.month,
                        state.year,
                        state.fulfilled_on.map(date_to_db)
                    ],
                )?;
            }
            IntentionKind::FixedDate(state) => {
                self.conn.execute(
                    "INSERT INTO fixed_date_intentions (
                        intention_uuid,
                        original_date,
                        rescheduled_date,
                        reschedule_reason,
                        is_fulfilled
                    ) VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        uuid,
                        date_to_db(state.original_date),
                        state.rescheduled_date.map(date_to_db),
                        state.reschedule_reason.as_deref(),
                        bool_to_int(state.fulfilled),
                    ],
                )?;
            }
            IntentionKind::Bulk(state) => {
                self.conn.execute(
                    "INSERT INTO bulk_intentions (
                        intention_uuid,
                        total_count,
                        remaining_count,
                        start_date,
                        is_paused,
                        last_fulfilled_on
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        uuid,
                        state.total,
                        state.remaining,
                        date_to_db(state.start_date),
                        bool_to_int(state.paused),
                        state.last_fulfilled_on.map(date_to_db),
                    ],
                )?;
            }
        }

        Ok(())
    }

    fn get_intention(
        &self,
        celebrant: CelebrantId,
        id: IntentionId,
    ) -> RepoResult<Option<Intention>> {
        let mut found = self.query_intentions(
            "WHERE i.uuid = ?1 AND i.celebrant_uuid = ?2;",
            params![id.to_string(), celebrant.to_string()],
        )?;
        Ok(found.pop())
    }

    fn save_intention_state(&self, intention: &Intention) -> RepoResult<()> {
        intention.validate()?;
        let uuid = intention.id.to_string();

        let changed = self.conn.execute(
            "UPDATE intentions
             SET updated_at = ?3
             WHERE uuid = ?1
               AND celebrant_uuid = ?2
               AND kind = ?4;",
            params![
                uuid,
                intention.celebrant.to_string(),
                intention.updated_at,
                intention.kind_tag().as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(intention.id));
        }

        match &intention.kind {
            IntentionKind::Periodic(state) => {
                self.conn.execute(
                    "UPDATE periodic_intentions
                     SET month = ?2, year = ?3, fulfilled_on = ?4
                     WHERE intention_uuid = ?1;",
                    params![
                        uuid,
                        state.month,
                        state.year,
                        state.fulfilled_on.map(date_to_db)
                    ],
                )?;
            }
            IntentionKind::FixedDate(state) => {
                self.conn.execute(
                    "UPDATE fixed_date_intentions
                     SET
                        rescheduled_date = ?2,
                        reschedule_reason = ?3,
                        is_fulfilled = ?4
                     WHERE intention_uuid = ?1;",
                    params![
                        uuid,
                        state.rescheduled_date.map(date_to_db),
                        state.reschedule_reason.as_deref(),
                        bool_to_int(state.fulfilled),
                    ],
                )?;
            }
            IntentionKind::Bulk(state) => {
                self.conn.execute(
                    "UPDATE bulk_intentions
                     SET
                        total_count = ?2,
                        remaining_count = ?3,
                        is_paused = ?4,
                        last_fulfilled_on = ?5
                     WHERE intention_uuid = ?1;",
                    params![
                        uuid,
                        state.total,
                        state.remaining,
                        bool_to_int(state.paused),
                        state.last_fulfilled_on.map(date_to_db),
                    ],
                )?;
            }
        }

        Ok(())
    }

    fn list_intentions(
        &self,
        celebrant: CelebrantId,
        kind: Option<IntentionKindTag>,
    ) -> RepoResult<Vec<Intention>> {
        self.query_intentions(
            "WHERE i.celebrant_uuid = ?1
               AND (?2 IS NULL OR i.kind = ?2)
             ORDER BY i.created_at ASC, i.uuid ASC;",
            params![celebrant.to_string(), kind.map(IntentionKindTag::as_str)],
        )
    }

    fn list_periodic_for_month(
        &self,
        celebrant: CelebrantId,
        month: u32,
        year: i32,
    ) -> RepoResult<Vec<Intention>> {
        self.query_intentions(
            "WHERE i.celebrant_uuid = ?1
               AND i.kind = 'periodic'
               AND p.month = ?2
               AND p.year = ?3
             ORDER BY i.created_at ASC, i.uuid ASC;",
            params![celebrant.to_string(), month, year],
        )
    }

    fn list_open_bulk(&self, celebrant: CelebrantId) -> RepoResult<Vec<Intention>> {
        self.query_intentions(
            "WHERE i.celebrant_uuid = ?1
               AND i.kind = 'bulk'
               AND b.remaining_count > 0
             ORDER BY b.start_date ASC, i.uuid ASC;",
            [celebrant.to_string()],
        )
    }

    fn list_upcoming_fixed_date(
        &self,
        celebrant: CelebrantId,
        from: NaiveDate,
        limit: u32,
    ) -> RepoResult<Vec<Intention>> {
        self.query_intentions(
            "WHERE i.celebrant_uuid = ?1
               AND i.kind = 'fixed_date'
               AND f.is_fulfilled = 0
               AND f.original_date >= ?2
             ORDER BY f.original_date ASC, i.uuid ASC
             LIMIT ?3;",
            params![celebrant.to_string(), date_to_db(from), limit],
        )
    }

    fn pause_active_bulk(&self, celebrant: CelebrantId) -> RepoResult<usize> {
        let celebrant = celebrant.to_string();
        self.conn.execute(
            "UPDATE intentions
             SET updated_at = ?2
             WHERE celebrant_uuid = ?1
               AND kind = 'bulk'
               AND uuid IN (
                   SELECT intention_uuid FROM bulk_intentions WHERE is_paused = 0
               );",
            params![celebrant.as_str(), now_epoch_ms()],
        )?;
        let paused = self.conn.execute(
            "UPDATE bulk_intentions
             SET is_paused = 1
             WHERE is_paused = 0
               AND intention_uuid IN (
                   SELECT uuid FROM intentions WHERE celebrant_uuid = ?1 AND kind = 'bulk'
               );",
            [celebrant.as_str()],
        )?;
        Ok(paused)
    }

    fn append_event(&self, event: &FulfillmentEvent) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO fulfillment_events (
                uuid,
                celebrant_uuid,
                intention_uuid,
                fulfilled_on,
                notes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.id.to_string(),
                event.celebrant.to_string(),
                event.intention_id.to_string(),
                date_to_db(event.date),
                event.notes.as_str(),
                event.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_events(
        &self,
        celebrant: CelebrantId,
        intention_id: Option<IntentionId>,
    ) -> RepoResult<Vec<FulfillmentEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE celebrant_uuid = ?1
               AND (?2 IS NULL OR intention_uuid = ?2)
             ORDER BY fulfilled_on ASC, created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            celebrant.to_string(),
            intention_id.map(|id| id.to_string())
        ])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn get_daily_record(
        &self,
        celebrant: CelebrantId,
        date: NaiveDate,
    ) -> RepoResult<Option<DailyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT celebrant_uuid, record_date, obligation_met, reason
             FROM daily_records
             WHERE celebrant_uuid = ?1 AND record_date = ?2;",
        )?;
        let mut rows = stmt.query(params![celebrant.to_string(), date_to_db(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_daily_record_row(row)?));
        }
        Ok(None)
    }

    fn put_daily_record(&self, record: &DailyRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO daily_records (
                celebrant_uuid,
                record_date,
                obligation_met,
                reason,
                created_at,
                updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (celebrant_uuid, record_date) DO UPDATE SET
                obligation_met = excluded.obligation_met,
                reason = excluded.reason,
                updated_at = excluded.updated_at;",
            params![
                record.celebrant.to_string(),
                date_to_db(record.date),
                bool_to_int(record.met),
                record.reason.as_deref(),
                now_epoch_ms(),
            ],
        )?;
        Ok(())
    }

    fn list_daily_records(&self, celebrant: CelebrantId) -> RepoResult<Vec<DailyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT celebrant_uuid, record_date, obligation_met, reason
             FROM daily_records
             WHERE celebrant_uuid = ?1
             ORDER BY record_date ASC;",
        )?;
        let mut rows = stmt.query([celebrant.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_daily_record_row(row)?);
        }
        Ok(records)
    }
}

/// SQLite-backed obligation store owning write access to one connection.
pub struct SqliteObligationStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteObligationStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn records(&self) -> SqliteRecords<'_> {
        SqliteRecords::unchecked(&*self.conn)
    }
}

impl ObligationStore for SqliteObligationStore<'_> {
    fn atomically<T, E>(
        &mut self,
        work: impl FnOnce(&dyn ObligationRecords) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        // Dropping `tx` without commit rolls back every write made by `work`.
        let value = work(&SqliteRecords::unchecked(&tx))?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

impl ObligationRecords for SqliteObligationStore<'_> {
    fn insert_intention(&self, intention: &Intention) -> RepoResult<()> {
        self.records().insert_intention(intention)
    }

    fn get_intention(
        &self,
        celebrant: CelebrantId,
        id: IntentionId,
    ) -> RepoResult<Option<Intention>> {
        self.records().get_intention(celebrant, id)
    }

    fn save_intention_state(&self, intention: &Intention) -> RepoResult<()> {
        self.records().save_intention_state(intention)
    }

    fn list_intentions(
        &self,
        celebrant: CelebrantId,
        kind: Option<IntentionKindTag>,
    ) -> RepoResult<Vec<Intention>> {
        self.records().list_intentions(celebrant, kind)
    }

    fn list_periodic_for_month(
        &self,
        celebrant: CelebrantId,
        month: u32,
        year: i32,
    ) -> RepoResult<Vec<Intention>> {
        self.records()
            .list_periodic_for_month(celebrant, month, year)
    }

    fn list_open_bulk(&self, celebrant: CelebrantId) -> RepoResult<Vec<Intention>> {
        self.records().list_open_bulk(celebrant)
    }

    fn list_upcoming_fixed_date(
        &self,
        celebrant: CelebrantId,
        from: NaiveDate,
        limit: u32,
    ) -> RepoResult<Vec<Intention>> {
        self.records()
            .list_upcoming_fixed_date(celebrant, from, limit)
    }

    fn pause_active_bulk(&self, celebrant: CelebrantId) -> RepoResult<usize> {
        self.records().pause_active_bulk(celebrant)
    }

    fn append_event(&self, event: &FulfillmentEvent) -> RepoResult<()> {
        self.records().append_event(event)
    }

    fn list_events(
        &self,
        celebrant: CelebrantId,
        intention_id: Option<IntentionId>,
    ) -> RepoResult<Vec<FulfillmentEvent>> {
        self.records().list_events(celebrant, intention_id)
    }

    fn get_daily_record(
        &self,
        celebrant: CelebrantId,
        date: NaiveDate,
    ) -> RepoResult<Option<DailyRecord>> {
        self.records().get_daily_record(celebrant, date)
    }

    fn put_daily_record(&self, record: &DailyRecord) -> RepoResult<()> {
        self.records().put_daily_record(record)
    }

    fn list_daily_records(&self, celebrant: CelebrantId) -> RepoResult<Vec<DailyRecord>> {
        self.records().list_daily_records(celebrant)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn parse_intention_row(row: &Row<'_>) -> RepoResult<Intention> {
    let id = parse_uuid(row.get("uuid")?, "intentions.uuid")?;
    let celebrant = parse_uuid(row.get("celebrant_uuid")?, "intentions.celebrant_uuid")?;

    let kind_text: String = row.get("kind")?;
    let tag = IntentionKindTag::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid intention kind `{kind_text}` in intentions.kind"))
    })?;

    let kind = match tag {
        IntentionKindTag::Periodic => IntentionKind::Periodic(PeriodicState {
            month: required(row.get("month")?, id, "periodic_intentions.month")?,
            year: required(row.get("year")?, id, "periodic_intentions.year")?,
            fulfilled_on: parse_optional_date(
                row.get("fulfilled_on")?,
                "periodic_intentions.fulfilled_on",
            )?,
        }),
        IntentionKindTag::FixedDate => {
            let original: String =
                required(row.get("original_date")?, id, "fixed_date_intentions.original_date")?;
            let fulfilled: i64 =
                required(row.get("is_fulfilled")?, id, "fixed_date_intentions.is_fulfilled")?;
            IntentionKind::FixedDate(FixedDateState {
                original_date: parse_date(&original, "fixed_date_intentions.original_date")?,
                rescheduled_date: parse_optional_date(
                    row.get("rescheduled_date")?,
                    "fixed_date_intentions.rescheduled_date",
                )?,
                reschedule_reason: row.get("reschedule_reason")?,
                fulfilled: parse_bool(fulfilled, "fixed_date_intentions.is_fulfilled")?,
            })
        }
        IntentionKindTag::Bulk => {
            let start: String = required(row.get("start_date")?, id, "bulk_intentions.start_date")?;
            let paused: i64 = required(row.get("is_paused")?, id, "bulk_intentions.is_paused")?;
            IntentionKind::Bulk(BulkState {
                total: required(row.get("total_count")?, id, "bulk_intentions.total_count")?,
                remaining: required(
                    row.get("remaining_count")?,
                    id,
                    "bulk_intentions.remaining_count",
                )?,
                start_date: parse_date(&start, "bulk_intentions.start_date")?,
                paused: parse_bool(paused, "bulk_intentions.is_paused")?,
                last_fulfilled_on: parse_optional_date(
                    row.get("last_fulfilled_on")?,
                    "bulk_intentions.last_fulfilled_on",
                )?,
            })
        }
    };

    let intention = Intention {
        id,
        celebrant,
        title: row.get("title")?,
        description: row.get("description")?,
        source: row.get("source")?,
        kind,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    intention.validate()?;
    Ok(intention)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<FulfillmentEvent> {
    let date: String = row.get("fulfilled_on")?;
    Ok(FulfillmentEvent {
        id: parse_uuid(row.get("uuid")?, "fulfillment_events.uuid")?,
        celebrant: parse_uuid(row.get("celebrant_uuid")?, "fulfillment_events.celebrant_uuid")?,
        intention_id: parse_uuid(
            row.get("intention_uuid")?,
            "fulfillment_events.intention_uuid",
        )?,
        date: parse_date(&date, "fulfillment_events.fulfilled_on")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_daily_record_row(row: &Row<'_>) -> RepoResult<DailyRecord> {
    let date: String = row.get("record_date")?;
    Ok(DailyRecord {
        celebrant: parse_uuid(row.get("celebrant_uuid")?, "daily_records.celebrant_uuid")?,
        date: parse_date(&date, "daily_records.record_date")?,
        met: parse_bool(row.get("obligation_met")?, "daily_records.obligation_met")?,
        reason: row.get("reason")?,
    })
}

/// Kind-specific columns come from LEFT JOINs; a missing value means the
/// companion row is absent.
fn required<T>(value: Option<T>, id: IntentionId, column: &str) -> RepoResult<T> {
    value.ok_or_else(|| RepoError::InvalidData(format!("missing {column} for intention {id}")))
}

fn parse_uuid(value: String, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

fn parse_optional_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    value.map(|text| parse_date(&text, column)).transpose()
}

fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
