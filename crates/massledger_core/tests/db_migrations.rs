use massledger_core::db::migrations::{current_version, latest_version};
use massledger_core::db::{open_db, open_db_in_memory, DbError};
use massledger_core::{RepoError, SqliteObligationStore, SqliteRecords};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "intentions");
    assert_table_exists(&conn, "periodic_intentions");
    assert_table_exists(&conn, "fixed_date_intentions");
    assert_table_exists(&conn, "bulk_intentions");
    assert_table_exists(&conn, "fulfillment_events");
    assert_table_exists(&conn, "daily_records");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("massledger.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "daily_records");
}

#[test]
fn version_one_database_gains_source_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let has_source: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('intentions') WHERE name = 'source';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(has_source, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_unmigrated_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let read_err = SqliteRecords::try_new(&conn).err().unwrap();
    assert!(matches!(
        read_err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));

    let write_err = SqliteObligationStore::try_new(&mut conn).err().unwrap();
    match write_err {
        RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
