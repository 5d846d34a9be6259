use rusqlite::Connection;
use taskscloud_core::db::migrations::latest_version;
use taskscloud_core::db::{open_configured, open_db, open_db_in_memory, DbError};
use taskscloud_core::DatabaseConfig;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "lists");
    assert_table_exists(&conn, "list_members");
    assert_table_exists(&conn, "tasks");
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO tasks (uuid, list_uuid, name, created_at, updated_at)
         VALUES ('t-1', 'missing-list', 'orphan', 1, 1);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskscloud.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "lists");
}

#[test]
fn open_configured_uses_file_path_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.db");

    let conn = open_configured(&DatabaseConfig {
        path: Some(path.clone()),
    })
    .unwrap();
    assert_table_exists(&conn, "tasks");
    assert!(path.exists());

    let memory = open_configured(&DatabaseConfig::default()).unwrap();
    assert_eq!(schema_version(&memory), latest_version());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
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
