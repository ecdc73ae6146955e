use breccia_core::db::migrations::latest_version;
use breccia_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "users",
        "persons",
        "person_questions",
        "person_question_choices",
        "person_answer_sets",
        "person_answer_set_choices",
        "relationships",
        "relationship_answer_sets",
        "activity_series",
        "activities",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("breccia.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "persons");
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

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let result = conn.execute(
        "INSERT INTO person_answer_sets (person_id, timestamp) VALUES (42, '2024-01-01T00:00:00Z');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_rejects_two_current_answer_sets_for_one_person() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO persons (name) VALUES ('Ada');", [])
        .unwrap();
    let person_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO person_answer_sets (person_id, timestamp) VALUES (?1, '2024-01-01T00:00:00Z');",
        [person_id],
    )
    .unwrap();
    let second = conn.execute(
        "INSERT INTO person_answer_sets (person_id, timestamp) VALUES (?1, '2024-01-02T00:00:00Z');",
        [person_id],
    );
    assert!(second.is_err());
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
