// Integration tests for the migration framework

use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

fn index_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'todo'")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = setup_test_db();

    let result = reminder_store::migrations::apply_migrations(&mut conn);
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    // sqlite_sequence is created by SQLite for AUTOINCREMENT columns
    assert_eq!(
        table_names(&conn),
        vec!["schema_version", "sqlite_sequence", "todo"]
    );

    let indexes = index_names(&conn);
    assert!(indexes.contains(&"idx_todo_created".to_string()));
    assert!(indexes.contains(&"idx_todo_completed_created".to_string()));
}

#[test]
fn test_migration_idempotency() {
    let mut conn = setup_test_db();
    reminder_store::migrations::apply_migrations(&mut conn).unwrap();
    reminder_store::migrations::apply_migrations(&mut conn).unwrap();

    let version_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version_count, 1);
}

#[test]
fn test_checksum_is_recorded() {
    let mut conn = setup_test_db();
    reminder_store::migrations::apply_migrations(&mut conn).unwrap();

    let checksum: String = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = '001_todo'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(checksum.len(), 64);
}

#[test]
fn test_edited_migration_is_rejected() {
    let mut conn = setup_test_db();
    reminder_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_todo'",
        [],
    )
    .unwrap();

    let err = reminder_store::migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), reminder_core::ExErrorKind::Migration);
    assert_eq!(err.entity_id(), Some("001_todo"));
}

#[test]
fn test_unknown_applied_migration_is_rejected() {
    let mut conn = setup_test_db();
    reminder_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES ('999_future', 0, NULL)",
        [],
    )
    .unwrap();

    let err = reminder_store::migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), reminder_core::ExErrorKind::Migration);
    assert_eq!(err.entity_id(), Some("999_future"));
}

#[test]
fn test_completed_must_be_boolean() {
    let mut conn = setup_test_db();
    reminder_store::migrations::apply_migrations(&mut conn).unwrap();

    let result = conn.execute(
        "INSERT INTO todo (description, created_at, deadline_at, completed) VALUES ('x', 0, 0, 2)",
        [],
    );
    assert!(result.is_err());
}
