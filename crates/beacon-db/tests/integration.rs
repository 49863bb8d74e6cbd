//! Pool and schema wiring against real database files.

use beacon_db::{create_pool, ensure_schema, DbRuntimeSettings};

#[test]
fn pooled_store_accepts_events_after_setup() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("events.db");

    let pool = create_pool(
        path.to_str().expect("utf-8 path"),
        DbRuntimeSettings::default(),
    )
    .expect("pool");
    let conn = pool.get().expect("connection");
    assert!(ensure_schema(&conn).expect("schema"), "fresh file needs DDL");

    conn.execute(
        "INSERT INTO events (json) VALUES (?1)",
        [r#"{"topic":"launch"}"#],
    )
    .expect("events table accepts rows");

    // A second pooled connection sees the same store.
    let other = pool.get().expect("second connection");
    let count: i64 = other
        .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 1);
}

#[test]
fn queued_rows_survive_a_full_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("events.db");
    let path = path.to_str().expect("utf-8 path");

    {
        let pool = create_pool(path, DbRuntimeSettings::default()).expect("first open");
        let conn = pool.get().expect("connection");
        ensure_schema(&conn).expect("schema");
        conn.execute("INSERT INTO events (json) VALUES ('{}')", [])
            .expect("insert");
    }

    let pool = create_pool(path, DbRuntimeSettings::default()).expect("reopen");
    let conn = pool.get().expect("connection");
    assert!(
        !ensure_schema(&conn).expect("schema on reopen"),
        "schema already in place"
    );

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 1, "row written before reopen should persist");
}
