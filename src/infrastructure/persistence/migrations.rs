use rusqlite::Connection;

/// Create the `records` and `metrics` tables and their indexes when missing.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS records (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            time    REAL    NOT NULL,
            type    TEXT,
            host    TEXT    NOT NULL,
            UNIQUE (time, type, host)
        );

        CREATE TABLE IF NOT EXISTS metrics (
            record_id     INTEGER NOT NULL REFERENCES records(id) ON DELETE CASCADE,
            name          TEXT    NOT NULL,
            numeric_value REAL,
            text_value    TEXT,
            CHECK ((numeric_value IS NULL) <> (text_value IS NULL)),
            PRIMARY KEY (record_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_records_type_time ON records(type, time);
        CREATE INDEX IF NOT EXISTS idx_metrics_name ON metrics(name);",
    )?;
    Ok(())
}

/// Drop every table created by [`initialize_schema`].
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn drop_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS metrics;
         DROP TABLE IF EXISTS records;",
    )
}
