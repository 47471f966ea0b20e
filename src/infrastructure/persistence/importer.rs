use std::sync::MutexGuard;

use rusqlite::{Connection, params};

use crate::domain::entities::record::{MetricValue, RecordHeader};
use crate::domain::ports::store::{RecordWriter, StoreError};

/// Exclusive write session on a [`super::sqlite_store::SqliteStore`].
///
/// Each object of the metric stream runs in its own transaction, opened on
/// the first write and closed by [`RecordWriter::commit`]. Dropping the
/// importer rolls back an object that was not committed, which leaves the
/// connection in auto-commit mode on every exit path.
pub struct SqliteImporter<'a> {
    conn: MutexGuard<'a, Connection>,
    in_transaction: bool,
}

impl<'a> SqliteImporter<'a> {
    pub(super) const fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            self.conn
                .execute_batch("BEGIN")
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Commit the pending object and release the connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the final commit fails.
    pub fn finish(mut self) -> Result<(), StoreError> {
        self.commit()
    }
}

impl RecordWriter for SqliteImporter<'_> {
    fn insert_record(&mut self, header: &RecordHeader) -> Result<i64, StoreError> {
        self.begin()?;
        self.conn
            .execute(
                "INSERT INTO records (time, type, host) VALUES (?1, ?2, ?3)",
                params![header.time, header.record_type, header.host],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_metric(
        &mut self,
        record_id: i64,
        name: &str,
        value: &MetricValue,
    ) -> Result<(), StoreError> {
        self.begin()?;
        let (numeric, text) = match value {
            MetricValue::Numeric(n) => (Some(*n), None),
            MetricValue::Text(t) => (None, Some(t.as_str())),
        };
        self.conn
            .execute(
                "INSERT INTO metrics (record_id, name, numeric_value, text_value) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![record_id, name, numeric, text],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            self.conn
                .execute_batch("COMMIT")
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            self.in_transaction = false;
        }
        Ok(())
    }
}

impl Drop for SqliteImporter<'_> {
    fn drop(&mut self) {
        if self.in_transaction && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("failed to roll back unfinished import object: {e}");
            }
        }
    }
}
