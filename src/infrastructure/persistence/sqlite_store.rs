use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::{Connection, params, params_from_iter};
use rusqlite::types::Value;

use crate::domain::entities::record::MetricValue;
use crate::domain::entities::statistics::MetricStatistics;
use crate::domain::ports::store::{
    AdvisorQueries, MetricCondition, MetricStore, RankAggregate, ResourceSample, StoreError,
};
use crate::domain::topology::GlobalRank;
use crate::domain::value_objects::{MemoryResource, MetricName, RecordType, TimeWindow};

use super::importer::SqliteImporter;
use super::migrations;
use super::pivot::PivotQuery;

/// SQLite-backed cache of imported metric records.
pub struct SqliteStore {
    pub(super) conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the metric cache at `path`, which may start with `~`.
    ///
    /// The file runs in WAL mode with foreign keys enforced.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` when the file or its schema cannot be set up.
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let expanded = shellexpand::tilde(path);
        let db_path = PathBuf::from(expanded.as_ref());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        let conn =
            Connection::open(&db_path).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Self::with_connection(conn)
    }

    /// Create a store that lives in memory only.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        migrations::initialize_schema(&conn).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Start an import. The importer holds the connection until it is
    /// finished or dropped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the connection lock is poisoned.
    pub fn importer(&self) -> Result<SqliteImporter<'_>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        Ok(SqliteImporter::new(conn))
    }

    /// Delete `ProgramRuntime` records superseded by a more recent record
    /// with the same `GlobalRank` and `StartTimestamp`. Returns the number of
    /// records removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if deletion fails.
    pub fn compact_program_runtime(&self) -> Result<usize, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        let removed = conn
            .execute(
                "DELETE FROM records WHERE id IN (
                    SELECT r.id FROM records r
                    JOIN metrics g ON g.record_id = r.id AND g.name = ?2
                    JOIN metrics s ON s.record_id = r.id AND s.name = ?3
                    WHERE r.type = ?1 AND EXISTS (
                        SELECT 1 FROM records r2
                        JOIN metrics g2 ON g2.record_id = r2.id AND g2.name = ?2
                        JOIN metrics s2 ON s2.record_id = r2.id AND s2.name = ?3
                        WHERE r2.type = ?1
                          AND g2.numeric_value = g.numeric_value
                          AND s2.numeric_value = s.numeric_value
                          AND (r2.time > r.time OR (r2.time = r.time AND r2.id > r.id))
                    )
                )",
                params![
                    RecordType::ProgramRuntime.as_str(),
                    MetricName::GlobalRank.as_str(),
                    MetricName::StartTimestamp.as_str(),
                ],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(removed)
    }

    /// Drop both tables. The store cannot be used afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the tables cannot be dropped.
    pub fn drop_schema(&self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        migrations::drop_schema(&conn).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        drop(conn);
        Ok(())
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if `SQLite` refuses to close.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        conn.close()
            .map_err(|(_, e)| StoreError::WriteFailed(e.to_string()))
    }
}

fn parse_value_row(row: &rusqlite::Row<'_>) -> Result<MetricValue, rusqlite::Error> {
    let numeric: Option<f64> = row.get(0)?;
    let text: Option<String> = row.get(1)?;
    Ok(numeric.map_or_else(
        || MetricValue::Text(text.unwrap_or_default()),
        MetricValue::Numeric,
    ))
}

fn rank_from_row(value: i64) -> Option<GlobalRank> {
    let rank = GlobalRank::try_from(value).ok();
    if rank.is_none() {
        tracing::warn!("ignoring out of range global rank {value}");
    }
    rank
}

impl MetricStore for SqliteStore {
    fn metric_names(&self) -> Result<Vec<String>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT name FROM metrics ORDER BY name")
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(names)
    }

    fn metric_values(
        &self,
        name: &str,
        condition: Option<&MetricCondition>,
    ) -> Result<Vec<MetricValue>, StoreError> {
        let mut params: Vec<Value> = vec![Value::Text(name.to_string())];
        let filter = match condition {
            None => "",
            Some(MetricCondition::Timestamp(time)) => {
                params.push(Value::Real(*time));
                " AND r.time = ?2"
            }
            Some(MetricCondition::RecordType(record_type)) => {
                params.push(Value::Text(record_type.clone()));
                " AND r.type = ?2"
            }
            Some(MetricCondition::Hostname(host)) => {
                params.push(Value::Text(host.clone()));
                " AND r.host = ?2"
            }
            Some(MetricCondition::Metric {
                name: sibling,
                value,
            }) => {
                params.push(Value::Text(sibling.clone()));
                match value {
                    MetricValue::Numeric(n) => {
                        params.push(Value::Real(*n));
                        " AND EXISTS (SELECT 1 FROM metrics c WHERE c.record_id = m.record_id \
                         AND c.name = ?2 AND c.numeric_value = ?3)"
                    }
                    MetricValue::Text(t) => {
                        params.push(Value::Text(t.clone()));
                        " AND EXISTS (SELECT 1 FROM metrics c WHERE c.record_id = m.record_id \
                         AND c.name = ?2 AND c.text_value = ?3)"
                    }
                }
            }
        };
        let sql = format!(
            "SELECT m.numeric_value, m.text_value FROM metrics m \
             JOIN records r ON r.id = m.record_id \
             WHERE m.name = ?1{filter} ORDER BY r.time, r.id"
        );

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let values = stmt
            .query_map(params_from_iter(params), parse_value_row)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(values)
    }

    fn statistics(
        &self,
        name: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Option<MetricStatistics>, StoreError> {
        let mut params: Vec<Value> = vec![Value::Text(name.to_string())];
        let filter = match window {
            Some(w) => {
                params.push(Value::Real(w.start()));
                params.push(Value::Real(w.end()));
                " AND r.time BETWEEN ?2 AND ?3"
            }
            None => "",
        };
        let sql = format!(
            "SELECT COUNT(m.numeric_value), MIN(m.numeric_value), MAX(m.numeric_value), \
             TOTAL(m.numeric_value), TOTAL(m.numeric_value * m.numeric_value) \
             FROM metrics m JOIN records r ON r.id = m.record_id \
             WHERE m.name = ?1 AND m.numeric_value IS NOT NULL{filter}"
        );

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let (count, min, max, sum, sum_of_squares) = conn
            .query_row(&sql, params_from_iter(params), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(conn);

        let count = u64::try_from(count).map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        Ok(MetricStatistics::from_sums(
            count,
            min.unwrap_or_default(),
            max.unwrap_or_default(),
            sum,
            sum_of_squares,
        ))
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let removed = conn
            .execute("DELETE FROM records", [])
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        drop(conn);
        Ok(removed)
    }
}

impl AdvisorQueries for SqliteStore {
    fn aggregate_by_rank(
        &self,
        record_type: RecordType,
        metric: MetricName,
        window: &TimeWindow,
    ) -> Result<Vec<RankAggregate>, StoreError> {
        let pivot = PivotQuery::new(record_type)
            .inner(MetricName::GlobalRank)
            .inner(metric);
        let (from, params) = pivot.from_clause(Some(window));
        let rank = PivotQuery::column(0);
        let value = PivotQuery::column(1);
        let sql = format!(
            "SELECT CAST({rank} AS INTEGER) AS global_rank, COUNT({value}), TOTAL({value}), \
             MIN({value}), MAX({value}) {from} GROUP BY global_rank ORDER BY global_rank"
        );

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);

        Ok(rows
            .into_iter()
            .filter_map(|(rank, count, sum, min, max)| {
                Some(RankAggregate {
                    global_rank: rank_from_row(rank)?,
                    count: u64::try_from(count).ok()?,
                    sum,
                    min,
                    max,
                })
            })
            .collect())
    }

    fn resource_samples(
        &self,
        resource: MemoryResource,
        window: &TimeWindow,
    ) -> Result<Vec<ResourceSample>, StoreError> {
        let pivot = PivotQuery::new(RecordType::ResourceUsage)
            .inner(MetricName::GlobalRank)
            .inner(resource.used())
            .left(resource.limit());
        let (from, params) = pivot.from_clause(Some(window));
        let sql = format!(
            "SELECT CAST({} AS INTEGER), r.time, {}, {} {from} ORDER BY r.time, r.id",
            PivotQuery::column(0),
            PivotQuery::column(1),
            PivotQuery::column(2),
        );

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);

        Ok(rows
            .into_iter()
            .filter_map(|(rank, time, used, limit)| {
                Some(ResourceSample {
                    global_rank: rank_from_row(rank)?,
                    time,
                    used,
                    limit,
                })
            })
            .collect())
    }

    fn time_bounds(&self) -> Result<Option<TimeWindow>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let (earliest, latest) = conn
            .query_row("SELECT MIN(time), MAX(time) FROM records", [], |row| {
                Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<f64>>(1)?))
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(conn);
        Ok(earliest
            .zip(latest)
            .and_then(|(start, end)| TimeWindow::new(start, end)))
    }
}
