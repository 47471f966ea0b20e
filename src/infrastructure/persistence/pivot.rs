//! Builds the `FROM ... WHERE ...` part of queries that pivot the narrow
//! `metrics` table into one column per metric name.
//!
//! Every value (metric names, record type, window bounds) is bound as a
//! parameter. Table aliases are derived from the join position only, so no
//! caller-supplied text ever reaches the SQL string.

use std::fmt::Write;

use rusqlite::types::Value;

use crate::domain::value_objects::{MetricName, RecordType, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    /// Row must carry the metric, as a number.
    Inner,
    /// Metric is optional.
    Left,
}

/// A pivot over records of one type.
#[derive(Debug, Clone)]
pub struct PivotQuery {
    record_type: RecordType,
    joins: Vec<(Join, MetricName)>,
}

impl PivotQuery {
    #[must_use]
    pub const fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            joins: Vec::new(),
        }
    }

    /// Requires a numeric value of `metric` on every row.
    #[must_use]
    pub fn inner(mut self, metric: MetricName) -> Self {
        self.joins.push((Join::Inner, metric));
        self
    }

    /// Adds `metric` as an optional column.
    #[must_use]
    pub fn left(mut self, metric: MetricName) -> Self {
        self.joins.push((Join::Left, metric));
        self
    }

    /// Numeric value column of the `index`-th joined metric.
    #[must_use]
    pub fn column(index: usize) -> String {
        format!("m{index}.numeric_value")
    }

    /// The `FROM`/`WHERE` fragment and its parameters, in order.
    ///
    /// Records are aliased `r`; the `time` filter is inclusive.
    #[must_use]
    pub fn from_clause(&self, window: Option<&TimeWindow>) -> (String, Vec<Value>) {
        let mut sql = String::from("FROM records r");
        let mut params: Vec<Value> = Vec::with_capacity(self.joins.len() + 3);

        for (index, (join, metric)) in self.joins.iter().enumerate() {
            params.push(Value::Text(metric.as_str().to_string()));
            let p = params.len();
            let alias = format!("m{index}");
            let _ = match join {
                Join::Inner => write!(
                    sql,
                    " JOIN metrics {alias} ON {alias}.record_id = r.id AND {alias}.name = ?{p} \
                     AND {alias}.numeric_value IS NOT NULL"
                ),
                Join::Left => write!(
                    sql,
                    " LEFT JOIN metrics {alias} ON {alias}.record_id = r.id AND {alias}.name = ?{p}"
                ),
            };
        }

        params.push(Value::Text(self.record_type.as_str().to_string()));
        let _ = write!(sql, " WHERE r.type = ?{}", params.len());

        if let Some(window) = window {
            params.push(Value::Real(window.start()));
            params.push(Value::Real(window.end()));
            let _ = write!(
                sql,
                " AND r.time BETWEEN ?{} AND ?{}",
                params.len() - 1,
                params.len()
            );
        }

        (sql, params)
    }
}
