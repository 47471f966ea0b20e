use std::str::FromStr;

use thiserror::Error;

use crate::domain::entities::record::{MetricValue, RecordHeader};
use crate::domain::entities::statistics::MetricStatistics;
use crate::domain::topology::GlobalRank;
use crate::domain::value_objects::{MemoryResource, MetricName, RecordType, TimeWindow};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// Filter applied when listing the raw values of a metric.
///
/// `timestamp`, `type` and `hostname` address the record header; any other
/// key names a sibling metric of the same record.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricCondition {
    Timestamp(f64),
    RecordType(String),
    Hostname(String),
    Metric { name: String, value: MetricValue },
}

impl MetricCondition {
    /// Builds a condition from a key and a raw value.
    ///
    /// # Errors
    ///
    /// Returns a message when the key is `timestamp` and the value is not a
    /// finite number.
    pub fn new(key: &str, value: &str) -> Result<Self, String> {
        match key.to_ascii_lowercase().as_str() {
            "timestamp" => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .map(Self::Timestamp)
                .ok_or_else(|| format!("invalid timestamp '{value}'")),
            "type" => Ok(Self::RecordType(value.to_string())),
            "hostname" => Ok(Self::Hostname(value.to_string())),
            _ => Ok(Self::Metric {
                name: key.to_string(),
                value: MetricValue::from_literal(value),
            }),
        }
    }
}

impl FromStr for MetricCondition {
    type Err = String;

    /// Parses `KEY=VALUE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in '{s}'"));
        }
        Self::new(key, value.trim())
    }
}

/// Browsing surface of the metric cache.
pub trait MetricStore: Send + Sync {
    /// Distinct metric names present in the cache, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn metric_names(&self) -> Result<Vec<String>, StoreError>;

    /// Raw values of `name`, optionally restricted by a condition.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn metric_values(
        &self,
        name: &str,
        condition: Option<&MetricCondition>,
    ) -> Result<Vec<MetricValue>, StoreError>;

    /// Statistics over the numeric values of `name` within an inclusive
    /// window (all time when `None`). `None` when there is no data.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn statistics(
        &self,
        name: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Option<MetricStatistics>, StoreError>;

    /// Deletes every record and its metrics. Returns the number of records
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Count, sum and extremes of one metric for one global rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankAggregate {
    pub global_rank: GlobalRank,
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

/// One memory usage reading of one rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub global_rank: GlobalRank,
    pub time: f64,
    pub used: f64,
    /// Capacity reported alongside the reading, when present.
    pub limit: Option<f64>,
}

/// Typed queries the advisors run against the metric cache.
pub trait AdvisorQueries: Send + Sync {
    /// Per-rank aggregate of `metric` over records of `record_type` within
    /// `window`. Ordered by rank.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn aggregate_by_rank(
        &self,
        record_type: RecordType,
        metric: MetricName,
        window: &TimeWindow,
    ) -> Result<Vec<RankAggregate>, StoreError>;

    /// Usage readings of `resource` within `window`, ordered by time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn resource_samples(
        &self,
        resource: MemoryResource,
        window: &TimeWindow,
    ) -> Result<Vec<ResourceSample>, StoreError>;

    /// Earliest and latest record time. `None` when the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn time_bounds(&self) -> Result<Option<TimeWindow>, StoreError>;
}

/// Write side used by the import pipeline.
///
/// Writes between two commits form one unit: an object of the metric
/// stream.
pub trait RecordWriter {
    /// Inserts a record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the record cannot be inserted, including
    /// when a record with the same time, type and host already exists.
    fn insert_record(&mut self, header: &RecordHeader) -> Result<i64, StoreError>;

    /// Inserts one metric of an inserted record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    fn insert_metric(
        &mut self,
        record_id: i64,
        name: &str,
        value: &MetricValue,
    ) -> Result<(), StoreError>;

    /// Makes the writes since the previous commit durable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the commit fails.
    fn commit(&mut self) -> Result<(), StoreError>;
}
