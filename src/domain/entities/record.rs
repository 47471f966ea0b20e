use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of one stored metric. Exactly one representation is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Numeric(f64),
    Text(String),
}

impl MetricValue {
    /// Interprets a raw literal: a finite number when it parses as one,
    /// text otherwise.
    #[must_use]
    pub fn from_literal(literal: &str) -> Self {
        match literal.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Numeric(n),
            _ => Self::Text(literal.to_string()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Identifying fields of a record: time, optional type and host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub time: f64,
    pub record_type: Option<String>,
    pub host: String,
}

/// A complete sample as produced by a sensor: header plus named values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub header: RecordHeader,
    pub metrics: Vec<(String, MetricValue)>,
}

impl MetricSample {
    #[must_use]
    pub fn new(time: f64, record_type: Option<&str>, host: &str) -> Self {
        Self {
            header: RecordHeader {
                time,
                record_type: record_type.map(str::to_string),
                host: host.to_string(),
            },
            metrics: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: MetricValue) -> Self {
        self.metrics.push((name.to_string(), value));
        self
    }
}
