use anyhow::Context;
use chrono::Utc;

use crate::domain::entities::record::{MetricSample, MetricValue};
use crate::domain::ports::sink::MetricSink;

/// Build a sample from `NAME=VALUE` arguments.
///
/// # Errors
///
/// Returns an error if an argument has no `=` or an empty name.
pub fn build_sample(
    hostname: &str,
    record_type: Option<&str>,
    timestamp: Option<f64>,
    metrics: &[String],
) -> anyhow::Result<MetricSample> {
    #[allow(clippy::cast_precision_loss)]
    let time = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis() as f64 / 1000.0);
    let mut sample = MetricSample::new(time, record_type, hostname);
    for arg in metrics {
        let (name, value) = arg
            .split_once('=')
            .with_context(|| format!("expected NAME=VALUE, got '{arg}'"))?;
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("missing metric name in '{arg}'");
        }
        sample = sample.with(name, MetricValue::from_literal(value.trim()));
    }
    Ok(sample)
}

/// Send one sample through `sink`.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or the sink rejects the
/// sample.
pub fn run_record(
    sink: &dyn MetricSink,
    hostname: &str,
    record_type: Option<&str>,
    timestamp: Option<f64>,
    metrics: &[String],
) -> anyhow::Result<()> {
    let sample = build_sample(hostname, record_type, timestamp, metrics)?;
    sink.send(&sample)
        .with_context(|| format!("{} sink rejected the sample", sink.kind()))?;
    tracing::info!(sink = sink.kind(), metrics = sample.metrics.len(), "sample sent");
    Ok(())
}
