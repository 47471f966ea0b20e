use thiserror::Error;

use crate::domain::entities::record::MetricSample;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write sample: {0}")]
    WriteFailed(String),
}

/// Destination for samples produced by sensors.
pub trait MetricSink: Send + Sync {
    /// Short name of the sink variant, as used in configuration.
    fn kind(&self) -> &'static str;

    /// Delivers one sample.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the sample cannot be delivered.
    fn send(&self, sample: &MetricSample) -> Result<(), SinkError>;
}
