use crate::domain::entities::record::MetricSample;
use crate::domain::ports::sink::{MetricSink, SinkError};

/// Sink that accepts every sample and keeps none.
pub struct DisabledSink;

impl DisabledSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for DisabledSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for DisabledSink {
    fn kind(&self) -> &'static str {
        "disabled"
    }

    fn send(&self, _sample: &MetricSample) -> Result<(), SinkError> {
        Ok(())
    }
}
