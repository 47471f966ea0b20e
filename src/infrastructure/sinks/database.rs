use crate::domain::entities::record::MetricSample;
use crate::domain::ports::sink::{MetricSink, SinkError};
use crate::infrastructure::import::{import_reader, write_sample};
use crate::infrastructure::persistence::sqlite_store::SqliteStore;

/// Imports every sample straight into the metric cache.
pub struct DatabaseSink {
    store: SqliteStore,
}

impl DatabaseSink {
    #[must_use]
    pub const fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &SqliteStore {
        &self.store
    }
}

impl MetricSink for DatabaseSink {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn send(&self, sample: &MetricSample) -> Result<(), SinkError> {
        let mut buf = Vec::new();
        write_sample(&mut buf, sample).map_err(|e| SinkError::WriteFailed(e.to_string()))?;

        let mut importer = self
            .store
            .importer()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        let summary = import_reader(buf.as_slice(), &mut importer)
            .map_err(|e| SinkError::WriteFailed(e.to_string()))?;
        importer
            .finish()
            .map_err(|e| SinkError::WriteFailed(e.to_string()))?;

        if !sample.metrics.is_empty() && summary.records_inserted == 0 {
            return Err(SinkError::WriteFailed(format!(
                "record at {} from {} was rejected",
                sample.header.time, sample.header.host
            )));
        }
        Ok(())
    }
}
