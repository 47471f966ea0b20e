use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::entities::record::MetricSample;
use crate::domain::ports::sink::{MetricSink, SinkError};
use crate::infrastructure::import::write_sample;

/// Appends samples to a dump file that the import pipeline can read back.
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    #[must_use]
    pub fn new(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricSink for FileSink {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn send(&self, sample: &MetricSample) -> Result<(), SinkError> {
        let mut buf = Vec::new();
        write_sample(&mut buf, sample).map_err(|e| SinkError::WriteFailed(e.to_string()))?;

        let _guard = self
            .lock
            .lock()
            .map_err(|_| SinkError::Unavailable("lock poisoned".into()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SinkError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                SinkError::Unavailable(format!("cannot open {}: {e}", self.path.display()))
            })?;

        file.write_all(&buf)
            .map_err(|e| SinkError::WriteFailed(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::record::MetricValue;
    use crate::domain::ports::store::MetricStore;
    use crate::infrastructure::import::import_reader;
    use crate::infrastructure::persistence::sqlite_store::SqliteStore;

    #[test]
    fn appended_samples_import_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("samples.metrics");
        let sink = FileSink::new(path.to_str().expect("utf8 path"));

        for time in [1.0, 2.0] {
            let sample = MetricSample::new(time, Some("ProgramRuntime"), "n1")
                .with("ProgramDuration", MetricValue::Numeric(time * 10.0));
            sink.send(&sample).expect("send");
        }

        let store = SqliteStore::open_in_memory().expect("store");
        let file = std::fs::File::open(sink.path()).expect("open");
        let mut importer = store.importer().expect("importer");
        let summary =
            import_reader(std::io::BufReader::new(file), &mut importer).expect("import");
        importer.finish().expect("finish");

        assert_eq!(summary.records_inserted, 2);
        assert_eq!(
            store
                .metric_values("ProgramDuration", None)
                .expect("values"),
            vec![MetricValue::Numeric(10.0), MetricValue::Numeric(20.0)]
        );
    }
}
