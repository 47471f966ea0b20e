pub mod database;
pub mod disabled;
pub mod file;

use std::str::FromStr;

use crate::application::config::{DatabaseConfig, SinkConfig};
use crate::domain::ports::sink::{MetricSink, SinkError};
use crate::infrastructure::persistence::sqlite_store::SqliteStore;

use self::database::DatabaseSink;
use self::disabled::DisabledSink;
use self::file::FileSink;

const DEFAULT_SINK_FILE: &str = "~/.local/share/rankscope/samples.metrics";

/// The closed set of sink variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Disabled,
    File,
    Database,
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" => Ok(Self::Disabled),
            "file" => Ok(Self::File),
            "database" | "db" => Ok(Self::Database),
            other => Err(format!("unknown sink kind: {other}")),
        }
    }
}

/// Create the sink selected by configuration.
///
/// Unknown kinds fall back to [`DisabledSink`]. The file sink writes to
/// `sink.path`, or to a default dump file when unset; the database sink opens
/// the configured metric cache.
///
/// # Errors
///
/// Returns `SinkError::Unavailable` if the database sink cannot open the store.
pub fn create_metric_sink(
    sink: &SinkConfig,
    database: &DatabaseConfig,
) -> Result<Box<dyn MetricSink>, SinkError> {
    let kind = sink.kind.parse::<SinkKind>().unwrap_or_else(|e| {
        tracing::warn!(kind = %sink.kind, "{e}, falling back to disabled");
        SinkKind::Disabled
    });
    match kind {
        SinkKind::Disabled => Ok(Box::new(DisabledSink::new())),
        SinkKind::File => Ok(Box::new(FileSink::new(
            sink.path.as_deref().unwrap_or(DEFAULT_SINK_FILE),
        ))),
        SinkKind::Database => {
            let path = sink.path.as_deref().unwrap_or(&database.path);
            let store = SqliteStore::new(path).map_err(|e| SinkError::Unavailable(e.to_string()))?;
            Ok(Box::new(DatabaseSink::new(store)))
        }
    }
}
