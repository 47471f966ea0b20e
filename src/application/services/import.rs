use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infrastructure::import::{ImportSummary, import_reader};
use crate::infrastructure::persistence::sqlite_store::SqliteStore;

/// Extension of dump files picked up from a spool directory.
pub const SPOOL_EXTENSION: &str = "metrics";
/// Extension given to spool files once imported.
pub const IMPORTED_EXTENSION: &str = "imported";

/// Outcome of one pass over a spool directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpoolCycle {
    pub files_imported: usize,
    pub files_failed: usize,
    pub summary: ImportSummary,
}

/// Feeds metric dumps into the cache, compacting afterwards when asked to.
pub struct ImportService<'a> {
    store: &'a SqliteStore,
    compact: bool,
}

impl<'a> ImportService<'a> {
    #[must_use]
    pub const fn new(store: &'a SqliteStore, compact: bool) -> Self {
        Self { store, compact }
    }

    fn import_one<R: BufRead>(&self, reader: R) -> Result<ImportSummary> {
        let mut importer = self.store.importer()?;
        let summary = import_reader(reader, &mut importer)?;
        importer.finish()?;
        Ok(summary)
    }

    fn import_path(&self, path: &Path) -> Result<ImportSummary> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let summary = self
            .import_one(BufReader::new(file))
            .with_context(|| format!("Failed to import {}", path.display()))?;
        tracing::info!(
            file = %path.display(),
            records = summary.records_inserted,
            metrics = summary.metrics_inserted,
            skipped = summary.pairs_skipped,
            "import finished"
        );
        Ok(summary)
    }

    fn compact_if_enabled(&self) -> Result<()> {
        if self.compact {
            let removed = self.store.compact_program_runtime()?;
            tracing::info!(removed, "superseded ProgramRuntime records removed");
        }
        Ok(())
    }

    /// Import one stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be read or the store rejects a
    /// commit.
    pub fn import_reader<R: BufRead>(&self, reader: R) -> Result<ImportSummary> {
        let summary = self.import_one(reader)?;
        self.compact_if_enabled()?;
        Ok(summary)
    }

    /// Import dump files in order and return the combined counters.
    ///
    /// # Errors
    ///
    /// Stops at the first file that cannot be opened or imported.
    pub fn import_files(&self, paths: &[PathBuf]) -> Result<ImportSummary> {
        let mut total = ImportSummary::default();
        for path in paths {
            total += self.import_path(path)?;
        }
        self.compact_if_enabled()?;
        Ok(total)
    }

    /// Import every `*.metrics` file of `dir`, oldest name first, and rename
    /// each imported file to `*.imported`. A file that fails stays in place
    /// and is retried on the next pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or compaction fails.
    pub fn import_spool(&self, dir: &Path) -> Result<SpoolCycle> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list spool directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == SPOOL_EXTENSION))
            .collect();
        files.sort();

        let mut cycle = SpoolCycle::default();
        for path in &files {
            match self.import_path(path) {
                Ok(summary) => {
                    cycle.summary += summary;
                    cycle.files_imported += 1;
                    let done = path.with_extension(IMPORTED_EXTENSION);
                    if let Err(e) = std::fs::rename(path, &done) {
                        tracing::warn!(file = %path.display(), "failed to mark file as imported: {e}");
                    }
                }
                Err(e) => {
                    cycle.files_failed += 1;
                    tracing::error!(file = %path.display(), "spool import failed: {e:#}");
                }
            }
        }

        if cycle.files_imported > 0 {
            self.compact_if_enabled()?;
        }
        Ok(cycle)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::ports::store::MetricStore;

    const DUMP: &str = "timestamp: 1\ntype: \"ProgramRuntime\"\nhostname: \"h\"\nGlobalRank: 0\nStartTimestamp: 0\nProgramDuration: 10\n}\n";
    const NEWER: &str = "timestamp: 2\ntype: \"ProgramRuntime\"\nhostname: \"h\"\nGlobalRank: 0\nStartTimestamp: 0\nProgramDuration: 20\n}\n";

    #[test]
    fn import_reader_counts_rows() {
        let store = SqliteStore::open_in_memory().expect("store");
        let service = ImportService::new(&store, false);
        let summary = service.import_reader(DUMP.as_bytes()).expect("import");
        assert_eq!(summary.records_inserted, 1);
        assert_eq!(summary.metrics_inserted, 3);
    }

    #[test]
    fn spool_file_with_invalid_utf8_is_still_imported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut bytes = b"{\ntimestamp: 1\nhostname: \"h\"\na: 1\n}\n".to_vec();
        bytes.extend_from_slice(b"note: \"\xff\xfe\"\n");
        bytes.extend_from_slice(b"{\ntimestamp: 2\nhostname: \"h\"\nb: 2\n}\n");
        std::fs::write(dir.path().join("01.metrics"), bytes).expect("write");

        let store = SqliteStore::open_in_memory().expect("store");
        let cycle = ImportService::new(&store, false)
            .import_spool(dir.path())
            .expect("spool");

        assert_eq!(cycle.files_imported, 1);
        assert_eq!(cycle.files_failed, 0);
        assert_eq!(store.metric_names().expect("names"), vec!["a", "b"]);
        assert!(dir.path().join("01.imported").exists());
    }

    #[test]
    fn import_files_adds_up_and_compacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.metrics");
        let second = dir.path().join("b.metrics");
        std::fs::write(&first, DUMP).expect("write");
        std::fs::write(&second, NEWER).expect("write");

        let store = SqliteStore::open_in_memory().expect("store");
        let service = ImportService::new(&store, true);
        let summary = service.import_files(&[first, second]).expect("import");

        assert_eq!(summary.records_inserted, 2);
        let durations = store
            .metric_values("ProgramDuration", None)
            .expect("values");
        assert_eq!(durations.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let store = SqliteStore::open_in_memory().expect("store");
        let service = ImportService::new(&store, false);
        let result = service.import_files(&[PathBuf::from("/nonexistent/dump.metrics")]);
        assert!(result.is_err());
    }

    #[test]
    fn spool_files_are_imported_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("1.metrics"), DUMP).expect("write");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let store = SqliteStore::open_in_memory().expect("store");
        let service = ImportService::new(&store, false);

        let cycle = service.import_spool(dir.path()).expect("first pass");
        assert_eq!(cycle.files_imported, 1);
        assert_eq!(cycle.summary.records_inserted, 1);
        assert!(dir.path().join("1.imported").exists());
        assert!(dir.path().join("notes.txt").exists());

        let cycle = service.import_spool(dir.path()).expect("second pass");
        assert_eq!(cycle, SpoolCycle::default());
    }
}
