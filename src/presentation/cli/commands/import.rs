use std::path::PathBuf;

use crate::application::services::import::ImportService;
use crate::presentation::cli::formatters::stats_fmt::format_import_summary;

/// Import dump files and print how much was stored.
///
/// # Errors
///
/// Returns an error if a file cannot be read or the store fails.
pub fn run_import(service: &ImportService<'_>, files: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let summary = service.import_files(files)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_import_summary(&summary));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite_store::SqliteStore;

    #[test]
    fn imports_files_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dump.metrics");
        std::fs::write(&path, "timestamp: 1\nhostname: h\nx: 1\n").expect("write");

        let store = SqliteStore::open_in_memory().expect("store");
        let service = ImportService::new(&store, false);
        run_import(&service, &[path], true).expect("import");
    }

    #[test]
    fn missing_file_fails() {
        let store = SqliteStore::open_in_memory().expect("store");
        let service = ImportService::new(&store, false);
        assert!(run_import(&service, &[PathBuf::from("/nonexistent.metrics")], false).is_err());
    }
}
