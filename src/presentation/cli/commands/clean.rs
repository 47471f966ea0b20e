use colored::Colorize;

use crate::domain::ports::store::MetricStore;
use crate::infrastructure::persistence::sqlite_store::SqliteStore;

/// Empty the cache, or drop its tables with `drop`. Consumes the store.
///
/// # Errors
///
/// Returns an error if the store cannot be cleared, dropped or closed.
pub fn run_clean(store: SqliteStore, drop: bool) -> anyhow::Result<()> {
    if drop {
        store.drop_schema()?;
        println!("{}", "Metric tables dropped".yellow());
    } else {
        let removed = store.clear()?;
        println!("{removed} record(s) deleted");
    }
    store.close()?;
    Ok(())
}
