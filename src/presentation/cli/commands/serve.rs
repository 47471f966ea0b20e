use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::application::services::import::ImportService;

/// Import spool files at a fixed interval until Ctrl+C.
///
/// A failing pass is logged and the loop carries on. The caller owns the
/// store and closes it once this returns.
///
/// # Errors
///
/// Returns an error if the spool directory cannot be created.
pub async fn run_serve(
    service: &ImportService<'_>,
    spool: &Path,
    interval_secs: u64,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(spool)
        .with_context(|| format!("Failed to create spool directory {}", spool.display()))?;
    tracing::info!(
        spool = %spool.display(),
        "server started (interval: {interval_secs}s)"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match service.import_spool(spool) {
                    Ok(cycle) if cycle.files_imported > 0 || cycle.files_failed > 0 => {
                        tracing::info!(
                            imported = cycle.files_imported,
                            failed = cycle.files_failed,
                            metrics = cycle.summary.metrics_inserted,
                            "spool pass finished"
                        );
                    }
                    Ok(_) => tracing::debug!("spool is empty"),
                    Err(e) => tracing::error!("spool pass failed: {e:#}"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                println!("\nStopping rankscope...");
                break;
            }
        }
    }
    Ok(())
}
