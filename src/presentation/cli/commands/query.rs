use anyhow::Context;

use crate::domain::ports::store::{MetricCondition, MetricStore};
use crate::domain::value_objects::TimeWindow;
use crate::presentation::cli::formatters::stats_fmt::{format_statistics, format_values};

/// Print the distinct metric names in the cache.
///
/// # Errors
///
/// Returns an error if the store query fails or JSON serialization fails.
pub fn run_metrics(store: &dyn MetricStore, json: bool) -> anyhow::Result<()> {
    let names = store.metric_names()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(())
}

/// Print the raw values of a metric, optionally filtered by `KEY=VALUE`.
///
/// # Errors
///
/// Returns an error if the condition is malformed or the store query fails.
pub fn run_values(
    store: &dyn MetricStore,
    name: &str,
    condition: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let condition = condition
        .map(str::parse::<MetricCondition>)
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid condition: {e}"))?;
    let values = store.metric_values(name, condition.as_ref())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if !values.is_empty() {
        println!("{}", format_values(&values));
    }
    Ok(())
}

/// Inclusive window from optional bounds; an open side is unbounded.
///
/// # Errors
///
/// Returns an error if the bounds are inverted or not finite.
pub fn stats_window(from: Option<f64>, to: Option<f64>) -> anyhow::Result<Option<TimeWindow>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let start = from.unwrap_or(f64::MIN);
    let end = to.unwrap_or(f64::MAX);
    TimeWindow::new(start, end)
        .map(Some)
        .with_context(|| format!("Invalid window: {start} .. {end}"))
}

/// Print aggregate statistics of a metric.
///
/// # Errors
///
/// Returns an error if the window is invalid or the store query fails.
pub fn run_stats(
    store: &dyn MetricStore,
    name: &str,
    from: Option<f64>,
    to: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let window = stats_window(from, to)?;
    let stats = store.statistics(name, window.as_ref())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", format_statistics(name, stats.as_ref()));
    }
    Ok(())
}
