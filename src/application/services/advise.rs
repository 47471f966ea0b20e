use anyhow::{Context, Result};

use crate::domain::advisors::{AdvisorContext, AdvisorEngine};
use crate::domain::entities::report::AdviceReport;
use crate::domain::ports::store::AdvisorQueries;
use crate::domain::topology::{Application, TopologySnapshot};
use crate::domain::value_objects::TimeWindow;

/// Runs the advisor engine against the cache and assembles the report.
pub struct AdviseService<'a> {
    queries: &'a dyn AdvisorQueries,
    engine: &'a AdvisorEngine,
}

impl<'a> AdviseService<'a> {
    #[must_use]
    pub const fn new(queries: &'a dyn AdvisorQueries, engine: &'a AdvisorEngine) -> Self {
        Self { queries, engine }
    }

    /// Turn optional `--from`/`--to` bounds into an analysis window.
    ///
    /// Without bounds the advisors cover the whole cache. A single bound is
    /// completed from the cache's time bounds; an empty cache yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are inverted or the cache cannot be read.
    pub fn resolve_window(&self, from: Option<f64>, to: Option<f64>) -> Result<Option<TimeWindow>> {
        match (from, to) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => TimeWindow::new(start, end)
                .map(Some)
                .with_context(|| format!("Invalid window: {start} .. {end}")),
            _ => {
                let Some(bounds) = self.queries.time_bounds()? else {
                    return Ok(None);
                };
                bounds
                    .restrict(from, to)
                    .map(Some)
                    .context("Window does not overlap the cached records")
            }
        }
    }

    /// Run every enabled advisor over `window` (or the whole cache).
    ///
    /// # Errors
    ///
    /// Returns an error if an advisor fails while the engine aborts on
    /// failure, or if the cache bounds cannot be read.
    pub fn run(&self, topology: &Application, window: Option<TimeWindow>) -> Result<AdviceReport> {
        let ctx = AdvisorContext {
            queries: self.queries,
            topology,
        };
        let advices = self
            .engine
            .run(&ctx, window.as_ref())
            .context("Advisor run failed")?;

        let window = match window {
            Some(w) => Some(w),
            None => self.queries.time_bounds()?,
        };
        tracing::info!(
            application = topology.name(),
            advices = advices.len(),
            "advisor run finished"
        );
        Ok(AdviceReport::new(
            window,
            &advices,
            TopologySnapshot::from(topology),
        ))
    }
}
