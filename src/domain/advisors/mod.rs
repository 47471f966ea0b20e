pub mod aggregate;
pub mod data_transfer;
pub mod execution_times;
pub mod garbage_collection;
pub mod out_of_memory;
pub mod regression;

use thiserror::Error;

use crate::domain::entities::advice::Advice;
use crate::domain::ports::store::{AdvisorQueries, StoreError};
use crate::domain::topology::{Application, GlobalRank, Program};
use crate::domain::value_objects::{AdvisorSettings, TimeWindow};

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no program instance with global rank {0}")]
    UnresolvedRank(GlobalRank),
}

/// What an advisor reads from: the metric cache and the deployment graph.
#[derive(Clone, Copy)]
pub struct AdvisorContext<'a> {
    pub queries: &'a dyn AdvisorQueries,
    pub topology: &'a Application,
}

/// A detector that reads the metric cache and produces advice about the
/// topology. Advisors never write.
pub trait Advisor: Send + Sync {
    /// Returns the unique name of this advisor
    fn name(&self) -> &'static str;

    /// Describes what the advisor reports, including its thresholds
    fn description(&self) -> String;

    fn is_enabled(&self) -> bool;

    /// Runs the detector over records within `window`.
    ///
    /// # Errors
    ///
    /// Returns `AdvisorError` when a query fails or a global rank found in
    /// the cache is not part of the topology.
    fn execute(
        &self,
        ctx: &AdvisorContext<'_>,
        window: &TimeWindow,
    ) -> Result<Vec<Advice>, AdvisorError>;

    /// Runs the detector over every record in the cache.
    ///
    /// # Errors
    ///
    /// Same as [`Advisor::execute`].
    fn execute_all(&self, ctx: &AdvisorContext<'_>) -> Result<Vec<Advice>, AdvisorError> {
        match ctx.queries.time_bounds()? {
            Some(window) => self.execute(ctx, &window),
            None => Ok(Vec::new()),
        }
    }
}

/// Program owning the instance with `global_rank`.
///
/// # Errors
///
/// Returns `AdvisorError::UnresolvedRank` when no instance or program matches.
pub fn resolve_program(
    topology: &Application,
    global_rank: GlobalRank,
) -> Result<&Program, AdvisorError> {
    topology
        .resolve_program_instance(global_rank)
        .and_then(|instance| topology.program(instance.program()))
        .ok_or(AdvisorError::UnresolvedRank(global_rank))
}

/// Returns every built-in advisor, in reporting order
#[must_use]
pub fn default_advisors(settings: &AdvisorSettings) -> Vec<Box<dyn Advisor>> {
    let t = &settings.thresholds;
    vec![
        Box::new(execution_times::ExecutionTimesAdvisor::new(
            settings.execution_times,
        )),
        Box::new(data_transfer::DataTransferAdvisor::new(
            settings.data_transfer,
            t.data_transfer_ratio,
        )),
        Box::new(garbage_collection::GarbageCollectionAdvisor::new(
            settings.garbage_collection,
            t.garbage_collection_ratio,
        )),
        Box::new(out_of_memory::OutOfMemoryAdvisor::new(
            settings.out_of_memory,
            t.heap_growth,
            t.non_heap_growth,
            t.swap_growth,
        )),
    ]
}

/// Runs enabled advisors in registration order and concatenates their advice.
pub struct AdvisorEngine {
    advisors: Vec<Box<dyn Advisor>>,
    abort_on_failure: bool,
}

impl AdvisorEngine {
    #[must_use]
    pub fn new(advisors: Vec<Box<dyn Advisor>>, abort_on_failure: bool) -> Self {
        Self {
            advisors,
            abort_on_failure,
        }
    }

    #[must_use]
    pub fn advisors(&self) -> &[Box<dyn Advisor>] {
        &self.advisors
    }

    /// Runs every enabled advisor over `window`, or over the whole cache
    /// when `window` is `None`.
    ///
    /// # Errors
    ///
    /// Returns the first advisor failure when the engine aborts on failure.
    /// Otherwise failing advisors are logged and skipped.
    pub fn run(
        &self,
        ctx: &AdvisorContext<'_>,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Advice>, AdvisorError> {
        let mut advices = Vec::new();
        for advisor in self.advisors.iter().filter(|a| a.is_enabled()) {
            let result = match window {
                Some(w) => advisor.execute(ctx, w),
                None => advisor.execute_all(ctx),
            };
            match result {
                Ok(found) => {
                    tracing::debug!(advisor = advisor.name(), count = found.len(), "advisor done");
                    advices.extend(found);
                }
                Err(e) if self.abort_on_failure => return Err(e),
                Err(e) => {
                    tracing::error!(advisor = advisor.name(), "advisor failed: {e}");
                }
            }
        }
        Ok(advices)
    }
}
