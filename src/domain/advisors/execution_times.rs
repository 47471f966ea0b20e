use crate::domain::entities::advice::Advice;
use crate::domain::value_objects::{MetricName, RecordType, TimeWindow};

use super::aggregate::totals_by_program;
use super::{Advisor, AdvisorContext, AdvisorError};

/// Reports how long every program ran within the window.
pub struct ExecutionTimesAdvisor {
    enabled: bool,
}

impl ExecutionTimesAdvisor {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Advisor for ExecutionTimesAdvisor {
    fn name(&self) -> &'static str {
        "execution_times"
    }

    fn description(&self) -> String {
        "Reports run count and total, average, minimum and maximum execution time of every program"
            .to_string()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[allow(clippy::cast_precision_loss)]
    fn execute(
        &self,
        ctx: &AdvisorContext<'_>,
        window: &TimeWindow,
    ) -> Result<Vec<Advice>, AdvisorError> {
        let aggregates = ctx.queries.aggregate_by_rank(
            RecordType::ProgramRuntime,
            MetricName::ProgramDuration,
            window,
        )?;
        let totals = totals_by_program(ctx.topology, &aggregates)?;

        Ok(totals
            .into_iter()
            .filter_map(|(id, t)| ctx.topology.program(id).map(|p| (p, t)))
            .map(|(program, t)| {
                Advice::builder(
                    "Execution times",
                    "Program {} ran {} times for {} s in total (average {} s, min {} s, max {} s)",
                )
                .entity(program)
                .number(t.count as f64, 0)
                .number(t.sum, 2)
                .number(t.avg(), 2)
                .number(t.min, 2)
                .number(t.max, 2)
                .build()
            })
            .collect())
    }
}
