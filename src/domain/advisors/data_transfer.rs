use crate::domain::entities::advice::{Advice, AdviceArgument};
use crate::domain::value_objects::{MetricName, RecordType, TimeWindow};

use super::aggregate::ratio_by_program;
use super::{Advisor, AdvisorContext, AdvisorError};

/// Flags receiving programs that spend a large share of their run time
/// waiting for data.
pub struct DataTransferAdvisor {
    enabled: bool,
    threshold: f64,
}

impl DataTransferAdvisor {
    #[must_use]
    pub const fn new(enabled: bool, threshold: f64) -> Self {
        Self { enabled, threshold }
    }
}

impl Advisor for DataTransferAdvisor {
    fn name(&self) -> &'static str {
        "data_transfer"
    }

    fn description(&self) -> String {
        format!(
            "Reports receiving programs that spend at least {} of their execution time in data transfers",
            AdviceArgument::Percent {
                ratio: self.threshold
            }
        )
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn execute(
        &self,
        ctx: &AdvisorContext<'_>,
        window: &TimeWindow,
    ) -> Result<Vec<Advice>, AdvisorError> {
        let ratios = ratio_by_program(
            ctx,
            RecordType::DataTransfer,
            MetricName::SendReceiveDuration,
            window,
        )?;

        Ok(ratios
            .into_iter()
            .filter(|r| r.ratio >= self.threshold)
            .filter_map(|r| ctx.topology.program(r.program).map(|p| (p, r)))
            .map(|(program, r)| {
                Advice::builder(
                    "Data transfer overhead",
                    "Program {} spends {} of its execution time receiving data ({} s of {} s)",
                )
                .entity(program)
                .percent(r.ratio)
                .number(r.part, 2)
                .number(r.duration, 2)
                .solution(
                    "Reduce the volume of data sent to this program or place its senders on the same node",
                )
                .build()
            })
            .collect())
    }
}
