use crate::domain::entities::advice::{Advice, AdviceArgument};
use crate::domain::value_objects::{MetricName, RecordType, TimeWindow};

use super::aggregate::ratio_by_program;
use super::{Advisor, AdvisorContext, AdvisorError};

pub struct GarbageCollectionAdvisor {
    enabled: bool,
    threshold: f64,
}

impl GarbageCollectionAdvisor {
    #[must_use]
    pub const fn new(enabled: bool, threshold: f64) -> Self {
        Self { enabled, threshold }
    }
}

impl Advisor for GarbageCollectionAdvisor {
    fn name(&self) -> &'static str {
        "garbage_collection"
    }

    fn description(&self) -> String {
        format!(
            "Reports programs that spend at least {} of their execution time collecting garbage",
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
            RecordType::ProgramRuntime,
            MetricName::GarbageCollectionTime,
            window,
        )?;

        Ok(ratios
            .into_iter()
            .filter(|r| r.ratio >= self.threshold)
            .filter_map(|r| ctx.topology.program(r.program).map(|p| (p, r)))
            .map(|(program, r)| {
                Advice::builder(
                    "Garbage collection performance",
                    "Program {} spends {} of its execution time in garbage collection",
                )
                .entity(program)
                .percent(r.ratio)
                .solution("Increase the heap size of the program or reduce its allocation rate")
                .build()
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::advisors::tests::{FakeQueries, aggregate, topology, window};

    fn five_percent() -> FakeQueries {
        FakeQueries {
            aggregates: vec![
                (
                    RecordType::ProgramRuntime,
                    MetricName::GarbageCollectionTime,
                    vec![aggregate(2, 5.0)],
                ),
                (
                    RecordType::ProgramRuntime,
                    MetricName::ProgramDuration,
                    vec![aggregate(2, 100.0)],
                ),
            ],
            ..FakeQueries::default()
        }
    }

    fn run(threshold: f64) -> Vec<Advice> {
        let queries = five_percent();
        let app = topology();
        let ctx = AdvisorContext {
            queries: &queries,
            topology: &app,
        };
        GarbageCollectionAdvisor::new(true, threshold)
            .execute(&ctx, &window(0.0, 100.0))
            .expect("execute")
    }

    #[test]
    fn reports_ratio_as_percentage() {
        let advices = run(0.02);
        assert_eq!(advices.len(), 1);
        assert_eq!(
            advices[0].description(),
            "Program reducer spends 5.00% of its execution time in garbage collection"
        );
    }

    #[test]
    fn no_alert_when_below_threshold() {
        assert!(run(0.06).is_empty());
    }

    #[test]
    fn alert_at_exact_threshold() {
        assert_eq!(run(0.05).len(), 1);
    }

    #[test]
    fn zero_duration_gives_zero_ratio() {
        let queries = FakeQueries {
            aggregates: vec![
                (
                    RecordType::ProgramRuntime,
                    MetricName::GarbageCollectionTime,
                    vec![aggregate(0, 5.0)],
                ),
                (
                    RecordType::ProgramRuntime,
                    MetricName::ProgramDuration,
                    vec![aggregate(0, 0.0)],
                ),
            ],
            ..FakeQueries::default()
        };
        let app = topology();
        let ctx = AdvisorContext {
            queries: &queries,
            topology: &app,
        };
        let advices = GarbageCollectionAdvisor::new(true, 0.01)
            .execute(&ctx, &window(0.0, 1.0))
            .expect("execute");
        assert!(advices.is_empty());
    }
}
