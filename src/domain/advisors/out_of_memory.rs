use std::collections::BTreeMap;

use crate::domain::entities::advice::{Advice, AdviceArgument};
use crate::domain::ports::store::ResourceSample;
use crate::domain::topology::{Program, ProgramId};
use crate::domain::value_objects::{MemoryResource, TimeWindow};

use super::regression::LinearFit;
use super::{Advisor, AdvisorContext, AdvisorError, resolve_program};

const NAME: &str = "Out of memory prediction";

/// Extrapolates memory growth per program and predicts when each resource
/// runs out.
pub struct OutOfMemoryAdvisor {
    enabled: bool,
    heap_threshold: f64,
    non_heap_threshold: f64,
    swap_threshold: f64,
}

/// Samples of one program for one resource.
#[derive(Default)]
struct Series {
    points: Vec<(f64, f64)>,
    limit: Option<f64>,
}

impl Series {
    fn push(&mut self, window: &TimeWindow, sample: &ResourceSample) {
        self.points.push((window.elapsed(sample.time), sample.used));
        if let Some(limit) = sample.limit.filter(|l| *l > 0.0) {
            self.limit = Some(self.limit.map_or(limit, |l| l.max(limit)));
        }
    }
}

impl OutOfMemoryAdvisor {
    #[must_use]
    pub const fn new(
        enabled: bool,
        heap_threshold: f64,
        non_heap_threshold: f64,
        swap_threshold: f64,
    ) -> Self {
        Self {
            enabled,
            heap_threshold,
            non_heap_threshold,
            swap_threshold,
        }
    }

    const fn threshold(&self, resource: MemoryResource) -> f64 {
        match resource {
            MemoryResource::Heap => self.heap_threshold,
            MemoryResource::NonHeap => self.non_heap_threshold,
            MemoryResource::Swap => self.swap_threshold,
        }
    }

    fn advise(
        program: &Program,
        resource: MemoryResource,
        fit: LinearFit,
        limit: Option<f64>,
        window: &TimeWindow,
    ) -> Advice {
        let exhaustion = limit.and_then(|l| fit.solve_for(l).map(|t| (l, t)));
        match exhaustion {
            Some((limit, offset)) => {
                let builder = Advice::builder(
                    NAME,
                    "{} of program {} grows by {} B/s and is predicted to reach its limit of {} B at {}, {} s after the start of the window",
                )
                .text(resource.label())
                .entity(program)
                .number(fit.slope, 2)
                .number(limit, 0);
                let builder = match window.instant_after(offset) {
                    Some(at) => builder.time(at),
                    None => builder.text("an unrepresentable time"),
                };
                builder
                    .number(offset, 2)
                    .solution("Give the program more memory or look for a leak")
                    .build()
            }
            None => {
                let note = if limit.is_none() {
                    "No capacity was reported, exhaustion time cannot be predicted"
                } else {
                    "Usage is flat"
                };
                Advice::builder(NAME, "{} of program {} grows by {} B/s")
                    .text(resource.label())
                    .entity(program)
                    .number(fit.slope, 2)
                    .note(note)
                    .build()
            }
        }
    }
}

impl Advisor for OutOfMemoryAdvisor {
    fn name(&self) -> &'static str {
        "out_of_memory"
    }

    fn description(&self) -> String {
        let rate = |value: f64| AdviceArgument::Number {
            value,
            precision: 2,
        };
        format!(
            "Predicts memory exhaustion of programs whose heap grows by at least {} B/s, non-heap by at least {} B/s or swap by at least {} B/s",
            rate(self.heap_threshold),
            rate(self.non_heap_threshold),
            rate(self.swap_threshold),
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
        let mut series: BTreeMap<(ProgramId, usize), Series> = BTreeMap::new();
        for (index, resource) in MemoryResource::ALL.into_iter().enumerate() {
            for sample in ctx.queries.resource_samples(resource, window)? {
                let program = resolve_program(ctx.topology, sample.global_rank)?;
                series
                    .entry((program.id(), index))
                    .or_default()
                    .push(window, &sample);
            }
        }

        let mut advices = Vec::new();
        for ((program_id, index), s) in series {
            let resource = MemoryResource::ALL[index];
            let Some(program) = ctx.topology.program(program_id) else {
                continue;
            };
            let Some(fit) = LinearFit::fit(&s.points) else {
                continue;
            };
            if fit.slope < self.threshold(resource) {
                continue;
            }
            tracing::debug!(
                program = program.name(),
                resource = resource.label(),
                slope = fit.slope,
                "memory growth above threshold"
            );
            advices.push(Self::advise(program, resource, fit, s.limit, window));
        }
        Ok(advices)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::advisors::tests::{FakeQueries, topology, window};

    fn sample(global_rank: u32, time: f64, used: f64, limit: Option<f64>) -> ResourceSample {
        ResourceSample {
            global_rank,
            time,
            used,
            limit,
        }
    }

    fn heap_growth(limit: Option<f64>) -> FakeQueries {
        FakeQueries {
            resources: vec![(
                MemoryResource::Heap,
                vec![
                    sample(2, 1_000.0, 100.0, limit),
                    sample(2, 1_010.0, 200.0, limit),
                    sample(2, 1_020.0, 300.0, limit),
                    sample(2, 1_030.0, 400.0, limit),
                ],
            )],
            ..FakeQueries::default()
        }
    }

    fn run(queries: &FakeQueries, heap_threshold: f64) -> Vec<Advice> {
        let app = topology();
        let ctx = AdvisorContext {
            queries,
            topology: &app,
        };
        OutOfMemoryAdvisor::new(true, heap_threshold, 0.0, 0.0)
            .execute(&ctx, &window(1_000.0, 1_030.0))
            .expect("execute")
    }

    #[test]
    fn predicts_exhaustion_from_linear_growth() {
        let advices = run(&heap_growth(Some(1_000.0)), 0.0);
        assert_eq!(advices.len(), 1);
        assert_eq!(
            advices[0].description(),
            "Heap memory of program reducer grows by 10.00 B/s and is predicted to reach its limit of 1000 B at 1970-01-01T00:18:10Z, 90.00 s after the start of the window"
        );
        let at = advices[0]
            .arguments()
            .iter()
            .find_map(|a| match a {
                crate::domain::entities::advice::AdviceArgument::Time { value } => Some(*value),
                _ => None,
            })
            .expect("time argument");
        assert_eq!(at.timestamp(), 1_090);
    }

    #[test]
    fn largest_positive_limit_wins() {
        let mut queries = heap_growth(Some(500.0));
        queries.resources[0].1.push(sample(2, 1_030.0, 400.0, Some(1_000.0)));
        queries.resources[0].1.push(sample(2, 1_030.0, 400.0, Some(-1.0)));
        let advices = run(&queries, 0.0);
        assert!(advices[0].description().contains("limit of 1000 B"));
    }

    #[test]
    fn unknown_limit_reports_growth_only() {
        let advices = run(&heap_growth(None), 0.0);
        assert_eq!(advices.len(), 1);
        assert_eq!(
            advices[0].description(),
            "Heap memory of program reducer grows by 10.00 B/s"
        );
        assert!(advices[0].note().is_some());
    }

    #[test]
    fn alert_at_exact_threshold() {
        assert_eq!(run(&heap_growth(None), 10.0).len(), 1);
    }

    #[test]
    fn no_alert_when_below_threshold() {
        assert!(run(&heap_growth(None), 10.0 + 1e-9).is_empty());
    }

    #[test]
    fn flat_usage_has_no_prediction() {
        let queries = FakeQueries {
            resources: vec![(
                MemoryResource::Swap,
                vec![
                    sample(0, 1_000.0, 50.0, Some(100.0)),
                    sample(1, 1_020.0, 50.0, Some(100.0)),
                ],
            )],
            ..FakeQueries::default()
        };
        let advices = run(&queries, 0.0);
        assert_eq!(advices.len(), 1);
        assert!(advices[0].description().starts_with("Swap space of program mapper"));
        assert_eq!(advices[0].note(), Some("Usage is flat"));
    }

    #[test]
    fn unknown_rank_fails_the_run() {
        let queries = FakeQueries {
            resources: vec![(
                MemoryResource::NonHeap,
                vec![sample(77, 1_000.0, 1.0, None)],
            )],
            ..FakeQueries::default()
        };
        let app = topology();
        let ctx = AdvisorContext {
            queries: &queries,
            topology: &app,
        };
        let result = OutOfMemoryAdvisor::new(true, 0.0, 0.0, 0.0).execute(&ctx, &window(0.0, 1.0));
        assert!(matches!(result, Err(AdvisorError::UnresolvedRank(77))));
    }

    #[test]
    fn description_uses_fixed_point_rates() {
        let advisor = OutOfMemoryAdvisor::new(true, 1.0, 0.5, 1024.0);
        let text = advisor.description();
        assert!(text.contains("heap grows by at least 1.00 B/s"));
        assert!(text.contains("non-heap by at least 0.50 B/s"));
        assert!(text.contains("swap by at least 1024.00 B/s"));
    }
}
