use std::collections::BTreeMap;

use crate::domain::ports::store::RankAggregate;
use crate::domain::topology::{Application, ProgramId};
use crate::domain::value_objects::{MetricName, RecordType, TimeWindow};

use super::{AdvisorContext, AdvisorError, resolve_program};

/// Aggregate of one metric over every instance of a program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramTotals {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl ProgramTotals {
    const fn from_rank(aggregate: &RankAggregate) -> Self {
        Self {
            count: aggregate.count,
            sum: aggregate.sum,
            min: aggregate.min,
            max: aggregate.max,
        }
    }

    fn merge(&mut self, aggregate: &RankAggregate) {
        self.count += aggregate.count;
        self.sum += aggregate.sum;
        self.min = self.min.min(aggregate.min);
        self.max = self.max.max(aggregate.max);
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Folds per-rank aggregates into per-program totals, keyed in catalog order.
///
/// # Errors
///
/// Returns `AdvisorError::UnresolvedRank` when a rank has no instance in the
/// topology.
pub fn totals_by_program(
    topology: &Application,
    aggregates: &[RankAggregate],
) -> Result<BTreeMap<ProgramId, ProgramTotals>, AdvisorError> {
    let mut totals: BTreeMap<ProgramId, ProgramTotals> = BTreeMap::new();
    for aggregate in aggregates {
        let program = resolve_program(topology, aggregate.global_rank)?;
        totals
            .entry(program.id())
            .and_modify(|t| t.merge(aggregate))
            .or_insert_with(|| ProgramTotals::from_rank(aggregate));
    }
    Ok(totals)
}

/// Share of `ProgramDuration` that a program spends in `metric`, for every
/// program with data for `metric`. Sorted by descending ratio.
///
/// A program with no recorded duration has a ratio of zero.
///
/// # Errors
///
/// Returns `AdvisorError` when a query fails or a rank cannot be resolved.
pub fn ratio_by_program(
    ctx: &AdvisorContext<'_>,
    record_type: RecordType,
    metric: MetricName,
    window: &TimeWindow,
) -> Result<Vec<ProgramRatio>, AdvisorError> {
    let part = ctx
        .queries
        .aggregate_by_rank(record_type, metric, window)?;
    let whole = ctx.queries.aggregate_by_rank(
        RecordType::ProgramRuntime,
        MetricName::ProgramDuration,
        window,
    )?;
    let part = totals_by_program(ctx.topology, &part)?;
    let whole = totals_by_program(ctx.topology, &whole)?;

    let mut ratios: Vec<ProgramRatio> = part
        .into_iter()
        .map(|(program, totals)| {
            let duration = whole.get(&program).map_or(0.0, |t| t.sum);
            let ratio = if duration == 0.0 {
                0.0
            } else {
                totals.sum / duration
            };
            ProgramRatio {
                program,
                part: totals.sum,
                duration,
                ratio,
            }
        })
        .collect();
    ratios.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    Ok(ratios)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramRatio {
    pub program: ProgramId,
    pub part: f64,
    pub duration: f64,
    pub ratio: f64,
}
