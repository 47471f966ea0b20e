use serde::{Deserialize, Serialize};

/// Aggregate statistics of the numeric values of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    pub sum_of_squares: f64,
    /// Population variance
    pub variance: f64,
    /// Population standard deviation
    pub std_deviation: f64,
}

impl MetricStatistics {
    /// Derives mean and spread from raw sums. `None` when `count` is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_sums(count: u64, min: f64, max: f64, sum: f64, sum_of_squares: f64) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let avg = sum / n;
        // Rounding can push E[x²] − E[x]² slightly below zero.
        let variance = (sum_of_squares / n - avg * avg).max(0.0);
        Some(Self {
            count,
            min,
            max,
            avg,
            sum,
            sum_of_squares,
            variance,
            std_deviation: variance.sqrt(),
        })
    }
}
