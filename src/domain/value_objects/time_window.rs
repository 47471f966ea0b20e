use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive range of record times, in seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    /// Returns `None` when a bound is not finite or `start > end`.
    #[must_use]
    pub fn new(start: f64, end: f64) -> Option<Self> {
        (start.is_finite() && end.is_finite() && start <= end).then_some(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> f64 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> f64 {
        self.end
    }

    /// Seconds between the window start and `time`.
    #[must_use]
    pub fn elapsed(&self, time: f64) -> f64 {
        time - self.start
    }

    /// Wall-clock time `offset` seconds after the window start.
    #[must_use]
    pub fn instant_after(&self, offset: f64) -> Option<DateTime<Utc>> {
        epoch_to_datetime(self.start + offset)
    }

    /// Narrows the window with optional explicit bounds.
    #[must_use]
    pub fn restrict(&self, from: Option<f64>, to: Option<f64>) -> Option<Self> {
        Self::new(
            from.map_or(self.start, |f| f.max(self.start)),
            to.map_or(self.end, |t| t.min(self.end)),
        )
    }
}

/// Converts epoch seconds to a UTC timestamp, millisecond precision.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn epoch_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}
