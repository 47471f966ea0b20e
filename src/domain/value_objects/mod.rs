pub mod metric_name;
pub mod thresholds;
pub mod time_window;

pub use metric_name::{MemoryResource, MetricName, RecordType};
pub use thresholds::{AdvisorSettings, AdvisorThresholds};
pub use time_window::TimeWindow;
