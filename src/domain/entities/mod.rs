pub mod advice;
pub mod record;
pub mod report;
pub mod statistics;

pub use advice::{Advice, AdviceArgument, AdviceBuilder, EntityKind, EntityRef};
pub use record::{MetricSample, MetricValue, RecordHeader};
pub use report::{AdviceReport, ReportedAdvice};
pub use statistics::MetricStatistics;
