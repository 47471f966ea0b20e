pub mod sink;
pub mod store;

pub use sink::{MetricSink, SinkError};
pub use store::{
    AdvisorQueries, MetricCondition, MetricStore, RankAggregate, RecordWriter, ResourceSample,
    StoreError,
};
