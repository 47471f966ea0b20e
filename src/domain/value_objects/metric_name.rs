use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Record types the advisors know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    ProgramRuntime,
    DataTransfer,
    ResourceUsage,
}

impl RecordType {
    pub const ALL: [Self; 3] = [Self::ProgramRuntime, Self::DataTransfer, Self::ResourceUsage];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProgramRuntime => "ProgramRuntime",
            Self::DataTransfer => "DataTransfer",
            Self::ResourceUsage => "ResourceUsage",
        }
    }

    /// Metric names carried by records of this type.
    #[must_use]
    pub const fn metrics(self) -> &'static [MetricName] {
        match self {
            Self::ProgramRuntime => &[
                MetricName::GlobalRank,
                MetricName::StartTimestamp,
                MetricName::ProgramDuration,
                MetricName::GarbageCollectionTime,
            ],
            Self::DataTransfer => &[MetricName::GlobalRank, MetricName::SendReceiveDuration],
            Self::ResourceUsage => &[
                MetricName::GlobalRank,
                MetricName::HeapMemoryUsed,
                MetricName::HeapMemoryMax,
                MetricName::NonHeapMemoryUsed,
                MetricName::NonHeapMemoryMax,
                MetricName::SwapSpaceUsed,
                MetricName::SwapSpaceTotal,
            ],
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown record type '{s}'"))
    }
}

/// The fixed catalog of metric names. Only these names are ever joined on
/// by the advisor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricName {
    GlobalRank,
    StartTimestamp,
    ProgramDuration,
    GarbageCollectionTime,
    SendReceiveDuration,
    HeapMemoryUsed,
    HeapMemoryMax,
    NonHeapMemoryUsed,
    NonHeapMemoryMax,
    SwapSpaceUsed,
    SwapSpaceTotal,
}

impl MetricName {
    pub const ALL: [Self; 11] = [
        Self::GlobalRank,
        Self::StartTimestamp,
        Self::ProgramDuration,
        Self::GarbageCollectionTime,
        Self::SendReceiveDuration,
        Self::HeapMemoryUsed,
        Self::HeapMemoryMax,
        Self::NonHeapMemoryUsed,
        Self::NonHeapMemoryMax,
        Self::SwapSpaceUsed,
        Self::SwapSpaceTotal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlobalRank => "GlobalRank",
            Self::StartTimestamp => "StartTimestamp",
            Self::ProgramDuration => "ProgramDuration",
            Self::GarbageCollectionTime => "GarbageCollectionTime",
            Self::SendReceiveDuration => "SendReceiveDuration",
            Self::HeapMemoryUsed => "HeapMemoryUsed",
            Self::HeapMemoryMax => "HeapMemoryMax",
            Self::NonHeapMemoryUsed => "NonHeapMemoryUsed",
            Self::NonHeapMemoryMax => "NonHeapMemoryMax",
            Self::SwapSpaceUsed => "SwapSpaceUsed",
            Self::SwapSpaceTotal => "SwapSpaceTotal",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

/// Memory resources tracked by the out-of-memory predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryResource {
    Heap,
    NonHeap,
    Swap,
}

impl MemoryResource {
    pub const ALL: [Self; 3] = [Self::Heap, Self::NonHeap, Self::Swap];

    #[must_use]
    pub const fn used(self) -> MetricName {
        match self {
            Self::Heap => MetricName::HeapMemoryUsed,
            Self::NonHeap => MetricName::NonHeapMemoryUsed,
            Self::Swap => MetricName::SwapSpaceUsed,
        }
    }

    #[must_use]
    pub const fn limit(self) -> MetricName {
        match self {
            Self::Heap => MetricName::HeapMemoryMax,
            Self::NonHeap => MetricName::NonHeapMemoryMax,
            Self::Swap => MetricName::SwapSpaceTotal,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Heap => "Heap memory",
            Self::NonHeap => "Non-heap memory",
            Self::Swap => "Swap space",
        }
    }
}

impl fmt::Display for MemoryResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
