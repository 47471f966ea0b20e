use serde::{Deserialize, Serialize};

/// Thresholds at or above which the ratio and trend advisors emit advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorThresholds {
    /// Share of program time spent receiving data
    pub data_transfer_ratio: f64,
    /// Share of program time spent in garbage collection
    pub garbage_collection_ratio: f64,
    /// Heap growth rate in bytes per second
    pub heap_growth: f64,
    /// Non-heap growth rate in bytes per second
    pub non_heap_growth: f64,
    /// Swap growth rate in bytes per second
    pub swap_growth: f64,
}

impl Default for AdvisorThresholds {
    fn default() -> Self {
        Self {
            data_transfer_ratio: 0.0,
            garbage_collection_ratio: 0.0,
            heap_growth: 0.0,
            non_heap_growth: 0.0,
            swap_growth: 0.0,
        }
    }
}

/// Which advisors run, and with which thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorSettings {
    pub execution_times: bool,
    pub data_transfer: bool,
    pub garbage_collection: bool,
    pub out_of_memory: bool,
    pub thresholds: AdvisorThresholds,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            execution_times: true,
            data_transfer: true,
            garbage_collection: true,
            out_of_memory: true,
            thresholds: AdvisorThresholds::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_with_zero_thresholds() {
        let settings = AdvisorSettings::default();
        assert!(settings.execution_times && settings.out_of_memory);
        assert!(settings.thresholds.data_transfer_ratio.abs() < f64::EPSILON);
        assert!(settings.thresholds.swap_growth.abs() < f64::EPSILON);
    }

    #[test]
    fn serde_roundtrip() {
        let original = AdvisorSettings::default();
        let json = serde_json::to_string(&original).expect("serialize");
        let deserialized: AdvisorSettings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(original, deserialized);
    }
}
