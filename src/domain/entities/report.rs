use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::advice::{Advice, AdviceArgument};
use crate::domain::topology::TopologySnapshot;
use crate::domain::value_objects::TimeWindow;

/// Advice as written to a report: rendered text plus its structured parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedAdvice {
    pub name: String,
    pub description: String,
    pub template: String,
    pub arguments: Vec<AdviceArgument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&Advice> for ReportedAdvice {
    fn from(advice: &Advice) -> Self {
        Self {
            name: advice.name().to_string(),
            description: advice.description(),
            template: advice.template().to_string(),
            arguments: advice.arguments().to_vec(),
            solution: advice.solution().map(str::to_string),
            note: advice.note().map(str::to_string),
        }
    }
}

/// Output of one advisor run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceReport {
    pub generated_at: DateTime<Utc>,
    /// Window the advisors ran over; `None` when the store was empty.
    pub window: Option<TimeWindow>,
    pub advices: Vec<ReportedAdvice>,
    pub topology: TopologySnapshot,
}

impl AdviceReport {
    #[must_use]
    pub fn new(window: Option<TimeWindow>, advices: &[Advice], topology: TopologySnapshot) -> Self {
        Self {
            generated_at: Utc::now(),
            window,
            advices: advices.iter().map(ReportedAdvice::from).collect(),
            topology,
        }
    }
}
