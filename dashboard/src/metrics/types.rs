//! @ai:module:intent Zero-score aggregate types and severity tiers
//! @ai:module:layer domain
//! @ai:module:public_api TaskAggregate, AggregationResult, Aggregation, Severity, ExecutiveSummary
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// Lower bound of the "monitor" tier, in percent.
pub const MONITOR_THRESHOLD: f64 = 10.0;
/// Lower bound of the "concerning" tier, in percent.
pub const CONCERNING_THRESHOLD: f64 = 20.0;
/// Lower bound of the "critical" tier, in percent.
pub const CRITICAL_THRESHOLD: f64 = 30.0;

/// @ai:intent Interpretation tier for a zero-score percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Acceptable,
    Monitor,
    Concerning,
    Critical,
}

impl Severity {
    /// @ai:intent Classify a percentage: <10 acceptable, 10-20 monitor, 20-30 concerning, >=30 critical
    /// @ai:effects pure
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= CRITICAL_THRESHOLD {
            Severity::Critical
        } else if percentage >= CONCERNING_THRESHOLD {
            Severity::Concerning
        } else if percentage >= MONITOR_THRESHOLD {
            Severity::Monitor
        } else {
            Severity::Acceptable
        }
    }

    /// @ai:intent Localization key of the tier label
    /// @ai:effects pure
    pub fn label_key(&self) -> &'static str {
        match self {
            Severity::Acceptable => "level_acceptable",
            Severity::Monitor => "level_monitor",
            Severity::Concerning => "level_concerning",
            Severity::Critical => "level_critical",
        }
    }
}

/// @ai:intent Zero-score statistics for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAggregate {
    pub task_id: String,
    pub display_name: String,
    pub zero_count: u32,
    /// Non-missing records for this task; always > 0.
    pub total_count: u32,
    /// Rounded to two decimals at aggregation time.
    pub zero_percentage: f64,
}

impl TaskAggregate {
    pub fn severity(&self) -> Severity {
        Severity::from_percentage(self.zero_percentage)
    }
}

/// @ai:intent Ordered aggregates for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub aggregates: Vec<TaskAggregate>,
    /// The task selection the aggregates were computed from.
    pub selection: Vec<String>,
    /// Selected tasks left out because no record had a value for them.
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// @ai:intent Aggregates at exactly the given tier, in result order
    /// @ai:effects pure
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &TaskAggregate> {
        self.aggregates.iter().filter(move |a| a.severity() == severity)
    }
}

/// @ai:intent Outcome of an aggregation run
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// No task was selected; nothing to analyze.
    Empty,
    Computed(AggregationResult),
}

impl Aggregation {
    pub fn into_result(self) -> Option<AggregationResult> {
        match self {
            Aggregation::Empty => None,
            Aggregation::Computed(result) => Some(result),
        }
    }
}

/// @ai:intent Headline statistics shown at the top of every report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_tasks: usize,
    pub avg_percentage: f64,
    pub critical_count: usize,
    pub concerning_count: usize,
}

impl ExecutiveSummary {
    /// @ai:intent Compute summary statistics from a result
    /// @ai:effects pure
    pub fn from_result(result: &AggregationResult) -> Self {
        let total_tasks = result.aggregates.len();
        let avg_percentage = if total_tasks == 0 {
            0.0
        } else {
            result.aggregates.iter().map(|a| a.zero_percentage).sum::<f64>() / total_tasks as f64
        };

        Self {
            total_tasks,
            avg_percentage,
            critical_count: result.with_severity(Severity::Critical).count(),
            concerning_count: result.with_severity(Severity::Concerning).count(),
        }
    }
}
