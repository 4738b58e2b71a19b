//! @ai:module:intent Per-task zero-score counting over an assessment table
//! @ai:module:layer application
//! @ai:module:public_api ZeroScoreAggregator
//! @ai:module:stateless true

use crate::metrics::types::{Aggregation, AggregationResult, TaskAggregate};
use crate::table::AssessmentTable;
use std::collections::HashMap;

/// @ai:intent Trait for zero-score aggregation
pub trait AggregatorTrait: Send + Sync {
    /// @ai:intent Count zero scores per selected task
    fn aggregate(&self, table: &AssessmentTable, task_ids: &[String]) -> Aggregation;
}

/// @ai:intent Computes zero counts and percentages, excluding missing values
pub struct ZeroScoreAggregator {
    display_names: HashMap<String, String>,
}

impl ZeroScoreAggregator {
    /// @ai:intent Create an aggregator that labels tasks with the given display names
    /// @ai:effects pure
    pub fn new(display_names: HashMap<String, String>) -> Self {
        Self { display_names }
    }

    fn display_name(&self, task_id: &str) -> String {
        self.display_names
            .get(task_id)
            .cloned()
            .unwrap_or_else(|| task_id.to_string())
    }

    /// @ai:intent Count zeros and non-missing values for one column
    /// @ai:effects pure
    fn count_zeros(table: &AssessmentTable, task_id: &str) -> (u32, u32) {
        table
            .column_values(task_id)
            .flatten()
            .fold((0u32, 0u32), |(zeros, total), value| {
                (zeros + u32::from(value == 0.0), total + 1)
            })
    }
}

impl Default for ZeroScoreAggregator {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl AggregatorTrait for ZeroScoreAggregator {
    /// @ai:pre every task id names a column of `table` (filter with available_tasks first)
    /// @ai:post every aggregate has 0 <= zero_count <= total_count and total_count > 0
    /// @ai:effects pure
    fn aggregate(&self, table: &AssessmentTable, task_ids: &[String]) -> Aggregation {
        if task_ids.is_empty() {
            return Aggregation::Empty;
        }

        let mut aggregates = Vec::with_capacity(task_ids.len());
        let mut skipped = Vec::new();

        for task_id in task_ids {
            let (zero_count, total_count) = Self::count_zeros(table, task_id);

            if total_count == 0 {
                tracing::warn!("Task {} has no recorded scores; excluding it", task_id);
                skipped.push(task_id.clone());
                continue;
            }

            let zero_percentage = round2(100.0 * zero_count as f64 / total_count as f64);
            tracing::debug!(
                "{}: {}/{} zero scores ({}%)",
                task_id,
                zero_count,
                total_count,
                zero_percentage
            );

            aggregates.push(TaskAggregate {
                task_id: task_id.clone(),
                display_name: self.display_name(task_id),
                zero_count,
                total_count,
                zero_percentage,
            });
        }

        Aggregation::Computed(AggregationResult {
            aggregates,
            selection: task_ids.to_vec(),
            skipped,
        })
    }
}

/// @ai:intent Round to two decimals, halves away from zero
/// @ai:effects pure
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
