//! @ai:module:intent JSON export of aggregation results
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter, JsonReporterTrait, JsonReport
//! @ai:module:stateless true

use crate::i18n::Locale;
use crate::metrics::{AggregationResult, ExecutiveSummary, Severity};
use crate::narrative::NarrativeOutcome;
use crate::report::ReportError;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

/// @ai:intent One task row in the JSON export
#[derive(Debug, Serialize)]
pub struct JsonTaskRow<'a> {
    pub task_id: &'a str,
    pub display_name: &'a str,
    pub zero_count: u32,
    pub total_count: u32,
    pub zero_percentage: f64,
    pub severity: Severity,
}

/// @ai:intent Serialized shape of `zero_scores_results.json`
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: NaiveDateTime,
    pub locale: Locale,
    pub summary: ExecutiveSummary,
    pub tasks: Vec<JsonTaskRow<'a>>,
    pub skipped: &'a [String],
    pub narrative: &'a NarrativeOutcome,
}

impl<'a> JsonReport<'a> {
    pub fn new(
        result: &'a AggregationResult,
        narrative: &'a NarrativeOutcome,
        locale: Locale,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            generated_at,
            locale,
            summary: ExecutiveSummary::from_result(result),
            tasks: result
                .aggregates
                .iter()
                .map(|a| JsonTaskRow {
                    task_id: &a.task_id,
                    display_name: &a.display_name,
                    zero_count: a.zero_count,
                    total_count: a.total_count,
                    zero_percentage: a.zero_percentage,
                    severity: a.severity(),
                })
                .collect(),
            skipped: &result.skipped,
            narrative,
        }
    }
}

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write the report as pretty-printed JSON
    fn generate(&self, report: &JsonReport<'_>, output_path: &Path) -> Result<(), ReportError>;
}

/// @ai:intent Generates JSON reports
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, report: &JsonReport<'_>, output_path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(output_path, json).map_err(|source| ReportError::Io {
            path: output_path.to_path_buf(),
            source,
        })
    }
}
