//! @ai:module:intent EGRA/EGMA zero-score dashboard library
//! @ai:module:layer application
//! @ai:module:public_api config, i18n, table, metrics, narrative, report

pub mod config;
pub mod i18n;
pub mod metrics;
pub mod narrative;
pub mod report;
pub mod table;

pub use config::DashboardConfig;
pub use i18n::{Catalog, Locale, LocalizationStore};
pub use metrics::{Aggregation, AggregationResult, TaskAggregate, ZeroScoreAggregator};
pub use narrative::{GeminiClient, NarrativeOutcome, NarrativePipeline, TextGenerator};
pub use report::{ReportGenerator, ReportSpec, ReportSynthesizer};
pub use table::{AssessmentTable, TableLoader};
