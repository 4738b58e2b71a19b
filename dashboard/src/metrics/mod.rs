//! @ai:module:intent Zero-score aggregation and summary statistics
//! @ai:module:layer application
//! @ai:module:public_api ZeroScoreAggregator, TaskAggregate, AggregationResult, Aggregation, Severity, ExecutiveSummary

pub mod aggregator;
pub mod types;

pub use aggregator::{round2, AggregatorTrait, ZeroScoreAggregator};
pub use types::{
    Aggregation, AggregationResult, ExecutiveSummary, Severity, TaskAggregate,
    CONCERNING_THRESHOLD, CRITICAL_THRESHOLD, MONITOR_THRESHOLD,
};
