//! Aggregator: recommendations and the cross-phase report bundle

mod recommend;
mod report;

pub use recommend::{
    recommend, suggestion_for, AggregationError, Priority, Recommendation, DEFAULT_TOP_N,
    FALLBACK_SUGGESTION,
};
pub use report::{AggregatedReport, CategoryFindings, Summary};
