//! # Report Module
//!
//! - `summary` - serializable output types and pass-rate rounding
//! - `aggregator` - merges group results into a [`DatasetSummary`]

pub mod aggregator;
pub mod summary;

pub use aggregator::ResultAggregator;
pub use summary::{
    round_percent, DatasetSummary, FeatureSummary, GroupFailure, GroupSummary, OverallSummary,
    PassRate, RateStatus, SkipCounts, SymmetrySummary, TaskSummary,
};
