//! # Analysis Module
//!
//! Per-group statistics computed from a [`CycleTensor`](crate::cycles::CycleTensor).
//!
//! ## Submodules
//!
//! - `descriptive` - NaN-aware mean/std/quantile/correlation helpers
//! - `patterns` - ensemble patterns, range of motion, peak timing
//! - `symmetry` - bilateral symmetry index and phase correlation
//! - `outliers` - IQR, z-score and median-based outlier rules

pub mod descriptive;
pub mod outliers;
pub mod patterns;
pub mod symmetry;

pub use descriptive::DistributionSummary;
pub use outliers::{
    detect, detect_cycle_outliers, outlier_indices, OutlierMethod, OutlierMetric, OutlierReport,
};
pub use patterns::{
    mean_pattern, peak_value_and_timing, range_of_motion, std_pattern, CyclePeaks,
    FeatureStatistics, PatternStatistics, Peak,
};
pub use symmetry::{phase_correlation, symmetry_index, SymmetryAnalyzer, SymmetryReport};
