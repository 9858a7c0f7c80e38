//! # gait_core - Gait-Cycle Analysis and Range Validation Engine
//!
//! Turns phase-normalized locomotion rows into per-cycle biomechanical
//! statistics and literature range checks.
//!
//! ## Features
//! - Ragged rows → dense [cycle][phase][feature] tensors (complete cycles only)
//! - Ensemble mean/std patterns, range of motion, peak value and timing
//! - Bilateral symmetry index and per-phase correlation
//! - IQR, z-score and modified z-score outlier rules
//! - Stride pass/fail against (task, feature, phase bin) bounds
//! - Serializable dataset summary with a published JSON schema
//!
//! ## Example
//! ```no_run
//! use gait_core::{analyze_dataset, AnalysisConfig, RangeSpec, Sample};
//!
//! let rows: Vec<Sample> = Vec::new();
//! let spec = RangeSpec::from_yaml_str("{}").unwrap();
//! let features = vec!["knee_flexion_angle_ipsi_rad".to_string()];
//! let summary = analyze_dataset(&rows, &features, Some(&spec), &AnalysisConfig::default());
//! ```

// Per-feature check tables are tuples of borrowed ranges and bin maps
#![allow(clippy::type_complexity)]

pub mod analysis;
pub mod config;
pub mod cycles;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod validation;

pub use analysis::{
    DistributionSummary, OutlierMethod, OutlierMetric, OutlierReport, PatternStatistics,
    SymmetryAnalyzer, SymmetryReport,
};
pub use config::{AnalysisConfig, PHASE_POINTS};
pub use cycles::{CycleStore, CycleTensor, FlatRecord, RowIssue, RowIssueKind, TensorBuild};
pub use data::{BilateralPair, DatasetCatalog, GroupKey, Sample};
pub use error::{AnalysisError, Result};
pub use pipeline::{analyze_dataset, AnalysisPipeline, GroupAnalysis};
pub use report::{DatasetSummary, PassRate, RateStatus, ResultAggregator};
pub use validation::{PassPolicy, RangeSpec, RangeSpecSource, RangeValidator, StrideState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the JSON output document
pub const SCHEMA_VERSION: &str = "1.0";
