//! Structured output consumed by the reporting layer.
//!
//! All types serialize with serde and publish a JSON schema through
//! schemars. Undefined floating-point statistics are emitted as `null`.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    DistributionSummary, FeatureStatistics, OutlierReport, SymmetryReport,
};
use crate::data::is_angle;
use crate::error::Result;
use crate::validation::GroupValidation;

/// Why a pass rate has no numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RateStatus {
    /// Range spec exists but no stride was evaluable
    Undefined,
    /// No range spec exists for the task
    NoValidation,
}

/// Percentage of passing strides, or the reason there is none.
///
/// Serializes as a bare number, `"undefined"` or `"no_validation"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PassRate {
    Defined(f64),
    Unavailable(RateStatus),
}

impl PassRate {
    /// `passing / evaluated × 100`, rounded; `Undefined` when nothing was evaluated.
    pub fn from_counts(passing: usize, evaluated: usize, decimals: u32) -> Self {
        if evaluated == 0 {
            return PassRate::Unavailable(RateStatus::Undefined);
        }
        PassRate::Defined(round_percent(
            passing as f64 / evaluated as f64 * 100.0,
            decimals,
        ))
    }

    pub fn no_validation() -> Self {
        PassRate::Unavailable(RateStatus::NoValidation)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            PassRate::Defined(v) => Some(*v),
            PassRate::Unavailable(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, PassRate::Defined(_))
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_percent(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

fn defined(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn defined_all(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| defined(v)).collect()
}

/// Per-feature pattern output for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureSummary {
    pub feature: String,
    /// Angle-like feature; values are radians
    pub angle: bool,
    pub mean_pattern: Vec<Option<f64>>,
    pub std_pattern: Vec<Option<f64>>,
    pub rom: DistributionSummary,
    /// Cycles without a ROM because of missing values
    pub rom_excluded_cycles: usize,
    pub peak_max_timing: DistributionSummary,
    pub peak_min_timing: DistributionSummary,
}

impl From<&FeatureStatistics> for FeatureSummary {
    fn from(stats: &FeatureStatistics) -> Self {
        Self {
            feature: stats.feature.clone(),
            angle: is_angle(&stats.feature),
            mean_pattern: defined_all(&stats.mean_pattern),
            std_pattern: defined_all(&stats.std_pattern),
            rom: stats.rom_summary(),
            rom_excluded_cycles: stats.rom.len() - stats.valid_rom_count(),
            peak_max_timing: stats.peak_max_timing(),
            peak_min_timing: stats.peak_min_timing(),
        }
    }
}

/// Symmetry output for one bilateral pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SymmetrySummary {
    pub ipsi_feature: String,
    pub contra_feature: String,
    pub indices: Vec<Option<f64>>,
    pub mean_index: Option<f64>,
    pub defined_cycles: usize,
    pub phase_correlation: Vec<Option<f64>>,
}

impl From<&SymmetryReport> for SymmetrySummary {
    fn from(report: &SymmetryReport) -> Self {
        Self {
            ipsi_feature: report.ipsi_feature.clone(),
            contra_feature: report.contra_feature.clone(),
            indices: defined_all(&report.indices),
            mean_index: defined(report.mean_index()),
            defined_cycles: report.defined_cycles(),
            phase_correlation: defined_all(&report.phase_correlation),
        }
    }
}

/// Everything reported for one (subject, task) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupSummary {
    pub subject: String,
    pub task: String,
    pub complete_cycles: usize,
    pub incomplete_cycles: usize,
    pub row_issues: usize,
    pub cycle_ids: Vec<i64>,
    pub features: Vec<FeatureSummary>,
    pub symmetry: Vec<SymmetrySummary>,
    pub outliers: OutlierReport,
    pub pass_rate: PassRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<GroupValidation>,
}

/// Stride counts and pass rate for one task across subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskSummary {
    pub task: String,
    pub subjects: Vec<String>,
    /// Complete cycles
    pub total_strides: usize,
    pub evaluated_strides: usize,
    pub passing_strides: usize,
    pub failing_strides: usize,
    pub not_applicable_strides: usize,
    pub pass_rate: PassRate,
    /// Feature → failing strides with an out-of-range point
    pub feature_violations: BTreeMap<String, usize>,
}

/// Items left out of the statistics, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkipCounts {
    pub incomplete_cycles: usize,
    pub row_issues: usize,
    pub not_applicable_cycles: usize,
    pub unvalidated_cycles: usize,
    pub failed_groups: usize,
}

/// A group whose analysis returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupFailure {
    pub subject: String,
    pub task: String,
    pub error: String,
}

/// Dataset-level totals over tasks that have a range spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverallSummary {
    pub total_strides: usize,
    pub evaluated_strides: usize,
    pub passing_strides: usize,
    pub pass_rate: PassRate,
    pub tasks_validated: usize,
    pub tasks_without_validation: usize,
}

/// Terminal result of a dataset analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetSummary {
    pub overall: OverallSummary,
    pub tasks: BTreeMap<String, TaskSummary>,
    pub groups: Vec<GroupSummary>,
    pub skipped: SkipCounts,
    pub failures: Vec<GroupFailure>,
}

impl DatasetSummary {
    pub fn group(&self, subject: &str, task: &str) -> Option<&GroupSummary> {
        self.groups
            .iter()
            .find(|g| g.subject == subject && g.task == task)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON schema of the output document.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DatasetSummary)
    }
}
