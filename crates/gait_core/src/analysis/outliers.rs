//! # Outlier Detector
//!
//! Flags anomalous cycles from a per-cycle scalar (ROM by default).
//!
//! ## Rules
//! - `Iqr`: value < Q1 − 1.5·IQR or value > Q3 + 1.5·IQR
//! - `ZScore`: |value − mean| / std > 3 (population std)
//! - `ModifiedZScore`: |0.6745·(value − median) / MAD| > 3.5
//!
//! NaN values are never flagged and never enter the reference statistics.
//! Degenerate spreads (zero std or zero MAD) flag nothing.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::descriptive::{finite, median_sorted, nan_std, quantile_sorted, sorted};
use super::patterns::{cycle_means, PatternStatistics};
use crate::cycles::CycleTensor;

pub const IQR_FENCE: f64 = 1.5;
pub const Z_SCORE_THRESHOLD: f64 = 3.0;
pub const MODIFIED_Z_THRESHOLD: f64 = 3.5;
/// Φ⁻¹(0.75), scales MAD to σ for normal data
pub const MODIFIED_Z_SCALE: f64 = 0.6745;

/// Outlier rule selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    #[default]
    Iqr,
    ZScore,
    ModifiedZScore,
}

/// Per-cycle scalar the rule is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMetric {
    #[default]
    RangeOfMotion,
    MeanValue,
}

impl OutlierMethod {
    /// Flag outliers in `values`. Output is aligned with the input.
    pub fn detect(self, values: &[f64]) -> Vec<bool> {
        let reference = sorted(finite(values.iter().copied()));
        if reference.len() < 2 {
            return vec![false; values.len()];
        }

        match self {
            OutlierMethod::Iqr => {
                let q1 = quantile_sorted(&reference, 0.25);
                let q3 = quantile_sorted(&reference, 0.75);
                let iqr = q3 - q1;
                let lo = q1 - IQR_FENCE * iqr;
                let hi = q3 + IQR_FENCE * iqr;
                flag(values, |v| v < lo || v > hi)
            }
            OutlierMethod::ZScore => {
                let mean = reference.iter().sum::<f64>() / reference.len() as f64;
                let std = nan_std(reference.iter().copied(), 0);
                if std == 0.0 || !std.is_finite() {
                    return vec![false; values.len()];
                }
                flag(values, |v| ((v - mean) / std).abs() > Z_SCORE_THRESHOLD)
            }
            OutlierMethod::ModifiedZScore => {
                let median = median_sorted(&reference);
                let deviations = sorted(reference.iter().map(|v| (v - median).abs()).collect());
                let mad = median_sorted(&deviations);
                if mad == 0.0 || !mad.is_finite() {
                    return vec![false; values.len()];
                }
                flag(values, |v| {
                    (MODIFIED_Z_SCALE * (v - median) / mad).abs() > MODIFIED_Z_THRESHOLD
                })
            }
        }
    }
}

fn flag(values: &[f64], is_outlier: impl Fn(f64) -> bool) -> Vec<bool> {
    values
        .iter()
        .map(|&v| v.is_finite() && is_outlier(v))
        .collect()
}

/// Free-function form of [`OutlierMethod::detect`].
pub fn detect(values: &[f64], method: OutlierMethod) -> Vec<bool> {
    method.detect(values)
}

/// Positions flagged in a detection mask.
pub fn outlier_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &flagged)| flagged.then_some(i))
        .collect()
}

/// Outlier cycles for one (subject, task) group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    pub metric: OutlierMetric,
    /// Feature → flagged cycle ids
    pub by_feature: BTreeMap<String, Vec<i64>>,
    /// Union over features, ascending
    pub cycle_ids: Vec<i64>,
}

/// Apply `method` to `metric` for every feature of a tensor.
pub fn detect_cycle_outliers(
    tensor: &CycleTensor,
    stats: &PatternStatistics,
    method: OutlierMethod,
    metric: OutlierMetric,
) -> OutlierReport {
    let ids = tensor.cycle_ids();
    let mut by_feature = BTreeMap::new();
    let mut union = BTreeSet::new();

    for (f, feature_stats) in stats.features.iter().enumerate() {
        let values: Vec<f64> = match metric {
            OutlierMetric::RangeOfMotion => feature_stats
                .rom
                .iter()
                .map(|r| r.unwrap_or(f64::NAN))
                .collect(),
            OutlierMetric::MeanValue => cycle_means(tensor, f),
        };

        let flagged: Vec<i64> = outlier_indices(&method.detect(&values))
            .into_iter()
            .map(|i| ids[i])
            .collect();
        union.extend(flagged.iter().copied());
        by_feature.insert(feature_stats.feature.clone(), flagged);
    }

    OutlierReport {
        method,
        metric,
        by_feature,
        cycle_ids: union.into_iter().collect(),
    }
}
