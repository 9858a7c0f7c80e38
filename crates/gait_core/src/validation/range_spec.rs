//! Range specifications: (task, feature, phase-bin) → [min, max].
//!
//! The source form is the nested mapping delivered by the config layer:
//!
//! ```yaml
//! level_walking:
//!   knee_flexion_angle_ipsi_rad:
//!     - { phase_range: [0, 50], min: -0.1, max: 1.2 }
//!     - { phase_range: [50, 100], min: 0.0, max: 1.4 }
//! ```
//!
//! Per (task, feature) the bins must partition [0, 100]: sorted by lower
//! edge, starting at 0, each bin starting where the previous one ends, the
//! last ending at 100. A bin may omit `min` and/or `max`; a bin with neither
//! bound marks its phase window as not applicable. Bins are half-open
//! `[lo, hi)` except the last, which is closed.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::patterns::phase_percent;
use crate::error::{AnalysisError, Result};

/// Tolerance for bin edge comparisons, in percent.
const EDGE_EPS: f64 = 1e-9;

/// One bin as written in a range-spec file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhaseRangeEntry {
    /// [lo%, hi%]
    pub phase_range: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Nested source mapping: task → feature → bins.
pub type RangeSpecSource = BTreeMap<String, BTreeMap<String, Vec<PhaseRangeEntry>>>;

/// Validated phase bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhaseBin {
    pub lo: f64,
    pub hi: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PhaseBin {
    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Inclusive bound check.
    pub fn admits(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }

    /// Distance outside the bounds; 0 when admitted.
    pub fn excess(&self, value: f64) -> f64 {
        let below = self.min.map_or(0.0, |m| m - value);
        let above = self.max.map_or(0.0, |m| value - m);
        below.max(above).max(0.0)
    }
}

/// Validated bins for one (task, feature).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRanges {
    bins: Vec<PhaseBin>,
}

impl FeatureRanges {
    fn from_entries(task: &str, feature: &str, entries: &[PhaseRangeEntry]) -> Result<Self> {
        let invalid = |reason: String| AnalysisError::InvalidRangeSpec {
            task: task.to_string(),
            feature: feature.to_string(),
            reason,
        };

        if entries.is_empty() {
            return Err(invalid("no phase bins".to_string()));
        }

        let mut bins = Vec::with_capacity(entries.len());
        for entry in entries {
            let [lo, hi] = entry.phase_range;
            if !lo.is_finite() || !hi.is_finite() || lo < -EDGE_EPS || hi > 100.0 + EDGE_EPS {
                return Err(invalid(format!("phase range [{}, {}] outside [0, 100]", lo, hi)));
            }
            if hi - lo <= EDGE_EPS {
                return Err(invalid(format!("empty phase range [{}, {}]", lo, hi)));
            }
            if entry.min.is_some_and(|v| !v.is_finite()) || entry.max.is_some_and(|v| !v.is_finite()) {
                return Err(invalid(format!("non-finite bound in [{}, {}]", lo, hi)));
            }
            if let (Some(min), Some(max)) = (entry.min, entry.max) {
                if min > max {
                    return Err(invalid(format!("min {} > max {} in [{}, {}]", min, max, lo, hi)));
                }
            }
            bins.push(PhaseBin {
                lo,
                hi,
                min: entry.min,
                max: entry.max,
            });
        }

        bins.sort_by(|a, b| a.lo.total_cmp(&b.lo));

        if bins[0].lo.abs() > EDGE_EPS {
            return Err(invalid(format!("bins start at {}, not 0", bins[0].lo)));
        }
        for pair in bins.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.lo < prev.hi - EDGE_EPS {
                return Err(invalid(format!(
                    "overlapping bins [{}, {}] and [{}, {}]",
                    prev.lo, prev.hi, next.lo, next.hi
                )));
            }
            if next.lo > prev.hi + EDGE_EPS {
                return Err(invalid(format!("gap between {} and {}", prev.hi, next.lo)));
            }
        }
        let last = bins[bins.len() - 1];
        if (last.hi - 100.0).abs() > EDGE_EPS {
            return Err(invalid(format!("bins end at {}, not 100", last.hi)));
        }

        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[PhaseBin] {
        &self.bins
    }

    /// Bin containing `percent`.
    pub fn bin_index(&self, percent: f64) -> Option<usize> {
        if !(-EDGE_EPS..=100.0 + EDGE_EPS).contains(&percent) {
            return None;
        }
        // bins are sorted and contiguous, so the first upper edge above
        // `percent` identifies the bin; 100% falls through to the last one
        let last = self.bins.len() - 1;
        Some(
            self.bins
                .iter()
                .position(|b| percent < b.hi - EDGE_EPS)
                .unwrap_or(last),
        )
    }

    /// Bin index for every phase index of a P-point cycle.
    pub fn phase_bin_map(&self, phase_points: usize) -> Vec<Option<usize>> {
        (0..phase_points)
            .map(|p| self.bin_index(phase_percent(p, phase_points)))
            .collect()
    }

    fn to_entries(&self) -> Vec<PhaseRangeEntry> {
        self.bins
            .iter()
            .map(|b| PhaseRangeEntry {
                phase_range: [b.lo, b.hi],
                min: b.min,
                max: b.max,
            })
            .collect()
    }
}

/// Validated, read-only range specification for a validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeSpec {
    tasks: BTreeMap<String, BTreeMap<String, FeatureRanges>>,
}

impl RangeSpec {
    /// Validate a nested source mapping. Any structural defect aborts.
    pub fn from_source(source: &RangeSpecSource) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for (task, features) in source {
            let mut validated = BTreeMap::new();
            for (feature, entries) in features {
                validated.insert(
                    feature.clone(),
                    FeatureRanges::from_entries(task, feature, entries)?,
                );
            }
            tasks.insert(task.clone(), validated);
        }
        Ok(Self { tasks })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let source: RangeSpecSource = serde_yaml::from_str(yaml)
            .map_err(|e| AnalysisError::InvalidConfig(format!("range spec: {}", e)))?;
        Self::from_source(&source)
    }

    pub fn to_source(&self) -> RangeSpecSource {
        self.tasks
            .iter()
            .map(|(task, features)| {
                let features = features
                    .iter()
                    .map(|(feature, ranges)| (feature.clone(), ranges.to_entries()))
                    .collect();
                (task.clone(), features)
            })
            .collect()
    }

    pub fn has_task(&self, task: &str) -> bool {
        self.tasks.contains_key(task)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn features_for(&self, task: &str) -> Vec<&str> {
        self.tasks
            .get(task)
            .map(|f| f.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn feature_ranges(&self, task: &str, feature: &str) -> Option<&FeatureRanges> {
        self.tasks.get(task)?.get(feature)
    }

    /// Bound covering `phase_index` for (task, feature), if any.
    pub fn bound(
        &self,
        task: &str,
        feature: &str,
        phase_index: usize,
        phase_points: usize,
    ) -> Option<&PhaseBin> {
        let ranges = self.feature_ranges(task, feature)?;
        let idx = ranges.bin_index(phase_percent(phase_index, phase_points))?;
        ranges.bins.get(idx).filter(|b| b.is_bounded())
    }
}
