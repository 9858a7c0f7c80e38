//! # Pattern Statistics
//!
//! Ensemble phase patterns, range of motion and peak timing for one
//! (subject, task) cycle tensor.
//!
//! All functions are pure over the tensor. Results are indexed
//! `[feature][...]` in the tensor's feature order.
//!
//! ## NaN handling
//! - Mean/std patterns skip NaN per phase point; an all-NaN phase point is NaN.
//! - A cycle with any NaN in a feature has no ROM for that feature.
//! - Peak search skips NaN points; an all-NaN trajectory has no peaks.
//!
//! Angles stay in radians. Degree conversion belongs to the presentation layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::descriptive::{nan_mean, nan_std, DistributionSummary};
use crate::cycles::CycleTensor;

/// Extremum of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Peak {
    pub value: f64,
    pub phase_index: usize,
    /// phase_index / (P - 1) × 100
    pub phase_percent: f64,
}

/// Maximum and minimum of one cycle's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CyclePeaks {
    pub max: Peak,
    pub min: Peak,
}

/// Everything PatternStatistics derives for a single feature.
#[derive(Debug, Clone)]
pub struct FeatureStatistics {
    pub feature: String,
    pub mean_pattern: Vec<f64>,
    pub std_pattern: Vec<f64>,
    /// Per cycle, `None` where the cycle has NaN at this feature
    pub rom: Vec<Option<f64>>,
    /// Per cycle, `None` where the trajectory is all NaN
    pub peaks: Vec<Option<CyclePeaks>>,
}

impl FeatureStatistics {
    pub fn rom_summary(&self) -> DistributionSummary {
        DistributionSummary::from_values(self.rom.iter().flatten().copied())
    }

    pub fn peak_max_timing(&self) -> DistributionSummary {
        DistributionSummary::from_values(self.peaks.iter().flatten().map(|p| p.max.phase_percent))
    }

    pub fn peak_min_timing(&self) -> DistributionSummary {
        DistributionSummary::from_values(self.peaks.iter().flatten().map(|p| p.min.phase_percent))
    }

    /// Cycles that contributed a ROM value.
    pub fn valid_rom_count(&self) -> usize {
        self.rom.iter().filter(|r| r.is_some()).count()
    }
}

/// Pattern statistics for every feature of a tensor.
#[derive(Debug, Clone)]
pub struct PatternStatistics {
    pub subject: String,
    pub task: String,
    pub cycle_ids: Vec<i64>,
    pub features: Vec<FeatureStatistics>,
}

impl PatternStatistics {
    pub fn compute(tensor: &CycleTensor) -> Self {
        let means = mean_pattern(tensor);
        let stds = std_pattern(tensor);
        let roms = range_of_motion(tensor);
        let peaks = peak_value_and_timing(tensor);

        let features = tensor
            .features()
            .iter()
            .zip(means)
            .zip(stds)
            .zip(roms)
            .zip(peaks)
            .map(|((((name, mean), std), rom), peaks)| FeatureStatistics {
                feature: name.clone(),
                mean_pattern: mean,
                std_pattern: std,
                rom,
                peaks,
            })
            .collect();

        Self {
            subject: tensor.subject().to_string(),
            task: tensor.task().to_string(),
            cycle_ids: tensor.cycle_ids().to_vec(),
            features,
        }
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureStatistics> {
        self.features.iter().find(|f| f.feature == name)
    }
}

/// Convert a phase index into percent of the gait cycle.
#[inline]
pub fn phase_percent(phase_index: usize, phase_points: usize) -> f64 {
    if phase_points < 2 {
        return 0.0;
    }
    phase_index as f64 / (phase_points - 1) as f64 * 100.0
}

/// Per feature, per phase point: mean across cycles.
pub fn mean_pattern(tensor: &CycleTensor) -> Vec<Vec<f64>> {
    per_phase(tensor, nan_mean)
}

/// Per feature, per phase point: sample standard deviation across cycles.
pub fn std_pattern(tensor: &CycleTensor) -> Vec<Vec<f64>> {
    per_phase(tensor, |values| nan_std(values, 1))
}

fn per_phase(tensor: &CycleTensor, stat: impl Fn(Vec<f64>) -> f64) -> Vec<Vec<f64>> {
    (0..tensor.n_features())
        .map(|f| {
            tensor
                .matrix(f)
                .column_iter()
                .map(|column| stat(column.iter().copied().collect()))
                .collect()
        })
        .collect()
}

/// Per feature, per cycle: max − min over the phase axis.
pub fn range_of_motion(tensor: &CycleTensor) -> Vec<Vec<Option<f64>>> {
    (0..tensor.n_features())
        .map(|f| {
            (0..tensor.n_cycles())
                .map(|c| trajectory_rom(&tensor.trajectory(c, f)))
                .collect()
        })
        .collect()
}

/// ROM of a trajectory; `None` if any point is NaN.
pub fn trajectory_rom(trajectory: &[f64]) -> Option<f64> {
    if trajectory.is_empty() || trajectory.iter().any(|v| v.is_nan()) {
        return None;
    }
    let (min, max) = trajectory
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Some(max - min)
}

/// Per feature, per cycle: max and min with phase timing.
pub fn peak_value_and_timing(tensor: &CycleTensor) -> Vec<Vec<Option<CyclePeaks>>> {
    let p = tensor.n_phases();
    (0..tensor.n_features())
        .map(|f| {
            (0..tensor.n_cycles())
                .map(|c| trajectory_peaks(&tensor.trajectory(c, f), p))
                .collect()
        })
        .collect()
}

/// First-occurrence max and min of a trajectory, skipping NaN.
pub fn trajectory_peaks(trajectory: &[f64], phase_points: usize) -> Option<CyclePeaks> {
    let mut max: Option<(usize, f64)> = None;
    let mut min: Option<(usize, f64)> = None;

    for (i, &v) in trajectory.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        // strict comparison keeps the lowest index on ties
        if max.map_or(true, |(_, m)| v > m) {
            max = Some((i, v));
        }
        if min.map_or(true, |(_, m)| v < m) {
            min = Some((i, v));
        }
    }

    let peak = |(i, v): (usize, f64)| Peak {
        value: v,
        phase_index: i,
        phase_percent: phase_percent(i, phase_points),
    };

    Some(CyclePeaks {
        max: peak(max?),
        min: peak(min?),
    })
}

/// Per cycle mean over the phase axis.
pub fn cycle_means(tensor: &CycleTensor, feature: usize) -> Vec<f64> {
    (0..tensor.n_cycles())
        .map(|c| nan_mean(tensor.trajectory(c, feature)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::CycleStore;
    use crate::data::Sample;

    fn tensor(cycles: &[Vec<f64>]) -> CycleTensor {
        let p = cycles[0].len();
        let mut rows = Vec::new();
        for (c, values) in cycles.iter().enumerate() {
            for (i, &v) in values.iter().enumerate() {
                let mut s = Sample::new("S01", "walk", c as i64, i as i64);
                if !v.is_nan() {
                    s = s.with_feature("x", v);
                }
                rows.push(s);
            }
        }
        CycleStore::new(&rows)
            .with_phase_points(p)
            .build_tensor("S01", "walk", &["x".to_string()])
            .unwrap()
            .tensor
    }

    #[test]
    fn test_mean_and_std_pattern() {
        let t = tensor(&[vec![1.0, 2.0, 3.0], vec![3.0, 4.0, f64::NAN]]);
        let mean = &mean_pattern(&t)[0];
        let std = &std_pattern(&t)[0];

        assert_eq!(mean, &vec![2.0, 3.0, 3.0]);
        assert!((std[0] - 2f64.sqrt()).abs() < 1e-12);
        // single finite value → undefined sample std
        assert!(std[2].is_nan());
    }

    #[test]
    fn test_all_nan_phase_point_is_nan() {
        let t = tensor(&[vec![1.0, f64::NAN], vec![2.0, f64::NAN]]);
        let mean = &mean_pattern(&t)[0];
        assert_eq!(mean[0], 1.5);
        assert!(mean[1].is_nan());
    }

    #[test]
    fn test_rom_excludes_cycles_with_nan() {
        let t = tensor(&[
            vec![0.0, 0.5, -0.2, 0.1],
            vec![0.0, f64::NAN, 0.3, 0.1],
            vec![1.0, 1.0, 1.0, 1.0],
        ]);
        let rom = &range_of_motion(&t)[0];
        assert!((rom[0].unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(rom[1], None);
        assert_eq!(rom[2], Some(0.0));
    }

    #[test]
    fn test_peak_timing_first_index_on_tie() {
        let p = 5;
        let peaks = trajectory_peaks(&[0.0, 2.0, 2.0, -1.0, -1.0], p).unwrap();
        assert_eq!(peaks.max.phase_index, 1);
        assert_eq!(peaks.max.value, 2.0);
        assert_eq!(peaks.max.phase_percent, 25.0);
        assert_eq!(peaks.min.phase_index, 3);
        assert_eq!(peaks.min.phase_percent, 75.0);
    }

    #[test]
    fn test_peaks_skip_nan_and_all_nan_is_none() {
        let peaks = trajectory_peaks(&[f64::NAN, 1.0, 3.0], 3).unwrap();
        assert_eq!(peaks.max.phase_index, 2);
        assert_eq!(peaks.min.phase_index, 1);
        assert!(trajectory_peaks(&[f64::NAN, f64::NAN], 2).is_none());
    }

    #[test]
    fn test_phase_percent_endpoints() {
        assert_eq!(phase_percent(0, 150), 0.0);
        assert_eq!(phase_percent(149, 150), 100.0);
    }

    #[test]
    fn test_compute_collects_summaries() {
        let t = tensor(&[vec![0.0, 1.0, 0.0], vec![0.0, 3.0, 0.0]]);
        let stats = PatternStatistics::compute(&t);
        let x = stats.feature("x").unwrap();

        assert_eq!(stats.cycle_ids, vec![0, 1]);
        assert_eq!(x.valid_rom_count(), 2);
        let rom = x.rom_summary();
        assert_eq!(rom.mean, Some(2.0));
        assert_eq!(x.peak_max_timing().mean, Some(50.0));
        assert_eq!(x.peak_min_timing().mean, Some(0.0));
        assert_eq!(cycle_means(&t, 0), vec![1.0 / 3.0, 1.0]);
    }
}
