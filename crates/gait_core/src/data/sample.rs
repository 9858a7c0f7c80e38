//! Flat input rows.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Feature name → value for one row. NaN marks a missing measurement.
pub type FeatureMap = FxHashMap<String, f64>;

/// One phase-normalized sample of one gait cycle.
///
/// `phase_index` is signed so that out-of-range indices coming from a data
/// source can be reported instead of wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub subject: String,
    pub task: String,
    pub cycle_id: i64,
    pub phase_index: i64,
    #[serde(default)]
    pub features: FeatureMap,
}

impl Sample {
    pub fn new(subject: &str, task: &str, cycle_id: i64, phase_index: i64) -> Self {
        Self {
            subject: subject.to_string(),
            task: task.to_string(),
            cycle_id,
            phase_index,
            features: FeatureMap::default(),
        }
    }

    /// Builder-style feature insertion.
    pub fn with_feature(mut self, name: &str, value: f64) -> Self {
        self.features.insert(name.to_string(), value);
        self
    }

    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    pub fn belongs_to(&self, subject: &str, task: &str) -> bool {
        self.subject == subject && self.task == task
    }
}

/// (subject, task) key identifying an independent analysis group.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
pub struct GroupKey {
    pub subject: String,
    pub task: String,
}

impl GroupKey {
    pub fn new(subject: &str, task: &str) -> Self {
        Self {
            subject: subject.to_string(),
            task: task.to_string(),
        }
    }

    pub fn of(sample: &Sample) -> Self {
        Self::new(&sample.subject, &sample.task)
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.subject, self.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_builder() {
        let s = Sample::new("S01", "level_walking", 3, 10)
            .with_feature("knee_flexion_angle_ipsi_rad", 0.42)
            .with_feature("hip_flexion_angle_ipsi_rad", f64::NAN);

        assert_eq!(s.feature("knee_flexion_angle_ipsi_rad"), Some(0.42));
        assert!(s.feature("hip_flexion_angle_ipsi_rad").unwrap().is_nan());
        assert_eq!(s.feature("ankle_dorsiflexion_angle_ipsi_rad"), None);
        assert!(s.belongs_to("S01", "level_walking"));
        assert!(!s.belongs_to("S02", "level_walking"));
    }

    #[test]
    fn test_group_key_ordering() {
        let mut keys = vec![
            GroupKey::new("S02", "run"),
            GroupKey::new("S01", "walk"),
            GroupKey::new("S01", "run"),
        ];
        keys.sort();
        assert_eq!(keys[0], GroupKey::new("S01", "run"));
        assert_eq!(keys[2].to_string(), "S02/run");
    }
}
