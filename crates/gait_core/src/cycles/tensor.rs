//! Dense cycle tensor.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// [cycle][phase][feature] values for one (subject, task) group.
///
/// Only complete cycles are stored. Cycles are ordered by ascending cycle id.
/// The tensor is immutable once built; every statistic is a pure function of
/// it.
#[derive(Debug, Clone)]
pub struct CycleTensor {
    subject: String,
    task: String,
    features: Vec<String>,
    cycle_ids: Vec<i64>,
    phase_points: usize,
    /// Row-major storage, feature index fastest.
    data: Vec<f64>,
}

/// One (subject, task, cycle, phase, feature) value, as produced by
/// [`CycleTensor::flatten`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub subject: String,
    pub task: String,
    pub cycle_id: i64,
    pub phase_index: usize,
    pub feature: String,
    pub value: f64,
}

impl CycleTensor {
    pub(crate) fn new(
        subject: &str,
        task: &str,
        features: Vec<String>,
        cycle_ids: Vec<i64>,
        phase_points: usize,
        data: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(data.len(), cycle_ids.len() * phase_points * features.len());
        Self {
            subject: subject.to_string(),
            task: task.to_string(),
            features,
            cycle_ids,
            phase_points,
            data,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn cycle_ids(&self) -> &[i64] {
        &self.cycle_ids
    }

    pub fn n_cycles(&self) -> usize {
        self.cycle_ids.len()
    }

    pub fn n_phases(&self) -> usize {
        self.phase_points
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycle_ids.is_empty()
    }

    pub fn feature_index(&self, feature: &str) -> Option<usize> {
        self.features.iter().position(|f| f == feature)
    }

    #[inline]
    fn offset(&self, cycle: usize, phase: usize, feature: usize) -> usize {
        (cycle * self.phase_points + phase) * self.features.len() + feature
    }

    /// Value at (cycle index, phase index, feature index).
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    #[inline]
    pub fn get(&self, cycle: usize, phase: usize, feature: usize) -> f64 {
        assert!(cycle < self.n_cycles() && phase < self.phase_points && feature < self.n_features());
        self.data[self.offset(cycle, phase, feature)]
    }

    /// Phase trajectory of one feature in one cycle.
    pub fn trajectory(&self, cycle: usize, feature: usize) -> Vec<f64> {
        (0..self.phase_points)
            .map(|p| self.get(cycle, p, feature))
            .collect()
    }

    /// Trajectory looked up by cycle id and feature name.
    pub fn cycle_feature(&self, cycle_id: i64, feature: &str) -> Option<Vec<f64>> {
        let c = self.cycle_ids.iter().position(|&id| id == cycle_id)?;
        let f = self.feature_index(feature)?;
        Some(self.trajectory(c, f))
    }

    /// [cycle × phase] matrix of one feature by index.
    pub fn matrix(&self, feature: usize) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_cycles(), self.phase_points, |c, p| {
            self.get(c, p, feature)
        })
    }

    /// [cycle × phase] matrix of one feature by name.
    pub fn feature_series(&self, feature: &str) -> Option<DMatrix<f64>> {
        self.feature_index(feature).map(|f| self.matrix(f))
    }

    /// Expand back into flat records for every stored value.
    pub fn flatten(&self) -> Vec<FlatRecord> {
        let mut records = Vec::with_capacity(self.data.len());
        for (c, &cycle_id) in self.cycle_ids.iter().enumerate() {
            for p in 0..self.phase_points {
                for (f, feature) in self.features.iter().enumerate() {
                    records.push(FlatRecord {
                        subject: self.subject.clone(),
                        task: self.task.clone(),
                        cycle_id,
                        phase_index: p,
                        feature: feature.clone(),
                        value: self.get(c, p, f),
                    });
                }
            }
        }
        records
    }

    /// Memory held by the value buffer.
    pub fn estimated_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    /// Upper bound for a group before it is built.
    pub fn estimate_bytes(cycles: usize, phase_points: usize, features: usize) -> usize {
        cycles * phase_points * features * std::mem::size_of::<f64>()
    }
}
