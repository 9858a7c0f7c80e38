//! Validation result types.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-stride validation state.
///
/// `Unvalidated` is the initial state; evaluation moves a stride to exactly
/// one of the other three and never back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrideState {
    #[default]
    Unvalidated,
    Passed,
    Failed,
    /// No feature-phase check was applicable
    NotApplicable,
}

/// Out-of-range detail for one (feature, phase bin) in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    pub feature: String,
    pub bin_index: usize,
    pub phase_range: [f64; 2],
    pub points_out_of_range: usize,
    /// Value farthest outside the bounds
    pub worst_value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Evaluation of one stride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CycleValidation {
    pub cycle_id: i64,
    pub state: StrideState,
    pub points_evaluated: usize,
    pub points_in_range: usize,
    pub failing_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl CycleValidation {
    pub fn unvalidated(cycle_id: i64) -> Self {
        Self {
            cycle_id,
            state: StrideState::Unvalidated,
            points_evaluated: 0,
            points_in_range: 0,
            failing_features: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.state == StrideState::Passed
    }

    /// Fraction of evaluated points inside bounds; `None` if nothing was evaluated.
    pub fn in_range_fraction(&self) -> Option<f64> {
        (self.points_evaluated > 0)
            .then(|| self.points_in_range as f64 / self.points_evaluated as f64)
    }
}

/// Validation of every complete cycle of one (subject, task) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupValidation {
    pub subject: String,
    pub task: String,
    /// False when the range spec has no entry for the task
    pub spec_available: bool,
    pub cycles: Vec<CycleValidation>,
    /// Feature → cycles with at least one out-of-range point
    pub feature_violations: BTreeMap<String, usize>,
}

impl GroupValidation {
    fn count(&self, state: StrideState) -> usize {
        self.cycles.iter().filter(|c| c.state == state).count()
    }

    pub fn passing(&self) -> usize {
        self.count(StrideState::Passed)
    }

    pub fn failing(&self) -> usize {
        self.count(StrideState::Failed)
    }

    pub fn not_applicable(&self) -> usize {
        self.count(StrideState::NotApplicable)
    }

    /// Strides in the pass-rate denominator.
    pub fn evaluated(&self) -> usize {
        self.passing() + self.failing()
    }

    pub fn failed_cycle_ids(&self) -> Vec<i64> {
        self.cycles
            .iter()
            .filter(|c| c.state == StrideState::Failed)
            .map(|c| c.cycle_id)
            .collect()
    }
}
