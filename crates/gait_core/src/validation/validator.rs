//! RangeValidator - checks every stride of a tensor against a [`RangeSpec`].
//!
//! Per (cycle, feature) each phase index is mapped to its bin; finite values
//! under a bounded bin are checked against `[min, max]` inclusive. Anything
//! else (missing spec entry, unbounded bin, NaN value) is skipped.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::range_spec::{FeatureRanges, RangeSpec};
use super::result::{CycleValidation, GroupValidation, StrideState, Violation};
use crate::cycles::CycleTensor;

/// Rule deciding whether an evaluated stride passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassPolicy {
    /// Every evaluated point must be in range
    #[default]
    AllPoints,
    /// At least `fraction` of evaluated points must be in range
    MinFraction { fraction: f64 },
}

impl PassPolicy {
    pub fn passes(&self, points_in_range: usize, points_evaluated: usize) -> bool {
        match *self {
            PassPolicy::AllPoints => points_in_range == points_evaluated,
            PassPolicy::MinFraction { fraction } => {
                points_in_range as f64 >= fraction * points_evaluated as f64
            }
        }
    }
}

/// Per-bin tally while walking one trajectory.
struct BinTally {
    out_of_range: usize,
    worst_value: f64,
    worst_excess: f64,
}

pub struct RangeValidator<'a> {
    spec: &'a RangeSpec,
    policy: PassPolicy,
    record_violations: bool,
}

impl<'a> RangeValidator<'a> {
    pub fn new(spec: &'a RangeSpec) -> Self {
        Self {
            spec,
            policy: PassPolicy::default(),
            record_violations: true,
        }
    }

    pub fn with_policy(mut self, policy: PassPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_violation_detail(mut self, record: bool) -> Self {
        self.record_violations = record;
        self
    }

    /// Evaluate every cycle in the tensor.
    pub fn validate(&self, tensor: &CycleTensor) -> GroupValidation {
        let task = tensor.task();
        let spec_available = self.spec.has_task(task);

        if !spec_available {
            debug!(subject = tensor.subject(), task, "no range spec for task");
            return GroupValidation {
                subject: tensor.subject().to_string(),
                task: task.to_string(),
                spec_available,
                cycles: tensor
                    .cycle_ids()
                    .iter()
                    .map(|&id| CycleValidation::unvalidated(id))
                    .collect(),
                feature_violations: BTreeMap::new(),
            };
        }

        // (tensor feature index, ranges, phase → bin) for features the spec covers
        let checks: Vec<(usize, &FeatureRanges, Vec<Option<usize>>)> = tensor
            .features()
            .iter()
            .enumerate()
            .filter_map(|(f, name)| {
                let ranges = self.spec.feature_ranges(task, name)?;
                Some((f, ranges, ranges.phase_bin_map(tensor.n_phases())))
            })
            .collect();

        let mut feature_violations: BTreeMap<String, usize> = BTreeMap::new();
        let cycles: Vec<CycleValidation> = (0..tensor.n_cycles())
            .map(|c| {
                let result = self.validate_cycle(tensor, c, &checks);
                for feature in &result.failing_features {
                    *feature_violations.entry(feature.clone()).or_default() += 1;
                }
                result
            })
            .collect();

        let group = GroupValidation {
            subject: tensor.subject().to_string(),
            task: task.to_string(),
            spec_available,
            cycles,
            feature_violations,
        };
        debug!(
            subject = group.subject.as_str(),
            task,
            passed = group.passing(),
            failed = group.failing(),
            not_applicable = group.not_applicable(),
            "validated group"
        );
        group
    }

    fn validate_cycle(
        &self,
        tensor: &CycleTensor,
        cycle: usize,
        checks: &[(usize, &FeatureRanges, Vec<Option<usize>>)],
    ) -> CycleValidation {
        let mut result = CycleValidation::unvalidated(tensor.cycle_ids()[cycle]);

        for (f, ranges, bin_map) in checks {
            let bins = ranges.bins();
            let mut tallies: BTreeMap<usize, BinTally> = BTreeMap::new();
            let mut out_of_range = 0;

            for (p, bin) in bin_map.iter().enumerate() {
                let Some(b) = *bin else { continue };
                let bin = &bins[b];
                let value = tensor.get(cycle, p, *f);
                if !bin.is_bounded() || !value.is_finite() {
                    continue;
                }

                result.points_evaluated += 1;
                if bin.admits(value) {
                    result.points_in_range += 1;
                    continue;
                }

                out_of_range += 1;
                let excess = bin.excess(value);
                let tally = tallies.entry(b).or_insert(BinTally {
                    out_of_range: 0,
                    worst_value: value,
                    worst_excess: excess,
                });
                tally.out_of_range += 1;
                if excess > tally.worst_excess {
                    tally.worst_value = value;
                    tally.worst_excess = excess;
                }
            }

            if out_of_range == 0 {
                continue;
            }
            let feature = &tensor.features()[*f];
            result.failing_features.push(feature.clone());
            if self.record_violations {
                result
                    .violations
                    .extend(tallies.into_iter().map(|(b, tally)| Violation {
                        feature: feature.clone(),
                        bin_index: b,
                        phase_range: [bins[b].lo, bins[b].hi],
                        points_out_of_range: tally.out_of_range,
                        worst_value: tally.worst_value,
                        min: bins[b].min,
                        max: bins[b].max,
                    }));
            }
        }

        result.state = if result.points_evaluated == 0 {
            StrideState::NotApplicable
        } else if self
            .policy
            .passes(result.points_in_range, result.points_evaluated)
        {
            StrideState::Passed
        } else {
            StrideState::Failed
        };
        result
    }
}
