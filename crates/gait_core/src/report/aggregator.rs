//! ResultAggregator - per-group results → dataset summary.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use super::summary::{
    DatasetSummary, FeatureSummary, GroupFailure, GroupSummary, OverallSummary, PassRate,
    SkipCounts, SymmetrySummary, TaskSummary,
};
use crate::config::DEFAULT_ROUNDING_DECIMALS;
use crate::data::GroupKey;
use crate::error::AnalysisError;
use crate::pipeline::GroupAnalysis;
use crate::validation::StrideState;

#[derive(Default)]
struct TaskTally {
    subjects: BTreeSet<String>,
    validated: bool,
    total: usize,
    passing: usize,
    failing: usize,
    not_applicable: usize,
    feature_violations: BTreeMap<String, usize>,
}

impl TaskTally {
    fn evaluated(&self) -> usize {
        self.passing + self.failing
    }
}

/// Collects group results in any order and produces a deterministic summary.
#[derive(Debug)]
pub struct ResultAggregator {
    decimals: u32,
    groups: Vec<GroupAnalysis>,
    failures: Vec<GroupFailure>,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDING_DECIMALS)
    }
}

impl ResultAggregator {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            groups: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn add_group(&mut self, group: GroupAnalysis) {
        self.groups.push(group);
    }

    pub fn add_failure(&mut self, key: &GroupKey, error: &AnalysisError) {
        self.failures.push(GroupFailure {
            subject: key.subject.clone(),
            task: key.task.clone(),
            error: error.to_string(),
        });
    }

    pub fn finish(mut self) -> DatasetSummary {
        self.groups.sort_by(|a, b| a.key.cmp(&b.key));
        self.failures
            .sort_by(|a, b| (&a.subject, &a.task).cmp(&(&b.subject, &b.task)));

        let mut skipped = SkipCounts {
            failed_groups: self.failures.len(),
            ..SkipCounts::default()
        };
        let mut tallies: BTreeMap<String, TaskTally> = BTreeMap::new();
        let mut groups = Vec::with_capacity(self.groups.len());

        for group in self.groups {
            let tally = tallies.entry(group.key.task.clone()).or_default();
            tally.subjects.insert(group.key.subject.clone());
            tally.total += group.complete_cycle_ids.len();

            skipped.incomplete_cycles += group.incomplete_cycles;
            skipped.row_issues += group.row_issues.len();

            let validation = group.validation.filter(|v| v.spec_available);
            let pass_rate = match &validation {
                Some(v) => {
                    tally.validated = true;
                    tally.passing += v.passing();
                    tally.failing += v.failing();
                    tally.not_applicable += v.not_applicable();
                    for (feature, count) in &v.feature_violations {
                        *tally.feature_violations.entry(feature.clone()).or_default() += count;
                    }
                    skipped.not_applicable_cycles += v.not_applicable();
                    skipped.unvalidated_cycles += v
                        .cycles
                        .iter()
                        .filter(|c| c.state == StrideState::Unvalidated)
                        .count();
                    PassRate::from_counts(v.passing(), v.evaluated(), self.decimals)
                }
                None => {
                    skipped.unvalidated_cycles += group.complete_cycle_ids.len();
                    PassRate::no_validation()
                }
            };

            groups.push(GroupSummary {
                subject: group.key.subject,
                task: group.key.task,
                complete_cycles: group.complete_cycle_ids.len(),
                incomplete_cycles: group.incomplete_cycles,
                row_issues: group.row_issues.len(),
                cycle_ids: group.complete_cycle_ids,
                features: group.patterns.features.iter().map(FeatureSummary::from).collect(),
                symmetry: group.symmetry.iter().map(SymmetrySummary::from).collect(),
                outliers: group.outliers,
                pass_rate,
                validation,
            });
        }

        let mut overall_total = 0;
        let mut overall_evaluated = 0;
        let mut overall_passing = 0;
        let mut tasks_validated = 0;

        let tasks: BTreeMap<String, TaskSummary> = tallies
            .into_iter()
            .map(|(task, tally)| {
                let pass_rate = if tally.validated {
                    tasks_validated += 1;
                    overall_total += tally.total;
                    overall_evaluated += tally.evaluated();
                    overall_passing += tally.passing;
                    PassRate::from_counts(tally.passing, tally.evaluated(), self.decimals)
                } else {
                    PassRate::no_validation()
                };
                let summary = TaskSummary {
                    task: task.clone(),
                    subjects: tally.subjects.iter().cloned().collect(),
                    total_strides: tally.total,
                    evaluated_strides: tally.evaluated(),
                    passing_strides: tally.passing,
                    failing_strides: tally.failing,
                    not_applicable_strides: tally.not_applicable,
                    pass_rate,
                    feature_violations: tally.feature_violations,
                };
                (task, summary)
            })
            .collect();

        let overall = OverallSummary {
            total_strides: overall_total,
            evaluated_strides: overall_evaluated,
            passing_strides: overall_passing,
            pass_rate: if tasks_validated > 0 {
                PassRate::from_counts(overall_passing, overall_evaluated, self.decimals)
            } else {
                PassRate::no_validation()
            },
            tasks_validated,
            tasks_without_validation: tasks.len() - tasks_validated,
        };

        info!(
            groups = groups.len(),
            tasks = tasks.len(),
            failed_groups = skipped.failed_groups,
            "dataset summary ready"
        );

        DatasetSummary {
            overall,
            tasks,
            groups,
            skipped,
            failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{OutlierReport, PatternStatistics};
    use crate::report::RateStatus;
    use crate::validation::{CycleValidation, GroupValidation};

    fn cycle(id: i64, state: StrideState) -> CycleValidation {
        CycleValidation {
            state,
            ..CycleValidation::unvalidated(id)
        }
    }

    fn group(subject: &str, task: &str, cycles: Option<Vec<CycleValidation>>) -> GroupAnalysis {
        let ids: Vec<i64> = match &cycles {
            Some(cycles) => cycles.iter().map(|c| c.cycle_id).collect(),
            None => vec![1, 2],
        };
        GroupAnalysis {
            key: GroupKey::new(subject, task),
            complete_cycle_ids: ids.clone(),
            incomplete_cycles: 1,
            row_issues: Vec::new(),
            patterns: PatternStatistics {
                subject: subject.to_string(),
                task: task.to_string(),
                cycle_ids: ids,
                features: Vec::new(),
            },
            symmetry: Vec::new(),
            outliers: OutlierReport::default(),
            validation: cycles.map(|cycles| GroupValidation {
                subject: subject.to_string(),
                task: task.to_string(),
                spec_available: true,
                cycles,
                feature_violations: BTreeMap::from([("knee".to_string(), 1)]),
            }),
        }
    }

    #[test]
    fn test_task_rates_and_overall() {
        let mut agg = ResultAggregator::new(1);
        agg.add_group(group(
            "S02",
            "walk",
            Some(vec![cycle(1, StrideState::Passed), cycle(2, StrideState::Failed)]),
        ));
        agg.add_group(group(
            "S01",
            "walk",
            Some(vec![
                cycle(1, StrideState::Passed),
                cycle(2, StrideState::NotApplicable),
            ]),
        ));
        agg.add_group(group("S01", "stairs", None));
        let summary = agg.finish();

        let walk = &summary.tasks["walk"];
        assert_eq!(walk.subjects, vec!["S01", "S02"]);
        assert_eq!(walk.total_strides, 4);
        assert_eq!(walk.evaluated_strides, 3);
        assert_eq!(walk.pass_rate, PassRate::Defined(66.7));
        assert_eq!(walk.feature_violations.get("knee"), Some(&2));

        let stairs = &summary.tasks["stairs"];
        assert_eq!(stairs.pass_rate, PassRate::Unavailable(RateStatus::NoValidation));

        assert_eq!(summary.overall.tasks_validated, 1);
        assert_eq!(summary.overall.tasks_without_validation, 1);
        assert_eq!(summary.overall.pass_rate, PassRate::Defined(66.7));
        assert_eq!(summary.skipped.incomplete_cycles, 3);
        assert_eq!(summary.skipped.not_applicable_cycles, 1);
        assert_eq!(summary.skipped.unvalidated_cycles, 2);
    }

    #[test]
    fn test_groups_sorted_regardless_of_insertion() {
        let mut agg = ResultAggregator::default();
        agg.add_group(group("S02", "walk", None));
        agg.add_group(group("S01", "walk", None));
        let summary = agg.finish();
        let order: Vec<&str> = summary.groups.iter().map(|g| g.subject.as_str()).collect();
        assert_eq!(order, vec!["S01", "S02"]);
    }

    #[test]
    fn test_zero_evaluated_is_undefined_not_zero() {
        let mut agg = ResultAggregator::default();
        agg.add_group(group("S01", "walk", Some(Vec::new())));
        agg.add_group(group(
            "S01",
            "run",
            Some(vec![cycle(1, StrideState::Failed)]),
        ));
        let summary = agg.finish();

        assert_eq!(
            summary.tasks["walk"].pass_rate,
            PassRate::Unavailable(RateStatus::Undefined)
        );
        assert_eq!(summary.tasks["run"].pass_rate, PassRate::Defined(0.0));
        assert_eq!(
            summary.group("S01", "walk").map(|g| g.pass_rate),
            Some(PassRate::Unavailable(RateStatus::Undefined))
        );
    }

    #[test]
    fn test_failures_are_reported() {
        let mut agg = ResultAggregator::default();
        agg.add_failure(&GroupKey::new("S01", "walk"), &AnalysisError::EmptyFeatureList);
        let summary = agg.finish();

        assert_eq!(summary.skipped.failed_groups, 1);
        assert_eq!(summary.failures[0].subject, "S01");
        assert!(summary.groups.is_empty());
        assert_eq!(summary.overall.pass_rate, PassRate::no_validation());
    }
}
