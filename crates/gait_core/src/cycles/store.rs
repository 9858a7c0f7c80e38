//! CycleStore - ragged rows → dense cycle tensors.
//!
//! Rows are grouped by (subject, task, cycle id). A cycle is complete when its
//! phase indices are exactly {0, .., P-1}; only complete cycles enter the
//! tensor. Incomplete or duplicated cycles are counted and skipped. Bad rows
//! are reported as [`RowIssue`]s and never abort the build.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::tensor::CycleTensor;
use crate::config::PHASE_POINTS;
use crate::data::{GroupKey, Sample};
use crate::error::{AnalysisError, Result};

/// Recoverable defect found on a single input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RowIssue {
    /// Index into the row slice handed to the store
    pub row: usize,
    pub kind: RowIssueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssueKind {
    /// Phase index outside [0, P); the row is dropped
    PhaseOutOfRange { phase_index: i64 },
    /// Infinite value; stored as NaN
    NonNumericValue { feature: String },
}

/// Result of [`CycleStore::build_tensor`].
#[derive(Debug, Clone)]
pub struct TensorBuild {
    pub tensor: CycleTensor,
    pub complete_cycle_ids: Vec<i64>,
    pub incomplete_cycle_count: usize,
    pub issues: Vec<RowIssue>,
}

/// Complete / incomplete cycle counts for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completeness {
    pub rows: usize,
    pub complete_cycles: usize,
    pub incomplete_cycles: usize,
}

/// Shape check outcome for one cycle.
#[derive(Debug, Clone, PartialEq)]
enum CycleShape {
    /// Row indices ordered by phase index
    Complete(Vec<usize>),
    Incomplete,
    DuplicatePhase,
}

/// Builder over an immutable row slice.
#[derive(Debug, Clone, Copy)]
pub struct CycleStore<'a> {
    rows: &'a [Sample],
    phase_points: usize,
}

impl<'a> CycleStore<'a> {
    pub fn new(rows: &'a [Sample]) -> Self {
        Self {
            rows,
            phase_points: PHASE_POINTS,
        }
    }

    pub fn with_phase_points(mut self, phase_points: usize) -> Self {
        self.phase_points = phase_points;
        self
    }

    pub fn rows(&self) -> &'a [Sample] {
        self.rows
    }

    pub fn phase_points(&self) -> usize {
        self.phase_points
    }

    /// Distinct (subject, task) groups, sorted.
    pub fn groups(&self) -> Vec<GroupKey> {
        self.rows
            .iter()
            .map(GroupKey::of)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Cycle completeness for every group.
    pub fn completeness(&self) -> BTreeMap<GroupKey, Completeness> {
        let mut by_group: BTreeMap<GroupKey, BTreeMap<i64, Vec<usize>>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            by_group
                .entry(GroupKey::of(row))
                .or_default()
                .entry(row.cycle_id)
                .or_default()
                .push(i);
        }

        by_group
            .into_iter()
            .map(|(key, cycles)| {
                let mut c = Completeness::default();
                for indices in cycles.values() {
                    c.rows += indices.len();
                    match self.classify(indices) {
                        CycleShape::Complete(_) => c.complete_cycles += 1,
                        _ => c.incomplete_cycles += 1,
                    }
                }
                (key, c)
            })
            .collect()
    }

    /// Row indices of every (subject, task) group, in input order.
    ///
    /// One pass over the rows; feed the slices to [`Self::build_tensor_for_rows`].
    pub fn partition(&self) -> BTreeMap<GroupKey, Vec<usize>> {
        let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            groups.entry(GroupKey::of(row)).or_default().push(i);
        }
        groups
    }

    /// Reshape one group's rows into a tensor over `features`.
    ///
    /// A feature absent from a cycle is written as NaN for every phase point.
    pub fn build_tensor(
        &self,
        subject: &str,
        task: &str,
        features: &[String],
    ) -> Result<TensorBuild> {
        let indices: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.belongs_to(subject, task))
            .map(|(i, _)| i)
            .collect();
        self.build_tensor_for_rows(subject, task, &indices, features)
    }

    /// [`Self::build_tensor`] over pre-selected row indices of one group.
    ///
    /// `indices` must all belong to (subject, task); [`RowIssue::row`] still
    /// refers to the full row slice.
    pub fn build_tensor_for_rows(
        &self,
        subject: &str,
        task: &str,
        indices: &[usize],
        features: &[String],
    ) -> Result<TensorBuild> {
        if features.is_empty() {
            return Err(AnalysisError::EmptyFeatureList);
        }
        if indices.is_empty() {
            return Err(AnalysisError::UnknownGroup {
                subject: subject.to_string(),
                task: task.to_string(),
            });
        }

        let p = self.phase_points;
        let mut issues = Vec::new();
        let mut cycles: BTreeMap<i64, Vec<usize>> = BTreeMap::new();

        for &i in indices {
            let row = &self.rows[i];

            if row.phase_index < 0 || row.phase_index >= p as i64 {
                issues.push(RowIssue {
                    row: i,
                    kind: RowIssueKind::PhaseOutOfRange {
                        phase_index: row.phase_index,
                    },
                });
                continue;
            }

            for feature in features {
                if matches!(row.feature(feature), Some(v) if v.is_infinite()) {
                    issues.push(RowIssue {
                        row: i,
                        kind: RowIssueKind::NonNumericValue {
                            feature: feature.clone(),
                        },
                    });
                }
            }

            cycles.entry(row.cycle_id).or_default().push(i);
        }

        let mut complete_cycle_ids = Vec::new();
        let mut incomplete_cycle_count = 0;
        let mut data = Vec::new();

        for (&cycle_id, indices) in &cycles {
            let ordered = match self.classify(indices) {
                CycleShape::Complete(ordered) => ordered,
                CycleShape::Incomplete => {
                    incomplete_cycle_count += 1;
                    continue;
                }
                CycleShape::DuplicatePhase => {
                    debug!(subject, task, cycle_id, "duplicate phase index, cycle skipped");
                    incomplete_cycle_count += 1;
                    continue;
                }
            };

            for &row_idx in &ordered {
                let row = &self.rows[row_idx];
                data.extend(features.iter().map(|f| match row.feature(f) {
                    Some(v) if !v.is_infinite() => v,
                    _ => f64::NAN,
                }));
            }
            complete_cycle_ids.push(cycle_id);
        }

        if !issues.is_empty() {
            warn!(subject, task, issues = issues.len(), "row issues while building tensor");
        }
        debug!(
            subject,
            task,
            complete = complete_cycle_ids.len(),
            incomplete = incomplete_cycle_count,
            "cycle tensor built"
        );

        let tensor = CycleTensor::new(
            subject,
            task,
            features.to_vec(),
            complete_cycle_ids.clone(),
            p,
            data,
        );

        Ok(TensorBuild {
            tensor,
            complete_cycle_ids,
            incomplete_cycle_count,
            issues,
        })
    }

    /// Check that a cycle's phase indices are exactly {0, .., P-1}.
    fn classify(&self, indices: &[usize]) -> CycleShape {
        let p = self.phase_points;
        let mut slots: Vec<Option<usize>> = vec![None; p];
        let mut duplicate = false;

        for &i in indices {
            let phase = self.rows[i].phase_index;
            if phase < 0 || phase >= p as i64 {
                continue;
            }
            let slot = &mut slots[phase as usize];
            if slot.is_some() {
                duplicate = true;
            } else {
                *slot = Some(i);
            }
        }

        if duplicate {
            return CycleShape::DuplicatePhase;
        }
        slots
            .into_iter()
            .collect::<Option<Vec<usize>>>()
            .map(CycleShape::Complete)
            .unwrap_or(CycleShape::Incomplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: usize = 5;

    fn cycle_rows(subject: &str, task: &str, cycle_id: i64, values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(p, &v)| Sample::new(subject, task, cycle_id, p as i64).with_feature("x", v))
            .collect()
    }

    fn features(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_orders_by_phase_and_cycle() {
        let mut rows = cycle_rows("S01", "walk", 2, &[10.0, 11.0, 12.0, 13.0, 14.0]);
        rows.extend(cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]));
        rows.reverse();

        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store.build_tensor("S01", "walk", &features(&["x"])).unwrap();

        assert_eq!(build.complete_cycle_ids, vec![1, 2]);
        assert_eq!(build.incomplete_cycle_count, 0);
        assert_eq!(build.tensor.trajectory(0, 0), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(build.tensor.trajectory(1, 0), vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_incomplete_cycle_counted_not_stored() {
        let mut rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        rows.extend(cycle_rows("S01", "walk", 2, &[0.0, 1.0, 2.0]));

        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store.build_tensor("S01", "walk", &features(&["x"])).unwrap();

        assert_eq!(build.complete_cycle_ids, vec![1]);
        assert_eq!(build.incomplete_cycle_count, 1);
        assert_eq!(build.tensor.n_cycles(), 1);
    }

    #[test]
    fn test_duplicate_phase_is_malformed() {
        let mut rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        rows.push(Sample::new("S01", "walk", 1, 2).with_feature("x", 99.0));

        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store.build_tensor("S01", "walk", &features(&["x"])).unwrap();

        assert!(build.complete_cycle_ids.is_empty());
        assert_eq!(build.incomplete_cycle_count, 1);
    }

    #[test]
    fn test_missing_feature_becomes_nan() {
        let rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store
            .build_tensor("S01", "walk", &features(&["x", "y"]))
            .unwrap();

        assert!(build.tensor.trajectory(0, 1).iter().all(|v| v.is_nan()));
        assert_eq!(build.tensor.trajectory(0, 0)[4], 4.0);
    }

    #[test]
    fn test_out_of_range_phase_reported() {
        let mut rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        rows.push(Sample::new("S01", "walk", 1, 7).with_feature("x", 1.0));
        rows.push(Sample::new("S01", "walk", 1, -1).with_feature("x", 1.0));

        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store.build_tensor("S01", "walk", &features(&["x"])).unwrap();

        assert_eq!(build.complete_cycle_ids, vec![1]);
        assert_eq!(build.issues.len(), 2);
        assert_eq!(
            build.issues[0].kind,
            RowIssueKind::PhaseOutOfRange { phase_index: 7 }
        );
    }

    #[test]
    fn test_infinite_value_reported_and_stored_as_nan() {
        let rows = cycle_rows("S01", "walk", 1, &[0.0, f64::INFINITY, 2.0, 3.0, 4.0]);
        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store.build_tensor("S01", "walk", &features(&["x"])).unwrap();

        assert_eq!(build.issues.len(), 1);
        assert_eq!(build.issues[0].row, 1);
        assert!(build.tensor.get(0, 1, 0).is_nan());
    }

    #[test]
    fn test_unknown_group_and_empty_features() {
        let rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let store = CycleStore::new(&rows).with_phase_points(P);

        assert!(matches!(
            store.build_tensor("S09", "walk", &features(&["x"])),
            Err(AnalysisError::UnknownGroup { .. })
        ));
        assert!(matches!(
            store.build_tensor("S01", "walk", &[]),
            Err(AnalysisError::EmptyFeatureList)
        ));
    }

    #[test]
    fn test_zero_complete_cycles_gives_empty_tensor() {
        let rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0]);
        let store = CycleStore::new(&rows).with_phase_points(P);
        let build = store.build_tensor("S01", "walk", &features(&["x"])).unwrap();

        assert!(build.tensor.is_empty());
        assert_eq!(build.incomplete_cycle_count, 1);
    }

    #[test]
    fn test_completeness_per_group() {
        let mut rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        rows.extend(cycle_rows("S01", "walk", 2, &[0.0, 1.0]));
        rows.extend(cycle_rows("S02", "run", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]));

        let store = CycleStore::new(&rows).with_phase_points(P);
        let completeness = store.completeness();

        let walk = completeness[&GroupKey::new("S01", "walk")];
        assert_eq!(walk.complete_cycles, 1);
        assert_eq!(walk.incomplete_cycles, 1);
        assert_eq!(walk.rows, 7);
        assert_eq!(store.groups().len(), 2);
    }

    #[test]
    fn test_partition_matches_per_group_build() {
        let mut rows = cycle_rows("S01", "walk", 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        rows.extend(cycle_rows("S02", "run", 1, &[5.0, 6.0, 7.0, 8.0, 9.0]));
        rows.extend(cycle_rows("S01", "walk", 2, &[0.0, f64::INFINITY, 2.0, 3.0, 4.0]));

        let store = CycleStore::new(&rows).with_phase_points(P);
        let parts = store.partition();
        let walk = &parts[&GroupKey::new("S01", "walk")];
        assert_eq!(walk.len(), 10);
        assert_eq!(parts[&GroupKey::new("S02", "run")], vec![5, 6, 7, 8, 9]);

        let x = features(&["x"]);
        let direct = store.build_tensor("S01", "walk", &x).unwrap();
        let split = store.build_tensor_for_rows("S01", "walk", walk, &x).unwrap();
        assert_eq!(split.complete_cycle_ids, direct.complete_cycle_ids);
        assert_eq!(split.tensor.trajectory(0, 0), direct.tensor.trajectory(0, 0));
        // row index refers to the full slice
        assert_eq!(split.issues, direct.issues);
        assert_eq!(split.issues[0].row, 11);

        assert!(matches!(
            store.build_tensor_for_rows("S09", "walk", &[], &x),
            Err(AnalysisError::UnknownGroup { .. })
        ));
    }
}
