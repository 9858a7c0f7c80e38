//! Read-only index over a dataset's rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::naming::{bilateral_pairs, BilateralPair};
use super::sample::{GroupKey, Sample};
use crate::cycles::{Completeness, CycleStore};

/// Subjects, tasks, features and per-group completeness of a row set.
///
/// Built on demand from an explicit row slice; nothing is cached globally.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetCatalog {
    pub subjects: Vec<String>,
    pub tasks: Vec<String>,
    pub features: Vec<String>,
    pub row_count: usize,
    #[serde(serialize_with = "serialize_groups")]
    pub groups: BTreeMap<GroupKey, Completeness>,
}

#[derive(Serialize)]
struct GroupEntry<'a> {
    subject: &'a str,
    task: &'a str,
    #[serde(flatten)]
    completeness: &'a Completeness,
}

fn serialize_groups<S: serde::Serializer>(
    groups: &BTreeMap<GroupKey, Completeness>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(groups.iter().map(|(key, c)| GroupEntry {
        subject: &key.subject,
        task: &key.task,
        completeness: c,
    }))
}

impl DatasetCatalog {
    pub fn from_rows(rows: &[Sample], phase_points: usize) -> Self {
        let mut subjects = BTreeSet::new();
        let mut tasks = BTreeSet::new();
        let mut features = BTreeSet::new();

        for row in rows {
            subjects.insert(row.subject.as_str());
            tasks.insert(row.task.as_str());
            features.extend(row.features.keys().map(String::as_str));
        }

        let store = CycleStore::new(rows).with_phase_points(phase_points);

        Self {
            subjects: subjects.into_iter().map(str::to_string).collect(),
            tasks: tasks.into_iter().map(str::to_string).collect(),
            features: features.into_iter().map(str::to_string).collect(),
            row_count: rows.len(),
            groups: store.completeness(),
        }
    }

    /// Subjects that performed `task`.
    pub fn subjects_for_task(&self, task: &str) -> Vec<&str> {
        self.groups
            .keys()
            .filter(|k| k.task == task)
            .map(|k| k.subject.as_str())
            .collect()
    }

    pub fn bilateral_pairs(&self) -> Vec<BilateralPair> {
        bilateral_pairs(&self.features)
    }

    pub fn total_complete_cycles(&self) -> usize {
        self.groups.values().map(|c| c.complete_cycles).sum()
    }

    pub fn total_incomplete_cycles(&self) -> usize {
        self.groups.values().map(|c| c.incomplete_cycles).sum()
    }
}
