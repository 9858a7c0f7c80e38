//! # Analysis Pipeline
//!
//! Runs the full flow for every (subject, task) group of a row set:
//!
//! ```text
//! rows → CycleStore → CycleTensor → { PatternStatistics, SymmetryAnalyzer,
//!                                     OutlierDetector, RangeValidator }
//!      → ResultAggregator → DatasetSummary
//! ```
//!
//! Groups are independent. With `parallel` on they run on the rayon pool;
//! the summary is identical either way. A group that errors is recorded as a
//! failure and the rest continue. Only a bad config or an empty feature list
//! aborts the run.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::analysis::{
    detect_cycle_outliers, OutlierReport, PatternStatistics, SymmetryAnalyzer, SymmetryReport,
};
use crate::config::AnalysisConfig;
use crate::cycles::{CycleStore, RowIssue, TensorBuild};
use crate::data::{bilateral_pairs, GroupKey, Sample};
use crate::error::{AnalysisError, Result};
use crate::report::{DatasetSummary, ResultAggregator};
use crate::validation::{GroupValidation, RangeSpec, RangeValidator};

/// All per-group outputs, before aggregation.
#[derive(Debug, Clone)]
pub struct GroupAnalysis {
    pub key: GroupKey,
    pub complete_cycle_ids: Vec<i64>,
    pub incomplete_cycles: usize,
    pub row_issues: Vec<RowIssue>,
    pub patterns: PatternStatistics,
    pub symmetry: Vec<SymmetryReport>,
    pub outliers: OutlierReport,
    /// `None` when the run has no range spec at all
    pub validation: Option<GroupValidation>,
}

pub struct AnalysisPipeline<'a> {
    config: AnalysisConfig,
    range_spec: Option<&'a RangeSpec>,
}

impl<'a> AnalysisPipeline<'a> {
    /// Validates the config up front.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
            range_spec: None,
        })
    }

    pub fn with_range_spec(mut self, spec: &'a RangeSpec) -> Self {
        self.range_spec = Some(spec);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one group.
    pub fn analyze_group(
        &self,
        store: &CycleStore<'_>,
        key: &GroupKey,
        features: &[String],
    ) -> Result<GroupAnalysis> {
        let build = store.build_tensor(&key.subject, &key.task, features)?;
        Ok(self.analyze_build(key, build, features))
    }

    fn analyze_build(
        &self,
        key: &GroupKey,
        build: TensorBuild,
        features: &[String],
    ) -> GroupAnalysis {
        let tensor = &build.tensor;

        let patterns = PatternStatistics::compute(tensor);
        let symmetry = SymmetryAnalyzer::new(tensor).analyze_all(&bilateral_pairs(features));
        let outliers = detect_cycle_outliers(
            tensor,
            &patterns,
            self.config.outlier_method,
            self.config.outlier_metric,
        );
        let validation = self.range_spec.map(|spec| {
            RangeValidator::new(spec)
                .with_policy(self.config.pass_policy)
                .with_violation_detail(self.config.record_violations)
                .validate(tensor)
        });

        GroupAnalysis {
            key: key.clone(),
            complete_cycle_ids: build.complete_cycle_ids,
            incomplete_cycles: build.incomplete_cycle_count,
            row_issues: build.issues,
            patterns,
            symmetry,
            outliers,
            validation,
        }
    }

    /// Analyze every group in `rows` and aggregate.
    pub fn run(&self, rows: &[Sample], features: &[String]) -> Result<DatasetSummary> {
        if features.is_empty() {
            return Err(AnalysisError::EmptyFeatureList);
        }

        let store = CycleStore::new(rows).with_phase_points(self.config.phase_points);
        let groups: Vec<(GroupKey, Vec<usize>)> = store.partition().into_iter().collect();
        info!(
            rows = rows.len(),
            groups = groups.len(),
            features = features.len(),
            parallel = self.config.parallel,
            "starting dataset analysis"
        );

        let analyze = |(key, indices): &(GroupKey, Vec<usize>)| {
            let result = store
                .build_tensor_for_rows(&key.subject, &key.task, indices, features)
                .map(|build| self.analyze_build(key, build, features));
            (key.clone(), result)
        };
        let results: Vec<(GroupKey, Result<GroupAnalysis>)> = if self.config.parallel {
            groups.par_iter().map(analyze).collect()
        } else {
            groups.iter().map(analyze).collect()
        };

        let mut aggregator = ResultAggregator::new(self.config.rounding_decimals);
        for (key, result) in results {
            match result {
                Ok(group) => aggregator.add_group(group),
                Err(e) => {
                    warn!(group = %key, error = %e, "group analysis failed");
                    aggregator.add_failure(&key, &e);
                }
            }
        }
        Ok(aggregator.finish())
    }
}

/// One-shot form of [`AnalysisPipeline::run`].
pub fn analyze_dataset(
    rows: &[Sample],
    features: &[String],
    range_spec: Option<&RangeSpec>,
    config: &AnalysisConfig,
) -> Result<DatasetSummary> {
    let mut pipeline = AnalysisPipeline::new(config.clone())?;
    if let Some(spec) = range_spec {
        pipeline = pipeline.with_range_spec(spec);
    }
    pipeline.run(rows, features)
}
