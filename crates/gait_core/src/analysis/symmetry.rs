//! SymmetryAnalyzer - ipsilateral vs contralateral comparison.
//!
//! Inputs are matched [cycle × phase] matrices of the same measurement on the
//! two limbs. The symmetry index per cycle is
//!
//! ```text
//! SI = (mean(ipsi) - mean(contra)) / (mean(ipsi) + mean(contra)) × 100
//! ```
//!
//! with means over the phase axis. A zero denominator yields NaN.

use nalgebra::DMatrix;
use serde::Serialize;

use super::descriptive::{nan_mean, pearson};
use crate::cycles::CycleTensor;
use crate::data::BilateralPair;
use crate::error::{AnalysisError, Result};

/// Symmetry metrics for one bilateral pair in one (subject, task) group.
#[derive(Debug, Clone, Serialize)]
pub struct SymmetryReport {
    pub ipsi_feature: String,
    pub contra_feature: String,
    /// Per cycle, NaN where undefined
    pub indices: Vec<f64>,
    /// Per phase point, NaN where undefined
    pub phase_correlation: Vec<f64>,
}

impl SymmetryReport {
    /// Mean index over cycles where it is defined.
    pub fn mean_index(&self) -> f64 {
        nan_mean(self.indices.iter().copied())
    }

    pub fn defined_cycles(&self) -> usize {
        self.indices.iter().filter(|v| v.is_finite()).count()
    }
}

fn check_shapes(ipsi: &DMatrix<f64>, contra: &DMatrix<f64>) -> Result<()> {
    if ipsi.shape() != contra.shape() {
        return Err(AnalysisError::ShapeMismatch {
            expected: format!("{:?}", ipsi.shape()),
            found: format!("{:?}", contra.shape()),
        });
    }
    Ok(())
}

/// Per-cycle symmetry index.
pub fn symmetry_index(ipsi: &DMatrix<f64>, contra: &DMatrix<f64>) -> Result<Vec<f64>> {
    check_shapes(ipsi, contra)?;

    Ok(ipsi
        .row_iter()
        .zip(contra.row_iter())
        .map(|(i_row, c_row)| {
            let mi = nan_mean(i_row.iter().copied());
            let mc = nan_mean(c_row.iter().copied());
            let denom = mi + mc;
            if denom == 0.0 || !denom.is_finite() {
                f64::NAN
            } else {
                (mi - mc) / denom * 100.0
            }
        })
        .collect())
}

/// Per phase point, Pearson correlation of the two sides across cycles.
pub fn phase_correlation(ipsi: &DMatrix<f64>, contra: &DMatrix<f64>) -> Result<Vec<f64>> {
    check_shapes(ipsi, contra)?;

    Ok(ipsi
        .column_iter()
        .zip(contra.column_iter())
        .map(|(i_col, c_col)| {
            let xs: Vec<f64> = i_col.iter().copied().collect();
            let ys: Vec<f64> = c_col.iter().copied().collect();
            pearson(&xs, &ys)
        })
        .collect())
}

/// Runs both metrics for bilateral pairs of a tensor.
pub struct SymmetryAnalyzer<'a> {
    tensor: &'a CycleTensor,
}

impl<'a> SymmetryAnalyzer<'a> {
    pub fn new(tensor: &'a CycleTensor) -> Self {
        Self { tensor }
    }

    /// Analyze one pair. Both features must be present in the tensor.
    pub fn analyze(&self, pair: &BilateralPair) -> Result<SymmetryReport> {
        let ipsi = self.series(&pair.ipsi)?;
        let contra = self.series(&pair.contra)?;

        Ok(SymmetryReport {
            ipsi_feature: pair.ipsi.clone(),
            contra_feature: pair.contra.clone(),
            indices: symmetry_index(&ipsi, &contra)?,
            phase_correlation: phase_correlation(&ipsi, &contra)?,
        })
    }

    /// Analyze every pair; pairs with a missing side are skipped.
    pub fn analyze_all(&self, pairs: &[BilateralPair]) -> Vec<SymmetryReport> {
        pairs.iter().filter_map(|p| self.analyze(p).ok()).collect()
    }

    fn series(&self, feature: &str) -> Result<DMatrix<f64>> {
        self.tensor
            .feature_series(feature)
            .ok_or_else(|| AnalysisError::ShapeMismatch {
                expected: format!("feature '{}' in tensor", feature),
                found: format!("{:?}", self.tensor.features()),
            })
    }
}
