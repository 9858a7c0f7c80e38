//! Analysis configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.
//! Values are checked with `validator` before a run starts; a bad config is a
//! structural defect and aborts the run.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::analysis::outliers::{OutlierMethod, OutlierMetric};
use crate::error::{AnalysisError, Result};
use crate::validation::PassPolicy;

/// Number of phase points per normalized gait cycle.
pub const PHASE_POINTS: usize = 150;

/// Default decimal places for reported percentages.
pub const DEFAULT_ROUNDING_DECIMALS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Phase points per cycle (P)
    #[validate(range(min = 2))]
    pub phase_points: usize,

    /// Outlier rule applied to per-cycle metrics
    pub outlier_method: OutlierMethod,

    /// Per-cycle scalar the outlier rule runs on
    pub outlier_metric: OutlierMetric,

    /// Stride pass policy
    #[validate(custom = "validate_pass_policy")]
    pub pass_policy: PassPolicy,

    /// Keep per-bin violation detail on cycle results
    pub record_violations: bool,

    /// Analyze (subject, task) groups on the rayon pool
    pub parallel: bool,

    /// Decimal places for pass-rate percentages
    #[validate(range(max = 6))]
    pub rounding_decimals: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            phase_points: PHASE_POINTS,
            outlier_method: OutlierMethod::default(),
            outlier_metric: OutlierMetric::default(),
            pass_policy: PassPolicy::default(),
            record_violations: true,
            parallel: true,
            rounding_decimals: DEFAULT_ROUNDING_DECIMALS,
        }
    }
}

impl AnalysisConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(yaml)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    /// Run field validation, returning the config on success.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn with_phase_points(mut self, phase_points: usize) -> Self {
        self.phase_points = phase_points;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_pass_policy(mut self, policy: PassPolicy) -> Self {
        self.pass_policy = policy;
        self
    }

    pub fn with_outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = method;
        self
    }
}

fn validate_pass_policy(policy: &PassPolicy) -> std::result::Result<(), ValidationError> {
    match policy {
        PassPolicy::AllPoints => Ok(()),
        PassPolicy::MinFraction { fraction } => {
            if fraction.is_finite() && (0.0..=1.0).contains(fraction) {
                Ok(())
            } else {
                Err(ValidationError::new("fraction_out_of_range"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default().validated().unwrap();
        assert_eq!(config.phase_points, 150);
        assert_eq!(config.pass_policy, PassPolicy::AllPoints);
        assert_eq!(config.outlier_method, OutlierMethod::Iqr);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = AnalysisConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
phase_points: 101
outlier_method: modified_z_score
outlier_metric: mean_value
pass_policy:
  kind: min_fraction
  fraction: 0.9
parallel: false
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.phase_points, 101);
        assert_eq!(config.outlier_method, OutlierMethod::ModifiedZScore);
        assert_eq!(config.outlier_metric, OutlierMetric::MeanValue);
        assert_eq!(config.pass_policy, PassPolicy::MinFraction { fraction: 0.9 });
        assert!(!config.parallel);
    }

    #[test]
    fn test_rejects_single_phase_point() {
        let err = AnalysisConfig::default().with_phase_points(1).validated();
        assert!(matches!(err, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_fraction_above_one() {
        let config =
            AnalysisConfig::default().with_pass_policy(PassPolicy::MinFraction { fraction: 1.5 });
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_rejects_unknown_outlier_method() {
        let err = AnalysisConfig::from_yaml_str("outlier_method: grubbs");
        assert!(matches!(err, Err(AnalysisError::InvalidConfig(_))));
    }
}
