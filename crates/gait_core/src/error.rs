use thiserror::Error;

/// Errors that abort an analysis request.
///
/// Data-quality conditions (incomplete cycles, missing features, missing
/// range entries, zero denominators) are not represented here. They are
/// recovered locally and surfaced as counts on the result objects.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Feature list must not be empty")]
    EmptyFeatureList,

    #[error("No rows for subject '{subject}', task '{task}'")]
    UnknownGroup { subject: String, task: String },

    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("Invalid range spec for task '{task}', feature '{feature}': {reason}")]
    InvalidRangeSpec {
        task: String,
        feature: String,
        reason: String,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Configuration defects abort the whole run; everything else is
    /// scoped to a single (subject, task) group.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidRangeSpec { .. } | AnalysisError::InvalidConfig(_)
        )
    }
}

impl From<validator::ValidationErrors> for AnalysisError {
    fn from(err: validator::ValidationErrors) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        let spec_err = AnalysisError::InvalidRangeSpec {
            task: "walk".to_string(),
            feature: "knee".to_string(),
            reason: "overlap".to_string(),
        };
        assert!(spec_err.is_structural());
        assert!(AnalysisError::InvalidConfig("x".to_string()).is_structural());
        assert!(!AnalysisError::EmptyFeatureList.is_structural());
    }

    #[test]
    fn test_display_messages() {
        let err = AnalysisError::UnknownGroup {
            subject: "S01".to_string(),
            task: "run".to_string(),
        };
        assert_eq!(err.to_string(), "No rows for subject 'S01', task 'run'");
    }
}
