//! # Validation Module
//!
//! Literature range checks for gait cycles.
//!
//! - `range_spec` - validated (task, feature, phase bin) → bounds table
//! - `validator` - per-stride evaluation and pass policies
//! - `result` - stride states and violation detail

pub mod range_spec;
pub mod result;
pub mod validator;

pub use range_spec::{FeatureRanges, PhaseBin, PhaseRangeEntry, RangeSpec, RangeSpecSource};
pub use result::{CycleValidation, GroupValidation, StrideState, Violation};
pub use validator::{PassPolicy, RangeValidator};
