//! Cycle reshaping.
//!
//! - `store` - groups flat rows into complete cycles and builds tensors
//! - `tensor` - immutable [cycle][phase][feature] container

pub mod store;
pub mod tensor;

pub use store::{Completeness, CycleStore, RowIssue, RowIssueKind, TensorBuild};
pub use tensor::{CycleTensor, FlatRecord};
