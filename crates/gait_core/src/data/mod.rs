//! Input data model.
//!
//! - `sample` - flat per-phase rows and group keys
//! - `naming` - feature naming convention (side, unit, bilateral pairs)
//! - `catalog` - subjects/tasks/features/completeness index

pub mod catalog;
pub mod naming;
pub mod sample;

pub use catalog::DatasetCatalog;
pub use naming::{bilateral_pairs, counterpart, is_angle, side_of, BilateralPair, Side};
pub use sample::{FeatureMap, GroupKey, Sample};
