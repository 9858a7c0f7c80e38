//! Feature naming convention.
//!
//! Features follow `<joint>_<motion>_<measure>_<side>_<unit>`, e.g.
//! `knee_flexion_angle_ipsi_rad` or `hip_moment_contra_Nm_kg`. The side token
//! is `ipsi` or `contra`; the trailing unit token `rad` marks angle-like
//! features.

use serde::{Deserialize, Serialize};

const IPSI: &str = "ipsi";
const CONTRA: &str = "contra";

/// Limb side relative to the analyzed limb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Ipsi,
    Contra,
}

impl Side {
    fn token(self) -> &'static str {
        match self {
            Side::Ipsi => IPSI,
            Side::Contra => CONTRA,
        }
    }

    fn opposite(self) -> Side {
        match self {
            Side::Ipsi => Side::Contra,
            Side::Contra => Side::Ipsi,
        }
    }
}

/// Matched ipsilateral / contralateral feature names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BilateralPair {
    pub ipsi: String,
    pub contra: String,
}

/// Side encoded in a feature name, if any.
pub fn side_of(feature: &str) -> Option<Side> {
    feature.split('_').find_map(|token| match token {
        IPSI => Some(Side::Ipsi),
        CONTRA => Some(Side::Contra),
        _ => None,
    })
}

/// Name of the same measurement on the opposite limb.
pub fn counterpart(feature: &str) -> Option<String> {
    let side = side_of(feature)?;
    let swapped: Vec<&str> = feature
        .split('_')
        .map(|token| {
            if token == side.token() {
                side.opposite().token()
            } else {
                token
            }
        })
        .collect();
    Some(swapped.join("_"))
}

/// Angle-like features are stored in radians.
pub fn is_angle(feature: &str) -> bool {
    feature.ends_with("_rad")
}

/// Bilateral pairs whose both sides are present in `features`.
///
/// Pairs are returned sorted by ipsilateral name; each pair appears once.
pub fn bilateral_pairs(features: &[String]) -> Vec<BilateralPair> {
    let mut pairs: Vec<BilateralPair> = features
        .iter()
        .filter(|f| side_of(f) == Some(Side::Ipsi))
        .filter_map(|ipsi| {
            let contra = counterpart(ipsi)?;
            features.contains(&contra).then(|| BilateralPair {
                ipsi: ipsi.clone(),
                contra,
            })
        })
        .collect();
    pairs.sort();
    pairs.dedup();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_detection() {
        assert_eq!(side_of("knee_flexion_angle_ipsi_rad"), Some(Side::Ipsi));
        assert_eq!(side_of("hip_moment_contra_Nm_kg"), Some(Side::Contra));
        assert_eq!(side_of("pelvis_tilt_angle_rad"), None);
        // substring match must not count
        assert_eq!(side_of("ipsilateral_marker"), None);
    }

    #[test]
    fn test_counterpart_swaps_only_side_token() {
        assert_eq!(
            counterpart("knee_flexion_angle_ipsi_rad").as_deref(),
            Some("knee_flexion_angle_contra_rad")
        );
        assert_eq!(
            counterpart("hip_moment_contra_Nm_kg").as_deref(),
            Some("hip_moment_ipsi_Nm_kg")
        );
        assert_eq!(counterpart("pelvis_tilt_angle_rad"), None);
    }

    #[test]
    fn test_bilateral_pairs_require_both_sides() {
        let features: Vec<String> = [
            "knee_flexion_angle_ipsi_rad",
            "knee_flexion_angle_contra_rad",
            "hip_flexion_angle_ipsi_rad",
            "ankle_moment_contra_Nm_kg",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let pairs = bilateral_pairs(&features);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].ipsi, "knee_flexion_angle_ipsi_rad");
        assert_eq!(pairs[0].contra, "knee_flexion_angle_contra_rad");
    }

    #[test]
    fn test_angle_classification() {
        assert!(is_angle("knee_flexion_angle_ipsi_rad"));
        assert!(!is_angle("knee_flexion_velocity_ipsi_rad_s"));
        assert!(!is_angle("vertical_grf_ipsi_BW"));
    }
}
