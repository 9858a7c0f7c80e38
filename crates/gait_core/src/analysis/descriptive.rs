//! NaN-aware descriptive statistics shared by the analyzers.
//!
//! NaN marks a missing measurement and is skipped everywhere. A statistic
//! with too few finite inputs is NaN, never a panic.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Finite values of `values` in input order.
pub fn finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().filter(|v| v.is_finite()).collect()
}

/// Mean of finite values; NaN when there are none.
pub fn nan_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        sum += v;
        n += 1;
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Standard deviation of finite values with `ddof` degrees of freedom removed.
///
/// NaN when fewer than `ddof + 1` finite values exist.
pub fn nan_std(values: impl IntoIterator<Item = f64>, ddof: usize) -> f64 {
    let vals = finite(values);
    if vals.len() <= ddof {
        return f64::NAN;
    }
    let mean = vals.iter().sum::<f64>() / vals.len() as f64;
    let ss: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (vals.len() - ddof) as f64).sqrt()
}

/// Sort ascending. Input must already be NaN-free.
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Quantile by linear interpolation between closest ranks (R-7).
///
/// `sorted_values` must be sorted and NaN-free. Empty input yields NaN.
pub fn quantile_sorted(sorted_values: &[f64], q: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_values[0];
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted_values[lo] + (h - lo as f64) * (sorted_values[hi] - sorted_values[lo])
}

pub fn median_sorted(sorted_values: &[f64]) -> f64 {
    quantile_sorted(sorted_values, 0.5)
}

/// Pearson correlation over index-aligned pairs where both sides are finite.
///
/// NaN with fewer than two pairs or zero variance on either side.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Distribution summary of a per-cycle scalar.
///
/// `count` is the number of finite values the summary was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

fn defined(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

impl DistributionSummary {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let vals = sorted(finite(values));
        Self {
            count: vals.len(),
            mean: defined(nan_mean(vals.iter().copied())),
            std: defined(nan_std(vals.iter().copied(), 1)),
            min: vals.first().copied(),
            median: defined(median_sorted(&vals)),
            max: vals.last().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_mean_skips_missing() {
        assert_eq!(nan_mean([1.0, f64::NAN, 3.0]), 2.0);
        assert!(nan_mean([f64::NAN, f64::NAN]).is_nan());
        assert!(nan_mean(Vec::<f64>::new()).is_nan());
    }

    #[test]
    fn test_nan_std_ddof() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((nan_std(v, 0) - 2.0).abs() < 1e-12);
        assert!((nan_std(v, 1) - 2.138_089_935_299_395).abs() < 1e-12);
        assert!(nan_std([1.0], 1).is_nan());
        assert_eq!(nan_std([1.0], 0), 0.0);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&v, 0.0), 1.0);
        assert_eq!(quantile_sorted(&v, 1.0), 4.0);
        assert!((quantile_sorted(&v, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile_sorted(&v, 0.75) - 3.25).abs() < 1e-12);
        assert_eq!(median_sorted(&v), 2.5);
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
        assert!(pearson(&[1.0, f64::NAN], &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn test_distribution_summary() {
        let s = DistributionSummary::from_values([3.0, f64::NAN, 1.0, 2.0]);
        assert_eq!(s.count, 3);
        assert_eq!(s.mean, Some(2.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.median, Some(2.0));
        assert_eq!(s.max, Some(3.0));

        let empty = DistributionSummary::from_values(Vec::<f64>::new());
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.std, None);
    }
}
