// src/histogram.rs - Projection histogram data model and normalization

use std::collections::BTreeMap;

use crate::errors::{GestureMatchError, Result};

/// A 1-D silhouette projection: integer bin index (pixel row or column,
/// origin at the far edge of the capture) mapped to a pixel count.
///
/// Keys need not be contiguous or start at zero. Metrics are only defined
/// for histograms with at least two distinct bins and some non-zero mass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    bins: BTreeMap<u32, u32>,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            bins: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: u32, count: u32) {
        self.bins.insert(key, count);
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Iterate bins in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bins.iter().map(|(&k, &v)| (k, v))
    }

    pub fn min_key(&self) -> Option<u32> {
        self.bins.keys().next().copied()
    }

    pub fn max_key(&self) -> Option<u32> {
        self.bins.keys().next_back().copied()
    }

    pub fn max_value(&self) -> Option<u32> {
        self.bins.values().max().copied()
    }

    /// Mean of the raw counts over the original bin count (not the dense,
    /// interpolated domain). Used as the centering constant by the
    /// correlation and Bhattacharyya metrics.
    pub fn raw_mean(&self) -> f64 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.bins.values().map(|&v| v as u64).sum();
        sum as f64 / self.bins.len() as f64
    }
}

impl FromIterator<(u32, u32)> for Histogram {
    fn from_iter<T: IntoIterator<Item = (u32, u32)>>(iter: T) -> Self {
        Self {
            bins: iter.into_iter().collect(),
        }
    }
}

/// Linearly interpolate a sparse histogram onto the dense integer domain
/// `[min_key, max_key]`, sampling the piecewise-linear function through the
/// histogram's points at every integer in between.
pub fn interpolate(h: &Histogram) -> Result<Vec<f64>> {
    if h.len() < 2 {
        return Err(GestureMatchError::MalformedHistogram {
            context: "histogram".to_string(),
        });
    }

    let points: Vec<(u32, u32)> = h.iter().collect();
    let first = points[0].0;
    let last = points[points.len() - 1].0;

    let mut dense = Vec::with_capacity((last - first + 1) as usize);
    let mut seg = 0;
    for t in first..=last {
        while seg + 1 < points.len() && points[seg + 1].0 <= t {
            seg += 1;
        }
        let (x0, y0) = points[seg];
        if t == x0 {
            dense.push(y0 as f64);
        } else {
            let (x1, y1) = points[seg + 1];
            let frac = (t - x0) as f64 / (x1 - x0) as f64;
            dense.push(y0 as f64 + frac * (y1 as f64 - y0 as f64));
        }
    }

    Ok(dense)
}

/// Normalize a dense sequence to unit sum
pub fn normalize(values: &[f64]) -> Result<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return Err(GestureMatchError::MalformedHistogram {
            context: "histogram".to_string(),
        });
    }
    Ok(values.iter().map(|v| v / total).collect())
}

/// Interpolate both histograms and define the comparison range as the
/// overlapping prefix `[0, min(len1, len2) - 1]` of the two dense domains;
/// any trailing excess in the longer histogram is ignored. Optionally
/// normalizes both dense sequences to unit sum.
pub fn prepare(
    h1: &Histogram,
    h2: &Histogram,
    do_normalization: bool,
) -> Result<(Vec<f64>, Vec<f64>, usize, usize)> {
    let mut hi1 = interpolate(h1).map_err(|e| relabel(e, "first histogram"))?;
    let mut hi2 = interpolate(h2).map_err(|e| relabel(e, "second histogram"))?;

    let first = 0;
    let last = hi1.len().min(hi2.len()) - 1;

    if do_normalization {
        hi1 = normalize(&hi1).map_err(|e| relabel(e, "first histogram"))?;
        hi2 = normalize(&hi2).map_err(|e| relabel(e, "second histogram"))?;
    }

    Ok((hi1, hi2, first, last))
}

fn relabel(err: GestureMatchError, which: &str) -> GestureMatchError {
    match err {
        GestureMatchError::MalformedHistogram { .. } => GestureMatchError::MalformedHistogram {
            context: which.to_string(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn hist(pairs: &[(u32, u32)]) -> Histogram {
        pairs.iter().copied().collect()
    }

    #[test]
    fn interpolate_fills_missing_keys() {
        let h = hist(&[(0, 2), (2, 4)]);
        let dense = interpolate(&h).unwrap();
        assert_eq!(dense, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn interpolate_keeps_present_keys_exact() {
        let h = hist(&[(3, 1), (4, 7), (6, 3)]);
        let dense = interpolate(&h).unwrap();
        assert_eq!(dense.len(), 4);
        assert_approx_eq!(dense[0], 1.0);
        assert_approx_eq!(dense[1], 7.0);
        assert_approx_eq!(dense[2], 5.0);
        assert_approx_eq!(dense[3], 3.0);
    }

    #[test]
    fn interpolate_rejects_single_key() {
        let h = hist(&[(5, 10)]);
        assert!(matches!(
            interpolate(&h),
            Err(GestureMatchError::MalformedHistogram { .. })
        ));
    }

    #[test]
    fn normalize_after_interpolate_sums_to_one() {
        let h = hist(&[(0, 3), (2, 9), (5, 1), (9, 4)]);
        let normalized = normalize(&interpolate(&h).unwrap()).unwrap();
        let total: f64 = normalized.iter().sum();
        assert_approx_eq!(total, 1.0, 1e-12);
    }

    #[test]
    fn normalize_rejects_zero_mass() {
        let h = hist(&[(0, 0), (4, 0)]);
        let dense = interpolate(&h).unwrap();
        assert!(matches!(
            normalize(&dense),
            Err(GestureMatchError::MalformedHistogram { .. })
        ));
    }

    #[test]
    fn prepare_compares_overlapping_prefix_only() {
        let short = hist(&[(0, 1), (3, 4)]);
        let long = hist(&[(0, 2), (9, 2)]);
        let (hi1, hi2, first, last) = prepare(&short, &long, false).unwrap();
        assert_eq!(first, 0);
        assert_eq!(last, 3);
        assert_eq!(hi1.len(), 4);
        assert_eq!(hi2.len(), 10);
    }

    #[test]
    fn raw_mean_uses_original_key_count() {
        // Dense domain has 5 bins but only 2 raw keys
        let h = hist(&[(0, 2), (4, 6)]);
        assert_approx_eq!(h.raw_mean(), 4.0);
    }
}
