// src/metrics.rs - Pairwise histogram similarity metrics

use std::time::Instant;

use crate::errors::{GestureMatchError, Result};
use crate::histogram::{prepare, Histogram};

/// Score of one metric invocation plus its wall-clock cost in seconds.
/// The elapsed time is diagnostic only and never affects the decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricResult {
    pub score: f64,
    pub elapsed: f64,
}

/// The four similarity metrics computed for every histogram pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Correlation,
    ChiSquare,
    Intersection,
    Bhattacharyya,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Correlation,
        Metric::ChiSquare,
        Metric::Intersection,
        Metric::Bhattacharyya,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Correlation => "correlation",
            Metric::ChiSquare => "chi-square",
            Metric::Intersection => "intersection",
            Metric::Bhattacharyya => "bhattacharyya",
        }
    }

    /// Compute this metric for a raw (not pre-normalized) histogram pair
    pub fn compute(&self, h1: &Histogram, h2: &Histogram) -> Result<MetricResult> {
        match self {
            Metric::Correlation => correlation(h1, h2),
            Metric::ChiSquare => chi_square(h1, h2),
            Metric::Intersection => intersection(h1, h2),
            Metric::Bhattacharyya => bhattacharyya(h1, h2),
        }
    }
}

/// Pearson-style correlation coefficient over the interpolated, non-normalized
/// values, centered on each histogram's raw-count mean. Range [-1, 1],
/// higher = more similar.
pub fn correlation(h1: &Histogram, h2: &Histogram) -> Result<MetricResult> {
    let start = Instant::now();

    let (hi1, hi2, first, last) = prepare(h1, h2, false)?;

    let avg1 = h1.raw_mean();
    let avg2 = h2.raw_mean();

    let mut acc_u = 0.0;
    let mut acc_d1 = 0.0;
    let mut acc_d2 = 0.0;
    for i in first..=last {
        acc_u += (hi1[i] - avg1) * (hi2[i] - avg2);
        acc_d1 += (hi1[i] - avg1).powi(2);
        acc_d2 += (hi2[i] - avg2).powi(2);
    }

    let denom = (acc_d1 * acc_d2).sqrt();
    if denom == 0.0 {
        return Err(GestureMatchError::DegenerateMetric {
            metric: "correlation",
            context: "zero variance".to_string(),
        });
    }

    Ok(MetricResult {
        score: acc_u / denom,
        elapsed: start.elapsed().as_secs_f64(),
    })
}

/// Chi-square divergence over the normalized values. Lower = more similar.
///
/// Zero-denominator policy: a bin where both normalized values are zero
/// contributes nothing; a zero bin in the first histogram facing a non-zero
/// bin in the second is a degenerate-metric error rather than a division by
/// zero.
pub fn chi_square(h1: &Histogram, h2: &Histogram) -> Result<MetricResult> {
    let start = Instant::now();

    let (hi1, hi2, first, last) = prepare(h1, h2, true)?;

    let mut acc = 0.0;
    for i in first..=last {
        if hi1[i] == 0.0 {
            if hi2[i] == 0.0 {
                continue;
            }
            return Err(GestureMatchError::DegenerateMetric {
                metric: "chi-square",
                context: format!("zero bin {} in first histogram", i),
            });
        }
        acc += (hi1[i] - hi2[i]).powi(2) / hi1[i];
    }

    Ok(MetricResult {
        score: acc,
        elapsed: start.elapsed().as_secs_f64(),
    })
}

/// Histogram intersection over the normalized values. Range [0, 1],
/// higher = more similar.
pub fn intersection(h1: &Histogram, h2: &Histogram) -> Result<MetricResult> {
    let start = Instant::now();

    let (hi1, hi2, first, last) = prepare(h1, h2, true)?;

    let mut acc = 0.0;
    for i in first..=last {
        acc += hi1[i].min(hi2[i]);
    }

    Ok(MetricResult {
        score: acc,
        elapsed: start.elapsed().as_secs_f64(),
    })
}

/// Bhattacharyya distance over the non-normalized values, scaled by the
/// raw-count means and the overlap bin count. Lower = more similar.
///
/// The absolute value under the radical masks a possible negative radicand
/// (the scaling is mean-based, not a true unit-sum normalization), so the
/// output can fold the sign of the deviation.
pub fn bhattacharyya(h1: &Histogram, h2: &Histogram) -> Result<MetricResult> {
    let start = Instant::now();

    let (hi1, hi2, first, last) = prepare(h1, h2, false)?;

    let avg1 = h1.raw_mean();
    let avg2 = h2.raw_mean();

    let mut acc = 0.0;
    for i in first..=last {
        acc += (hi1[i] * hi2[i]).sqrt();
    }

    let bins = (last - first + 1) as f64;
    let denom = (avg1 * avg2 * bins * bins).sqrt();
    if denom == 0.0 {
        return Err(GestureMatchError::DegenerateMetric {
            metric: "bhattacharyya",
            context: "zero mean".to_string(),
        });
    }

    Ok(MetricResult {
        score: (1.0 - acc / denom).abs().sqrt(),
        elapsed: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn hist(pairs: &[(u32, u32)]) -> Histogram {
        pairs.iter().copied().collect()
    }

    fn bell() -> Histogram {
        hist(&[(0, 0), (1, 5), (2, 10), (3, 5), (4, 0)])
    }

    #[test]
    fn correlation_of_identical_is_one() {
        let h = bell();
        let result = correlation(&h, &h).unwrap();
        assert_approx_eq!(result.score, 1.0, 1e-12);
    }

    #[test]
    fn correlation_of_opposed_slopes_is_negative() {
        let up = hist(&[(0, 0), (1, 5), (2, 10)]);
        let down = hist(&[(0, 10), (1, 5), (2, 0)]);
        let result = correlation(&up, &down).unwrap();
        assert_approx_eq!(result.score, -1.0, 1e-12);
    }

    #[test]
    fn correlation_rejects_constant_histogram() {
        let flat = hist(&[(0, 4), (1, 4), (2, 4)]);
        let h = bell();
        assert!(matches!(
            correlation(&flat, &h),
            Err(GestureMatchError::DegenerateMetric {
                metric: "correlation",
                ..
            })
        ));
    }

    #[test]
    fn chi_square_of_identical_is_zero() {
        let h = bell();
        let result = chi_square(&h, &h).unwrap();
        assert_approx_eq!(result.score, 0.0, 1e-12);
    }

    #[test]
    fn chi_square_zero_bin_against_mass_is_degenerate() {
        let with_hole = hist(&[(0, 0), (1, 4), (2, 4)]);
        let full = hist(&[(0, 4), (1, 4), (2, 4)]);
        assert!(matches!(
            chi_square(&with_hole, &full),
            Err(GestureMatchError::DegenerateMetric {
                metric: "chi-square",
                ..
            })
        ));
    }

    #[test]
    fn intersection_of_identical_is_one() {
        let h = bell();
        let result = intersection(&h, &h).unwrap();
        assert_approx_eq!(result.score, 1.0, 1e-12);
    }

    #[test]
    fn intersection_of_disjoint_is_zero() {
        let left = hist(&[(0, 5), (1, 5), (2, 0), (3, 0)]);
        let right = hist(&[(0, 0), (1, 0), (2, 5), (3, 5)]);
        let result = intersection(&left, &right).unwrap();
        assert_approx_eq!(result.score, 0.0, 1e-12);
    }

    #[test]
    fn bhattacharyya_of_identical_is_zero() {
        // Contiguous keys, so the raw-count mean equals the dense mean
        let h = bell();
        let result = bhattacharyya(&h, &h).unwrap();
        assert_approx_eq!(result.score, 0.0, 1e-9);
    }

    #[test]
    fn bhattacharyya_rejects_zero_mass() {
        let empty_mass = hist(&[(0, 0), (3, 0)]);
        let h = bell();
        assert!(matches!(
            bhattacharyya(&empty_mass, &h),
            Err(GestureMatchError::DegenerateMetric {
                metric: "bhattacharyya",
                ..
            })
        ));
    }

    #[test]
    fn single_key_histogram_fails_before_any_metric_math() {
        let h = hist(&[(5, 10)]);
        let other = bell();
        for metric in Metric::ALL {
            assert!(matches!(
                metric.compute(&h, &other),
                Err(GestureMatchError::MalformedHistogram { .. })
            ));
        }
    }

    #[test]
    fn metrics_report_elapsed_time() {
        let h = bell();
        let result = intersection(&h, &h).unwrap();
        assert!(result.elapsed >= 0.0);
    }
}
