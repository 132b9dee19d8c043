// src/pipeline.rs - One matching run: geometric normalization, coarse and
// fine metric passes, probability fusion, decisions.

use crate::bundle::{Bundle, Half};
use crate::config::Weights;
use crate::errors::{GestureMatchError, Result};
use crate::fusion::{clamp01, decide, total_probability, Decision};
use crate::histogram::Histogram;
use crate::metrics::{Metric, MetricResult};
use crate::preprocess::{prepare_bundle, renormalize_fingers, split_at_midpoint};

/// Coarse-pass results for one metric: whole-axis scores, regional scores,
/// fused probability and its decision
#[derive(Debug, Clone)]
pub struct CoarseMetricReport {
    pub metric: Metric,
    pub horizontal: MetricResult,
    pub vertical: MetricResult,
    pub wrist: MetricResult,
    pub fingers: MetricResult,
    pub probability: f64,
    pub decision: Decision,
}

/// Fine-pass (finger-only) results for one metric
#[derive(Debug, Clone)]
pub struct FineMetricReport {
    pub metric: Metric,
    /// Finger histogram against the whole reference vertical projection
    pub vertical: MetricResult,
    pub wrist: MetricResult,
    pub fingers: MetricResult,
    pub probability: f64,
    pub decision: Decision,
}

/// Everything one matching run hands to the presentation layer. Plain
/// records only; no rendering or I/O happens here.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub gesture_type: String,
    pub coarse: Vec<CoarseMetricReport>,
    pub fine: Vec<FineMetricReport>,
}

/// Attach axis/region context to a metric failure so the caller can tell
/// which comparison died
fn annotate(err: GestureMatchError, metric: Metric, scope: &str) -> GestureMatchError {
    match err {
        GestureMatchError::MalformedHistogram { context } => {
            GestureMatchError::MalformedHistogram {
                context: format!("{}, {}: {}", metric.name(), scope, context),
            }
        }
        GestureMatchError::DegenerateMetric { metric, context } => {
            GestureMatchError::DegenerateMetric {
                metric,
                context: format!("{}: {}", scope, context),
            }
        }
        other => other,
    }
}

fn run_metric(
    metric: Metric,
    h1: &Histogram,
    h2: &Histogram,
    scope: &str,
) -> Result<MetricResult> {
    metric.compute(h1, h2).map_err(|e| annotate(e, metric, scope))
}

/// Map raw per-scope scores into [0,1]-oriented similarities and fuse them
/// with the coarse weights. The regional terms are ratios of shifted scores
/// (vertical match relative to regional match), so the result is not
/// clamped and may fall outside [0, 1].
fn coarse_probability(
    metric: Metric,
    x: f64,
    y: f64,
    wrist: f64,
    fingers: f64,
    weights: &Weights,
) -> f64 {
    match metric {
        Metric::Correlation => total_probability(&[
            ((x + 1.0) / 2.0, weights.prob_h),
            ((y + 1.0) / (wrist + 1.0), weights.prob_v),
            ((y + 1.0) / (fingers + 1.0), weights.prob_v_f),
        ]),
        Metric::ChiSquare => total_probability(&[
            (1.0 - x, weights.prob_h),
            ((1.0 - y) / (1.0 - wrist), weights.prob_v),
            ((1.0 - y) / (1.0 - fingers), weights.prob_v_f),
        ]),
        Metric::Intersection => total_probability(&[
            (x, weights.prob_h),
            (y / wrist, weights.prob_v),
            (y / fingers, weights.prob_v_f),
        ]),
        Metric::Bhattacharyya => total_probability(&[
            (1.0 - x, weights.prob_h),
            ((1.0 - y) / (1.0 - wrist), weights.prob_v),
            ((1.0 - y) / (1.0 - fingers), weights.prob_v_f),
        ]),
    }
}

/// Fine-pass fusion: the horizontal term reuses the coarse horizontal score,
/// the two regional ratio terms both carry the fine vertical weight
fn fine_probability(
    metric: Metric,
    coarse_x: f64,
    f: f64,
    f_wrist: f64,
    f_fingers: f64,
    weights: &Weights,
) -> f64 {
    match metric {
        Metric::Correlation => total_probability(&[
            ((coarse_x + 1.0) / 2.0, weights.prob_f_h),
            ((f + 1.0) / (f_wrist + 1.0), weights.prob_f_v),
            ((f + 1.0) / (f_fingers + 1.0), weights.prob_f_v),
        ]),
        Metric::ChiSquare => total_probability(&[
            (1.0 - coarse_x, weights.prob_f_h),
            ((1.0 - f) / (1.0 - f_wrist), weights.prob_f_v),
            ((1.0 - f) / (1.0 - f_fingers), weights.prob_f_v),
        ]),
        Metric::Intersection => total_probability(&[
            (coarse_x, weights.prob_f_h),
            (f / f_wrist, weights.prob_f_v),
            (f / f_fingers, weights.prob_f_v),
        ]),
        Metric::Bhattacharyya => total_probability(&[
            (1.0 - coarse_x, weights.prob_f_h),
            ((1.0 - f) / (1.0 - f_wrist), weights.prob_f_v),
            ((1.0 - f) / (1.0 - f_fingers), weights.prob_f_v),
        ]),
    }
}

/// Run one complete matching run for a bundle against a weight snapshot.
///
/// Any metric or normalization failure aborts the whole run; there are no
/// partial results. The fine pass is always computed, whether or not the
/// coarse pass was conclusive.
pub fn run_match(bundle: &Bundle, weights: &Weights) -> Result<MatchReport> {
    let prep = prepare_bundle(bundle)?;

    // Midpoint split of both vertical projections; wrist/fingers assignment
    // is resolved once from the orientation tag
    let (cand_lower, cand_upper) = split_at_midpoint(&prep.image_y_scaled)?;
    let (ref_lower, ref_upper) = split_at_midpoint(&bundle.reference_y)?;
    let finger_half = bundle.orientation.finger_half();

    let mut coarse = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let horizontal = run_metric(
            metric,
            &prep.image_x_scaled,
            &bundle.reference_x,
            "horizontal axis",
        )?;
        let vertical = run_metric(
            metric,
            &prep.image_y_scaled,
            &bundle.reference_y,
            "vertical axis",
        )?;

        let lower = run_metric(metric, &cand_lower, &ref_lower, "lower vertical region")?;
        let upper = run_metric(metric, &cand_upper, &ref_upper, "upper vertical region")?;
        let (wrist, fingers) = match finger_half {
            Half::Upper => (lower, upper),
            Half::Lower => (upper, lower),
        };

        let probability = coarse_probability(
            metric,
            horizontal.score,
            vertical.score,
            wrist.score,
            fingers.score,
            weights,
        );

        coarse.push(CoarseMetricReport {
            metric,
            horizontal,
            vertical,
            wrist,
            fingers,
            probability,
            decision: decide(probability),
        });
    }

    // Fine pass: isolate the finger region, re-normalize its domain onto the
    // reference, and match it against the whole reference vertical projection
    let finger_source = match finger_half {
        Half::Upper => &cand_upper,
        Half::Lower => &cand_lower,
    };
    let fingers_data = renormalize_fingers(finger_source, &bundle.reference_y)?;
    let (fd_lower, fd_upper) = split_at_midpoint(&fingers_data)?;

    let mut fine = Vec::with_capacity(Metric::ALL.len());
    for (metric, coarse_report) in Metric::ALL.into_iter().zip(&coarse) {
        let vertical = run_metric(metric, &fingers_data, &bundle.reference_y, "finger region")?;
        let wrist = run_metric(metric, &fd_upper, &ref_lower, "finger upper sub-region")?;
        let fingers = run_metric(metric, &fd_lower, &ref_upper, "finger lower sub-region")?;

        let probability = clamp01(fine_probability(
            metric,
            coarse_report.horizontal.score,
            vertical.score,
            wrist.score,
            fingers.score,
            weights,
        ));

        fine.push(FineMetricReport {
            metric,
            vertical,
            wrist,
            fingers,
            probability,
            decision: decide(probability),
        });
    }

    Ok(MatchReport {
        gesture_type: bundle.gesture_type.clone(),
        coarse,
        fine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Orientation;
    use crate::metrics;
    use assert_approx_eq::assert_approx_eq;
    use image::RgbaImage;

    fn hist(pairs: &[(u32, u32)]) -> Histogram {
        pairs.iter().copied().collect()
    }

    /// Projection with per-bin variation, all counts at or above the noise
    /// floor. Max key and max value are powers of two so the floor-to-integer
    /// scaling in the preprocessor is an exact no-op for a self-reference.
    fn busy_projection(max_key: u32) -> Histogram {
        (0..=max_key).map(|k| (k, 8 + (k % 7) * 4)).collect()
    }

    fn identical_bundle() -> Bundle {
        let x = busy_projection(16);
        let y = busy_projection(16);
        Bundle {
            gesture_type: "open palm".to_string(),
            orientation: Orientation::Bottom,
            image: RgbaImage::new(100, 100),
            image_x: x.clone(),
            image_y: y.clone(),
            reference: RgbaImage::new(100, 100),
            reference_x: x,
            reference_y: y,
        }
    }

    fn weights() -> Weights {
        Weights {
            prob_h: 0.4,
            prob_v: 0.3,
            prob_v_f: 0.3,
            prob_f_h: 0.5,
            prob_f_v: 0.25,
        }
    }

    #[test]
    fn identical_candidate_and_reference_match_on_all_metrics() {
        let report = run_match(&identical_bundle(), &weights()).unwrap();

        assert_eq!(report.coarse.len(), 4);
        assert_eq!(report.fine.len(), 4);

        for metric_report in &report.coarse {
            // Bhattacharyya's mean-based scaling leaves ~1e-8 residue even
            // for identical projections, hence the loose tolerance
            assert_approx_eq!(metric_report.probability, 1.0, 1e-6);
            assert_eq!(metric_report.decision, Decision::Match);
        }
    }

    #[test]
    fn fine_probabilities_are_clamped() {
        let report = run_match(&identical_bundle(), &weights()).unwrap();
        for metric_report in &report.fine {
            assert!(!metric_report.probability.is_nan());
            assert!(metric_report.probability >= 0.0);
            assert!(metric_report.probability <= 1.0);
        }
    }

    #[test]
    fn coarse_fusion_with_horizontal_only_weights() {
        // Candidate and reference horizontal projections identical; weight
        // 1.0 on the horizontal term, 0 elsewhere.
        let h = hist(&[(0, 0), (1, 5), (2, 10), (3, 5), (4, 0)]);

        let cor = metrics::correlation(&h, &h).unwrap().score;
        let chi = metrics::chi_square(&h, &h).unwrap().score;
        let int = metrics::intersection(&h, &h).unwrap().score;
        let bha = metrics::bhattacharyya(&h, &h).unwrap().score;

        assert_approx_eq!(cor, 1.0, 1e-12);
        assert_approx_eq!(chi, 0.0, 1e-12);
        assert_approx_eq!(int, 1.0, 1e-12);
        assert_approx_eq!(bha, 0.0, 1e-9);

        let w = Weights {
            prob_h: 1.0,
            prob_v: 0.0,
            prob_v_f: 0.0,
            prob_f_h: 0.0,
            prob_f_v: 0.0,
        };

        // Regional scores are irrelevant under zero weights; pick safe ones
        let prob = coarse_probability(Metric::Correlation, cor, cor, cor, cor, &w);
        assert_approx_eq!(prob, 1.0, 1e-12);
        assert_eq!(decide(prob), Decision::Match);
    }

    #[test]
    fn sparse_candidate_aborts_the_run() {
        let mut bundle = identical_bundle();
        // Only one bin survives the noise floor
        bundle.image_x = hist(&[(0, 1), (10, 50), (16, 2)]);

        assert!(matches!(
            run_match(&bundle, &weights()),
            Err(GestureMatchError::MalformedHistogram { .. })
        ));
    }

    #[test]
    fn orientation_swaps_wrist_and_finger_assignment() {
        let mut bundle = identical_bundle();
        bundle.orientation = Orientation::Top;
        let top_report = run_match(&bundle, &weights()).unwrap();

        bundle.orientation = Orientation::Bottom;
        let bottom_report = run_match(&bundle, &weights()).unwrap();

        for (t, b) in top_report.coarse.iter().zip(bottom_report.coarse.iter()) {
            assert_eq!(t.wrist.score, b.fingers.score);
            assert_eq!(t.fingers.score, b.wrist.score);
        }
    }
}
