// src/fusion.rs - Weighted probability fusion and the three-way decision

use std::fmt;

/// Fused probability at or above this threshold means the gestures match
pub const MATCH_THRESHOLD: f64 = 0.75;

/// Fused probability at or below this threshold means they do not
pub const NO_MATCH_THRESHOLD: f64 = 0.35;

/// Three-way matching verdict, produced independently per metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Match,
    NoMatch,
    Inconclusive,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Match => "match",
            Decision::NoMatch => "no match",
            Decision::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted sum of similarity terms. Weights are not required to sum to 1,
/// so the result is a raw weighted score rather than a true posterior and
/// may fall outside [0, 1].
pub fn total_probability(terms: &[(f64, f64)]) -> f64 {
    terms.iter().map(|(similarity, weight)| similarity * weight).sum()
}

/// Clamp a fine-pass probability into [0, 1]. NaN passes through (both
/// comparisons are false), which later decides Inconclusive.
pub fn clamp01(prob: f64) -> f64 {
    if prob > 1.0 {
        1.0
    } else if prob < 0.0 {
        0.0
    } else {
        prob
    }
}

/// Map a fused probability to a decision via the fixed thresholds.
/// Out-of-range probabilities are tolerated: anything >= 0.75 matches,
/// anything <= 0.35 does not, everything else (including NaN) is
/// inconclusive.
pub fn decide(prob: f64) -> Decision {
    if prob >= MATCH_THRESHOLD {
        Decision::Match
    } else if prob <= NO_MATCH_THRESHOLD {
        Decision::NoMatch
    } else {
        Decision::Inconclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn total_probability_is_weighted_sum() {
        let terms = [(1.0, 0.4), (0.5, 0.3), (0.0, 0.3)];
        assert_approx_eq!(total_probability(&terms), 0.55, 1e-12);
    }

    #[test]
    fn decision_boundaries() {
        assert_eq!(decide(0.75), Decision::Match);
        assert_eq!(decide(0.7499), Decision::Inconclusive);
        assert_eq!(decide(0.35), Decision::NoMatch);
        assert_eq!(decide(0.3501), Decision::Inconclusive);
    }

    #[test]
    fn out_of_range_probabilities_still_decide() {
        assert_eq!(decide(1.8), Decision::Match);
        assert_eq!(decide(-0.4), Decision::NoMatch);
        assert_eq!(decide(f64::NAN), Decision::Inconclusive);
    }

    #[test]
    fn clamp01_bounds_and_passes_interior() {
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(-0.2), 0.0);
        assert_approx_eq!(clamp01(0.42), 0.42, 1e-12);
        assert!(clamp01(f64::NAN).is_nan());
    }
}
