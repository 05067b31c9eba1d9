//! Confidence scoring for QR results.
//!
//! A coarse linear heuristic: every finding costs a fixed number of points.
//! The numbers are provisional and meant to be calibrated against real runs.

/// Default escalation threshold, in percent.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 80.0;

/// Points deducted per finding on a failed QR.
pub const PENALTY_PER_FINDING: f64 = 5.0;

/// Turn a QR result into a confidence score in `[0, 100]`.
///
/// A pass is always full confidence. A failure loses
/// [`PENALTY_PER_FINDING`] per finding, clamped at both ends.
///
/// ```
/// use planner::qr::confidence::score;
///
/// assert_eq!(score(true, 12), 100.0);
/// assert_eq!(score(false, 2), 90.0);
/// assert_eq!(score(false, 40), 0.0);
/// ```
pub fn score(passed: bool, findings_count: u32) -> f64 {
    if passed {
        return 100.0;
    }
    let confidence = 100.0 - f64::from(findings_count) * PENALTY_PER_FINDING;
    confidence.clamp(0.0, 100.0)
}

/// Whether a confidence value falls below the escalation threshold.
pub fn below_threshold(confidence: f64, threshold: f64) -> bool {
    confidence < threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_documented_examples() {
        assert_eq!(score(true, 0), 100.0);
        assert_eq!(score(false, 0), 100.0);
        assert_eq!(score(false, 2), 90.0);
        assert_eq!(score(false, 5), 75.0);
        assert_eq!(score(false, 8), 60.0);
        assert_eq!(score(false, 20), 0.0);
    }

    #[test]
    fn test_below_threshold_is_strict() {
        assert!(below_threshold(75.0, DEFAULT_CONFIDENCE_THRESHOLD));
        assert!(!below_threshold(80.0, DEFAULT_CONFIDENCE_THRESHOLD));
    }

    proptest! {
        #[test]
        fn failed_score_matches_clamped_formula(findings in 0u32..10_000) {
            let expected = (100.0 - 5.0 * f64::from(findings)).clamp(0.0, 100.0);
            prop_assert_eq!(score(false, findings), expected);
        }

        #[test]
        fn passed_score_is_always_full(findings in any::<u32>()) {
            prop_assert_eq!(score(true, findings), 100.0);
        }

        #[test]
        fn score_stays_in_range(passed in any::<bool>(), findings in any::<u32>()) {
            let s = score(passed, findings);
            prop_assert!((0.0..=100.0).contains(&s));
        }
    }
}
