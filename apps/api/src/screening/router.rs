//! Router — ordered threshold rules that turn a match result into a final
//! disposition.

use serde::{Deserialize, Serialize};

use crate::models::candidate::{MatchResult, Recommendation};

/// Routing thresholds. Configuration, not constants — each is adjustable
/// without touching rule order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingThresholds {
    /// Minimum match score for an automatic shortlist.
    pub shortlist: f64,
    /// Minimum match score to route to human review instead of rejecting.
    pub review: f64,
    /// Extraction confidence below this forces human review regardless of
    /// score — an untrustworthy extraction must not silently reject or
    /// shortlist a candidate.
    pub confidence_floor: f64,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            shortlist: 0.85,
            review: 0.60,
            confidence_floor: 0.75,
        }
    }
}

/// Applies the ordered routing rules; the first matching rule wins. Sets the
/// recommendation and review reason exactly once.
pub fn route(
    mut result: MatchResult,
    extraction_confidence: f64,
    thresholds: &RoutingThresholds,
) -> MatchResult {
    let (recommendation, reason) = if extraction_confidence < thresholds.confidence_floor {
        (Recommendation::HumanReview, "Low extraction confidence")
    } else if result.match_score >= thresholds.shortlist && !result.experience_gap {
        (Recommendation::Shortlisted, "")
    } else if result.match_score >= thresholds.review {
        (Recommendation::HumanReview, "Partial skill match")
    } else {
        (Recommendation::Rejected, "Insufficient skill match")
    };

    result.recommendation = recommendation;
    result.review_reason = reason.to_string();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_result(match_score: f64, experience_gap: bool) -> MatchResult {
        MatchResult {
            match_score,
            missing_skills: vec![],
            experience_gap,
            recommendation: Recommendation::Pending,
            review_reason: String::new(),
        }
    }

    #[test]
    fn test_low_confidence_overrides_shortlist_worthy_score() {
        let routed = route(match_result(0.95, false), 0.70, &RoutingThresholds::default());
        assert_eq!(routed.recommendation, Recommendation::HumanReview);
        assert_eq!(routed.review_reason, "Low extraction confidence");
    }

    #[test]
    fn test_exact_shortlist_boundary_is_shortlisted() {
        let routed = route(match_result(0.85, false), 0.9, &RoutingThresholds::default());
        assert_eq!(routed.recommendation, Recommendation::Shortlisted);
        assert_eq!(routed.review_reason, "");
    }

    #[test]
    fn test_just_below_shortlist_boundary_falls_to_review() {
        let routed = route(
            match_result(0.849999, false),
            0.9,
            &RoutingThresholds::default(),
        );
        assert_eq!(routed.recommendation, Recommendation::HumanReview);
        assert_eq!(routed.review_reason, "Partial skill match");
    }

    #[test]
    fn test_experience_gap_blocks_shortlist() {
        let routed = route(match_result(0.90, true), 0.9, &RoutingThresholds::default());
        assert_eq!(routed.recommendation, Recommendation::HumanReview);
        assert_eq!(routed.review_reason, "Partial skill match");
    }

    #[test]
    fn test_exact_review_boundary_goes_to_review() {
        let routed = route(match_result(0.60, false), 0.9, &RoutingThresholds::default());
        assert_eq!(routed.recommendation, Recommendation::HumanReview);
    }

    #[test]
    fn test_below_review_boundary_is_rejected() {
        let routed = route(match_result(0.59, false), 0.9, &RoutingThresholds::default());
        assert_eq!(routed.recommendation, Recommendation::Rejected);
        assert_eq!(routed.review_reason, "Insufficient skill match");
    }

    #[test]
    fn test_thresholds_are_adjustable_without_reordering() {
        let lenient = RoutingThresholds {
            shortlist: 0.50,
            review: 0.30,
            confidence_floor: 0.10,
        };
        let routed = route(match_result(0.55, false), 0.9, &lenient);
        assert_eq!(routed.recommendation, Recommendation::Shortlisted);
    }
}
