//! Matcher — deterministic candidate-vs-requirements scoring.

use std::collections::HashSet;

use crate::models::candidate::{CandidateRecord, MatchResult, Recommendation};

const SKILL_WEIGHT: f64 = 0.7;
const EXPERIENCE_WEIGHT: f64 = 0.3;

/// Scores a candidate against the required skills and experience floor.
///
/// Pure and case-insensitive. Skill coverage dominates the blended score;
/// experience acts as a secondary gate contributing 30%. Inputs are taken as
/// given — validation happened at extraction. The recommendation is left at
/// the `Pending` sentinel for the router to set.
pub fn score(
    candidate: &CandidateRecord,
    required_skills: &[String],
    min_experience: f64,
) -> MatchResult {
    let required_lower: Vec<String> = required_skills.iter().map(|s| s.to_lowercase()).collect();
    let candidate_lower: HashSet<String> =
        candidate.skills.iter().map(|s| s.to_lowercase()).collect();

    let required_set: HashSet<&str> = required_lower.iter().map(String::as_str).collect();
    let overlap = required_set
        .iter()
        .filter(|s| candidate_lower.contains(**s))
        .count();
    // max(1) guards the denominator when no required skills were derivable
    let skill_score = overlap as f64 / required_lower.len().max(1) as f64;

    let experience_gap = candidate.years_of_experience < min_experience;
    let experience_score = if experience_gap { 0.0 } else { 1.0 };

    let match_score = round2(SKILL_WEIGHT * skill_score + EXPERIENCE_WEIGHT * experience_score);

    let missing_skills = required_skills
        .iter()
        .filter(|s| !candidate_lower.contains(&s.to_lowercase()))
        .cloned()
        .collect();

    MatchResult {
        match_score,
        missing_skills,
        experience_gap,
        recommendation: Recommendation::Pending,
        review_reason: String::new(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(skills: &[&str], years: f64) -> CandidateRecord {
        CandidateRecord {
            candidate_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            years_of_experience: years,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            education: vec![],
            previous_roles: vec![],
            extraction_confidence: 0.9,
        }
    }

    fn required(skills: &[&str]) -> Vec<String> {
        skills.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let c = candidate(&["Python", "SQL"], 5.0);
        let r = required(&["Python", "AWS"]);
        assert_eq!(score(&c, &r, 3.0), score(&c, &r, 3.0));
    }

    #[test]
    fn test_skill_comparison_is_case_insensitive() {
        let c = candidate(&["Python"], 5.0);
        let r = required(&["python"]);
        let result = score(&c, &r, 3.0);
        // full overlap, no gap: 0.7*1.0 + 0.3*1.0
        assert_eq!(result.match_score, 1.0);
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_empty_required_skills_does_not_divide_by_zero() {
        let c = candidate(&["Python"], 5.0);
        let result = score(&c, &[], 3.0);
        assert!(result.match_score.is_finite());
        // no skill coverage to credit, experience intact: 0.7*0 + 0.3*1
        assert_eq!(result.match_score, 0.3);
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_experience_gap_zeroes_experience_component() {
        let c = candidate(&["Python"], 1.0);
        let r = required(&["Python"]);
        let result = score(&c, &r, 3.0);
        assert!(result.experience_gap);
        assert_eq!(result.match_score, 0.7);
    }

    #[test]
    fn test_missing_skills_keep_original_casing() {
        let c = candidate(&["python"], 5.0);
        let r = required(&["Python", "AWS"]);
        let result = score(&c, &r, 3.0);
        assert_eq!(result.missing_skills, vec!["AWS"]);
    }

    #[test]
    fn test_recommendation_starts_as_pending_sentinel() {
        let c = candidate(&[], 0.0);
        let result = score(&c, &required(&["Rust"]), 3.0);
        assert_eq!(result.recommendation, Recommendation::Pending);
        assert_eq!(result.review_reason, "");
    }

    #[test]
    fn test_half_skill_coverage_blends_to_065() {
        // skillScore 0.5, experienceScore 1 -> 0.7*0.5 + 0.3*1 = 0.65
        let c = candidate(&["Python", "SQL"], 5.0);
        let r = required(&["Python", "AWS"]);
        let result = score(&c, &r, 3.0);
        assert_eq!(result.match_score, 0.65);
        assert!(!result.experience_gap);
        assert_eq!(result.missing_skills, vec!["AWS"]);
    }

    #[test]
    fn test_score_is_rounded_to_two_decimals() {
        // skillScore 1/3, no gap: 0.7/3 + 0.3 = 0.5333.. -> 0.53
        let c = candidate(&["Python"], 5.0);
        let r = required(&["Python", "AWS", "Rust"]);
        let result = score(&c, &r, 3.0);
        assert_eq!(result.match_score, 0.53);
    }
}
