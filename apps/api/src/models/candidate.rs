use serde::{Deserialize, Serialize};

/// One education entry from a resume. Everything but the degree and
/// institution is routinely absent from model output, so optional fields
/// default to empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub graduation_date: String,
    #[serde(default)]
    pub duration: String,
}

/// One prior role from a resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousRole {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub duration: String,
}

/// Structured extraction result for one candidate. Produced only by a fully
/// successful extraction — there are no partial records.
///
/// `extraction_confidence` is the extractor's self-reported certainty in
/// [0, 1] and gates routing independently of match quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_name: String,
    pub email: String,
    pub phone: String,
    pub years_of_experience: f64,
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub previous_roles: Vec<PreviousRole>,
    pub extraction_confidence: f64,
}

/// Final disposition for a screened candidate.
/// `Pending` is the sentinel the matcher emits; the router replaces it
/// exactly once before the result is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Pending,
    Shortlisted,
    #[serde(rename = "Human Review")]
    HumanReview,
    Rejected,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Pending => "Pending",
            Recommendation::Shortlisted => "Shortlisted",
            Recommendation::HumanReview => "Human Review",
            Recommendation::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring output for one candidate, routed to a disposition before being
/// folded into the task's result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Blended score in [0, 1], rounded to two decimals.
    pub match_score: f64,
    /// Required skills (original casing) absent from the candidate's set.
    pub missing_skills: Vec<String>,
    /// Candidate experience is below the configured floor.
    pub experience_gap: bool,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub review_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_wire_strings() {
        assert_eq!(
            serde_json::to_string(&Recommendation::HumanReview).unwrap(),
            r#""Human Review""#
        );
        assert_eq!(
            serde_json::to_string(&Recommendation::Shortlisted).unwrap(),
            r#""Shortlisted""#
        );
        let parsed: Recommendation = serde_json::from_str(r#""Human Review""#).unwrap();
        assert_eq!(parsed, Recommendation::HumanReview);
    }

    #[test]
    fn test_candidate_record_requires_numeric_fields() {
        let json = r#"{
            "candidate_name": "Ada",
            "email": "ada@example.com",
            "phone": "555-0100",
            "years_of_experience": "five",
            "skills": [],
            "extraction_confidence": 0.9
        }"#;
        assert!(serde_json::from_str::<CandidateRecord>(json).is_err());
    }

    #[test]
    fn test_candidate_record_defaults_entry_lists() {
        let json = r#"{
            "candidate_name": "Ada",
            "email": "ada@example.com",
            "phone": "555-0100",
            "years_of_experience": 5,
            "skills": ["Python"],
            "extraction_confidence": 0.9
        }"#;
        let record: CandidateRecord = serde_json::from_str(json).unwrap();
        assert!(record.education.is_empty());
        assert!(record.previous_roles.is_empty());
    }
}
