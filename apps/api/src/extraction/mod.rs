//! Candidate extraction — turns raw resume text into a structured record via
//! the generation service, with a single bounded JSON-repair retry.
//!
//! Generation services are unreliable JSON emitters. One repair round trip,
//! feeding the model its own invalid output, raises the success rate without
//! unbounded cost or latency. Transport errors propagate immediately and do
//! not consume the repair attempt.

pub mod prompts;

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::llm_client::{strip_code_fences, GenerationService, LlmError};
use crate::models::candidate::CandidateRecord;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Generation service failed: {0}")]
    Service(#[from] LlmError),

    #[error("Extraction failed after retry: {diagnostic}\n\nRaw model output:\n{raw_output}")]
    Invalid {
        raw_output: String,
        diagnostic: String,
    },
}

/// Retry state for the bounded self-correction loop: one fresh attempt, one
/// repair attempt carrying the raw first-attempt output, then failure.
enum Attempt {
    First,
    Repair { raw_output: String },
}

pub struct CandidateExtractor {
    llm: Arc<dyn GenerationService>,
}

impl CandidateExtractor {
    pub fn new(llm: Arc<dyn GenerationService>) -> Self {
        Self { llm }
    }

    /// Extracts a structured candidate record from resume text.
    /// Maximum two generation calls; the second embeds the literal first
    /// output under a fix-it instruction.
    pub async fn extract(&self, resume_text: &str) -> Result<CandidateRecord, ExtractionError> {
        let mut attempt = Attempt::First;

        loop {
            let prompt = match &attempt {
                Attempt::First => {
                    prompts::EXTRACTION_PROMPT_TEMPLATE.replace("{resume_text}", resume_text)
                }
                Attempt::Repair { raw_output } => {
                    prompts::REPAIR_PROMPT_TEMPLATE.replace("{raw_output}", raw_output)
                }
            };

            let raw = self
                .llm
                .complete(
                    prompts::EXTRACTION_SYSTEM,
                    &prompt,
                    prompts::EXTRACTION_TEMPERATURE,
                )
                .await?;

            match parse_candidate(&raw) {
                Ok(record) => return Ok(record),
                Err(diagnostic) => match attempt {
                    Attempt::First => {
                        warn!("First extraction attempt invalid, retrying with repair prompt: {diagnostic}");
                        attempt = Attempt::Repair { raw_output: raw };
                    }
                    Attempt::Repair { .. } => {
                        return Err(ExtractionError::Invalid {
                            raw_output: raw,
                            diagnostic,
                        });
                    }
                },
            }
        }
    }
}

/// Parses and validates one model response into a `CandidateRecord`.
/// Tolerates the model wrapping JSON in prose or markdown: fences are
/// stripped and the substring between the first `{` and last `}` is taken.
fn parse_candidate(raw: &str) -> Result<CandidateRecord, String> {
    let text = strip_code_fences(raw);
    let json = slice_json_object(text).ok_or("no JSON object found in model output")?;
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
    normalize_aliases(&mut value);
    serde_json::from_value(value).map_err(|e| format!("schema validation error: {e}"))
}

fn slice_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

// Field-alias table consulted once during deserialization. Models emit these
// alternate names for the canonical fields; strings listed per entry kind are
// backfilled with "" when absent, and numeric values (years, GPAs) are
// coerced to strings.
const ROLE_ALIASES: &[(&str, &str)] = &[("role", "title"), ("duration", "dates")];
const ROLE_FIELDS: &[&str] = &["role", "company", "duration"];
const EDUCATION_ALIASES: &[(&str, &str)] = &[("institution", "university"), ("graduation_date", "year")];
const EDUCATION_FIELDS: &[&str] = &[
    "degree",
    "institution",
    "location",
    "gpa",
    "graduation_date",
    "duration",
];

fn normalize_aliases(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    normalize_entries(obj, "previous_roles", ROLE_FIELDS, ROLE_ALIASES);
    normalize_entries(obj, "education", EDUCATION_FIELDS, EDUCATION_ALIASES);
}

fn normalize_entries(
    obj: &mut Map<String, Value>,
    key: &str,
    fields: &[&str],
    aliases: &[(&str, &str)],
) {
    let entries = obj.entry(key).or_insert_with(|| Value::Array(Vec::new()));
    let Some(entries) = entries.as_array_mut() else {
        return;
    };
    for entry in entries {
        let Some(entry) = entry.as_object_mut() else {
            continue;
        };
        for &(canonical, alias) in aliases {
            if entry.get(canonical).map_or(true, Value::is_null) {
                if let Some(aliased) = entry.remove(alias) {
                    entry.insert(canonical.to_string(), aliased);
                }
            }
        }
        for &field in fields {
            let replacement = match entry.get(field) {
                None | Some(Value::Null) => Some(Value::String(String::new())),
                Some(Value::Number(n)) => Some(Value::String(n.to_string())),
                _ => None,
            };
            if let Some(replacement) = replacement {
                entry.insert(field.to_string(), replacement);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    const VALID_RESPONSE: &str = r#"{
        "candidate_name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "555-0100",
        "years_of_experience": 5,
        "skills": ["Python", "SQL"],
        "education": [],
        "previous_roles": [],
        "extraction_confidence": 0.9
    }"#;

    /// Test double that replays a fixed sequence of responses and counts calls.
    struct ScriptedLlm {
        responses: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedLlm {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra LLM call"))
        }
    }

    #[tokio::test]
    async fn test_clean_json_succeeds_in_one_attempt() {
        let llm = ScriptedLlm::new(&[VALID_RESPONSE]);
        let extractor = CandidateExtractor::new(llm.clone());

        let record = extractor.extract("resume").await.unwrap();
        assert_eq!(record.candidate_name, "Ada Lovelace");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_repair_attempt_recovers_from_invalid_first_output() {
        let llm = ScriptedLlm::new(&["this is not json at all", VALID_RESPONSE]);
        let extractor = CandidateExtractor::new(llm.clone());

        let record = extractor.extract("resume").await.unwrap();
        assert_eq!(record.skills, vec!["Python", "SQL"]);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_two_invalid_outputs_fail_after_exactly_two_attempts() {
        let llm = ScriptedLlm::new(&["{broken", "{still broken"]);
        let extractor = CandidateExtractor::new(llm.clone());

        let err = extractor.extract("resume").await.unwrap_err();
        assert_eq!(llm.call_count(), 2);
        match err {
            ExtractionError::Invalid { raw_output, .. } => {
                assert_eq!(raw_output, "{still broken");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tolerates_prose_and_fences() {
        let raw = format!("Here is the data:\n```json\n{VALID_RESPONSE}\n```\nDone.");
        let record = parse_candidate(&raw).unwrap();
        assert_eq!(record.email, "ada@example.com");
    }

    #[test]
    fn test_parse_rejects_output_without_braces() {
        let err = parse_candidate("no object here").unwrap_err();
        assert!(err.contains("no JSON object"));
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        // no extraction_confidence
        let raw = r#"{
            "candidate_name": "Ada",
            "email": "a@b.c",
            "phone": "",
            "years_of_experience": 2,
            "skills": []
        }"#;
        let err = parse_candidate(raw).unwrap_err();
        assert!(err.contains("schema validation"));
    }

    #[test]
    fn test_role_and_education_aliases_are_normalized() {
        let raw = r#"{
            "candidate_name": "Ada",
            "email": "a@b.c",
            "phone": "",
            "years_of_experience": 2,
            "skills": [],
            "education": [
                {"degree": "BSc", "university": "MIT", "year": 2016, "gpa": 3.8}
            ],
            "previous_roles": [
                {"title": "Engineer", "company": "Acme", "dates": "2019-2022"}
            ],
            "extraction_confidence": 0.8
        }"#;
        let record = parse_candidate(raw).unwrap();

        let edu = &record.education[0];
        assert_eq!(edu.institution, "MIT");
        assert_eq!(edu.graduation_date, "2016");
        assert_eq!(edu.gpa, "3.8");
        assert_eq!(edu.location, "");

        let role = &record.previous_roles[0];
        assert_eq!(role.role, "Engineer");
        assert_eq!(role.duration, "2019-2022");
    }

    #[test]
    fn test_canonical_field_wins_over_alias() {
        let raw = r#"{
            "candidate_name": "Ada",
            "email": "a@b.c",
            "phone": "",
            "years_of_experience": 2,
            "skills": [],
            "previous_roles": [
                {"role": "Staff Engineer", "title": "Engineer", "company": "Acme"}
            ],
            "extraction_confidence": 0.8
        }"#;
        let record = parse_candidate(raw).unwrap();
        assert_eq!(record.previous_roles[0].role, "Staff Engineer");
    }
}
