//! The screening pipeline — runs every stage for one resume strictly in
//! order and folds the outcome into a result payload.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::extraction::{CandidateExtractor, ExtractionError};
use crate::models::candidate::{CandidateRecord, MatchResult};
use crate::pdf::PdfError;
use crate::retrieval::{SkillExtractionError, SkillExtractor};
use crate::screening::matcher;
use crate::screening::router::{self, RoutingThresholds};

/// Retrieval query used to pull skill-bearing reference documents.
pub const RETRIEVAL_QUERY: &str = "required skills";
pub const RETRIEVAL_TOP_K: usize = 2;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Candidate extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Skill extraction failed: {0}")]
    SkillExtraction(#[from] SkillExtractionError),

    #[error("{stage} timed out after {seconds}s")]
    StageTimeout { stage: &'static str, seconds: u64 },
}

/// Everything a completed run produces. Transient — owned by the in-flight
/// processing unit and folded into the task row on completion.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutcome {
    pub candidate: CandidateRecord,
    pub result: MatchResult,
    pub required_skills: Vec<String>,
}

impl ScreeningOutcome {
    /// Structured reasoning trace persisted alongside the result payload.
    pub fn reasoning_trace(&self) -> serde_json::Value {
        json!({
            "required_skills": self.required_skills,
            "match_score": self.result.match_score,
            "missing_skills": self.result.missing_skills,
            "confidence": self.candidate.extraction_confidence,
            "recommendation": self.result.recommendation,
        })
    }
}

/// The full screening pipeline: extraction, retrieval, scoring, routing.
/// Workers run it once per job; it holds no per-task state.
pub struct ScreeningPipeline {
    extractor: Arc<CandidateExtractor>,
    skills: Arc<SkillExtractor>,
    thresholds: RoutingThresholds,
    min_experience: f64,
    stage_timeout: Duration,
}

impl ScreeningPipeline {
    pub fn new(
        extractor: Arc<CandidateExtractor>,
        skills: Arc<SkillExtractor>,
        thresholds: RoutingThresholds,
        min_experience: f64,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            skills,
            thresholds,
            min_experience,
            stage_timeout,
        }
    }

    /// Runs all stages for one resume text, strictly in order. Any stage
    /// error aborts the run; the caller owns persistence of both outcomes.
    pub async fn run(&self, resume_text: &str) -> Result<ScreeningOutcome, PipelineError> {
        let candidate = self
            .stage("Candidate extraction", self.extractor.extract(resume_text))
            .await?;

        let required_skills = self
            .stage(
                "Skill extraction",
                self.skills.required_skills(RETRIEVAL_QUERY, RETRIEVAL_TOP_K),
            )
            .await?;

        // Scoring and routing are synchronous and in-memory — no timeout
        let scored = matcher::score(&candidate, &required_skills, self.min_experience);
        let result = router::route(scored, candidate.extraction_confidence, &self.thresholds);

        Ok(ScreeningOutcome {
            candidate,
            result,
            required_skills,
        })
    }

    /// Wraps a suspending stage in the per-stage timeout; elapse is that
    /// stage's failure path.
    async fn stage<T, E>(
        &self,
        name: &'static str,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, PipelineError>
    where
        E: Into<PipelineError>,
    {
        match tokio::time::timeout(self.stage_timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(PipelineError::StageTimeout {
                stage: name,
                seconds: self.stage_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::embedding::{EmbeddingError, EmbeddingService};
    use crate::llm_client::{GenerationService, LlmError};
    use crate::models::candidate::Recommendation;
    use crate::retrieval::RetrievalIndex;

    struct FlatEmbedder;

    #[async_trait]
    impl EmbeddingService for FlatEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.0, 0.0]).collect())
        }
    }

    struct ScriptedLlm {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            })
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
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra LLM call"))
        }
    }

    async fn pipeline_with(llm: Arc<ScriptedLlm>) -> ScreeningPipeline {
        let embedder = Arc::new(FlatEmbedder);
        let index = Arc::new(
            RetrievalIndex::build(vec!["jd".to_string(), "policy".to_string()], &FlatEmbedder)
                .await
                .unwrap(),
        );
        ScreeningPipeline::new(
            Arc::new(CandidateExtractor::new(llm.clone())),
            Arc::new(SkillExtractor::new(index, embedder, llm)),
            RoutingThresholds::default(),
            3.0,
            Duration::from_secs(5),
        )
    }

    const CANDIDATE_JSON: &str = r#"{
        "candidate_name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "555-0100",
        "years_of_experience": 5,
        "skills": ["Python", "SQL"],
        "education": [],
        "previous_roles": [],
        "extraction_confidence": 0.9
    }"#;

    #[tokio::test]
    async fn test_partial_match_routes_to_human_review() {
        // skillScore 0.5, no gap -> 0.65 -> above review, below shortlist
        let llm = ScriptedLlm::new(&[CANDIDATE_JSON, r#"["Python", "AWS"]"#]);
        let pipeline = pipeline_with(llm).await;

        let outcome = pipeline.run("resume text").await.unwrap();
        assert_eq!(outcome.result.match_score, 0.65);
        assert_eq!(outcome.result.recommendation, Recommendation::HumanReview);
        assert_eq!(outcome.result.review_reason, "Partial skill match");
        assert_eq!(outcome.required_skills, vec!["Python", "AWS"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts_before_skill_extraction() {
        // Two invalid extraction outputs exhaust the repair bound; the skill
        // call must never happen, so only two responses are scripted.
        let llm = ScriptedLlm::new(&["nope", "still nope"]);
        let pipeline = pipeline_with(llm).await;

        let err = pipeline.run("resume text").await.unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_unparseable_skill_output_fails_the_run() {
        let llm = ScriptedLlm::new(&[CANDIDATE_JSON, "no array in sight"]);
        let pipeline = pipeline_with(llm).await;

        let err = pipeline.run("resume text").await.unwrap_err();
        assert!(matches!(err, PipelineError::SkillExtraction(_)));
    }

    #[tokio::test]
    async fn test_reasoning_trace_carries_routing_inputs() {
        let llm = ScriptedLlm::new(&[CANDIDATE_JSON, r#"["Python", "AWS"]"#]);
        let pipeline = pipeline_with(llm).await;

        let outcome = pipeline.run("resume text").await.unwrap();
        let trace = outcome.reasoning_trace();
        assert_eq!(trace["match_score"], 0.65);
        assert_eq!(trace["confidence"], 0.9);
        assert_eq!(trace["recommendation"], "Human Review");
        assert_eq!(trace["missing_skills"][0], "AWS");
    }
}
