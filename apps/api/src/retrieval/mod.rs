//! Retrieval — embeds the reference corpus once at startup and derives the
//! required-skill set for a query from the nearest documents.
//!
//! The corpus is two small policy documents, so search is exact
//! nearest-neighbor over L2 distance — no approximation, no filtering.
//! Deriving skills from documents instead of a hardcoded list lets the
//! reference corpus evolve without code changes.

pub mod prompts;

use std::sync::Arc;

use thiserror::Error;

use crate::embedding::{EmbeddingError, EmbeddingService};
use crate::llm_client::{strip_code_fences, GenerationService, LlmError};

#[derive(Debug, Error)]
pub enum SkillExtractionError {
    #[error("Embedding service failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Generation service failed: {0}")]
    Service(#[from] LlmError),

    #[error("No JSON array detected in model output:\n{raw_output}")]
    NoArray { raw_output: String },

    #[error("Skill array failed to parse: {source}\n\nRaw model output:\n{raw_output}")]
    Parse {
        raw_output: String,
        source: serde_json::Error,
    },
}

/// Immutable nearest-neighbor index over the reference document corpus.
/// Built once at startup, then shared read-only across all background tasks.
pub struct RetrievalIndex {
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl RetrievalIndex {
    pub async fn build(
        documents: Vec<String>,
        embedder: &dyn EmbeddingService,
    ) -> Result<Self, EmbeddingError> {
        let embeddings = embedder.embed(&documents).await?;
        Ok(Self {
            documents,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn dimension(&self) -> usize {
        self.embeddings.first().map(Vec::len).unwrap_or(0)
    }

    /// Exact nearest-neighbor search: returns up to `top_k` documents ordered
    /// by ascending L2 distance to the query vector.
    pub fn retrieve(&self, query: &[f32], top_k: usize) -> Vec<&str> {
        let mut scored: Vec<(f32, &str)> = self
            .embeddings
            .iter()
            .zip(&self.documents)
            .map(|(embedding, document)| (l2_distance(query, embedding), document.as_str()))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored
            .into_iter()
            .take(top_k)
            .map(|(_, document)| document)
            .collect()
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Derives the required-skill set from the reference corpus: embed the query,
/// retrieve the nearest documents, and ask the generation service for the
/// skills they require.
pub struct SkillExtractor {
    index: Arc<RetrievalIndex>,
    embedder: Arc<dyn EmbeddingService>,
    llm: Arc<dyn GenerationService>,
}

impl SkillExtractor {
    pub fn new(
        index: Arc<RetrievalIndex>,
        embedder: Arc<dyn EmbeddingService>,
        llm: Arc<dyn GenerationService>,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
        }
    }

    /// One generation call, no repair retry — a flat skill-name array is a
    /// simpler output space than the full extraction schema and does not
    /// warrant one.
    pub async fn required_skills(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, SkillExtractionError> {
        let query_embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = query_embeddings.first().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })?;

        let context = self.index.retrieve(query_vector, top_k).join("\n");
        let prompt = prompts::SKILL_EXTRACTION_PROMPT_TEMPLATE.replace("{context}", &context);
        let raw = self
            .llm
            .complete(
                prompts::SKILL_EXTRACTION_SYSTEM,
                &prompt,
                prompts::SKILL_EXTRACTION_TEMPERATURE,
            )
            .await?;

        parse_skill_array(&raw)
    }
}

/// Slices the substring between the first `[` and last `]` and parses it as
/// a JSON array of skill names.
fn parse_skill_array(raw: &str) -> Result<Vec<String>, SkillExtractionError> {
    let text = strip_code_fences(raw);
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Err(SkillExtractionError::NoArray {
            raw_output: raw.to_string(),
        });
    };
    if end < start {
        return Err(SkillExtractionError::NoArray {
            raw_output: raw.to_string(),
        });
    }
    serde_json::from_str(&text[start..=end]).map_err(|source| SkillExtractionError::Parse {
        raw_output: raw.to_string(),
        source,
    })
}
