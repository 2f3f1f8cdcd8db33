// All LLM prompt constants for the retrieval module.

/// System prompt for skill extraction — array-only output.
pub const SKILL_EXTRACTION_SYSTEM: &str = "Return ONLY a raw JSON array of skill names.";

/// Fully deterministic sampling for skill extraction.
pub const SKILL_EXTRACTION_TEMPERATURE: f32 = 0.0;

/// Skill extraction prompt template. Replace `{context}` with the retrieved
/// reference documents before sending.
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract required technical skills from the job description below.

Return ONLY a JSON array of skill names.

Example:
["Python", "RAG", "AWS"]

Do NOT include explanations.
Do NOT use markdown.

Job Description:
{context}"#;
