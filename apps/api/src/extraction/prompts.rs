// All LLM prompt constants for the extraction module.

/// System prompt for candidate extraction — enforces JSON-only output.
pub const EXTRACTION_SYSTEM: &str = "Return ONLY strict valid JSON.";

/// Near-deterministic sampling for structured extraction.
pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Extraction prompt template. Replace `{resume_text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"You are an expert HR data extraction agent.

Extract structured data from the resume below.

Return ONLY strict valid JSON in this format:

{
    "candidate_name": "",
    "email": "",
    "phone": "",
    "years_of_experience": number,
    "skills": [],
    "education": [],
    "previous_roles": [],
    "extraction_confidence": number between 0 and 1
}

STRICT RULES:
- Output must be valid JSON.
- All strings must be quoted.
- Year ranges must be strings (example: "2011-2016").
- Do NOT include explanations.
- Do NOT use markdown.
- Do NOT wrap in code fences.

Resume:
{resume_text}"#;

/// Repair prompt template for the second attempt. Replace `{raw_output}` with
/// the literal, unrepaired first-attempt output.
pub const REPAIR_PROMPT_TEMPLATE: &str = r#"The previous output was invalid JSON.

Fix it and return ONLY strict valid JSON.
Do not include explanations.
Do not use markdown.

Previous output:
{raw_output}"#;
