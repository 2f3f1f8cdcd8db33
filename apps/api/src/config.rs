use std::time::Duration;

use anyhow::{Context, Result};

use crate::screening::router::RoutingThresholds;

/// Application configuration loaded from environment variables.
/// Fails fast at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub embedding_base_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub reference_docs_dir: String,
    pub port: u16,
    pub rust_log: String,
    pub thresholds: RoutingThresholds,
    pub min_experience: f64,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub stage_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://openrouter.ai/api/v1"),
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_model: env_or("LLM_MODEL", "meta-llama/llama-3.1-8b-instruct"),
            embedding_base_url: env_or("EMBEDDING_BASE_URL", "http://localhost:8001/v1"),
            embedding_api_key: env_or("EMBEDDING_API_KEY", ""),
            embedding_model: env_or("EMBEDDING_MODEL", "all-MiniLM-L6-v2"),
            reference_docs_dir: env_or("REFERENCE_DOCS_DIR", "data"),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            thresholds: RoutingThresholds {
                shortlist: parse_env("SHORTLIST_THRESHOLD", 0.85)?,
                review: parse_env("REVIEW_THRESHOLD", 0.60)?,
                confidence_floor: parse_env("CONFIDENCE_FLOOR", 0.75)?,
            },
            min_experience: parse_env("MIN_EXPERIENCE", 3.0)?,
            worker_count: parse_env("WORKER_COUNT", 4)?,
            queue_capacity: parse_env("QUEUE_CAPACITY", 64)?,
            stage_timeout: Duration::from_secs(parse_env("STAGE_TIMEOUT_SECS", 60u64)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .ok()
            .with_context(|| format!("'{key}' must be a valid number")),
        Err(_) => Ok(default),
    }
}
