mod config;
mod db;
mod embedding;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod pdf;
mod retrieval;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::{EmbeddingClient, EmbeddingService};
use crate::extraction::CandidateExtractor;
use crate::llm_client::{GenerationService, LlmClient};
use crate::retrieval::{RetrievalIndex, SkillExtractor};
use crate::routes::build_router;
use crate::screening::pipeline::ScreeningPipeline;
use crate::screening::worker::spawn_workers;
use crate::state::AppState;

/// Reference corpus loaded at startup: the job description and the hiring
/// policy. Static for the process lifetime.
const REFERENCE_DOCUMENT_FILES: &[&str] = &["job_description.txt", "hiring_policy.txt"];

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    db::init_schema(&db).await?;

    // Initialize service clients
    let llm: Arc<dyn GenerationService> = Arc::new(LlmClient::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    ));
    info!("LLM client initialized (model: {})", config.llm_model);

    let embedder: Arc<dyn EmbeddingService> = Arc::new(EmbeddingClient::new(
        config.embedding_base_url.clone(),
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
    ));
    info!(
        "Embedding client initialized (model: {})",
        config.embedding_model
    );

    // Build the retrieval index from the reference corpus, once
    let documents = load_reference_documents(&config.reference_docs_dir)?;
    let index = RetrievalIndex::build(documents, embedder.as_ref()).await?;
    info!(
        "Retrieval index built ({} documents, dimension {})",
        index.len(),
        index.dimension()
    );

    // Assemble the pipeline
    let pipeline = Arc::new(ScreeningPipeline::new(
        Arc::new(CandidateExtractor::new(llm.clone())),
        Arc::new(SkillExtractor::new(Arc::new(index), embedder, llm)),
        config.thresholds.clone(),
        config.min_experience,
        config.stage_timeout,
    ));

    // Bounded screening queue + worker pool
    let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);

    let state = AppState {
        db,
        config: config.clone(),
        pipeline,
        job_tx,
    };

    spawn_workers(state.clone(), job_rx);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_reference_documents(dir: &str) -> Result<Vec<String>> {
    let dir = std::path::Path::new(dir);
    REFERENCE_DOCUMENT_FILES
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read reference document {}", path.display()))
        })
        .collect()
}
