//! PostgreSQL pool and the durable task store.
//!
//! The task table is the only mutable shared resource in the system. Each
//! row is written twice: once at submission (insert, `processing`) and once
//! by the worker on reaching a terminal state. Terminal updates are guarded
//! on `status = 'processing'` so a task transitions exactly once and never
//! leaves a terminal state.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::task::{TaskRow, TaskStatus};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id UUID PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'processing',
    source TEXT NOT NULL,
    candidate_name TEXT,
    email TEXT,
    match_score DOUBLE PRECISION,
    recommendation TEXT,
    review_reason TEXT,
    extracted_data JSONB,
    reasoning_trace JSONB,
    error_detail TEXT,
    processing_time_ms DOUBLE PRECISION,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    completed_at TIMESTAMPTZ
)
"#;

/// Ensures the task table exists.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_TASKS_TABLE).execute(pool).await?;
    Ok(())
}

/// Creates a task in `processing` state.
pub async fn insert_task(pool: &PgPool, task_id: Uuid, source: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tasks (id, status, source) VALUES ($1, 'processing', $2)")
        .bind(task_id)
        .bind(source)
        .execute(pool)
        .await?;
    Ok(())
}

/// Full result payload written on the single `processing -> completed`
/// transition.
pub struct CompletionParams<'a> {
    pub task_id: Uuid,
    pub candidate_name: &'a str,
    pub email: &'a str,
    pub match_score: f64,
    pub recommendation: &'a str,
    pub review_reason: &'a str,
    pub extracted_data: &'a serde_json::Value,
    pub reasoning_trace: &'a serde_json::Value,
    pub processing_time_ms: f64,
}

pub async fn complete_task(pool: &PgPool, params: CompletionParams<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE tasks
        SET status = 'completed',
            candidate_name = $2,
            email = $3,
            match_score = $4,
            recommendation = $5,
            review_reason = $6,
            extracted_data = $7,
            reasoning_trace = $8,
            processing_time_ms = $9,
            completed_at = now()
        WHERE id = $1 AND status = 'processing'
        "#,
    )
    .bind(params.task_id)
    .bind(params.candidate_name)
    .bind(params.email)
    .bind(params.match_score)
    .bind(params.recommendation)
    .bind(params.review_reason)
    .bind(params.extracted_data)
    .bind(params.reasoning_trace)
    .bind(params.processing_time_ms)
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes the single `processing -> failed` transition with the captured
/// diagnostic message.
pub async fn fail_task(pool: &PgPool, task_id: Uuid, error_detail: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE tasks
        SET status = 'failed',
            error_detail = $2,
            completed_at = now()
        WHERE id = $1 AND status = 'processing'
        "#,
    )
    .bind(task_id)
    .bind(error_detail)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_task(pool: &PgPool, task_id: Uuid) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(pool)
        .await
}

/// Listing filter: a lifecycle status, a recommendation value, or everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Status(TaskStatus),
    Recommendation(String),
}

pub async fn list_tasks(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<TaskRow>, sqlx::Error> {
    match filter {
        TaskFilter::All => {
            sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC")
                .fetch_all(pool)
                .await
        }
        TaskFilter::Status(status) => {
            sqlx::query_as("SELECT * FROM tasks WHERE status = $1 ORDER BY created_at DESC")
                .bind(status.as_str())
                .fetch_all(pool)
                .await
        }
        TaskFilter::Recommendation(recommendation) => {
            sqlx::query_as("SELECT * FROM tasks WHERE recommendation = $1 ORDER BY created_at DESC")
                .bind(recommendation)
                .fetch_all(pool)
                .await
        }
    }
}
