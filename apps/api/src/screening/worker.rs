//! Background worker pool — consumes screening jobs from the bounded queue
//! and drives each task to its terminal state.
//!
//! Every stage failure is caught here, rendered to a human-readable message,
//! and written into the task's `failed` state. Nothing escapes past this
//! boundary; the submission call already returned long before.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::pdf;
use crate::screening::pipeline::{PipelineError, ScreeningOutcome};
use crate::state::AppState;

/// One unit of screening work. The file bytes are read out of the request
/// before it completes; the worker owns them from there.
#[derive(Debug)]
pub struct ScreeningJob {
    pub task_id: Uuid,
    pub file_bytes: Bytes,
}

/// Spawns the worker pool over the shared job queue. Workers run for the
/// life of the process; the queue closing (sender dropped) shuts them down.
pub fn spawn_workers(state: AppState, receiver: mpsc::Receiver<ScreeningJob>) {
    let worker_count = state.config.worker_count;
    let receiver = Arc::new(Mutex::new(receiver));

    for worker_id in 0..worker_count {
        let state = state.clone();
        let receiver = Arc::clone(&receiver);
        tokio::spawn(async move {
            run_worker(worker_id, state, receiver).await;
        });
    }

    info!("Started {worker_count} screening workers");
}

async fn run_worker(
    worker_id: usize,
    state: AppState,
    receiver: Arc<Mutex<mpsc::Receiver<ScreeningJob>>>,
) {
    debug!("Worker {worker_id} started");

    loop {
        // Hold the lock only while waiting for a job, not while running one
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            debug!("Worker {worker_id} shutting down: queue closed");
            break;
        };
        process_job(&state, job).await;
    }
}

/// Runs one task to its terminal state. Exactly one terminal write happens
/// per job: `completed` with the full payload, or `failed` with the message.
async fn process_job(state: &AppState, job: ScreeningJob) {
    let task_id = job.task_id;
    let started = Instant::now();
    info!("Processing task {task_id}");

    let outcome = run_stages(state, &job).await;
    let processing_time_ms = (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;

    match outcome {
        Ok(outcome) => {
            let extracted_data = serde_json::to_value(&outcome.candidate).unwrap_or_default();
            let reasoning_trace = outcome.reasoning_trace();
            let params = db::CompletionParams {
                task_id,
                candidate_name: &outcome.candidate.candidate_name,
                email: &outcome.candidate.email,
                match_score: outcome.result.match_score,
                recommendation: outcome.result.recommendation.as_str(),
                review_reason: &outcome.result.review_reason,
                extracted_data: &extracted_data,
                reasoning_trace: &reasoning_trace,
                processing_time_ms,
            };
            if let Err(e) = db::complete_task(&state.db, params).await {
                error!("Failed to persist completion for task {task_id}: {e}");
            } else {
                info!(
                    "Task {task_id} completed in {processing_time_ms}ms: {}",
                    outcome.result.recommendation
                );
            }
        }
        Err(e) => {
            warn!("Task {task_id} failed: {e}");
            if let Err(db_err) = db::fail_task(&state.db, task_id, &e.to_string()).await {
                error!("Failed to persist failure for task {task_id}: {db_err}");
            }
        }
    }
}

async fn run_stages(
    state: &AppState,
    job: &ScreeningJob,
) -> Result<ScreeningOutcome, PipelineError> {
    let resume_text = pdf::extract_text(&job.file_bytes)?;
    state.pipeline.run(&resume_text).await
}
