use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::screening::pipeline::ScreeningPipeline;
use crate::screening::worker::ScreeningJob;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// The full screening pipeline; workers run it once per job.
    pub pipeline: Arc<ScreeningPipeline>,
    /// Producer side of the bounded screening queue. Submission reserves a
    /// slot here before creating the task row.
    pub job_tx: mpsc::Sender<ScreeningJob>,
}
