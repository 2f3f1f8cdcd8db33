use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of a screening task.
/// `Processing` is initial; `Completed` and `Failed` are terminal and a task
/// transitions into exactly one of them, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(TaskStatus::Processing),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One screening request's durable state across its asynchronous lifecycle.
/// Result columns are NULL while the task is in flight; `error_detail` is set
/// only on failure, the result columns only on completion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub status: String,
    pub source: String,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub match_score: Option<f64>,
    pub recommendation: Option<String>,
    pub review_reason: Option<String>,
    pub extracted_data: Option<Value>,
    pub reasoning_trace: Option<Value>,
    pub error_detail: Option<String>,
    pub processing_time_ms: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
