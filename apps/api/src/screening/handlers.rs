use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::{self, TaskFilter};
use crate::errors::AppError;
use crate::models::task::{TaskRow, TaskStatus};
use crate::screening::worker::ScreeningJob;
use crate::state::AppState;

const DEFAULT_SOURCE: &str = "external";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub task_id: Uuid,
    pub status: &'static str,
}

/// POST /api/v1/screenings
///
/// Accepts a multipart resume upload and returns immediately; the pipeline
/// runs in the background. A queue slot is reserved before the task row is
/// created, so every created task is guaranteed a background run.
pub async fn handle_submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let mut file_bytes: Option<Bytes> = None;
    let mut source = DEFAULT_SOURCE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?,
                );
            }
            "source" => {
                source = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read source: {e}")))?;
            }
            _ => {}
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let permit = state.job_tx.try_reserve().map_err(|_| AppError::QueueFull)?;

    let task_id = Uuid::new_v4();
    db::insert_task(&state.db, task_id, &source).await?;
    permit.send(ScreeningJob {
        task_id,
        file_bytes,
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id,
            status: "processing",
        }),
    ))
}

/// Task state document returned by the status and listing endpoints. Result
/// fields are null until the task completes; a failed task exposes only the
/// captured error detail, never partial extracted data.
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: Uuid,
    pub status: String,
    pub source: String,
    pub processing_time_ms: Option<f64>,
    pub extracted_data: Option<Value>,
    pub reasoning_trace: Option<Value>,
    pub match_score: Option<f64>,
    pub recommendation: Option<String>,
    pub review_reason: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for TaskStatusResponse {
    fn from(task: TaskRow) -> Self {
        Self {
            task_id: task.id,
            status: task.status,
            source: task.source,
            processing_time_ms: task.processing_time_ms,
            extracted_data: task.extracted_data,
            reasoning_trace: task.reasoning_trace,
            match_score: task.match_score,
            recommendation: task.recommendation,
            review_reason: task.review_reason,
            error_detail: task.error_detail,
            created_at: task.created_at,
            completed_at: task.completed_at,
        }
    }
}

/// GET /api/v1/screenings/:task_id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskStatusResponse>, AppError> {
    let task = db::get_task(&state.db, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))?;
    Ok(Json(task.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/v1/screenings
///
/// A lifecycle status value filters by status; any other value filters by
/// recommendation (e.g. `?status=Shortlisted`).
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TaskStatusResponse>>, AppError> {
    let filter = parse_filter(query.status.as_deref());
    let tasks = db::list_tasks(&state.db, &filter).await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/screenings/export.csv
pub async fn handle_export_csv(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = parse_filter(query.status.as_deref());
    let tasks = db::list_tasks(&state.db, &filter).await?;
    let body = render_csv(&tasks);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"candidates_export.csv\"",
            ),
        ],
        body,
    ))
}

fn parse_filter(status: Option<&str>) -> TaskFilter {
    match status {
        None | Some("") | Some("All") => TaskFilter::All,
        Some(value) => match TaskStatus::parse(value) {
            Some(status) => TaskFilter::Status(status),
            None => TaskFilter::Recommendation(value.to_string()),
        },
    }
}

const CSV_HEADER: &str = "Task ID,Name,Email,Match Score,Recommendation,Status,Review Reason,Processing Time (ms),Created At,Completed At";

fn render_csv(tasks: &[TaskRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for task in tasks {
        let fields = [
            task.id.to_string(),
            task.candidate_name.clone().unwrap_or_default(),
            task.email.clone().unwrap_or_default(),
            task.match_score.map(|s| s.to_string()).unwrap_or_default(),
            task.recommendation.clone().unwrap_or_default(),
            task.status.clone(),
            task.review_reason.clone().unwrap_or_default(),
            task.processing_time_ms
                .map(|ms| ms.to_string())
                .unwrap_or_default(),
            task.created_at.to_rfc3339(),
            task.completed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
