//! Synchronous job endpoint, shaped like a serverless runtime's local API.

use crate::handlers::job::handle_job;
use crate::models::{Job, JobOutput};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use uuid::Uuid;

/// Terminal state of a job run through `/runsync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Completed,
}

#[derive(Debug, Serialize)]
pub struct RunSyncResponse {
    pub id: String,
    pub status: JobStatus,
    pub output: JobOutput,
}

/// `POST /runsync`: run one job to completion.
///
/// Handler-level failures are still `COMPLETED` jobs with an error output;
/// only an unreadable envelope is rejected.
pub async fn run_sync(
    State(state): State<AppState>,
    payload: Result<Json<Job>, JsonRejection>,
) -> Result<Json<RunSyncResponse>, AppError> {
    let Json(job) = payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    let id = job
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!(job_id = %id, "Job received");
    let output = handle_job(&state.context, job.input).await;
    tracing::info!(job_id = %id, failed = output.is_error(), "Job completed");

    Ok(Json(RunSyncResponse {
        id,
        status: JobStatus::Completed,
        output,
    }))
}
