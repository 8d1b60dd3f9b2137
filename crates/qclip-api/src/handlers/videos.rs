//! Video generation, status and deletion handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;
use validator::Validate;

use qclip_models::{JobId, JobStatusEntry, VideoRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for an accepted asynchronous job.
#[derive(Serialize)]
pub struct GenerateVideoResponse {
    pub job_id: JobId,
    pub status: String,
}

/// Response for the synchronous variant.
#[derive(Serialize)]
pub struct GenerateVideoSyncResponse {
    pub job_id: JobId,
    pub url: String,
}

fn validate_request(request: &VideoRequest) -> ApiResult<()> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    request.check().map_err(ApiError::validation)?;
    Ok(())
}

/// Accept a generation request and run the pipeline in the background.
///
/// Returns 202 immediately; callers poll `/video-status/:job_id`.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(request): Json<VideoRequest>,
) -> ApiResult<(StatusCode, Json<GenerateVideoResponse>)> {
    validate_request(&request)?;

    let job_id = JobId::new();
    // Register the job before answering 202 so an immediate status poll
    // never sees 404 for an accepted job.
    state.pipeline.registry().create(&job_id).await;

    let pipeline = Arc::clone(&state.pipeline);
    let spawned_id = job_id.clone();
    tokio::spawn(async move {
        // Outcome lands in the registry; the error is already recorded
        // there when this returns Err.
        if let Err(e) = pipeline.process(&spawned_id, &request).await {
            error!(job_id = %spawned_id, "Video generation failed: {}", e);
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateVideoResponse {
            job_id,
            status: "processing".to_string(),
        }),
    ))
}

/// Run the pipeline inline and return the download URL.
pub async fn generate_video_sync(
    State(state): State<AppState>,
    Json(request): Json<VideoRequest>,
) -> ApiResult<Json<GenerateVideoSyncResponse>> {
    validate_request(&request)?;

    let job_id = JobId::new();
    let url = state.pipeline.process(&job_id, &request).await?;

    Ok(Json(GenerateVideoSyncResponse { job_id, url }))
}

/// Current status of a job.
pub async fn video_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusEntry>> {
    let job_id = JobId::from_string(job_id);
    let entry = state
        .pipeline
        .registry()
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job {} not found", job_id)))?;

    Ok(Json(entry))
}

/// Delete a finished video and forget the job.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<StatusCode> {
    let job_id = JobId::from_string(job_id);
    let entry = state
        .pipeline
        .registry()
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job {} not found", job_id)))?;

    if let Some(url) = &entry.result_url {
        state.pipeline.store().delete_by_url(url).await?;
    }
    state.pipeline.registry().delete(&job_id).await;

    Ok(StatusCode::NO_CONTENT)
}
