//! Analyze endpoint handler.

use axum::extract::State;
use axum::Json;
use tracing::debug;

use gaffer_models::{AnalyzeRequest, AnalyzeResponse, VideoRef};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/analyze` — run the analysis pipeline for a video position.
///
/// Degraded results are normal 200s; the only error outcomes here are
/// contract validation failures.
pub async fn analyze_video(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    if !request.timestamp.is_finite() {
        return Err(ApiError::bad_request("timestamp must be a finite number"));
    }

    let video = VideoRef::parse(&request.video_id)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(video = %video, timestamp = request.timestamp, "Analyze request");

    let response = state.pipeline.analyze(&video, request.timestamp).await;
    Ok(Json(response))
}
