use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::super::AppState;
use crate::core::error::PipelineError;
use crate::core::pipeline::{GenerationRequest, GenerationResult, VALIDATION_MESSAGE};

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}

/// Always answers 200 with a renderable design, except for unusable input.
pub async fn generate_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return bad_request(VALIDATION_MESSAGE);
    };

    match state.pipeline.run(&request).await {
        Ok(result) => {
            if let Err(e) = state.history.record(result.clone()).await {
                warn!(error = %e, "Failed to record design history");
            }
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(PipelineError::Validation(message)) => bad_request(&message),
        Err(e) => {
            error!(error = %e, code = e.error_code(), "Generation failed, serving fallback design");
            (StatusCode::OK, Json(GenerationResult::fallback(&e))).into_response()
        }
    }
}
