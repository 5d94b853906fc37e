use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use super::super::AppState;

const PING_PROMPT: &str = "Say 'Hello, API is working!' in exactly those words.";

fn failure(error: String, hint: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "success": false, "error": error, "hint": hint })),
    )
        .into_response()
}

pub async fn test_ai_connection(State(state): State<AppState>) -> Response {
    let Some(llm) = state.pipeline.llm() else {
        return failure(
            "Google AI API key not configured".to_string(),
            "Set GOOGLE_AI_API_KEY in the environment and restart the server.",
        );
    };

    match llm.generate(PING_PROMPT).await {
        Ok(reply) => {
            info!(model = llm.model_id(), "AI connectivity check passed");
            Json(serde_json::json!({
                "success": true,
                "message": "Google AI API connection successful!",
                "geminiResponse": reply,
                "modelUsed": llm.model_id(),
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response()
        }
        Err(e) => {
            warn!(model = llm.model_id(), error = %e, "AI connectivity check failed");
            failure(
                format!("{:#}", e),
                "Check that GOOGLE_AI_API_KEY is valid and the model name is available.",
            )
        }
    }
}
