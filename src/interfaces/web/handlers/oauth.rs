use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

pub const CALLBACK_PATH: &str = "/oauth/callback";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Landing page for the Canva redirect. Shows the code to paste into
/// `cardsmith oauth --code`; the exchange itself stays on the CLI.
pub async fn oauth_callback(Query(query): Query<CallbackQuery>) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        warn!(error = %error, "Canva authorization was not granted");
        return (
            StatusCode::BAD_REQUEST,
            format!("Authorization failed: {} {}", error, description)
                .trim_end()
                .to_string(),
        )
            .into_response();
    }

    match query.code.filter(|c| !c.trim().is_empty()) {
        Some(code) => {
            info!("Received Canva authorization code");
            (
                StatusCode::OK,
                format!(
                    "Authorization code received.\n\nFinish in your terminal:\n  cardsmith oauth --code {}\n",
                    code.trim()
                ),
            )
                .into_response()
        }
        None => (StatusCode::BAD_REQUEST, "Missing authorization code").into_response(),
    }
}
