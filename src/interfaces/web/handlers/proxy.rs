use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use super::super::AppState;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const CACHE_FOREVER: &str = "public, max-age=31536000, immutable";

#[derive(Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

fn target_url(raw: Option<&str>) -> Option<url::Url> {
    let parsed = url::Url::parse(raw?.trim()).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

/// Relays a remote image so the browser can draw it on a canvas without
/// tainting it.
pub async fn proxy_image(State(state): State<AppState>, Query(query): Query<ProxyQuery>) -> Response {
    let Some(target) = target_url(query.url.as_deref()) else {
        return (StatusCode::BAD_REQUEST, "Missing URL").into_response();
    };

    let upstream = match state.http.get(target.clone()).send().await {
        Ok(res) if res.status().is_success() => res,
        Ok(res) => {
            warn!(url = %target, status = %res.status(), "Image proxy upstream returned an error");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error proxying image").into_response();
        }
        Err(e) => {
            warn!(url = %target, error = %e, "Image proxy request failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error proxying image").into_response();
        }
    };

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_FOREVER));
    response
}
