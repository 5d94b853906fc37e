use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{generate, health, oauth, proxy};

fn build_localhost_cors(api_port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", api_port),
        format!("http://localhost:{}", api_port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    // The image proxy sets its own wildcard CORS header and must stay
    // embeddable, so it sits outside the localhost CORS layer.
    let proxy_routes = Router::new()
        .route("/api/proxy", get(proxy::proxy_image))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/generate", post(generate::generate_endpoint))
        .route("/api/test", get(health::test_ai_connection))
        .route("/api/logs", get(super::sse_logs_endpoint))
        .route(oauth::CALLBACK_PATH, get(oauth::oauth_callback))
        .layer(middleware::from_fn(security_headers))
        .layer(build_localhost_cors(state.api_port))
        .with_state(state);

    proxy_routes
        .merge(api_routes)
        .fallback(super::static_asset_handler)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:",
        ),
    );
    response
}
