pub(crate) mod handlers;
mod router;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{StatusCode, Uri, header},
    response::IntoResponse,
    response::sse::{Event, KeepAlive, Sse},
};
use include_dir::{Dir, include_dir};
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::history::HistoryStore;
use crate::core::pipeline::Pipeline;

static ASSETS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

const PROXY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) history: Arc<HistoryStore>,
    pub(crate) http: reqwest::Client,
    pub(crate) log_tx: broadcast::Sender<String>,
    pub(crate) api_port: u16,
}

impl AppState {
    pub(crate) fn new(
        config: &AppConfig,
        log_tx: broadcast::Sender<String>,
        api_port: u16,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::from_config(config)),
            history: Arc::new(HistoryStore::new(&config.data_dir)),
            http: reqwest::Client::builder()
                .timeout(PROXY_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            log_tx,
            api_port,
        }
    }
}

pub struct ApiServer {
    state: AppState,
    api_host: String,
    api_port: u16,
}

impl ApiServer {
    pub fn new(
        config: &AppConfig,
        log_tx: broadcast::Sender<String>,
        api_host: String,
        api_port: u16,
    ) -> Self {
        Self {
            state: AppState::new(config, log_tx, api_port),
            api_host,
            api_port,
        }
    }

    /// Binds and serves until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.api_host, self.api_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        let app = router::build_api_router(self.state);

        info!("Cardsmith server running at http://{addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await
            .context("Server crashed")
    }
}

async fn sse_logs_endpoint(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.log_tx.subscribe();
    let stream = BroadcastStream::new(receiver).map(|msg| match msg {
        Ok(line) => Ok(Event::default().data(line)),
        Err(_) => Ok(Event::default().data("Log stream lagged")),
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn static_asset_handler(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/');
    if path.is_empty() {
        path = "index.html";
    }

    match ASSETS_DIR.get_file(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.to_string())],
                file.contents(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
