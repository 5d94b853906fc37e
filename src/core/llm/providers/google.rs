use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::llm::LlmProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiResContent,
}

#[derive(Deserialize)]
struct GeminiResContent {
    #[serde(default)]
    parts: Vec<GeminiResPart>,
}

#[derive(Deserialize)]
struct GeminiResPart {
    #[serde(default)]
    text: String,
}

pub struct GoogleProvider {
    api_key: String,
    model_id: String,
    base_url: String,
    client: Client,
}

impl GoogleProvider {
    pub fn new(api_key: String, model_id: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key,
            model_id,
            base_url,
            client,
        }
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "Google Gemini"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };
        // Accept both "gemini-x" and "models/gemini-x"
        let model = self.model_id.trim_start_matches("models/");
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        // Keeps the credential out of the URL, which reqwest errors echo.
        let res = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Google Gemini API Error ({}): {}",
                status.as_u16(),
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: GeminiResponse = res.json().await.map_err(reqwest::Error::without_url)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::json;

    const KEY: &str = "SECRET-KEY-123";

    fn provider(base_url: &str) -> GoogleProvider {
        GoogleProvider::new(
            KEY.to_string(),
            "models/gemini-flash-latest".to_string(),
            base_url.to_string(),
        )
    }

    #[tokio::test]
    async fn api_key_travels_in_header_not_url() {
        let app = Router::new().route(
            "/models/{model_call}",
            post(|headers: HeaderMap, uri: axum::http::Uri| async move {
                let key = headers
                    .get(API_KEY_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let text = format!("{}|{}", key, uri.query().unwrap_or_default());
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let reply = provider(&format!("http://{}", addr))
            .generate("hi")
            .await
            .unwrap();
        assert_eq!(reply, format!("{}|", KEY));
    }

    #[tokio::test]
    async fn connection_errors_never_mention_the_key() {
        let err = provider("http://127.0.0.1:1").generate("hi").await.unwrap_err();
        let msg = format!("{:#}", err);
        assert!(!msg.contains(KEY), "key leaked: {}", msg);
        assert!(crate::core::llm::retry::is_transient(&err));
    }
}
