//! Background image resolution. Never fails: every path ends in some usable
//! URL, the bundled fallback image at worst.

mod keywords;

use std::time::Duration;

use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::{AppConfig, ImageSource};
use crate::core::error::PipelineError;

pub use keywords::{placeholder_keywords, stock_keywords};

/// Served from the embedded asset directory.
pub const FALLBACK_IMAGE_PATH: &str = "/fallback-bg.svg";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImage {
    Remote(String),
    Inline(String),
    Fallback(String),
}

impl ResolvedImage {
    pub fn into_url(self) -> String {
        match self {
            ResolvedImage::Remote(url) | ResolvedImage::Inline(url) | ResolvedImage::Fallback(url) => {
                url
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch a stock photo and inline it as a data URI.
    StockInline,
    /// Hand back a keyword placeholder-image URL untouched.
    Placeholder,
    /// Ask the image-generation API, degrading to `Placeholder`.
    Generated,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

pub struct BackgroundResolver {
    client: Client,
    strategy: Strategy,
    stock_base: String,
    placeholder_base: String,
    image_gen_base: String,
    image_gen_key: Option<String>,
}

impl BackgroundResolver {
    pub fn from_config(config: &AppConfig) -> Self {
        let strategy = match (&config.image_gen_api_key, config.image_source) {
            (Some(_), _) => Strategy::Generated,
            (None, ImageSource::Placeholder) => Strategy::Placeholder,
            (None, ImageSource::Stock) => Strategy::StockInline,
        };
        Self {
            client: Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            strategy,
            stock_base: config.endpoints.stock_image_base.clone(),
            placeholder_base: config.endpoints.placeholder_image_base.clone(),
            image_gen_base: config.endpoints.image_gen_base.clone(),
            image_gen_key: config.image_gen_api_key.clone(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub async fn resolve(&self, image_description: &str) -> ResolvedImage {
        match self.strategy {
            Strategy::StockInline => self.resolve_stock(image_description).await,
            Strategy::Placeholder => ResolvedImage::Remote(self.placeholder_url(image_description)),
            Strategy::Generated => match self.generate(image_description).await {
                Ok(url) => ResolvedImage::Remote(url),
                Err(e) => {
                    warn!(error = %e, "Image generation failed, using placeholder image");
                    ResolvedImage::Remote(self.placeholder_url(image_description))
                }
            },
        }
    }

    pub fn stock_url(&self, image_description: &str) -> String {
        format!(
            "{}/1200x630/?{}",
            self.stock_base.trim_end_matches('/'),
            urlencoding::encode(&stock_keywords(image_description))
        )
    }

    pub fn placeholder_url(&self, image_description: &str) -> String {
        format!(
            "{}/1200/630/{}",
            self.placeholder_base.trim_end_matches('/'),
            placeholder_keywords(image_description)
                .split(',')
                .map(|word| urlencoding::encode(word).into_owned())
                .collect::<Vec<_>>()
                .join(",")
        )
    }

    async fn resolve_stock(&self, image_description: &str) -> ResolvedImage {
        let url = self.stock_url(image_description);
        match self.fetch_as_data_uri(&url).await {
            Ok(data_uri) => {
                info!(source = %url, bytes = data_uri.len(), "Inlined stock background image");
                ResolvedImage::Inline(data_uri)
            }
            Err(e) => {
                warn!(error = %e, "Failed to inline stock image, using local fallback");
                ResolvedImage::Fallback(FALLBACK_IMAGE_PATH.to_string())
            }
        }
    }

    async fn fetch_as_data_uri(&self, url: &str) -> Result<String, PipelineError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::ImageFetch(e.to_string()))?;
        if !res.status().is_success() {
            return Err(PipelineError::ImageFetch(format!(
                "HTTP {} from {}",
                res.status().as_u16(),
                url
            )));
        }
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(PipelineError::ImageFetch(format!(
                "non-image content type '{}'",
                content_type
            )));
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| PipelineError::ImageFetch(e.to_string()))?;
        Ok(format!("data:{};base64,{}", content_type, STANDARD.encode(&bytes)))
    }

    async fn generate(&self, image_description: &str) -> Result<String> {
        let api_key = self
            .image_gen_key
            .as_deref()
            .ok_or_else(|| anyhow!("image generation key not configured"))?;
        let req = ImageGenerationRequest {
            model: "dall-e-3",
            prompt: image_description,
            n: 1,
            size: "1792x1024",
        };
        let res = self
            .client
            .post(format!(
                "{}/images/generations",
                self.image_gen_base.trim_end_matches('/')
            ))
            .timeout(GENERATION_TIMEOUT)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&req)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!(
                "Image generation API Error: {}",
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: ImageGenerationResponse = res.json().await?;
        parsed
            .data
            .into_iter()
            .find_map(|img| img.url)
            .ok_or_else(|| anyhow!("image generation response had no URL"))
    }
}
