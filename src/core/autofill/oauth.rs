use std::time::Duration;

use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(15);

pub const AUTHORIZE_URL: &str = "https://www.canva.com/api/oauth/authorize";
pub const DEFAULT_SCOPES: &[&str] = &[
    "brandtemplate:meta:read",
    "brandtemplate:content:read",
    "design:content:write",
    "design:meta:read",
];

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn build_auth_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    let scopes = DEFAULT_SCOPES.join(" ");
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes),
        state
    )
}

/// Trades an authorization code for tokens at `{base_url}/oauth/token`,
/// authenticating with HTTP Basic client credentials.
pub async fn exchange_code(
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    exchange_code_within(
        base_url,
        client_id,
        client_secret,
        code,
        redirect_uri,
        TOKEN_TIMEOUT,
    )
    .await
}

async fn exchange_code_within(
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
    timeout: Duration,
) -> Result<TokenResponse> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
    let basic = STANDARD.encode(format!("{}:{}", client_id.trim(), client_secret.trim()));

    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];

    let response = client
        .post(format!("{}/oauth/token", base_url.trim_end_matches('/')))
        .header("Authorization", format!("Basic {}", basic))
        .form(&params)
        .send()
        .await
        .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response body: {}", e))?;

    if !status.is_success() {
        return Err(anyhow!("Token Exchange Failed (HTTP {}): {}", status, body));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| anyhow!("Failed to parse token response: {}", e))?;

    if let Some(error) = token.error {
        let desc = token.error_description.unwrap_or_default();
        return Err(anyhow!("OAuth error: {} - {}", error, desc));
    }
    if token.access_token.is_none() {
        return Err(anyhow!("No access_token in response. Response was: {}", body));
    }

    Ok(token)
}
