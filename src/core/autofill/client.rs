use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One template slot value, tagged the way the autofill API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SlotValue {
    Text { text: String },
    Image { image_url: String },
}

pub type AutofillData = BTreeMap<String, SlotValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "in_progress")]
    Pending,
    #[serde(alias = "success")]
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub design: Option<DesignRef>,
    #[serde(default)]
    pub url: Option<String>,
}

impl JobResult {
    pub fn design_url(&self) -> Option<&str> {
        self.design
            .as_ref()
            .and_then(|d| d.url.as_deref())
            .or(self.url.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutofillJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Deserialize)]
struct JobEnvelope {
    job: AutofillJob,
}

#[derive(Serialize)]
struct CreateAutofillRequest<'a> {
    brand_template_id: &'a str,
    data: &'a AutofillData,
}

/// The two calls the gateway needs from the autofill service.
#[async_trait]
pub trait AutofillApi: Send + Sync {
    async fn submit(&self, template_id: &str, data: &AutofillData) -> Result<String>;

    async fn status(&self, job_id: &str) -> Result<AutofillJob>;
}

pub struct CanvaClient {
    base_url: String,
    access_token: String,
    client: Client,
}

impl CanvaClient {
    pub fn new(base_url: String, access_token: String) -> Self {
        Self {
            base_url,
            access_token: access_token.trim().to_string(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn read_job(res: reqwest::Response) -> Result<AutofillJob> {
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body: {}", e))?;
        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(anyhow!("Canva API Error (HTTP {}): {}", status.as_u16(), detail));
        }
        let envelope: JobEnvelope = serde_json::from_str(&body)
            .map_err(|e| anyhow!("Unexpected autofill response: {} ({})", e, body))?;
        Ok(envelope.job)
    }
}

#[async_trait]
impl AutofillApi for CanvaClient {
    async fn submit(&self, template_id: &str, data: &AutofillData) -> Result<String> {
        let req = CreateAutofillRequest {
            brand_template_id: template_id,
            data,
        };
        let res = self
            .client
            .post(self.endpoint("autofills"))
            .bearer_auth(&self.access_token)
            .json(&req)
            .send()
            .await?;
        Ok(Self::read_job(res).await?.id)
    }

    async fn status(&self, job_id: &str) -> Result<AutofillJob> {
        let res = self
            .client
            .get(self.endpoint(&format!("autofills/{}", urlencoding::encode(job_id))))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::read_job(res).await
    }
}
