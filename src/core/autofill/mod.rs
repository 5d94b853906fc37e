//! Template autofill against the external design service.
//!
//! A real job is only attempted when every credential looks usable. Missing
//! configuration is masked as a simulated success; a job that fails or times
//! out is reported on the result but never fails the generation.

pub mod client;
pub mod oauth;

use std::sync::Arc;

use tracing::{info, warn};

pub use client::{AutofillApi, AutofillData, AutofillJob, CanvaClient, JobStatus, SlotValue};

use crate::core::config::{AppConfig, AutofillCredentials};
use crate::core::design::DesignFields;
use crate::core::error::PipelineError;
use crate::core::poll::{PollError, PollPolicy, PollStep, poll_until};

pub const SIMULATED_DESIGN_URL: &str = "https://www.canva.com/design/simulated-autofill/view";

/// Substring left behind by sample `.env` files.
const PLACEHOLDER_MARKER: &str = "your_canva";

/// Template names the client renders locally; never sent upstream.
pub const RESERVED_PRESETS: &[&str] = &["modern", "minimal", "bold", "classic", "default"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillOutcome {
    Real { url: String },
    Simulated { url: String },
    Failed { url: String, error: String },
}

impl AutofillOutcome {
    pub fn canva_url(&self) -> &str {
        match self {
            AutofillOutcome::Real { url }
            | AutofillOutcome::Simulated { url }
            | AutofillOutcome::Failed { url, .. } => url,
        }
    }

    /// What the wire format reports as `isRealCanva`. Simulated results are
    /// presented as real.
    pub fn reported_as_real(&self) -> bool {
        !matches!(self, AutofillOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AutofillOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub struct AutofillGateway {
    credentials: AutofillCredentials,
    api: Arc<dyn AutofillApi>,
    poll: PollPolicy,
}

fn usable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.contains(PLACEHOLDER_MARKER)
}

fn is_reserved_preset(template_id: &str) -> bool {
    let id = template_id.trim().to_lowercase();
    RESERVED_PRESETS.contains(&id.as_str())
}

/// The four fixed slots, filled 1:1 from the design fields.
pub fn build_slot_data(fields: &DesignFields, image_url: &str) -> AutofillData {
    let mut data = AutofillData::new();
    data.insert(
        "title".to_string(),
        SlotValue::Text {
            text: fields.title.clone(),
        },
    );
    data.insert(
        "quote".to_string(),
        SlotValue::Text {
            text: fields.quote.clone(),
        },
    );
    data.insert(
        "image".to_string(),
        SlotValue::Image {
            image_url: image_url.to_string(),
        },
    );
    data.insert(
        "hashtags".to_string(),
        SlotValue::Text {
            text: fields.hashtags.clone(),
        },
    );
    data
}

impl AutofillGateway {
    pub fn new(credentials: AutofillCredentials, api: Arc<dyn AutofillApi>, poll: PollPolicy) -> Self {
        Self {
            credentials,
            api,
            poll,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let api = CanvaClient::new(
            config.endpoints.autofill_base.clone(),
            config.autofill.access_token.clone(),
        );
        Self::new(config.autofill.clone(), Arc::new(api), PollPolicy::default())
    }

    /// The template id a real job would use, or why no real job can run.
    pub fn check_preconditions(&self, requested_template: Option<&str>) -> Result<String, PipelineError> {
        if !usable(&self.credentials.client_id) {
            return Err(PipelineError::Config(
                "Canva Client ID is missing or invalid.".to_string(),
            ));
        }
        if !usable(&self.credentials.access_token) {
            return Err(PipelineError::Config(
                "Canva Access Token is missing or invalid.".to_string(),
            ));
        }
        let template_id = match requested_template {
            Some(t) if !t.trim().is_empty() && !is_reserved_preset(t) => t.trim(),
            _ => self.credentials.template_id.trim(),
        };
        if !usable(template_id) || is_reserved_preset(template_id) {
            return Err(PipelineError::Config(
                "Canva Brand Template ID is missing or invalid.".to_string(),
            ));
        }
        Ok(template_id.to_string())
    }

    pub async fn autofill(
        &self,
        requested_template: Option<&str>,
        fields: &DesignFields,
        image_url: &str,
    ) -> AutofillOutcome {
        let template_id = match self.check_preconditions(requested_template) {
            Ok(id) => id,
            Err(reason) => {
                info!(reason = %reason, "Autofill not configured, using simulated result");
                return AutofillOutcome::Simulated {
                    url: SIMULATED_DESIGN_URL.to_string(),
                };
            }
        };

        let data = build_slot_data(fields, image_url);
        match self.run_job(&template_id, &data).await {
            Ok(url) => {
                info!(template_id = %template_id, url = %url, "Autofill job completed");
                AutofillOutcome::Real { url }
            }
            Err(e) => {
                warn!(template_id = %template_id, error = %e, "Autofill job failed");
                AutofillOutcome::Failed {
                    url: SIMULATED_DESIGN_URL.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    pub async fn run_job(&self, template_id: &str, data: &AutofillData) -> Result<String, PipelineError> {
        let job_id = self
            .api
            .submit(template_id, data)
            .await
            .map_err(|e| PipelineError::Autofill(format!("{:#}", e)))?;
        info!(job_id = %job_id, "Autofill job submitted");
        self.wait_for_result(&job_id).await
    }

    /// Polls the job until it completes, fails, or runs out of attempts.
    pub async fn wait_for_result(&self, job_id: &str) -> Result<String, PipelineError> {
        let api = self.api.clone();
        let outcome = poll_until(self.poll, |attempt| {
            let api = api.clone();
            let job_id = job_id.to_string();
            async move {
                let job = match api.status(&job_id).await {
                    Ok(job) => job,
                    Err(e) => return PollStep::Failed(format!("{:#}", e)),
                };
                match job.status {
                    JobStatus::Completed => match job.result.as_ref().and_then(|r| r.design_url()) {
                        Some(url) => PollStep::Ready(url.to_string()),
                        None => PollStep::Failed("job completed without a design URL".to_string()),
                    },
                    JobStatus::Failed => PollStep::Failed(format!(
                        "Canva Job Failed: {}",
                        job.error.map(|e| e.to_string()).unwrap_or_default()
                    )),
                    JobStatus::Pending => {
                        tracing::debug!(job_id = %job_id, attempt, "Autofill job still pending");
                        PollStep::Pending
                    }
                }
            }
        })
        .await;

        outcome.map_err(|e| match e {
            PollError::Failed(msg) => PipelineError::Autofill(msg),
            PollError::Exhausted { attempts } => PipelineError::Timeout(format!(
                "Canva Job timed out after {} status checks",
                attempts
            )),
        })
    }
}
