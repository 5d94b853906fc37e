use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::warn;

use super::LlmProvider;
use crate::core::error::PipelineError;

static TRANSIENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)econnreset|connection reset|fetch failed")
        .expect("transient error pattern is invalid")
});

/// Exponential backoff: the wait before retry `k` is `base_delay * 2^k`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Network-level failures worth another attempt. Quota, auth and malformed
/// request errors are not.
pub fn is_transient(err: &anyhow::Error) -> bool {
    let network_failure = err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_connect() || e.is_timeout())
    });
    network_failure || TRANSIENT_PATTERN.is_match(&format!("{:#}", err))
}

pub async fn generate_with_retry(
    provider: &dyn LlmProvider,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<String, PipelineError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match provider.generate(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if is_transient(&e) && attempt + 1 < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    provider = provider.provider_name(),
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient AI failure, retrying",
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(PipelineError::Upstream(format!("{:#}", e))),
        }
    }
}
