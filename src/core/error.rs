use std::sync::LazyLock;

use regex::Regex;

static RATE_LIMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)429|quota|rate limit").expect("rate limit pattern is invalid"));

/// Every way a generation can go wrong. Only `Validation` ever reaches the
/// caller as a non-200 status; the rest are masked at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Failed to parse AI response as JSON: {0}")]
    Parse(String),

    #[error("Image fetch failed: {0}")]
    ImageFetch(String),

    #[error("Autofill error: {0}")]
    Autofill(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Validation(String),
}

impl PipelineError {
    /// True when the message looks like a quota or rate-limit condition.
    pub fn is_rate_limit(&self) -> bool {
        RATE_LIMIT_PATTERN.is_match(&self.to_string())
    }

    pub fn error_code(&self) -> &'static str {
        if self.is_rate_limit() {
            "RATE_LIMIT"
        } else {
            "AI_ERROR"
        }
    }
}
