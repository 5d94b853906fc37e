pub mod providers;
pub mod retry;

use anyhow::Result;
use async_trait::async_trait;

pub use retry::{RetryPolicy, generate_with_retry};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    fn model_id(&self) -> &str;

    // Single-turn completion: one prompt in, the model's raw text out
    async fn generate(&self, prompt: &str) -> Result<String>;
}
