//! The generation pipeline: prompt → AI call → extraction → background image
//! → autofill → one fixed-shape result.
//!
//! `Pipeline::run` returns a real `Result`; callers that must always render
//! something convert an `Err` with [`GenerationResult::fallback`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::autofill::{AutofillGateway, AutofillOutcome};
use crate::core::config::AppConfig;
use crate::core::design::{self, DesignFields};
use crate::core::error::PipelineError;
use crate::core::image::{BackgroundResolver, FALLBACK_IMAGE_PATH};
use crate::core::llm::providers::GoogleProvider;
use crate::core::llm::{LlmProvider, RetryPolicy, generate_with_retry};

pub const MIN_ARTICLE_CHARS: usize = 20;
pub const VALIDATION_MESSAGE: &str = "Please provide article text (at least 20 characters)";

const DEFAULT_BACKGROUND: &str = "#4F46E5";
const DEFAULT_ACCENT: &str = "#FBBF24";
const DEFAULT_TEXT: &str = "#FFFFFF";

const FALLBACK_TITLE: &str = "The Future of AI Design";
const FALLBACK_QUOTE: &str = "Artificial intelligence is revolutionizing how we create visual content";
const FALLBACK_IMAGE_PROMPT: &str = "Futuristic digital art with neural networks";
const FALLBACK_HASHTAGS: &str = "#AI #Design #Innovation";

const RAW_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub hashtags: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub article_text: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub override_data: Option<OverrideData>,
}

impl GenerationRequest {
    pub fn new(article_text: impl Into<String>) -> Self {
        Self {
            article_text: Some(article_text.into()),
            ..Self::default()
        }
    }

    /// The article text, if it is long enough to work with.
    pub fn validated_text(&self) -> Result<&str, PipelineError> {
        match self.article_text.as_deref() {
            Some(text) if text.trim().chars().count() >= MIN_ARTICLE_CHARS => Ok(text),
            _ => Err(PipelineError::Validation(VALIDATION_MESSAGE.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub background_color: String,
    pub accent_color: String,
    pub text_color: String,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            accent_color: DEFAULT_ACCENT.to_string(),
            text_color: DEFAULT_TEXT.to_string(),
        }
    }
}

/// Splits a comma-separated palette positionally into background, accent
/// and text colors. Missing positions keep their defaults; extras are ignored.
pub fn parse_palette(color_scheme: &str) -> Template {
    let mut colors = color_scheme
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let defaults = Template::default();
    Template {
        background_color: colors.next().unwrap_or(defaults.background_color),
        accent_color: colors.next().unwrap_or(defaults.accent_color),
        text_color: colors.next().unwrap_or(defaults.text_color),
    }
}

/// The response contract. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub title: String,
    pub quote: String,
    pub hashtags: String,
    pub image_prompt: String,
    pub image_url: String,
    pub template: Template,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canva_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_real_canva: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl GenerationResult {
    /// The canned design shown when generation failed outright.
    pub fn fallback(err: &PipelineError) -> Self {
        let error = if err.is_rate_limit() {
            "AI rate limit reached. Using a fallback design."
        } else {
            "AI generation failed. Using a fallback design."
        };
        Self {
            success: false,
            title: FALLBACK_TITLE.to_string(),
            quote: FALLBACK_QUOTE.to_string(),
            hashtags: FALLBACK_HASHTAGS.to_string(),
            image_prompt: FALLBACK_IMAGE_PROMPT.to_string(),
            image_url: FALLBACK_IMAGE_PATH.to_string(),
            template: Template::default(),
            canva_url: None,
            is_real_canva: None,
            error: Some(error.to_string()),
            error_code: Some(err.error_code().to_string()),
            raw_response: None,
        }
    }
}

pub fn compose(
    fields: DesignFields,
    image_url: String,
    autofill: &AutofillOutcome,
    raw_response: &str,
) -> GenerationResult {
    let fields = fields.normalized();
    let template = parse_palette(&fields.color_scheme);
    GenerationResult {
        success: true,
        title: fields.title,
        quote: fields.quote,
        hashtags: fields.hashtags,
        image_prompt: fields.image_description,
        image_url,
        template,
        canva_url: Some(autofill.canva_url().to_string()),
        is_real_canva: Some(autofill.reported_as_real()),
        error: autofill.error().map(str::to_string),
        error_code: None,
        raw_response: Some(raw_preview(raw_response)),
    }
}

fn raw_preview(raw: &str) -> String {
    let clipped: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
    format!("{}...", clipped)
}

fn apply_overrides(mut fields: DesignFields, overrides: Option<&OverrideData>) -> DesignFields {
    let Some(overrides) = overrides else {
        return fields;
    };
    let pick = |value: &Option<String>| value.as_ref().filter(|v| !v.trim().is_empty()).cloned();
    if let Some(title) = pick(&overrides.title) {
        fields.title = title;
    }
    if let Some(quote) = pick(&overrides.quote) {
        fields.quote = quote;
    }
    if let Some(hashtags) = pick(&overrides.hashtags) {
        fields.hashtags = hashtags;
    }
    fields
}

pub struct Pipeline {
    llm: Option<Arc<dyn LlmProvider>>,
    images: BackgroundResolver,
    autofill: AutofillGateway,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        images: BackgroundResolver,
        autofill: AutofillGateway,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            images,
            autofill,
            retry,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let llm = config.ai_api_key.clone().map(|key| {
            Arc::new(GoogleProvider::new(
                key,
                config.ai_model.clone(),
                config.endpoints.ai_base.clone(),
            )) as Arc<dyn LlmProvider>
        });
        Self::new(
            llm,
            BackgroundResolver::from_config(config),
            AutofillGateway::from_config(config),
            RetryPolicy::default(),
        )
    }

    pub fn llm(&self) -> Option<&Arc<dyn LlmProvider>> {
        self.llm.as_ref()
    }

    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult, PipelineError> {
        let article_text = request.validated_text()?;
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| PipelineError::Config("Google AI API key not configured".to_string()))?;

        let prompt = design::build_prompt(article_text);
        let raw = generate_with_retry(llm.as_ref(), &prompt, self.retry).await?;
        let fields = design::extract(&raw)?;
        info!(title = %fields.title, "Extracted design fields");

        let overrides = request.override_data.as_ref();
        let fields = apply_overrides(fields, overrides);

        let image_url = match overrides
            .and_then(|o| o.image_url.as_ref())
            .filter(|u| !u.trim().is_empty())
        {
            Some(url) => url.clone(),
            None => self.images.resolve(&fields.image_description).await.into_url(),
        };

        let outcome = self
            .autofill
            .autofill(request.template_id.as_deref(), &fields, &image_url)
            .await;

        Ok(compose(fields, image_url, &outcome, &raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::autofill::tests::{FakeAutofill, configured};
    use crate::core::autofill::{AutofillGateway, SIMULATED_DESIGN_URL};
    use crate::core::config::AutofillCredentials;
    use crate::core::llm::retry::tests::ScriptedProvider;
    use crate::core::poll::PollPolicy;
    use std::time::Duration;

    const AI_RISING: &str = r##"Here is your design: {"title":"AI Rising","quote":"AI changes everything","imageDescription":"neural network lights","hashtags":"#AI #Future #Tech","colorScheme":"#111111,#222222,#333333"}"##;

    fn offline_config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "CARDSMITH_STOCK_IMAGE_BASE_URL" => Some("http://127.0.0.1:1".to_string()),
            _ => None,
        })
    }

    fn pipeline_with(
        provider: Arc<ScriptedProvider>,
        credentials: AutofillCredentials,
        autofill: Arc<FakeAutofill>,
    ) -> Pipeline {
        let config = offline_config();
        let provider: Arc<dyn LlmProvider> = provider;
        Pipeline::new(
            Some(provider),
            BackgroundResolver::from_config(&config),
            AutofillGateway::new(
                credentials,
                autofill,
                PollPolicy {
                    interval: Duration::from_millis(1),
                    max_attempts: 10,
                },
            ),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    #[test]
    fn palette_always_has_three_colors() {
        let cases = [
            ("", Template::default()),
            (
                "#000000",
                Template {
                    background_color: "#000000".to_string(),
                    ..Template::default()
                },
            ),
            (
                " #000000 , #111111",
                Template {
                    background_color: "#000000".to_string(),
                    accent_color: "#111111".to_string(),
                    ..Template::default()
                },
            ),
            (
                "#000000,#111111,#222222,#333333",
                Template {
                    background_color: "#000000".to_string(),
                    accent_color: "#111111".to_string(),
                    text_color: "#222222".to_string(),
                },
            ),
            (",,,", Template::default()),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_palette(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn short_text_fails_validation() {
        for text in [None, Some(""), Some("too short"), Some("   nineteen chars   ")] {
            let req = GenerationRequest {
                article_text: text.map(str::to_string),
                ..GenerationRequest::default()
            };
            assert!(matches!(req.validated_text(), Err(PipelineError::Validation(_))));
        }
        assert!(GenerationRequest::new("twenty characters!!!").validated_text().is_ok());
    }

    #[tokio::test]
    async fn short_text_never_calls_upstream() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(AI_RISING.to_string())]));
        let pipeline = pipeline_with(
            provider.clone(),
            AutofillCredentials::default(),
            Arc::new(FakeAutofill::completing_on(1)),
        );
        let err = pipeline.run(&GenerationRequest::new("short")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn end_to_end_success_uses_model_fields() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(AI_RISING.to_string())]));
        let autofill = Arc::new(FakeAutofill::completing_on(1));
        let pipeline = pipeline_with(provider, AutofillCredentials::default(), autofill.clone());

        let result = pipeline
            .run(&GenerationRequest::new(
                "Artificial intelligence is transforming how we work and create.",
            ))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.title, "AI Rising");
        assert_eq!(result.quote, "AI changes everything");
        assert_eq!(result.hashtags, "#AI #Future #Tech");
        assert_eq!(result.image_prompt, "neural network lights");
        assert_eq!(
            result.template,
            Template {
                background_color: "#111111".to_string(),
                accent_color: "#222222".to_string(),
                text_color: "#333333".to_string(),
            }
        );
        assert_eq!(result.image_url, FALLBACK_IMAGE_PATH);
        assert_eq!(result.canva_url.as_deref(), Some(SIMULATED_DESIGN_URL));
        assert_eq!(result.is_real_canva, Some(true));
        assert!(result.error.is_none());
        assert_eq!(autofill.submits.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn quota_error_becomes_rate_limit_fallback() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            "Google Gemini API Error (429): You exceeded your current quota".to_string(),
        )]));
        let pipeline = pipeline_with(
            provider.clone(),
            AutofillCredentials::default(),
            Arc::new(FakeAutofill::completing_on(1)),
        );
        let err = pipeline
            .run(&GenerationRequest::new(
                "Artificial intelligence is transforming everything.",
            ))
            .await
            .unwrap_err();
        assert_eq!(provider.calls(), 1);

        let result = GenerationResult::fallback(&err);
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("RATE_LIMIT"));
        assert_eq!(result.title, FALLBACK_TITLE);
        assert_eq!(result.quote, FALLBACK_QUOTE);
        assert_eq!(result.hashtags, FALLBACK_HASHTAGS);
        assert_eq!(result.image_url, FALLBACK_IMAGE_PATH);
    }

    #[tokio::test]
    async fn missing_ai_key_is_a_config_error() {
        let config = offline_config();
        let pipeline = Pipeline::from_config(&config);
        let err = pipeline
            .run(&GenerationRequest::new("A perfectly long enough article text."))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(GenerationResult::fallback(&err).error_code.as_deref(), Some("AI_ERROR"));
    }

    #[tokio::test]
    async fn unparseable_model_output_is_a_parse_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("I cannot do that.".to_string())]));
        let pipeline = pipeline_with(
            provider,
            AutofillCredentials::default(),
            Arc::new(FakeAutofill::completing_on(1)),
        );
        let err = pipeline
            .run(&GenerationRequest::new("A perfectly long enough article text."))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn real_autofill_result_and_overrides_flow_through() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(AI_RISING.to_string())]));
        let autofill = Arc::new(FakeAutofill::completing_on(3));
        let pipeline = pipeline_with(provider, configured(), autofill.clone());

        let request = GenerationRequest {
            article_text: Some("A perfectly long enough article text.".to_string()),
            template_id: Some("modern".to_string()),
            override_data: Some(OverrideData {
                title: Some("My Own Title".to_string()),
                quote: Some("  ".to_string()),
                hashtags: None,
                image_url: Some("https://img.example/mine.png".to_string()),
            }),
        };
        let result = pipeline.run(&request).await.unwrap();

        assert_eq!(result.title, "My Own Title");
        assert_eq!(result.quote, "AI changes everything");
        assert_eq!(result.image_url, "https://img.example/mine.png");
        assert_eq!(result.canva_url.as_deref(), Some("https://canva.example/design/real"));
        assert_eq!(result.is_real_canva, Some(true));
        assert_eq!(autofill.status_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn autofill_timeout_keeps_generation_successful() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(AI_RISING.to_string())]));
        let pipeline = pipeline_with(provider, configured(), Arc::new(FakeAutofill::never_completing()));

        let result = pipeline
            .run(&GenerationRequest::new("A perfectly long enough article text."))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.is_real_canva, Some(false));
        assert!(result.error.unwrap_or_default().contains("timed out"));
    }

    #[test]
    fn wire_format_uses_camel_case_and_omits_absent_options() {
        let result = GenerationResult::fallback(&PipelineError::Upstream("boom".into()));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["imagePrompt"], FALLBACK_IMAGE_PROMPT);
        assert_eq!(value["template"]["backgroundColor"], DEFAULT_BACKGROUND);
        assert_eq!(value["errorCode"], "AI_ERROR");
        assert!(value.get("canvaUrl").is_none());
        assert!(value.get("isRealCanva").is_none());
    }

    #[test]
    fn raw_preview_is_clipped() {
        let raw = "x".repeat(500);
        let preview = raw_preview(&raw);
        assert_eq!(preview.len(), RAW_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
