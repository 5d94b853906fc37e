use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Where each upstream lives. Production defaults, overridable from the
/// environment so local mock servers can stand in.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub ai_base: String,
    pub autofill_base: String,
    pub stock_image_base: String,
    pub placeholder_image_base: String,
    pub image_gen_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ai_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            autofill_base: "https://api.canva.com/rest/v1".to_string(),
            stock_image_base: "https://source.unsplash.com".to_string(),
            placeholder_image_base: "https://loremflickr.com".to_string(),
            image_gen_base: "https://api.openai.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    Stock,
    Placeholder,
}

impl ImageSource {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "placeholder" => ImageSource::Placeholder,
            _ => ImageSource::Stock,
        }
    }
}

/// Raw autofill credentials. Validation happens in the gateway; here they
/// are just whatever the environment held.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutofillCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub template_id: String,
}

/// Process-wide configuration, read once at startup and handed to whoever
/// needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub autofill: AutofillCredentials,
    pub image_gen_api_key: Option<String>,
    pub image_source: ImageSource,
    pub endpoints: Endpoints,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            ai_base: non_empty("CARDSMITH_AI_BASE_URL").unwrap_or(defaults.ai_base),
            autofill_base: non_empty("CARDSMITH_AUTOFILL_BASE_URL")
                .unwrap_or(defaults.autofill_base),
            stock_image_base: non_empty("CARDSMITH_STOCK_IMAGE_BASE_URL")
                .unwrap_or(defaults.stock_image_base),
            placeholder_image_base: non_empty("CARDSMITH_PLACEHOLDER_IMAGE_BASE_URL")
                .unwrap_or(defaults.placeholder_image_base),
            image_gen_base: non_empty("CARDSMITH_IMAGE_GEN_BASE_URL")
                .unwrap_or(defaults.image_gen_base),
        };

        let data_dir = non_empty("CARDSMITH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Self {
            ai_api_key: non_empty("GOOGLE_AI_API_KEY"),
            ai_model: non_empty("GOOGLE_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            autofill: AutofillCredentials {
                client_id: lookup("CANVA_CLIENT_ID").unwrap_or_default(),
                client_secret: lookup("CANVA_CLIENT_SECRET").unwrap_or_default(),
                access_token: lookup("CANVA_ACCESS_TOKEN").unwrap_or_default(),
                template_id: lookup("CANVA_BRAND_TEMPLATE_ID").unwrap_or_default(),
            },
            image_gen_api_key: non_empty("OPENAI_API_KEY"),
            image_source: non_empty("CARDSMITH_IMAGE_SOURCE")
                .map(|s| ImageSource::parse(&s))
                .unwrap_or_default(),
            endpoints,
            data_dir,
        }
    }
}

/// Unix: `~/.cardsmith`. Falls back to the working directory when no home
/// directory can be determined.
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cardsmith"))
        .unwrap_or_else(|| PathBuf::from(".cardsmith"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[("CARDSMITH_DATA_DIR", "/tmp/cardsmith-test")]);
        assert!(config.ai_api_key.is_none());
        assert_eq!(config.ai_model, DEFAULT_MODEL);
        assert_eq!(config.autofill, AutofillCredentials::default());
        assert!(config.image_gen_api_key.is_none());
        assert_eq!(config.image_source, ImageSource::Stock);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cardsmith-test"));
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let config = config_from(&[("GOOGLE_AI_API_KEY", "   "), ("OPENAI_API_KEY", "")]);
        assert!(config.ai_api_key.is_none());
        assert!(config.image_gen_api_key.is_none());
    }

    #[test]
    fn overrides_are_picked_up() {
        let config = config_from(&[
            ("GOOGLE_AI_API_KEY", "key-123"),
            ("GOOGLE_AI_MODEL", "gemini-2.5-flash"),
            ("CANVA_CLIENT_ID", "client"),
            ("CANVA_ACCESS_TOKEN", "token"),
            ("CANVA_BRAND_TEMPLATE_ID", "tmpl"),
            ("CARDSMITH_IMAGE_SOURCE", "Placeholder"),
            ("CARDSMITH_AI_BASE_URL", "http://127.0.0.1:9999"),
        ]);
        assert_eq!(config.ai_api_key.as_deref(), Some("key-123"));
        assert_eq!(config.ai_model, "gemini-2.5-flash");
        assert_eq!(config.autofill.client_id, "client");
        assert_eq!(config.autofill.access_token, "token");
        assert_eq!(config.autofill.template_id, "tmpl");
        assert_eq!(config.image_source, ImageSource::Placeholder);
        assert_eq!(config.endpoints.ai_base, "http://127.0.0.1:9999");
    }
}
