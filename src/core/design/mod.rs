//! The five design attributes the language model extracts from an article,
//! plus the prompt that asks for them and the parser that reads them back.

pub mod extract;
pub mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use extract::extract;
pub use prompt::build_prompt;

pub const DEFAULT_TITLE: &str = "AI Generated Design";
pub const DEFAULT_QUOTE: &str = "Innovation meets creativity";
pub const DEFAULT_IMAGE_DESCRIPTION: &str = "Abstract digital art";
pub const DEFAULT_HASHTAGS: &str = "#AI #Design #Future";
pub const DEFAULT_COLOR_SCHEME: &str = "#4F46E5,#FBBF24,#FFFFFF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignFields {
    pub title: String,
    pub quote: String,
    pub image_description: String,
    pub hashtags: String,
    pub color_scheme: String,
}

impl Default for DesignFields {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            quote: DEFAULT_QUOTE.to_string(),
            image_description: DEFAULT_IMAGE_DESCRIPTION.to_string(),
            hashtags: DEFAULT_HASHTAGS.to_string(),
            color_scheme: DEFAULT_COLOR_SCHEME.to_string(),
        }
    }
}

impl DesignFields {
    /// Reads the model's JSON object. Any field that is absent, blank or not
    /// a string gets its static default; present values are kept verbatim.
    pub fn from_value(value: &Value) -> Self {
        let read = |key: &str, default: &str| -> String {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            title: read("title", DEFAULT_TITLE),
            quote: read("quote", DEFAULT_QUOTE),
            image_description: read("imageDescription", DEFAULT_IMAGE_DESCRIPTION),
            hashtags: read("hashtags", DEFAULT_HASHTAGS),
            color_scheme: read("colorScheme", DEFAULT_COLOR_SCHEME),
        }
    }

    /// Re-applies the field defaults. A no-op on anything built by
    /// `from_value`.
    pub fn normalized(self) -> Self {
        let keep = |value: String, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value
            }
        };

        Self {
            title: keep(self.title, DEFAULT_TITLE),
            quote: keep(self.quote, DEFAULT_QUOTE),
            image_description: keep(self.image_description, DEFAULT_IMAGE_DESCRIPTION),
            hashtags: keep(self.hashtags, DEFAULT_HASHTAGS),
            color_scheme: keep(self.color_scheme, DEFAULT_COLOR_SCHEME),
        }
    }
}
