use serde_json::Value;

use super::DesignFields;
use crate::core::error::PipelineError;

/// Parses the model's free-form output into design fields.
pub fn extract(raw: &str) -> Result<DesignFields, PipelineError> {
    let object = find_json_object(raw).ok_or_else(|| {
        PipelineError::Parse(format!("no JSON object in model output: {}", preview(raw)))
    })?;
    Ok(DesignFields::from_value(&object))
}

/// Locates the JSON object in `text`. The first balanced `{...}` span wins;
/// if it does not parse, the loose first-`{`-to-last-`}` span is tried.
pub fn find_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let candidates = [
        balanced_object_span(text, start),
        text.rfind('}')
            .filter(|end| *end > start)
            .map(|end| &text[start..=end]),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|span| serde_json::from_str::<Value>(span).ok())
        .find(Value::is_object)
}

fn balanced_object_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    let clipped: String = text.chars().take(80).collect();
    if clipped.len() < text.len() {
        format!("{}...", clipped)
    } else {
        clipped
    }
}
