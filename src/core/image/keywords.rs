use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("non-word pattern is invalid"));

const STOCK_DEFAULT: &str = "abstract technology";
const PLACEHOLDER_DEFAULT: &str = "abstract,digital";

/// First two whitespace-separated tokens, comma-joined. Not yet URL-encoded.
pub fn stock_keywords(description: &str) -> String {
    let description = if description.trim().is_empty() {
        STOCK_DEFAULT
    } else {
        description
    };
    description
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(",")
}

/// Up to three tokens longer than three characters, punctuation stripped.
pub fn placeholder_keywords(description: &str) -> String {
    let cleaned = NON_WORD.replace_all(description, "");
    let keywords = cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .take(3)
        .collect::<Vec<_>>()
        .join(",");
    if keywords.is_empty() {
        PLACEHOLDER_DEFAULT.to_string()
    } else {
        keywords
    }
}
