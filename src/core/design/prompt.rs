pub const MAX_ARTICLE_CHARS: usize = 2000;

/// Builds the extraction prompt. Article text is clipped to its first
/// `MAX_ARTICLE_CHARS` characters and interpolated as-is.
pub fn build_prompt(article_text: &str) -> String {
    let article = clip_chars(article_text, MAX_ARTICLE_CHARS);
    format!(
        r##"Create a social media graphic design from this article.

ARTICLE: {article}

Return a JSON object with these exact fields:
1. "title": A catchy, engaging title (5-8 words max)
2. "quote": A key insight or compelling quote from the article (10-15 words)
3. "imageDescription": A detailed description for generating a relevant background image
4. "hashtags": 3 relevant hashtags (start with #)
5. "colorScheme": A color palette suggestion (e.g., "#4F46E5,#FBBF24,#FFFFFF")

Format as valid JSON only. No additional text."##
    )
}

fn clip_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
