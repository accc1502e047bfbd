//! Rich text to paragraph conversion used when inserting note bodies.

use regex::Regex;
use std::sync::LazyLock;

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</p\s*>|<br\s*/?>|</li\s*>|</h[1-6]\s*>|</blockquote\s*>|</div\s*>")
        .expect("Invalid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Split an HTML fragment into plain-text paragraphs.
///
/// Block-level closing tags and line breaks end a paragraph; remaining markup
/// is stripped, common entities are decoded, and blank paragraphs are dropped.
///
/// # Examples
///
/// ```
/// use flomo_core::store::html_to_paragraphs;
///
/// let paragraphs = html_to_paragraphs("<p>Hello <b>world</b></p><p></p><p>Bye</p>");
/// assert_eq!(paragraphs, vec!["Hello world", "Bye"]);
/// ```
#[must_use]
pub fn html_to_paragraphs(html: &str) -> Vec<String> {
    BLOCK_BREAK
        .split(html)
        .map(|chunk| decode_entities(&TAG.replace_all(chunk, "")))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_single_paragraph() {
        assert_eq!(html_to_paragraphs("just text"), vec!["just text"]);
    }

    #[test]
    fn test_lists_and_breaks_split_paragraphs() {
        let html = "<ul><li>one</li><li>two</li></ul>line<br/>next";
        assert_eq!(html_to_paragraphs(html), vec!["one", "two", "line", "next"]);
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            html_to_paragraphs("<p>a &amp; b &lt;c&gt;</p>"),
            vec!["a & b <c>"]
        );
    }

    #[test]
    fn test_empty_content_yields_nothing() {
        assert!(html_to_paragraphs("").is_empty());
        assert!(html_to_paragraphs("<p> </p><p></p>").is_empty());
    }
}
