//! Pattern-based HTML to text reduction.
//!
//! This is not an HTML parser: `<script>`, `<style>`, `<head>` and comments
//! are removed with their content, block-level tags become word breaks,
//! inline tags vanish, a small entity set is decoded, and whitespace is
//! collapsed to single spaces.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::util::resolve_entity;

static DROPPED_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<head\b[^>]*>.*?</head\s*>")
        .expect("valid regex")
});

static BLOCK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|br|hr|h[1-6]|li|ul|ol|tr|td|th|table|section|article|header|footer|blockquote|pre|dd|dt|dl|figure|figcaption|nav|aside|body|html)\b[^>]*>",
    )
    .expect("valid regex")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX]?[0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Reduce HTML to a single line of text.
pub fn strip_html(html: &str) -> String {
    strip_visible(&remove_hidden(html))
}

/// Remove comments and `<script>`, `<style>` and `<head>` blocks with their
/// content, leaving a space in their place.
pub fn remove_hidden(html: &str) -> Cow<'_, str> {
    DROPPED_BLOCKS.replace_all(html, " ")
}

/// [`strip_html`] for markup already passed through [`remove_hidden`].
pub fn strip_visible(html: &str) -> String {
    let text = BLOCK_TAGS.replace_all(html, " ");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Decode `&nbsp; &amp; &lt; &gt; &quot;` and numeric references in one pass,
/// so `&amp;lt;` becomes `&lt;` rather than `<`.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            resolve_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_script_and_style() {
        let html = r#"<html><head><title>T</title><style>p { color: red; }</style></head>
<body><script type="text/javascript">var x = "<p>";</script><p>Hello <b>bold</b> world</p></body></html>"#;
        assert_eq!(strip_html(html), "Hello bold world");
    }

    #[test]
    fn test_block_tags_separate_words() {
        assert_eq!(strip_html("<p>one</p><p>two</p>"), "one two");
        assert_eq!(strip_html("line<br/>break"), "line break");
        assert_eq!(strip_html("in<em>line</em>"), "inline");
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            strip_html("Fish&nbsp;&amp;&nbsp;chips &lt;tag&gt; &quot;q&quot;"),
            "Fish & chips <tag> \"q\""
        );
        assert_eq!(strip_html("&amp;lt;"), "&lt;");
        assert_eq!(strip_html("caf&#233;"), "caf\u{e9}");
        assert_eq!(strip_html("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(strip_html("  a \n\n\t b  "), "a b");
        assert_eq!(strip_html("<!-- hidden --> shown"), "shown");
        assert_eq!(strip_html(""), "");
    }
}
