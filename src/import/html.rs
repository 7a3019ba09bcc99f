//! HTML import: tag stripping plus `<h1>`..`<h6>` headings.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::model::{NavigationKind, ParseResult};
use crate::navigation::{Anchor, NavigationBuilder};
use crate::text::count_words;
use crate::text::html::{remove_hidden, strip_visible};
use crate::util::decode_markup;

use super::Extractor;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Strip `html`, recording each non-empty heading element as an anchor at
    /// the word index where its text starts.
    pub fn strip_with_headings(html: &str) -> (String, Vec<Anchor>) {
        let visible = remove_hidden(html);
        let mut segments: Vec<String> = Vec::new();
        let mut anchors = Vec::new();
        let mut words = 0;
        let mut cursor = 0;

        let mut push = |segment: String, words: &mut usize| {
            if !segment.is_empty() {
                *words += count_words(&segment);
                segments.push(segment);
            }
        };

        for caps in HEADING.captures_iter(&visible) {
            let (Some(whole), Some(level), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            push(strip_visible(&visible[cursor..whole.start()]), &mut words);

            let title = strip_visible(inner.as_str());
            if !title.is_empty() {
                let level = level.as_str().parse().unwrap_or(1);
                anchors.push(Anchor::new(title.clone(), words, NavigationKind::Heading).with_level(level));
            }
            push(title, &mut words);
            cursor = whole.end();
        }
        push(strip_visible(&visible[cursor..]), &mut words);

        (segments.join(" "), anchors)
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult> {
        let html = decode_markup(bytes);
        let (text, anchors) = Self::strip_with_headings(&html);
        let total = count_words(&text);
        Ok(ParseResult::new(text, NavigationBuilder::from_anchors(anchors, total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip_html;

    #[test]
    fn test_text_matches_plain_strip() {
        let html = "<html><head><title>x</title></head><body>\
                    <h1>Intro</h1><p>one <em>two</em></p>\
                    <h2 class=\"sub\">Part <b>B</b></h2><p>three</p></body></html>";
        let (text, _) = HtmlExtractor::strip_with_headings(html);
        assert_eq!(text, strip_html(html));
        assert_eq!(text, "Intro one two Part B three");
    }

    #[test]
    fn test_heading_anchors() {
        let html = "<p>lead in</p><h1>Intro</h1><p>one two</p><h3>Deep</h3><p>three</p>";
        let result = HtmlExtractor.extract(html.as_bytes()).unwrap();
        let points = &result.navigation_points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].title, "Intro");
        assert_eq!((points[0].word_start_index, points[0].word_end_index), (2, 5));
        assert_eq!(points[1].level, Some(3));
        assert_eq!((points[1].word_start_index, points[1].word_end_index), (5, 7));
    }

    #[test]
    fn test_headings_inside_script_ignored() {
        let html = "<script>document.write('<h1>fake</h1>')</script><p>real text</p>";
        let result = HtmlExtractor.extract(html.as_bytes()).unwrap();
        assert_eq!(result.text, "real text");
        assert!(result.navigation_points.is_empty());
    }

    #[test]
    fn test_empty_heading_skipped() {
        let (text, anchors) = HtmlExtractor::strip_with_headings("<h2> </h2><p>body</p>");
        assert_eq!(text, "body");
        assert!(anchors.is_empty());
    }
}
