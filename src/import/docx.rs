//! DOCX import.
//!
//! Only `word/document.xml` is read. Paragraphs become lines; a paragraph
//! whose style is `Title`, `HeadingN` or `hN` becomes a heading anchored at
//! the word index where the paragraph starts.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{NavigationKind, ParseResult};
use crate::navigation::{Anchor, NavigationBuilder};
use crate::text::count_words;
use crate::util::decode_markup;
use crate::xml::{self, XmlEvent, XmlReducer};

use super::{Archive, Extractor};

const DOCUMENT_PATH: &str = "word/document.xml";

static HEADING_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(?:heading\s*|h)([1-6])$").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult> {
        let mut archive = Archive::new(bytes)?;
        let document = archive
            .read_optional(DOCUMENT_PATH)?
            .ok_or_else(|| Error::InvalidDocx(format!("missing {DOCUMENT_PATH}")))?;
        let content = decode_markup(&document);

        let body = xml::reduce(&content, DocumentReducer::default())?;
        debug!("docx: {} paragraphs, {} headings", body.paragraphs, body.anchors.len());

        let points = NavigationBuilder::from_anchors(body.anchors, body.words);
        Ok(ParseResult::new(body.text, points))
    }
}

/// Heading level for a paragraph style id.
pub fn heading_level(style: &str) -> Option<u8> {
    if style.eq_ignore_ascii_case("title") {
        return Some(1);
    }
    HEADING_STYLE
        .captures(style)
        .and_then(|caps| caps[1].parse().ok())
}

struct DocumentBody {
    text: String,
    anchors: Vec<Anchor>,
    words: usize,
    paragraphs: usize,
}

#[derive(Default)]
struct DocumentReducer {
    text: String,
    paragraph: String,
    style: Option<String>,
    in_text: bool,
    anchors: Vec<Anchor>,
    words: usize,
    paragraphs: usize,
}

impl DocumentReducer {
    fn end_paragraph(&mut self) {
        let words = count_words(&self.paragraph);
        if let Some(level) = self.style.as_deref().and_then(heading_level)
            && words > 0
        {
            let title = self.paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
            self.anchors
                .push(Anchor::new(title, self.words, NavigationKind::Heading).with_level(level));
        }

        self.words += words;
        self.paragraphs += 1;
        self.text.push_str(self.paragraph.trim_end());
        self.text.push('\n');
        self.paragraph.clear();
        self.style = None;
    }
}

impl XmlReducer for DocumentReducer {
    type Output = DocumentBody;

    // Whitespace inside <w:t xml:space="preserve"> separates words.
    const TRIM_TEXT: bool = false;

    fn step(&mut self, event: XmlEvent<'_>) {
        match event {
            XmlEvent::Start(el) => match el.name.as_str() {
                "p" => {
                    self.paragraph.clear();
                    self.style = None;
                }
                "pStyle" => self.style = el.attr("val").map(str::to_string),
                "t" => self.in_text = true,
                "tab" => self.paragraph.push(' '),
                "br" | "cr" => self.paragraph.push('\n'),
                _ => {}
            },
            XmlEvent::End(name) => match name.as_str() {
                "t" => self.in_text = false,
                "p" => self.end_paragraph(),
                _ => {}
            },
            XmlEvent::Text(text) => {
                if self.in_text {
                    self.paragraph.push_str(&text);
                }
            }
        }
    }

    fn finish(self) -> Result<DocumentBody> {
        Ok(DocumentBody {
            text: self.text,
            anchors: self.anchors,
            words: self.words,
            paragraphs: self.paragraphs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(xml: &str) -> DocumentBody {
        xml::reduce(xml, DocumentReducer::default()).unwrap()
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("Title"), Some(1));
        assert_eq!(heading_level("Heading1"), Some(1));
        assert_eq!(heading_level("heading 3"), Some(3));
        assert_eq!(heading_level("h2"), Some(2));
        assert_eq!(heading_level("Heading7"), None);
        assert_eq!(heading_level("Normal"), None);
        assert_eq!(heading_level("Subtitle"), None);
    }

    #[test]
    fn test_paragraphs_and_runs() {
        let doc = body(
            r#"<w:document xmlns:w="w"><w:body>
<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> big </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
<w:p><w:r><w:t>Tab</w:t><w:tab/><w:t>bed</w:t></w:r></w:p>
</w:body></w:document>"#,
        );
        assert_eq!(doc.text, "Hello big world\nTab bed\n");
        assert_eq!(doc.words, 5);
        assert_eq!(doc.paragraphs, 2);
    }

    #[test]
    fn test_heading_word_index() {
        let doc = body(
            r#"<w:document xmlns:w="w"><w:body>
<w:p><w:r><w:t>intro words here</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Second Part</w:t></w:r></w:p>
<w:p><w:r><w:t>body</w:t></w:r></w:p>
</w:body></w:document>"#,
        );
        assert_eq!(doc.anchors.len(), 1);
        assert_eq!(doc.anchors[0].title, "Second Part");
        assert_eq!(doc.anchors[0].word_index, 3);
        assert_eq!(doc.anchors[0].level, Some(2));
    }

    #[test]
    fn test_empty_heading_paragraph_ignored() {
        let doc = body(
            r#"<w:document xmlns:w="w"><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr></w:p>
<w:p><w:r><w:t>text</w:t></w:r></w:p>
</w:body></w:document>"#,
        );
        assert!(doc.anchors.is_empty());
    }

    #[test]
    fn test_entities_in_runs() {
        let doc = body(r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>Q&amp;A</w:t></w:r></w:p></w:body></w:document>"#);
        assert_eq!(doc.text, "Q&A\n");
    }

    #[test]
    fn test_not_a_zip() {
        assert!(DocxExtractor.parse(b"PK but not really").is_none());
    }
}
