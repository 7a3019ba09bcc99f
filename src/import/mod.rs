//! Format extractors and the document parser facade.
//!
//! Every extractor turns raw bytes into a [`ParseResult`]. The
//! [`DocumentParser`] picks the extractor by file extension, applies the
//! navigation fallback policy (native structure, then heading detection, then
//! fixed-size pages), and absorbs failures into `None`.

mod archive;
mod docx;
mod epub;
mod html;
pub mod pdf;
mod rtf;
mod txt;

pub use archive::{Archive, parent_dir, resolve_href};
pub use docx::DocxExtractor;
pub use epub::EpubExtractor;
pub use html::HtmlExtractor;
pub use pdf::PdfExtractor;
pub use rtf::RtfExtractor;
pub use txt::TxtExtractor;

use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::model::ParseResult;
use crate::navigation::NavigationBuilder;
use crate::text::count_words;

use pdf::TextRecognizer;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Txt,
    Rtf,
    Html,
    Docx,
    Epub,
    Pdf,
}

impl Format {
    /// Format for a file extension, compared case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" | "markdown" => Some(Self::Txt),
            "rtf" => Some(Self::Rtf),
            "html" | "htm" | "xhtml" => Some(Self::Html),
            "docx" => Some(Self::Docx),
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether line heuristics run when the extractor found no structure.
    fn detects_headings(self) -> bool {
        matches!(self, Self::Txt | Self::Rtf | Self::Html)
    }
}

/// Converts one document format into text plus native navigation.
pub trait Extractor {
    /// Extract text and any structure the format itself carries.
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult>;

    /// [`extract`](Self::extract), with failures and empty text logged and
    /// reported as `None`.
    fn parse(&self, bytes: &[u8]) -> Option<ParseResult> {
        match self.extract(bytes) {
            Ok(result) if count_words(&result.text) > 0 => Some(result),
            Ok(_) => {
                warn!("extraction produced no text");
                None
            }
            Err(e) => {
                warn!("extraction failed: {e}");
                None
            }
        }
    }
}

/// Raw content handed over by a share/ingestion surface.
#[derive(Debug, Clone)]
pub enum SharedContent {
    Html(String),
    Text(String),
}

/// Dispatches by format and applies the navigation fallback policy.
pub struct DocumentParser {
    navigation: NavigationBuilder,
    pdf: PdfExtractor,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new(&ReaderConfig::default())
    }
}

impl DocumentParser {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            navigation: NavigationBuilder::from_config(&config.parser),
            pdf: PdfExtractor::new(config.pdf.clone()),
        }
    }

    /// Use `recognizer` for PDF pages without a text layer.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.pdf = self.pdf.with_recognizer(recognizer);
        self
    }

    /// Read and parse a file, choosing the extractor by extension.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Option<ParseResult> {
        let path = path.as_ref();
        self.extract_file(path)
            .inspect_err(|e| warn!("{}: {e}", path.display()))
            .ok()
    }

    /// Like [`parse_file`](Self::parse_file) but keeps the failure reason.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<ParseResult> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        let bytes = std::fs::read(path)?;
        info!("parsing {} ({} bytes, {format:?})", path.display(), bytes.len());
        self.extract(&bytes, format)
    }

    /// Parse bytes whose format is given by `file_name`'s extension.
    pub fn parse_named(&self, bytes: &[u8], file_name: &str) -> Option<ParseResult> {
        match Format::from_path(file_name) {
            Some(format) => self.parse_bytes(bytes, format),
            None => {
                warn!("unsupported file type: {file_name}");
                None
            }
        }
    }

    pub fn parse_bytes(&self, bytes: &[u8], format: Format) -> Option<ParseResult> {
        self.extract(bytes, format)
            .inspect_err(|e| warn!("{format:?} extraction failed: {e}"))
            .ok()
    }

    /// Like [`parse_bytes`](Self::parse_bytes) but keeps the failure reason.
    pub fn extract(&self, bytes: &[u8], format: Format) -> Result<ParseResult> {
        let result = match format {
            Format::Txt => TxtExtractor.extract(bytes),
            Format::Rtf => RtfExtractor.extract(bytes),
            Format::Html => HtmlExtractor.extract(bytes),
            Format::Docx => DocxExtractor.extract(bytes),
            Format::Epub => EpubExtractor.extract(bytes),
            Format::Pdf => self.pdf.extract(bytes),
        }?;
        self.finish(result, format)
    }

    /// Ingest pasted or shared content through the same extractors as files.
    pub fn parse_shared(&self, content: SharedContent) -> Option<ParseResult> {
        self.extract_shared(content)
            .inspect_err(|e| warn!("shared content extraction failed: {e}"))
            .ok()
    }

    pub fn extract_shared(&self, content: SharedContent) -> Result<ParseResult> {
        match content {
            SharedContent::Html(html) => self.extract(html.as_bytes(), Format::Html),
            SharedContent::Text(text) => self.extract(text.as_bytes(), Format::Txt),
        }
    }

    fn finish(&self, result: ParseResult, format: Format) -> Result<ParseResult> {
        let total = count_words(&result.text);
        if total == 0 {
            return Err(Error::EmptyDocument);
        }

        let native = result.navigation_points.len();
        let navigation_points = self.navigation.resolve(
            result.navigation_points,
            &result.text,
            total,
            format.detects_headings(),
        );
        debug!(
            "{format:?}: {total} words, {native} native points, {} final points",
            navigation_points.len()
        );

        Ok(ParseResult {
            text: result.text,
            navigation_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NavigationKind;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path("book.EPUB"), Some(Format::Epub));
        assert_eq!(Format::from_path("a/b/paper.Pdf"), Some(Format::Pdf));
        assert_eq!(Format::from_path("notes.txt"), Some(Format::Txt));
        assert_eq!(Format::from_path("letter.rtf"), Some(Format::Rtf));
        assert_eq!(Format::from_path("report.docx"), Some(Format::Docx));
        assert_eq!(Format::from_path("archive.zip"), None);
        assert_eq!(Format::from_path("no_extension"), None);
    }

    #[test]
    fn test_unknown_extension_yields_none() {
        let parser = DocumentParser::default();
        assert!(parser.parse_named(b"hello", "file.xyz").is_none());
    }

    #[test]
    fn test_empty_text_is_failure() {
        let parser = DocumentParser::default();
        assert!(parser.parse_bytes(b"   \n\n ", Format::Txt).is_none());
        assert!(matches!(
            parser.extract(b"", Format::Txt),
            Err(Error::EmptyDocument)
        ));
    }

    #[test]
    fn test_txt_page_fallback() {
        let text = vec!["word"; 600].join(" ");
        let result = DocumentParser::default()
            .parse_bytes(text.as_bytes(), Format::Txt)
            .unwrap();
        let sizes: Vec<_> = result.navigation_points.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![250, 250, 100]);
    }

    #[test]
    fn test_shared_html() {
        let parser = DocumentParser::default();
        let result = parser
            .parse_shared(SharedContent::Html(
                "<html><body><h1>Shared</h1><p>Pasted article body.</p></body></html>".into(),
            ))
            .unwrap();
        assert_eq!(result.text, "Shared Pasted article body.");
        assert_eq!(result.navigation_points.len(), 1);
        assert_eq!(result.navigation_points[0].kind, NavigationKind::Heading);
        assert_eq!(result.navigation_points[0].title, "Shared");
    }

    #[test]
    fn test_shared_text_headings() {
        let parser = DocumentParser::default();
        let result = parser
            .parse_shared(SharedContent::Text("# One\nalpha beta\n# Two\ngamma".into()))
            .unwrap();
        let titles: Vec<_> = result.navigation_points.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }
}
