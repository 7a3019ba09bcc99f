//! PDF import.
//!
//! Text is read page by page from the native text layer. Pages without one
//! are handed to an optional [`TextRecognizer`]. Sections come from the
//! outline, or from font sizes when there is no outline; see [`sections`].

mod cmap;
pub mod ocr;
pub mod sections;
mod source;

pub use cmap::{ToUnicode, decode_pdf_string};
pub use ocr::{Bounds, RecognitionError, RecognizedRegion, TextRecognizer};
pub use sections::{CleanPage, OutlineEntry, SectionDetector, SectionMark, TextLine};
pub use source::{LopdfSource, PdfSource};

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::PdfHeadingConfig;
use crate::error::Result;
use crate::model::ParseResult;
use crate::navigation::NavigationBuilder;

use super::Extractor;

const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Clone, Default)]
pub struct PdfExtractor {
    config: PdfHeadingConfig,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl PdfExtractor {
    pub fn new(config: PdfHeadingConfig) -> Self {
        Self {
            config,
            recognizer: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Extract from any [`PdfSource`]. `document` is only passed through to
    /// the recognizer.
    pub fn extract_from(&self, source: &dyn PdfSource, document: &[u8]) -> Result<ParseResult> {
        let page_count = source.page_count();
        let mut pages = Vec::with_capacity(page_count);
        let mut recognized = 0;

        for index in 0..page_count {
            let mut lines = source.page_lines(index).unwrap_or_else(|e| {
                warn!("pdf: page {} text layer unreadable: {e}", index + 1);
                Vec::new()
            });
            if lines.is_empty()
                && let Some(recognizer) = &self.recognizer
            {
                lines = self.recognize(recognizer.as_ref(), document, index);
                recognized += usize::from(!lines.is_empty());
            }
            pages.push(CleanPage::new(&lines));
        }

        let outline = source.outline();
        let marks = SectionDetector::new(&self.config).detect(&pages, &outline);
        info!(
            "pdf: {page_count} pages ({recognized} recognized), {} outline entries, {} sections",
            outline.len(),
            marks.len()
        );

        let total: usize = pages.iter().map(|p| p.word_count).sum();
        let anchors = sections::section_anchors(marks, &pages);
        let points = NavigationBuilder::from_anchors(anchors, total);

        let text = pages
            .iter()
            .map(CleanPage::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        Ok(ParseResult::new(text, points))
    }

    /// Failures are logged and leave the page empty; other pages continue.
    fn recognize(&self, recognizer: &dyn TextRecognizer, document: &[u8], index: usize) -> Vec<TextLine> {
        match recognizer.recognize(document, index) {
            Ok(regions) => {
                debug!("pdf: page {} recognized {} regions", index + 1, regions.len());
                ocr::regions_to_lines(regions, self.config.ocr_margin, self.config.ocr_min_confidence)
            }
            Err(e) => {
                warn!("pdf: page {}: {e}", index + 1);
                Vec::new()
            }
        }
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult> {
        let source = LopdfSource::load(bytes)?;
        self.extract_from(&source, bytes)
    }
}
