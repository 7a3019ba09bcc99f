//! Turns structural anchors into word-index spans.
//!
//! Every list produced here is sorted by start, non-overlapping, and its last
//! point ends at the document's word count.

use log::debug;

use crate::model::{NavigationKind, NavigationPoint};
use crate::text::{DetectedHeading, HeadingDetector};

/// A structural marker located at a word index, before spans are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub title: String,
    pub word_index: usize,
    pub kind: NavigationKind,
    pub level: Option<u8>,
}

impl Anchor {
    pub fn new(title: impl Into<String>, word_index: usize, kind: NavigationKind) -> Self {
        Self {
            title: title.into(),
            word_index,
            kind,
            level: None,
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }
}

impl From<&DetectedHeading> for Anchor {
    fn from(heading: &DetectedHeading) -> Self {
        Anchor::new(heading.title.clone(), heading.word_index, NavigationKind::Heading)
            .with_level(heading.level)
    }
}

/// Builds navigation lists and applies the structure fallback policy.
#[derive(Debug, Clone)]
pub struct NavigationBuilder {
    words_per_page: usize,
    detector: HeadingDetector,
}

impl Default for NavigationBuilder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_WORDS_PER_PAGE)
    }
}

impl NavigationBuilder {
    pub fn new(words_per_page: usize) -> Self {
        Self {
            words_per_page: words_per_page.max(1),
            detector: HeadingDetector::default(),
        }
    }

    pub fn from_config(config: &crate::config::ParserConfig) -> Self {
        Self {
            words_per_page: config.words_per_page.max(1),
            detector: HeadingDetector::new(config.max_numbered_heading_chars),
        }
    }

    pub fn detector(&self) -> &HeadingDetector {
        &self.detector
    }

    /// Each anchor spans to the next anchor's index, the last to `total_words`.
    /// Anchors past the end and anchors sharing a start with a later one
    /// produce empty spans and are dropped.
    pub fn from_anchors(
        anchors: impl IntoIterator<Item = Anchor>,
        total_words: usize,
    ) -> Vec<NavigationPoint> {
        let mut anchors: Vec<Anchor> = anchors
            .into_iter()
            .filter(|a| a.word_index < total_words)
            .collect();
        anchors.sort_by_key(|a| a.word_index);

        let ends: Vec<usize> = anchors
            .iter()
            .skip(1)
            .map(|a| a.word_index)
            .chain(std::iter::once(total_words))
            .collect();

        let mut points = Vec::with_capacity(anchors.len());
        for (anchor, end) in anchors.into_iter().zip(ends) {
            let id = points.len() as u32;
            if let Some(point) =
                NavigationPoint::new(id, anchor.title, anchor.word_index, end, anchor.kind, anchor.level)
            {
                points.push(point);
            }
        }
        points
    }

    /// Heading spans from detected headings.
    pub fn from_headings(headings: &[DetectedHeading], total_words: usize) -> Vec<NavigationPoint> {
        Self::from_anchors(headings.iter().map(Anchor::from), total_words)
    }

    /// Fixed-size pages titled "Page N"; the last page may be shorter.
    pub fn pages(&self, total_words: usize) -> Vec<NavigationPoint> {
        (0..total_words)
            .step_by(self.words_per_page)
            .enumerate()
            .filter_map(|(i, start)| {
                let end = (start + self.words_per_page).min(total_words);
                NavigationPoint::new(
                    i as u32,
                    format!("Page {}", i + 1),
                    start,
                    end,
                    NavigationKind::Page,
                    None,
                )
            })
            .collect()
    }

    /// Headings found by the line heuristics, as spans.
    pub fn detect_headings(&self, text: &str, total_words: usize) -> Vec<NavigationPoint> {
        Self::from_headings(&self.detector.detect(text), total_words)
    }

    /// Apply the fallback policy: native structure if any, else detected
    /// headings (when `detect` is set), else pages.
    pub fn resolve(
        &self,
        native: Vec<NavigationPoint>,
        text: &str,
        total_words: usize,
        detect: bool,
    ) -> Vec<NavigationPoint> {
        if !native.is_empty() {
            return native;
        }
        if detect {
            let headings = self.detect_headings(text, total_words);
            if !headings.is_empty() {
                debug!("navigation: {} detected headings", headings.len());
                return headings;
            }
        }
        debug!("navigation: falling back to {}-word pages", self.words_per_page);
        self.pages(total_words)
    }
}

/// Whether `points` are sorted, non-overlapping, non-empty spans ending at
/// `total_words`.
pub fn is_well_formed(points: &[NavigationPoint], total_words: usize) -> bool {
    if points.is_empty() {
        return true;
    }
    let ordered = points.iter().all(|p| p.word_start_index < p.word_end_index)
        && points
            .windows(2)
            .all(|w| w[0].word_end_index <= w[1].word_start_index);
    ordered && points.last().map(|p| p.word_end_index) == Some(total_words)
}

/// The point containing `index`, or the last point starting before it.
pub fn point_at(points: &[NavigationPoint], index: usize) -> Option<usize> {
    let after = points.partition_point(|p| p.word_start_index <= index);
    after.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pages_600_words() {
        let pages = NavigationBuilder::default().pages(600);
        assert_eq!(
            pages.iter().map(|p| p.len()).collect::<Vec<_>>(),
            vec![250, 250, 100]
        );
        assert_eq!(pages[2].title, "Page 3");
        assert!(pages.iter().all(|p| p.kind == NavigationKind::Page));
        assert!(is_well_formed(&pages, 600));
    }

    #[test]
    fn test_pages_empty_document() {
        assert!(NavigationBuilder::default().pages(0).is_empty());
    }

    #[test]
    fn test_from_anchors_drops_empty_spans() {
        let anchors = vec![
            Anchor::new("b", 5, NavigationKind::Section),
            Anchor::new("a", 0, NavigationKind::Section),
            Anchor::new("dup", 5, NavigationKind::Section),
            Anchor::new("past", 50, NavigationKind::Section),
        ];
        let points = NavigationBuilder::from_anchors(anchors, 10);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].title, "a");
        assert_eq!((points[0].word_start_index, points[0].word_end_index), (0, 5));
        assert_eq!(points[1].title, "dup");
        assert_eq!((points[1].word_start_index, points[1].word_end_index), (5, 10));
        assert_eq!(points[1].id, 1);
    }

    #[test]
    fn test_resolve_prefers_native() {
        let builder = NavigationBuilder::default();
        let native = NavigationBuilder::from_anchors(
            vec![Anchor::new("Chapter 1", 0, NavigationKind::Chapter)],
            3,
        );
        let resolved = builder.resolve(native.clone(), "# ignored\nx y", 3, true);
        assert_eq!(resolved, native);
    }

    #[test]
    fn test_resolve_detects_then_pages() {
        let builder = NavigationBuilder::new(2);
        let with_heading = builder.resolve(Vec::new(), "# Start\none two", 4, true);
        assert_eq!(with_heading.len(), 1);
        assert_eq!(with_heading[0].kind, NavigationKind::Heading);
        assert_eq!(with_heading[0].level, Some(1));

        let pages = builder.resolve(Vec::new(), "# Start\none two", 4, false);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].kind, NavigationKind::Page);
    }

    #[test]
    fn test_point_at() {
        let points = NavigationBuilder::new(10).pages(25);
        assert_eq!(point_at(&points, 0), Some(0));
        assert_eq!(point_at(&points, 9), Some(0));
        assert_eq!(point_at(&points, 10), Some(1));
        assert_eq!(point_at(&points, 24), Some(2));

        let late = NavigationBuilder::from_anchors(
            vec![Anchor::new("late", 5, NavigationKind::Heading)],
            10,
        );
        assert_eq!(point_at(&late, 2), None);
    }

    proptest! {
        #[test]
        fn prop_anchor_spans_cover_to_end(
            starts in prop::collection::vec(0usize..500, 0..30),
            total in 1usize..600,
        ) {
            let anchors = starts
                .iter()
                .map(|&s| Anchor::new(format!("s{s}"), s, NavigationKind::Section));
            let points = NavigationBuilder::from_anchors(anchors, total);
            prop_assert!(is_well_formed(&points, total));
        }

        #[test]
        fn prop_pages_cover_document(total in 0usize..5000, size in 1usize..400) {
            let pages = NavigationBuilder::new(size).pages(total);
            prop_assert!(is_well_formed(&pages, total));
            prop_assert_eq!(pages.iter().map(|p| p.len()).sum::<usize>(), total);
        }
    }
}
