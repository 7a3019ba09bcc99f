//! Format-agnostic data model shared by extractors, navigation, search and
//! playback.
//!
//! Every position in this model is a word index into the token sequence
//! produced by [`tokenize`](crate::text::tokenize).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Structural role of a [`NavigationPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NavigationKind {
    /// One EPUB spine item.
    Chapter,
    /// Fixed-size chunk used when no structure was detected.
    Page,
    /// Heading detected in text, DOCX styles, or Markdown markers.
    Heading,
    /// PDF outline entry or inferred PDF heading.
    Section,
}

/// A named, word-index-bounded span.
///
/// `word_start_index < word_end_index` always holds for points produced by
/// [`NavigationPoint::new`]; constructing one with an empty span yields `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigationPoint {
    pub id: u32,
    pub title: String,
    pub word_start_index: usize,
    pub word_end_index: usize,
    pub kind: NavigationKind,
    /// Hierarchy depth (1..=6), only meaningful for headings.
    pub level: Option<u8>,
}

impl NavigationPoint {
    /// Create a point, or `None` if the span would be empty.
    pub fn new(
        id: u32,
        title: impl Into<String>,
        start: usize,
        end: usize,
        kind: NavigationKind,
        level: Option<u8>,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        let level = match kind {
            NavigationKind::Heading => level.map(|l| l.clamp(1, 6)),
            _ => None,
        };
        Some(Self {
            id,
            title: title.into(),
            word_start_index: start,
            word_end_index: end,
            kind,
            level,
        })
    }

    /// Number of words covered by this point.
    pub fn len(&self) -> usize {
        self.word_end_index - self.word_start_index
    }

    /// Always false for points built through [`NavigationPoint::new`].
    pub fn is_empty(&self) -> bool {
        self.word_start_index >= self.word_end_index
    }

    /// Whether `index` falls inside `[start, end)`.
    pub fn contains(&self, index: usize) -> bool {
        (self.word_start_index..self.word_end_index).contains(&index)
    }
}

/// Output contract of every extractor.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParseResult {
    pub text: String,
    pub navigation_points: Vec<NavigationPoint>,
}

impl ParseResult {
    pub fn new(text: impl Into<String>, navigation_points: Vec<NavigationPoint>) -> Self {
        Self {
            text: text.into(),
            navigation_points,
        }
    }

    /// Text with no structure yet; the facade fills in navigation.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }
}

/// Per-word layout: a pure function of `(word, font_name, multiplier)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WordLayoutData {
    pub word: String,
    pub font_size: f32,
    /// Horizontal distance from the word's left edge to its ORP glyph center.
    pub orp_offset: f32,
}

impl WordLayoutData {
    /// Left edge of the word so the ORP lands on the fixed screen anchor.
    pub fn origin_x(&self, viewport_width: f32, anchor_ratio: f32) -> f32 {
        viewport_width * anchor_ratio - self.orp_offset
    }

    /// Index of the character the ORP sits on.
    pub fn orp_char_index(&self) -> usize {
        if self.word.chars().count() <= 1 { 0 } else { 1 }
    }
}

/// One hit of a word search.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchResult {
    pub id: usize,
    pub word_index: usize,
    pub context_snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_point_rejects_empty_span() {
        assert!(NavigationPoint::new(0, "x", 5, 5, NavigationKind::Page, None).is_none());
        assert!(NavigationPoint::new(0, "x", 6, 5, NavigationKind::Page, None).is_none());
        let point = NavigationPoint::new(0, "x", 5, 6, NavigationKind::Page, None).unwrap();
        assert_eq!(point.len(), 1);
        assert!(point.contains(5));
        assert!(!point.contains(6));
    }

    #[test]
    fn test_level_only_for_headings() {
        let page = NavigationPoint::new(0, "p", 0, 3, NavigationKind::Page, Some(2)).unwrap();
        assert_eq!(page.level, None);
        let heading = NavigationPoint::new(0, "h", 0, 3, NavigationKind::Heading, Some(9)).unwrap();
        assert_eq!(heading.level, Some(6));
    }

    #[test]
    fn test_origin_x_keeps_orp_on_anchor() {
        let layout = WordLayoutData {
            word: "reading".to_string(),
            font_size: 48.0,
            orp_offset: 30.0,
        };
        assert_eq!(layout.origin_x(1000.0, 0.38), 350.0);
        assert_eq!(layout.orp_char_index(), 1);
    }
}
