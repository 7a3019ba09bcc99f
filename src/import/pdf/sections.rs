//! PDF section detection.
//!
//! Two tiers: the document outline when there is one, otherwise headings
//! inferred from font sizes. Positions are `(page, word offset on page)`
//! pairs over the cleaned word stream and become global word indices only at
//! the end.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::config::PdfHeadingConfig;
use crate::model::NavigationKind;
use crate::navigation::Anchor;

/// One line of page text with the largest font size used on it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
        }
    }
}

/// A flattened outline (bookmark) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub title: String,
    /// Zero-based page the entry points at.
    pub page_index: usize,
    pub level: usize,
}

const ANCHOR_KEYWORDS: &[&str] = &[
    "abstract",
    "introduction",
    "background",
    "related work",
    "method",
    "methods",
    "results",
    "discussion",
    "conclusion",
    "conclusions",
    "references",
];

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+(?:\s*[,\-–]\s*\d+)*\]").expect("valid regex"));

static LEADING_NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:[ivxlc]+|\d+(?:\.\d+)*)[.):]?\s+)?").expect("valid regex")
});

/// Strip bracketed numeric citations, then drop words containing digits.
pub fn clean_words(line: &str) -> Vec<String> {
    CITATION
        .replace_all(line, " ")
        .split_whitespace()
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// Lowercased line without leading section numbering or trailing
/// punctuation, e.g. "2. Related Work:" → "related work".
pub fn normalize_heading(line: &str) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let stripped = LEADING_NUMBERING.replace(&collapsed, "");
    stripped
        .trim_end_matches(|c: char| c == '.' || c == ':' || c.is_whitespace())
        .to_string()
}

pub fn is_anchor_keyword(line: &str) -> bool {
    ANCHOR_KEYWORDS.contains(&normalize_heading(line).as_str())
}

/// First letter uppercase and at least half of the longer words capitalised.
pub fn is_title_like(line: &str) -> bool {
    let text = LEADING_NUMBERING.replace(line.trim(), "");
    let Some(first) = text.chars().find(|c| c.is_alphabetic()) else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    let long: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() > 3)
        .collect();
    let capitalised = long
        .iter()
        .filter(|w| w.chars().find(|c| c.is_alphabetic()).is_some_and(char::is_uppercase))
        .count();
    capitalised * 2 >= long.len()
}

/// A page's lines after cleaning, with each line's first word offset.
#[derive(Debug, Clone, Default)]
pub struct CleanPage {
    pub lines: Vec<CleanLine>,
    pub word_count: usize,
}

#[derive(Debug, Clone)]
pub struct CleanLine {
    /// Source line with whitespace collapsed.
    pub raw: String,
    pub words: Vec<String>,
    pub font_size: f32,
    pub offset: usize,
}

impl CleanLine {
    fn raw_word_count(&self) -> usize {
        self.raw.split_whitespace().count()
    }
}

impl CleanPage {
    pub fn new(lines: &[TextLine]) -> Self {
        let mut page = Self::default();
        for line in lines {
            let raw = line.text.split_whitespace().collect::<Vec<_>>().join(" ");
            if raw.is_empty() {
                continue;
            }
            let words = clean_words(&raw);
            let offset = page.word_count;
            page.word_count += words.len();
            page.lines.push(CleanLine {
                raw,
                words,
                font_size: line.font_size,
                offset,
            });
        }
        page
    }

    /// Cleaned page text, one line per source line that kept any words.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !l.words.is_empty())
            .map(|l| l.words.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A section located on a page, before global indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMark {
    pub title: String,
    pub page: usize,
    pub offset: usize,
    /// Whether `offset` is trusted rather than a page-start placeholder.
    pub refined: bool,
}

pub struct SectionDetector<'a> {
    config: &'a PdfHeadingConfig,
}

impl<'a> SectionDetector<'a> {
    pub fn new(config: &'a PdfHeadingConfig) -> Self {
        Self { config }
    }

    /// Sections sorted by `(page, offset)`.
    pub fn detect(&self, pages: &[CleanPage], outline: &[OutlineEntry]) -> Vec<SectionMark> {
        let mut marks = if outline.is_empty() {
            self.from_font_sizes(pages)
        } else {
            let mut marks = self.from_outline(pages, outline);
            self.refine(pages, &mut marks);
            marks
        };
        self.insert_abstract(pages, &mut marks);
        marks.sort_by_key(|m| (m.page, m.offset));
        marks
    }

    fn from_outline(&self, pages: &[CleanPage], outline: &[OutlineEntry]) -> Vec<SectionMark> {
        outline
            .iter()
            .filter(|entry| entry.page_index < pages.len() && !entry.title.trim().is_empty())
            .map(|entry| SectionMark {
                title: entry.title.split_whitespace().collect::<Vec<_>>().join(" "),
                page: entry.page_index,
                offset: 0,
                refined: false,
            })
            .collect()
    }

    /// Move outline sections from the top of their page to the line that
    /// carries their title.
    fn refine(&self, pages: &[CleanPage], marks: &mut [SectionMark]) {
        for mark in marks.iter_mut().filter(|m| !m.refined && m.offset == 0) {
            let title = mark.title.to_lowercase();
            let contained = format!(" {title}");
            let found = pages[mark.page].lines.iter().find(|line| {
                let text = line.raw.to_lowercase();
                line.raw_word_count() <= self.config.refine_max_words
                    && (text.starts_with(&title) || text.contains(&contained))
            });
            if let Some(line) = found {
                mark.offset = line.offset;
                mark.refined = true;
            }
        }
    }

    fn is_anchor_line(&self, line: &CleanLine) -> bool {
        line.font_size > 0.0
            && line.raw_word_count() <= self.config.max_anchor_words
            && is_anchor_keyword(&line.raw)
    }

    /// The font size of the first anchor-keyword line on the early pages.
    pub fn learn_heading_size(&self, pages: &[CleanPage]) -> Option<f32> {
        pages
            .iter()
            .take(self.config.learning_pages)
            .flat_map(|page| &page.lines)
            .find(|line| self.is_anchor_line(line))
            .map(|line| line.font_size)
    }

    /// Lines are judged in reading order: the loose size rule applies until
    /// an anchor keyword line fixes the heading size.
    fn from_font_sizes(&self, pages: &[CleanPage]) -> Vec<SectionMark> {
        let mut learned = None;
        let mut marks = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            for line in &page.lines {
                if learned.is_none() && page_index < self.config.learning_pages && self.is_anchor_line(line) {
                    learned = Some(line.font_size);
                    debug!("pdf: learned heading size {} on page {}", line.font_size, page_index + 1);
                }
                if self.is_heading(line, learned) {
                    marks.push(SectionMark {
                        title: line.raw.clone(),
                        page: page_index,
                        offset: line.offset,
                        refined: true,
                    });
                }
            }
        }
        marks
    }

    fn is_heading(&self, line: &CleanLine, learned: Option<f32>) -> bool {
        let words = line.raw_word_count();
        match learned {
            Some(size) => {
                words <= self.config.max_heading_words
                    && !line.raw.ends_with('.')
                    && (line.font_size - size).abs() <= self.config.size_tolerance
                    && is_title_like(&line.raw)
            }
            None => line.font_size > self.config.fallback_min_size && words <= self.config.fallback_max_words,
        }
    }

    fn insert_abstract(&self, pages: &[CleanPage], marks: &mut Vec<SectionMark>) {
        if marks.iter().any(|m| normalize_heading(&m.title) == "abstract") {
            return;
        }
        let found = pages
            .iter()
            .take(self.config.abstract_pages)
            .enumerate()
            .find_map(|(page_index, page)| {
                page.lines
                    .iter()
                    .find(|line| {
                        let text = line.raw.to_lowercase();
                        text == "abstract" || text.starts_with("abstract.")
                    })
                    .map(|line| (page_index, line.offset))
            });
        if let Some((page, offset)) = found {
            marks.push(SectionMark {
                title: "Abstract".to_string(),
                page,
                offset,
                refined: true,
            });
        }
    }
}

/// Global anchors: words of all prior pages plus the offset on the page.
pub fn section_anchors(marks: Vec<SectionMark>, pages: &[CleanPage]) -> Vec<Anchor> {
    let mut page_starts = Vec::with_capacity(pages.len());
    let mut total = 0;
    for page in pages {
        page_starts.push(total);
        total += page.word_count;
    }

    marks
        .into_iter()
        .filter_map(|mark| {
            let start = page_starts.get(mark.page)? + mark.offset;
            Some(Anchor::new(mark.title, start, NavigationKind::Section))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavigationBuilder;

    fn page(lines: &[(&str, f32)]) -> CleanPage {
        let lines: Vec<_> = lines.iter().map(|(t, s)| TextLine::new(*t, *s)).collect();
        CleanPage::new(&lines)
    }

    #[test]
    fn test_clean_words() {
        assert_eq!(
            clean_words("as shown [12] and [1, 2] or [1-3] in 2019 by Smith2"),
            vec!["as", "shown", "and", "or", "in", "by"]
        );
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading("2. Related Work:"), "related work");
        assert_eq!(normalize_heading("IV. RESULTS"), "results");
        assert_eq!(normalize_heading("1.2 Methods"), "methods");
        assert_eq!(normalize_heading("Introduction"), "introduction");
        assert!(is_anchor_keyword("I INTRODUCTION"));
        assert!(!is_anchor_keyword("Introduction to the topic"));
    }

    #[test]
    fn test_title_like() {
        assert!(is_title_like("Experimental Setup"));
        assert!(is_title_like("3 Related work"));
        assert!(!is_title_like("the results show that this works"));
        assert!(!is_title_like("The results show that"));
        assert!(!is_title_like("1234"));
    }

    #[test]
    fn test_clean_page_offsets() {
        let page = page(&[("Title line", 20.0), ("has 42 numbers [3]", 10.0), ("", 10.0), ("end", 10.0)]);
        assert_eq!(page.word_count, 5);
        let offsets: Vec<_> = page.lines.iter().map(|l| l.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(page.text(), "Title line\nhas numbers\nend");
    }

    #[test]
    fn test_font_learning() {
        let config = PdfHeadingConfig::default();
        let pages = vec![
            page(&[
                ("A Paper Title", 20.0),
                ("Introduction", 12.0),
                ("Body text goes here.", 10.0),
                ("Experimental Setup", 12.2),
                ("more body words in a sentence", 10.0),
                ("a lowercase line", 12.0),
                ("Ends With A Period.", 12.0),
            ]),
            page(&[("Conclusion", 12.0), ("final words", 10.0)]),
        ];
        let detector = SectionDetector::new(&config);
        assert_eq!(detector.learn_heading_size(&pages), Some(12.0));

        let marks = detector.detect(&pages, &[]);
        let found: Vec<_> = marks.iter().map(|m| (m.title.as_str(), m.page, m.offset)).collect();
        assert_eq!(
            found,
            vec![
                ("A Paper Title", 0, 0),
                ("Introduction", 0, 3),
                ("Experimental Setup", 0, 8),
                ("Conclusion", 1, 0)
            ]
        );
    }

    #[test]
    fn test_title_before_anchor_uses_loose_rule() {
        let config = PdfHeadingConfig::default();
        let pages = vec![page(&[
            ("A Big Paper Title", 20.0),
            ("author names", 10.0),
            ("Introduction", 12.0),
            ("Body text follows here.", 10.0),
            ("Another Large Line", 20.0),
        ])];
        let marks = SectionDetector::new(&config).detect(&pages, &[]);
        let titles: Vec<_> = marks.iter().map(|m| m.title.as_str()).collect();
        // Once the size is learned, 20pt lines no longer qualify.
        assert_eq!(titles, vec!["A Big Paper Title", "Introduction"]);
    }

    #[test]
    fn test_fallback_before_learning() {
        let config = PdfHeadingConfig::default();
        let pages = vec![page(&[("Big Heading", 18.0), ("body", 10.0), ("Another Big One", 16.0), ("x", 10.0)])];
        let marks = SectionDetector::new(&config).detect(&pages, &[]);
        let titles: Vec<_> = marks.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Big Heading", "Another Big One"]);
    }

    #[test]
    fn test_outline_refinement() {
        let config = PdfHeadingConfig::default();
        let pages = vec![
            page(&[("Front matter words", 10.0)]),
            page(&[("end of previous section", 10.0), ("2 Methods", 14.0), ("method body", 10.0)]),
            page(&[("nothing titled here", 10.0)]),
        ];
        let outline = vec![
            OutlineEntry { title: "Methods".into(), page_index: 1, level: 1 },
            OutlineEntry { title: "Appendix".into(), page_index: 2, level: 1 },
            OutlineEntry { title: "Beyond".into(), page_index: 9, level: 1 },
        ];
        let marks = SectionDetector::new(&config).detect(&pages, &outline);
        assert_eq!(marks.len(), 2);
        assert_eq!((marks[0].page, marks[0].offset, marks[0].refined), (1, 4, true));
        assert_eq!((marks[1].page, marks[1].offset, marks[1].refined), (2, 0, false));

        let anchors = section_anchors(marks, &pages);
        assert_eq!(anchors[0].word_index, 3 + 4);
        assert_eq!(anchors[1].word_index, 3 + 7);
    }

    #[test]
    fn test_implicit_abstract() {
        let config = PdfHeadingConfig::default();
        let pages = vec![page(&[("Some Title", 10.0), ("Abstract. We study things", 10.0), ("more", 10.0)])];
        let outline = vec![OutlineEntry { title: "Some Title".into(), page_index: 0, level: 1 }];
        let marks = SectionDetector::new(&config).detect(&pages, &outline);
        let titles: Vec<_> = marks.iter().map(|m| (m.title.as_str(), m.offset)).collect();
        assert_eq!(titles, vec![("Some Title", 0), ("Abstract", 2)]);
    }

    #[test]
    fn test_anchors_become_spans() {
        let config = PdfHeadingConfig::default();
        let pages = vec![
            page(&[("Introduction", 14.0), ("one two three", 10.0)]),
            page(&[("Results", 14.0), ("four five", 10.0)]),
        ];
        let marks = SectionDetector::new(&config).detect(&pages, &[]);
        let anchors = section_anchors(marks, &pages);
        let total: usize = pages.iter().map(|p| p.word_count).sum();
        let points = NavigationBuilder::from_anchors(anchors, total);
        let spans: Vec<_> = points.iter().map(|p| (p.word_start_index, p.word_end_index)).collect();
        assert_eq!(spans, vec![(0, 4), (4, 7)]);
    }
}
