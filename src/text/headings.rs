//! Line-based heading heuristics for plain text.
//!
//! Rules, checked in order per line (first match wins):
//! 1. Markdown `#`..`######` followed by text
//! 2. ALL-CAPS lines of 3..=60 chars with at least two words
//! 3. Numbered or labeled lines (`Chapter 3`, `Part IV`, `1.`, `1.2`, `1.2.3`, `IV.`)

use std::sync::LazyLock;

use regex::Regex;

use super::{count_words, title_case};

static MARKDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(\S.*)$").expect("valid regex"));

/// Numbered patterns with their heading level, in priority order.
static NUMBERED: LazyLock<Vec<(Regex, u8)>> = LazyLock::new(|| {
    [
        (r"^Chapter\s+\d+", 1),
        (r"^Part\s+[IVX\d]+\b", 1),
        (r"^\d+\.\s", 1),
        (r"^\d+\.\d+\s", 2),
        (r"^\d+\.\d+\.\d+\s", 3),
        (r"^[IVX]+\.\s", 1),
    ]
    .into_iter()
    .map(|(pattern, level)| (Regex::new(pattern).expect("valid regex"), level))
    .collect()
});

const CAPS_MIN_CHARS: usize = 3;
const CAPS_MAX_CHARS: usize = 60;
const CAPS_MIN_LETTERS: usize = 3;

/// A heading found in text, anchored to the word index where its line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedHeading {
    pub title: String,
    pub level: u8,
    pub line_index: usize,
    pub word_index: usize,
}

/// Finds headings line by line.
#[derive(Debug, Clone)]
pub struct HeadingDetector {
    max_numbered_chars: usize,
}

impl Default for HeadingDetector {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_NUMBERED_HEADING_CHARS)
    }
}

impl HeadingDetector {
    /// `max_numbered_chars` optionally bounds rule 3 so numbered list
    /// paragraphs are not mistaken for headings. The default is unbounded.
    pub fn new(max_numbered_chars: usize) -> Self {
        Self { max_numbered_chars }
    }

    /// Detect headings in `text`. Each heading's `word_index` is the number of
    /// words on all preceding lines.
    pub fn detect(&self, text: &str) -> Vec<DetectedHeading> {
        let mut headings = Vec::new();
        let mut word_index = 0;

        for (line_index, line) in text.lines().enumerate() {
            if let Some((title, level)) = self.classify(line.trim()) {
                headings.push(DetectedHeading {
                    title,
                    level,
                    line_index,
                    word_index,
                });
            }
            word_index += count_words(line);
        }

        headings
    }

    /// Classify one trimmed line, returning the display title and level.
    pub fn classify(&self, line: &str) -> Option<(String, u8)> {
        if line.is_empty() {
            return None;
        }

        if let Some(caps) = MARKDOWN.captures(line) {
            let level = caps[1].len() as u8;
            let title = caps[2].trim_end_matches('#').trim();
            if !title.is_empty() {
                return Some((title.to_string(), level));
            }
        }

        if is_all_caps_heading(line) {
            return Some((title_case(line), 1));
        }

        if line.chars().count() <= self.max_numbered_chars {
            for (pattern, level) in NUMBERED.iter() {
                if pattern.is_match(line) {
                    return Some((line.to_string(), *level));
                }
            }
        }

        None
    }
}

fn is_all_caps_heading(line: &str) -> bool {
    let len = line.chars().count();
    if !(CAPS_MIN_CHARS..=CAPS_MAX_CHARS).contains(&len) {
        return false;
    }
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    if letters < CAPS_MIN_LETTERS {
        return false;
    }
    if line.chars().any(char::is_lowercase) {
        return false;
    }
    line.split(' ').filter(|w| !w.is_empty()).count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Option<(String, u8)> {
        HeadingDetector::default().classify(line)
    }

    #[test]
    fn test_markdown_levels() {
        assert_eq!(classify("# Intro"), Some(("Intro".to_string(), 1)));
        assert_eq!(classify("### Deep ###"), Some(("Deep".to_string(), 3)));
        assert_eq!(classify("###### Six"), Some(("Six".to_string(), 6)));
        assert_eq!(classify("####### Seven"), None);
        assert_eq!(classify("#hashtag"), None);
        assert_eq!(classify("#"), None);
    }

    #[test]
    fn test_all_caps() {
        assert_eq!(
            classify("THE SECOND PART"),
            Some(("The Second Part".to_string(), 1))
        );
        // Single word is not enough
        assert_eq!(classify("WARNING"), None);
        // Mixed case
        assert_eq!(classify("The SECOND PART"), None);
        // Too few letters
        assert_eq!(classify("A 1 B"), None);
    }

    #[test]
    fn test_numbered_patterns() {
        assert_eq!(classify("Chapter 12"), Some(("Chapter 12".to_string(), 1)));
        assert_eq!(classify("Part IV: Ends"), Some(("Part IV: Ends".to_string(), 1)));
        assert_eq!(classify("3. Methods"), Some(("3. Methods".to_string(), 1)));
        assert_eq!(classify("3.1 Setup"), Some(("3.1 Setup".to_string(), 2)));
        assert_eq!(classify("3.1.4 Detail"), Some(("3.1.4 Detail".to_string(), 3)));
        assert_eq!(classify("IV. Results"), Some(("IV. Results".to_string(), 1)));
        assert_eq!(classify("3.14 is pi"), Some(("3.14 is pi".to_string(), 2)));
        assert_eq!(classify("Plain sentence here."), None);
    }

    #[test]
    fn test_long_numbered_line_needs_explicit_bound() {
        let line = format!("1. {}", "word ".repeat(40));
        let line = line.trim();
        assert_eq!(classify(line).map(|(_, level)| level), Some(1));
        assert_eq!(HeadingDetector::new(80).classify(line), None);
        assert!(HeadingDetector::new(80).classify("1. Short").is_some());
    }

    #[test]
    fn test_detect_word_indices() {
        let text = "# Title\nsome body words here\n\n## Next part\nmore words";
        let headings = HeadingDetector::default().detect(text);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].word_index, 0);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].title, "Next part");
        assert_eq!(headings[1].word_index, 6);
        assert_eq!(headings[1].line_index, 3);
    }

    #[test]
    fn test_no_headings_in_prose() {
        let text = "It was a bright cold day in April.\nThe clocks were striking thirteen.";
        assert!(HeadingDetector::default().detect(text).is_empty());
    }
}
