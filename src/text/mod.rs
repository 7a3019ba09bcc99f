//! Tokenization, pacing classification and text-level heuristics.
//!
//! - [`tokenize`] splits text into the word sequence every other component
//!   indexes into
//! - [`pause_multiplier`] stretches the display time of punctuated words
//! - [`headings`] finds headings in plain text
//! - [`html`] strips markup down to text
//! - [`search`] runs substring search over a word sequence

pub mod headings;
pub mod html;
pub mod search;

pub use headings::{DetectedHeading, HeadingDetector};
pub use html::strip_html;
pub use search::WordSearch;

use std::ops::Range;

/// Words-per-minute at which pauses use their base boost unscaled.
pub const REFERENCE_WPM: f64 = 300.0;

/// Closing punctuation skipped when looking for the terminal character.
const CLOSING_CHARS: &[char] = &['"', '\u{201D}', '\u{2019}', '\'', ')', ']', '}', '\u{201C}', '\u{2018}'];

/// Split text on Unicode whitespace, dropping empty pieces.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Count words without allocating them.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Byte range of every token in `text`, aligned with [`tokenize`].
pub fn word_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                ranges.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push(s..text.len());
    }
    ranges
}

/// Pacing class of a word's terminal punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunctuationClass {
    SentenceEnd,
    Clause,
    Dash,
    None,
}

impl PunctuationClass {
    /// Classify a word by its last meaningful character.
    pub fn of(word: &str) -> Self {
        match word.trim_end_matches(CLOSING_CHARS).chars().next_back() {
            Some('.' | '!' | '?') => Self::SentenceEnd,
            Some(',' | ';' | ':') => Self::Clause,
            Some('\u{2014}' | '\u{2013}') => Self::Dash,
            _ => Self::None,
        }
    }

    /// Extra display time at the reference speed, as a fraction of the base delay.
    pub fn base_boost(self) -> f64 {
        match self {
            Self::SentenceEnd => 0.65,
            Self::Clause => 0.50,
            Self::Dash => 0.55,
            Self::None => 0.0,
        }
    }
}

/// Display-time multiplier (≥ 1.0) for `word` at `wpm`.
///
/// The boost shrinks as speed rises: `1 + boost * clamp(300 / wpm, 0.3, 1.5)`.
pub fn pause_multiplier(word: &str, wpm: u32) -> f64 {
    let class = PunctuationClass::of(word);
    if class == PunctuationClass::None {
        return 1.0;
    }
    let speed_factor = (REFERENCE_WPM / f64::from(wpm.max(1))).clamp(0.3, 1.5);
    1.0 + class.base_boost() * speed_factor
}

/// Milliseconds `word` stays on screen at `wpm`.
pub fn word_delay_ms(word: &str, wpm: u32) -> f64 {
    60_000.0 / f64::from(wpm.max(1)) * pause_multiplier(word, wpm)
}

/// Upper-case the first letter of each word and lower-case the rest.
pub fn title_case(line: &str) -> String {
    line.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
