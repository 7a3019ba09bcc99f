//! The record handed to whatever persists a reader's library.

use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_WPM;
use crate::engine::clamp_wpm;
use crate::model::{NavigationPoint, ParseResult};
use crate::text::count_words;

/// An imported document with its reading progress.
///
/// `total_words` is fixed when the record is created. Progress fields change
/// only through [`apply_checkpoint`](Self::apply_checkpoint); new content
/// means a new record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadingDocument {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub navigation_points: Vec<NavigationPoint>,
    pub current_word_index: usize,
    pub total_words: usize,
    pub words_per_minute: u32,
    pub date_added: DateTime<Utc>,
    pub last_read_date: Option<DateTime<Utc>>,
}

impl ReadingDocument {
    pub fn from_parse_result(name: impl Into<String>, result: ParseResult) -> Self {
        let total_words = count_words(&result.text);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: result.text,
            navigation_points: result.navigation_points,
            current_word_index: 0,
            total_words,
            words_per_minute: DEFAULT_WPM,
            date_added: Utc::now(),
            last_read_date: None,
        }
    }

    /// Name shown for a document imported from `path`: the file stem.
    pub fn name_for_path(path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string())
    }

    pub fn with_words_per_minute(mut self, wpm: u32) -> Self {
        self.words_per_minute = clamp_wpm(wpm);
        self
    }

    /// Record progress reported by the playback engine.
    pub fn apply_checkpoint(&mut self, index: usize, wpm: u32) {
        self.apply_checkpoint_at(index, wpm, Utc::now());
    }

    pub fn apply_checkpoint_at(&mut self, index: usize, wpm: u32, at: DateTime<Utc>) {
        self.current_word_index = index.min(self.total_words.saturating_sub(1));
        self.words_per_minute = clamp_wpm(wpm);
        self.last_read_date = Some(at);
    }

    /// Percentage read, counting the current word.
    pub fn progress(&self) -> f64 {
        if self.total_words == 0 {
            return 0.0;
        }
        (self.current_word_index + 1) as f64 / self.total_words as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn document() -> ReadingDocument {
        ReadingDocument::from_parse_result("notes", ParseResult::text_only("one two three four"))
    }

    #[test]
    fn test_from_parse_result() {
        let doc = document();
        assert_eq!(doc.total_words, 4);
        assert_eq!(doc.current_word_index, 0);
        assert_eq!(doc.words_per_minute, DEFAULT_WPM);
        assert!(doc.last_read_date.is_none());
        assert_ne!(doc.id, document().id);
    }

    #[test]
    fn test_apply_checkpoint() {
        let mut doc = document();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        doc.apply_checkpoint_at(2, 450, at);
        assert_eq!(doc.current_word_index, 2);
        assert_eq!(doc.words_per_minute, 450);
        assert_eq!(doc.last_read_date, Some(at));
        assert!((doc.progress() - 75.0).abs() < 1e-9);

        doc.apply_checkpoint(99, 5000);
        assert_eq!(doc.current_word_index, 3);
        assert_eq!(doc.words_per_minute, 1500);
    }

    #[test]
    fn test_name_for_path() {
        assert_eq!(ReadingDocument::name_for_path("/books/Moby Dick.epub"), "Moby Dick");
    }
}
