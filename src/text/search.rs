//! Substring search over a word sequence.

use crate::model::SearchResult;

/// Words of context shown on each side of a hit.
pub const CONTEXT_RADIUS: usize = 4;

const ELLIPSIS: &str = "...";

/// Search results plus a cyclic cursor.
#[derive(Debug, Clone, Default)]
pub struct WordSearch {
    query: String,
    results: Vec<SearchResult>,
    current: Option<usize>,
}

impl WordSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `query` against `words`, replacing previous results. The current
    /// result becomes the one closest to `near_index`.
    pub fn run(&mut self, query: &str, words: &[String], case_sensitive: bool, near_index: usize) {
        self.query = query.to_string();
        self.results = search(query, words, case_sensitive);
        self.current = nearest_result(&self.results, near_index);
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.current = None;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&SearchResult> {
        self.current.and_then(|i| self.results.get(i))
    }

    /// Advance to the next result, wrapping to the first after the last.
    pub fn next(&mut self) -> Option<&SearchResult> {
        let len = self.results.len();
        if len == 0 {
            return None;
        }
        let next = self.current.map_or(0, |i| (i + 1) % len);
        self.current = Some(next);
        self.results.get(next)
    }

    /// Step back to the previous result, wrapping to the last before the first.
    pub fn previous(&mut self) -> Option<&SearchResult> {
        let len = self.results.len();
        if len == 0 {
            return None;
        }
        let prev = self
            .current
            .map_or(len - 1, |i| if i == 0 { len - 1 } else { i - 1 });
        self.current = Some(prev);
        self.results.get(prev)
    }
}

/// Every word containing `query`, in document order.
///
/// Matching is per word and by substring: `"foo"` finds `"Foobar"` when
/// `case_sensitive` is false. An empty query finds nothing.
pub fn search(query: &str, words: &[String], case_sensitive: bool) -> Vec<SearchResult> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let needle = if case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };

    words
        .iter()
        .enumerate()
        .filter(|(_, word)| {
            if case_sensitive {
                word.contains(&needle)
            } else {
                word.to_lowercase().contains(&needle)
            }
        })
        .enumerate()
        .map(|(id, (word_index, _))| SearchResult {
            id,
            word_index,
            context_snippet: context_snippet(words, word_index),
        })
        .collect()
}

/// Up to [`CONTEXT_RADIUS`] words on each side of `index`, with ellipses
/// where the snippet was cut short of the document boundary.
pub fn context_snippet(words: &[String], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(words.len());

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
        snippet.push(' ');
    }
    snippet.push_str(&words[start..end].join(" "));
    if end < words.len() {
        snippet.push(' ');
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Position in `results` whose word index is closest to `index`; ties go to
/// the earlier result.
pub fn nearest_result(results: &[SearchResult], index: usize) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.word_index.abs_diff(index))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tokenize;

    fn words(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn test_case_insensitive_substring() {
        let words = words("the Foobar is here and foo too");
        let results = search("foo", &words, false);
        assert_eq!(
            results.iter().map(|r| r.word_index).collect::<Vec<_>>(),
            vec![1, 5]
        );

        let strict = search("foo", &words, true);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].word_index, 5);
    }

    #[test]
    fn test_empty_query() {
        assert!(search("  ", &words("a b c"), false).is_empty());
    }

    #[test]
    fn test_context_snippet_ellipses() {
        let words = words("w0 w1 w2 w3 w4 w5 w6 w7 w8 w9 w10 w11");
        assert_eq!(context_snippet(&words, 0), "w0 w1 w2 w3 w4 ...");
        assert_eq!(
            context_snippet(&words, 6),
            "... w2 w3 w4 w5 w6 w7 w8 w9 w10 ..."
        );
        assert_eq!(context_snippet(&words, 11), "... w7 w8 w9 w10 w11");

        let short = tokenize("only three words");
        assert_eq!(context_snippet(&short, 1), "only three words");
    }

    #[test]
    fn test_nearest_result() {
        let words = words("x a x a x x x x x a");
        let results = search("a", &words, false);
        assert_eq!(nearest_result(&results, 0), Some(0));
        assert_eq!(nearest_result(&results, 7), Some(2));
        assert_eq!(nearest_result(&[], 7), None);
    }

    #[test]
    fn test_cyclic_navigation() {
        let words = words("a b a b a");
        let mut search = WordSearch::new();
        search.run("a", &words, false, 0);
        assert_eq!(search.current().unwrap().word_index, 0);

        let start = search.current_index();
        for _ in 0..search.results().len() {
            search.next();
        }
        assert_eq!(search.current_index(), start);

        assert_eq!(search.previous().unwrap().word_index, 4);
        assert_eq!(search.next().unwrap().word_index, 0);
    }
}
