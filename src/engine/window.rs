//! Sliding window of precomputed layouts.

use std::ops::Range;

use log::trace;

use crate::model::WordLayoutData;

use super::layout::LayoutService;

/// Layouts for the words within `radius` of a center index.
///
/// Recomputation is skipped while the requested center stays within
/// `hysteresis` words of the current one, or while the requested range is
/// already covered.
#[derive(Debug, Clone)]
pub struct LayoutWindow {
    radius: usize,
    hysteresis: usize,
    center: usize,
    start: usize,
    data: Vec<WordLayoutData>,
}

impl LayoutWindow {
    pub fn new(radius: usize, hysteresis: usize) -> Self {
        Self {
            radius,
            hysteresis,
            center: 0,
            start: 0,
            data: Vec::new(),
        }
    }

    /// Indices the window would hold around `center` in a document of
    /// `total` words.
    pub fn range_around(&self, center: usize, total: usize) -> Range<usize> {
        let start = center.saturating_sub(self.radius);
        let end = center.saturating_add(self.radius).saturating_add(1).min(total);
        start.min(end)..end
    }

    /// Indices currently holding layouts.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.data.len()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn center(&self) -> usize {
        self.center
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn layouts(&self) -> &[WordLayoutData] {
        &self.data
    }

    fn covers(&self, range: &Range<usize>) -> bool {
        let held = self.range();
        held.start <= range.start && range.end <= held.end
    }

    /// Move the window to `center`. Returns whether layouts were recomputed.
    pub fn update(&mut self, center: usize, words: &[String], layout: &LayoutService) -> bool {
        let wanted = self.range_around(center, words.len());
        if !self.data.is_empty()
            && (center.abs_diff(self.center) <= self.hysteresis || self.covers(&wanted))
        {
            return false;
        }
        self.recompute(center, wanted, words, layout);
        true
    }

    /// Recompute around `center` regardless of drift.
    pub fn refresh(&mut self, center: usize, words: &[String], layout: &LayoutService) {
        let wanted = self.range_around(center, words.len());
        self.recompute(center, wanted, words, layout);
    }

    fn recompute(&mut self, center: usize, range: Range<usize>, words: &[String], layout: &LayoutService) {
        trace!("window: {}..{} around {center}", range.start, range.end);
        self.center = center;
        self.start = range.start;
        let words = &words[range];
        self.data = words.iter().map(|word| layout.layout(word)).collect();
        layout.retain_words(words.iter().map(String::as_str));
    }

    /// Layout held for `index`, if it lies inside the window.
    pub fn get(&self, index: usize) -> Option<&WordLayoutData> {
        index.checked_sub(self.start).and_then(|offset| self.data.get(offset))
    }

    pub fn clear(&mut self) {
        self.center = 0;
        self.start = 0;
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn test_range_clamped_to_document() {
        let window = LayoutWindow::new(10, 2);
        assert_eq!(window.range_around(0, 100), 0..11);
        assert_eq!(window.range_around(50, 100), 40..61);
        assert_eq!(window.range_around(95, 100), 85..100);
        assert_eq!(window.range_around(3, 5), 0..5);
        assert_eq!(window.range_around(0, 0), 0..0);
    }

    #[test]
    fn test_hysteresis_skips_small_drift() {
        let words = words(1000);
        let layout = LayoutService::default();
        let mut window = LayoutWindow::new(100, 50);

        assert!(window.update(500, &words, &layout));
        assert_eq!(window.range(), 400..601);
        assert!(!window.update(550, &words, &layout));
        assert!(!window.update(450, &words, &layout));
        assert!(window.update(551, &words, &layout));
        assert_eq!(window.start(), 451);
        assert_eq!(window.get(451).map(|l| l.word.as_str()), Some("w451"));
        assert!(window.get(450).is_none());
    }

    #[test]
    fn test_covered_range_skips_recompute() {
        let words = words(120);
        let layout = LayoutService::default();
        let mut window = LayoutWindow::new(100, 5);

        assert!(window.update(10, &words, &layout));
        assert_eq!(window.range(), 0..111);
        // Far from the center, but the clamped range is already held.
        assert!(!window.update(2, &words, &layout));
        assert!(window.update(60, &words, &layout));
        assert_eq!(window.range(), 0..120);
    }

    #[test]
    fn test_cache_follows_window() {
        let words = words(20_000);
        let layout = LayoutService::default();
        let mut window = LayoutWindow::new(100, 50);
        for center in (0..words.len()).step_by(500) {
            window.update(center, &words, &layout);
            assert!(layout.cached_len() <= window.len());
        }
        assert_eq!(layout.cached_len(), 201);
    }

    #[test]
    fn test_refresh_ignores_drift() {
        let words = words(50);
        let layout = LayoutService::default();
        let mut window = LayoutWindow::new(5, 50);
        window.update(10, &words, &layout);
        window.refresh(12, &words, &layout);
        assert_eq!(window.range(), 7..18);
        window.clear();
        assert!(window.is_empty());
    }
}
