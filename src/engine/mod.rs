//! RSVP playback.
//!
//! [`PlaybackEngine`] owns the token sequence of one document and everything
//! indexed by it: the current position, navigation, search results and a
//! [`LayoutWindow`] of precomputed layouts. Time is external to the engine.
//! [`play`](PlaybackEngine::play) hands out a [`ScheduledTick`], the caller
//! waits for its delay and passes it back to
//! [`fire_tick`](PlaybackEngine::fire_tick). Every tick is single-use, and
//! pausing invalidates the outstanding one, so a late tick can never move
//! the position. [`Player`] is a blocking driver for that loop.

pub mod layout;
mod player;
pub mod window;

pub use layout::{FontFileMeasurer, LayoutService, MonospaceMeasurer, TextMeasurer};
pub use player::{Player, PlayerExit};
pub use window::LayoutWindow;

use std::borrow::Cow;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::config::{MAX_WPM, MIN_WPM, PlaybackConfig, ReaderConfig};
use crate::document::ReadingDocument;
use crate::loader::PreparedDocument;
use crate::model::{NavigationPoint, SearchResult, WordLayoutData};
use crate::navigation::point_at;
use crate::text::{WordSearch, tokenize, word_delay_ms, word_ranges};

/// Receives `(current_index, words_per_minute)` whenever progress should be
/// saved.
pub type CheckpointHook = Box<dyn FnMut(usize, u32) + Send>;

/// Coarse engine state.
///
/// Completion is reported by [`TickOutcome::Completed`]; afterwards the
/// engine is back in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No words loaded.
    Idle,
    Ready,
    Playing,
}

/// A pending advance. Pass it back to [`PlaybackEngine::fire_tick`] once
/// `delay` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    generation: u64,
    delay: Duration,
}

impl ScheduledTick {
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Moved to the next word; wait for the new tick.
    Advanced(ScheduledTick),
    /// The last word was shown. Playback is paused.
    Completed,
    /// The tick was invalidated by a pause, seek or an earlier firing.
    Stale,
}

pub fn clamp_wpm(wpm: u32) -> u32 {
    wpm.clamp(MIN_WPM, MAX_WPM)
}

pub struct PlaybackEngine {
    config: PlaybackConfig,
    layout: Arc<LayoutService>,
    words: Vec<String>,
    char_ranges: Option<Vec<Range<usize>>>,
    current_index: usize,
    is_playing: bool,
    completed: bool,
    words_per_minute: u32,
    generation: u64,
    words_since_checkpoint: usize,
    navigation_points: Vec<NavigationPoint>,
    current_navigation_point: Option<usize>,
    window: LayoutWindow,
    search: WordSearch,
    checkpoint_hook: Option<CheckpointHook>,
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig, layout: Arc<LayoutService>) -> Self {
        let window = LayoutWindow::new(config.window_radius, config.window_hysteresis);
        Self {
            words_per_minute: clamp_wpm(config.words_per_minute),
            config,
            layout,
            words: Vec::new(),
            char_ranges: None,
            current_index: 0,
            is_playing: false,
            completed: false,
            generation: 0,
            words_since_checkpoint: 0,
            navigation_points: Vec::new(),
            current_navigation_point: None,
            window,
            search: WordSearch::new(),
            checkpoint_hook: None,
        }
    }

    /// Engine with a monospace layout service built from `config`.
    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(
            config.playback.clone(),
            Arc::new(LayoutService::monospace(config.layout.clone())),
        )
    }

    pub fn set_checkpoint_hook(&mut self, hook: impl FnMut(usize, u32) + Send + 'static) {
        self.checkpoint_hook = Some(Box::new(hook));
    }

    pub fn layout_service(&self) -> &Arc<LayoutService> {
        &self.layout
    }

    // --- loading ---

    /// Tokenize `text` and position at `start_index`, clamped.
    pub fn load_text(&mut self, text: &str, start_index: usize, font_name: &str, font_size_multiplier: f32) {
        self.layout.set_font(font_name, font_size_multiplier);
        let words = tokenize(text);
        let char_ranges = (words.len() < self.config.paragraph_mapping_limit).then(|| word_ranges(text));
        self.install(words, char_ranges, Vec::new(), start_index);
    }

    /// Take over a document tokenized by the background loader. Returns the
    /// document record so the owner can keep it.
    pub fn load_prepared(&mut self, prepared: PreparedDocument) -> ReadingDocument {
        let PreparedDocument {
            document,
            words,
            char_ranges,
        } = prepared;
        self.words_per_minute = clamp_wpm(document.words_per_minute);
        self.install(
            words,
            char_ranges,
            document.navigation_points.clone(),
            document.current_word_index,
        );
        document
    }

    /// Replace the navigation list for the loaded words.
    pub fn set_navigation_points(&mut self, points: Vec<NavigationPoint>) {
        self.navigation_points = points;
        self.update_navigation_point();
    }

    fn install(
        &mut self,
        words: Vec<String>,
        char_ranges: Option<Vec<Range<usize>>>,
        navigation_points: Vec<NavigationPoint>,
        start_index: usize,
    ) {
        self.pause();
        self.words = words;
        self.char_ranges = char_ranges;
        self.current_index = start_index.min(self.words.len().saturating_sub(1));
        self.completed = false;
        self.words_since_checkpoint = 0;
        self.search.clear();
        self.navigation_points = navigation_points;
        self.update_navigation_point();
        self.window.clear();
        self.window.refresh(self.current_index, &self.words, &self.layout);
        info!(
            "engine: loaded {} words at {}{}",
            self.words.len(),
            self.current_index,
            if self.char_ranges.is_none() { ", no paragraph ranges" } else { "" }
        );
    }

    // --- state ---

    pub fn state(&self) -> PlaybackState {
        if self.words.is_empty() {
            PlaybackState::Idle
        } else if self.is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Ready
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether the last playback ran to the end.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn total_words(&self) -> usize {
        self.words.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_index).map(String::as_str)
    }

    /// Byte range of word `index` in the loaded text. `None` when the
    /// document was too large to map.
    pub fn char_range(&self, index: usize) -> Option<Range<usize>> {
        self.char_ranges.as_ref()?.get(index).cloned()
    }

    pub fn words_per_minute(&self) -> u32 {
        self.words_per_minute
    }

    /// Set the speed, clamped to the supported range. Takes effect from the
    /// next scheduled tick.
    pub fn set_words_per_minute(&mut self, wpm: u32) -> u32 {
        self.words_per_minute = clamp_wpm(wpm);
        self.words_per_minute
    }

    // --- playback ---

    /// Start playing. Returns the first tick, or `None` when nothing is
    /// loaded or playback is already running.
    pub fn play(&mut self) -> Option<ScheduledTick> {
        if self.words.is_empty() || self.is_playing {
            return None;
        }
        if self.completed && self.current_index + 1 >= self.words.len() {
            self.current_index = 0;
            self.update_navigation_point();
            self.window.update(0, &self.words, &self.layout);
        }
        self.completed = false;
        self.is_playing = true;
        self.words_since_checkpoint = 0;
        debug!("engine: play at {} ({} wpm)", self.current_index, self.words_per_minute);
        Some(self.schedule())
    }

    /// Stop playing and save a checkpoint. The outstanding tick becomes stale.
    pub fn pause(&mut self) {
        if !self.is_playing {
            return;
        }
        self.is_playing = false;
        self.generation += 1;
        debug!("engine: pause at {}", self.current_index);
        self.checkpoint();
    }

    pub fn toggle(&mut self) -> Option<ScheduledTick> {
        if self.is_playing {
            self.pause();
            None
        } else {
            self.play()
        }
    }

    fn schedule(&mut self) -> ScheduledTick {
        self.generation += 1;
        let word = self.words.get(self.current_index).map_or("", String::as_str);
        let micros = (word_delay_ms(word, self.words_per_minute) * 1000.0).round() as u64;
        ScheduledTick {
            generation: self.generation,
            delay: Duration::from_micros(micros),
        }
    }

    /// Advance one word if `tick` is still the pending one.
    pub fn fire_tick(&mut self, tick: ScheduledTick) -> TickOutcome {
        if !self.is_playing || tick.generation != self.generation {
            return TickOutcome::Stale;
        }

        if self.current_index + 1 >= self.words.len() {
            self.completed = true;
            self.pause();
            info!("engine: reached end of {} words", self.words.len());
            return TickOutcome::Completed;
        }

        self.current_index += 1;
        self.update_navigation_point();
        self.window.update(self.current_index, &self.words, &self.layout);
        self.words_since_checkpoint += 1;
        if self.words_since_checkpoint >= self.config.checkpoint_interval {
            self.words_since_checkpoint = 0;
            self.checkpoint();
        }
        TickOutcome::Advanced(self.schedule())
    }

    fn checkpoint(&mut self) {
        let (index, wpm) = (self.current_index, self.words_per_minute);
        if let Some(hook) = self.checkpoint_hook.as_mut() {
            hook(index, wpm);
        }
    }

    // --- seeking ---

    /// Jump to `index`, clamped. Pauses first when playing.
    pub fn go_to_index(&mut self, index: usize) {
        if self.words.is_empty() {
            return;
        }
        self.pause();
        self.current_index = index.min(self.words.len() - 1);
        self.completed = false;
        self.update_navigation_point();
        self.window.update(self.current_index, &self.words, &self.layout);
    }

    pub fn skip_forward(&mut self, count: usize) {
        self.go_to_index(self.current_index.saturating_add(count));
    }

    pub fn skip_backward(&mut self, count: usize) {
        self.go_to_index(self.current_index.saturating_sub(count));
    }

    // --- navigation ---

    pub fn navigation_points(&self) -> &[NavigationPoint] {
        &self.navigation_points
    }

    pub fn current_navigation_point(&self) -> Option<&NavigationPoint> {
        self.current_navigation_point
            .and_then(|i| self.navigation_points.get(i))
    }

    fn update_navigation_point(&mut self) {
        let index = self.current_index;
        self.current_navigation_point = point_at(&self.navigation_points, index)
            .filter(|&i| self.navigation_points[i].contains(index));
    }

    /// Go to the start of the next section. Returns the new index.
    pub fn jump_to_next_section(&mut self) -> Option<usize> {
        let target = self
            .navigation_points
            .iter()
            .find(|p| p.word_start_index > self.current_index)?
            .word_start_index;
        self.go_to_index(target);
        Some(self.current_index)
    }

    /// Go back to the start of the current section, or to the previous
    /// section when already within the dead zone of the current start.
    pub fn jump_to_previous_section(&mut self) -> Option<usize> {
        let current = point_at(&self.navigation_points, self.current_index)?;
        let start = self.navigation_points[current].word_start_index;
        let target = if self.current_index - start > self.config.section_dead_zone || current == 0 {
            start
        } else {
            self.navigation_points[current - 1].word_start_index
        };
        self.go_to_index(target);
        Some(self.current_index)
    }

    // --- progress ---

    /// Percentage of the document read, counting the current word.
    pub fn document_progress(&self) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        (self.current_index + 1) as f64 / self.words.len() as f64 * 100.0
    }

    /// Percentage of the current section read, within `0..=100`.
    pub fn section_progress(&self) -> f64 {
        let Some(point) = self.current_navigation_point() else {
            return 0.0;
        };
        let done = (self.current_index + 1).saturating_sub(point.word_start_index);
        (done as f64 / point.len() as f64 * 100.0).clamp(0.0, 100.0)
    }

    // --- layout ---

    pub fn window_start_index(&self) -> usize {
        self.window.start()
    }

    pub fn visible_layout_data(&self) -> &[WordLayoutData] {
        self.window.layouts()
    }

    pub fn window(&self) -> &LayoutWindow {
        &self.window
    }

    /// Move the window to `index`, subject to the usual hysteresis.
    pub fn update_window(&mut self, index: usize) -> bool {
        let center = index.min(self.words.len().saturating_sub(1));
        self.window.update(center, &self.words, &self.layout)
    }

    /// Layout for word `index`: from the window, or computed on the spot
    /// when outside it.
    pub fn layout_at(&self, index: usize) -> Option<Cow<'_, WordLayoutData>> {
        let word = self.words.get(index)?;
        match self.window.get(index) {
            Some(layout) => Some(Cow::Borrowed(layout)),
            None => Some(Cow::Owned(self.layout.compute(word))),
        }
    }

    pub fn current_layout(&self) -> Option<Cow<'_, WordLayoutData>> {
        self.layout_at(self.current_index)
    }

    /// Change font or multiplier and rebuild the window if that changed
    /// anything.
    pub fn set_font(&mut self, font_name: &str, font_size_multiplier: f32) {
        if self.layout.set_font(font_name, font_size_multiplier) {
            self.window.refresh(self.current_index, &self.words, &self.layout);
        }
    }

    // --- search ---

    /// Search the loaded words. The current result is the one nearest the
    /// playback position.
    pub fn search(&mut self, query: &str, case_sensitive: bool) -> &[SearchResult] {
        self.search.run(query, &self.words, case_sensitive, self.current_index);
        self.search.results()
    }

    pub fn search_results(&self) -> &[SearchResult] {
        self.search.results()
    }

    pub fn current_search_index(&self) -> Option<usize> {
        self.search.current_index()
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Go to the next result, wrapping. Returns the new word index.
    pub fn jump_to_next_search_result(&mut self) -> Option<usize> {
        let target = self.search.next()?.word_index;
        self.go_to_index(target);
        Some(target)
    }

    /// Go to the previous result, wrapping. Returns the new word index.
    pub fn jump_to_previous_search_result(&mut self) -> Option<usize> {
        let target = self.search.previous()?.word_index;
        self.go_to_index(target);
        Some(target)
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::from_config(&ReaderConfig::default())
    }
}
