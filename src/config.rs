//! Tunable constants, grouped per component.
//!
//! Every struct has a `Default` carrying the values the pipeline was tuned
//! with. With the `serde` feature, a [`ReaderConfig`] can be loaded from JSON;
//! missing fields keep their defaults.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORDS_PER_PAGE: usize = 250;
/// No length limit on numbered headings.
pub const DEFAULT_MAX_NUMBERED_HEADING_CHARS: usize = usize::MAX;
pub const DEFAULT_WPM: u32 = 300;
pub const MIN_WPM: u32 = 50;
pub const MAX_WPM: u32 = 1500;

/// Extraction and navigation fallback settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserConfig {
    /// Page size used when no structure was found.
    pub words_per_page: usize,
    /// Longest line accepted by the numbered-heading rule. Unlimited by
    /// default; lower it to keep numbered list paragraphs out of navigation.
    pub max_numbered_heading_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            words_per_page: DEFAULT_WORDS_PER_PAGE,
            max_numbered_heading_chars: DEFAULT_MAX_NUMBERED_HEADING_CHARS,
        }
    }
}

/// Playback pacing and virtualization settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaybackConfig {
    pub words_per_minute: u32,
    /// Words on each side of the window center that get precomputed layout.
    pub window_radius: usize,
    /// Minimum drift of the center before the window is recomputed.
    pub window_hysteresis: usize,
    /// Words between checkpoint callbacks while playing.
    pub checkpoint_interval: usize,
    /// Documents at or above this size skip the per-word character ranges.
    pub paragraph_mapping_limit: usize,
    /// Words past a section start within which "previous" goes one section back.
    pub section_dead_zone: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WPM,
            window_radius: 2500,
            window_hysteresis: 50,
            checkpoint_interval: 50,
            paragraph_mapping_limit: 100_000,
            section_dead_zone: 10,
        }
    }
}

/// Word layout settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutConfig {
    pub font_name: String,
    pub font_size_multiplier: f32,
    /// Base sizes for words of ≤12, 13..=18, 19..=24 and >24 characters.
    pub font_sizes: [f32; 4],
    /// Horizontal position of the ORP as a fraction of the viewport width.
    pub anchor_ratio: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_name: "Menlo".to_string(),
            font_size_multiplier: 1.0,
            font_sizes: [48.0, 40.0, 34.0, 28.0],
            anchor_ratio: 0.38,
        }
    }
}

/// Thresholds for PDF heading inference. Empirically tuned, not contracts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PdfHeadingConfig {
    /// Pages scanned for anchor keywords such as "Introduction".
    pub learning_pages: usize,
    /// Longest line accepted as an anchor keyword line.
    pub max_anchor_words: usize,
    /// Longest line accepted as a heading once a size was learned.
    pub max_heading_words: usize,
    /// Allowed distance from the learned heading size, in points.
    pub size_tolerance: f32,
    /// Size a line must exceed to be a heading before any size was learned.
    pub fallback_min_size: f32,
    /// Longest line accepted by the fallback rule.
    pub fallback_max_words: usize,
    /// Longest line accepted when refining an outline entry's position.
    pub refine_max_words: usize,
    /// Leading pages searched for an implicit "Abstract" line.
    pub abstract_pages: usize,
    /// Fraction of page height at top and bottom treated as header/footer in OCR output.
    pub ocr_margin: f32,
    /// OCR regions below this confidence are discarded.
    pub ocr_min_confidence: f32,
}

impl Default for PdfHeadingConfig {
    fn default() -> Self {
        Self {
            learning_pages: 3,
            max_anchor_words: 10,
            max_heading_words: 15,
            size_tolerance: 0.5,
            fallback_min_size: 14.0,
            fallback_max_words: 20,
            refine_max_words: 12,
            abstract_pages: 2,
            ocr_margin: 0.10,
            ocr_min_confidence: 0.3,
        }
    }
}

/// Settings for a whole reading session.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    pub parser: ParserConfig,
    pub playback: PlaybackConfig,
    pub layout: LayoutConfig,
    pub pdf: PdfHeadingConfig,
}

impl ReaderConfig {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.parser.words_per_page == 0 {
            return Err(crate::Error::Config("words_per_page must be positive".into()));
        }
        if !(MIN_WPM..=MAX_WPM).contains(&self.playback.words_per_minute) {
            return Err(crate::Error::Config(format!(
                "words_per_minute must be within {MIN_WPM}..={MAX_WPM}"
            )));
        }
        if self.playback.checkpoint_interval == 0 {
            return Err(crate::Error::Config("checkpoint_interval must be positive".into()));
        }
        if !(self.layout.font_size_multiplier > 0.0) {
            return Err(crate::Error::Config("font_size_multiplier must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.layout.anchor_ratio) {
            return Err(crate::Error::Config("anchor_ratio must be within 0..=1".into()));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl ReaderConfig {
    /// Parse a JSON config; absent fields fall back to defaults.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
