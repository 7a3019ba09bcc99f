//! Word measurement and ORP placement.
//!
//! A [`LayoutService`] turns a word into [`WordLayoutData`]: a font size picked
//! from the word's length and the horizontal offset of its optimal recognition
//! point. Results depend only on `(word, font_name, multiplier)` and are cached
//! until the font changes.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use log::debug;
use ttf_parser::Face;

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::model::WordLayoutData;

/// Width of a character at a given font size, in points.
pub trait TextMeasurer: Send + Sync {
    fn char_width(&self, c: char, font_size: f32) -> f32;

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c, font_size)).sum()
    }
}

/// Every character gets the same advance, a fixed fraction of the em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    advance: f32,
}

impl MonospaceMeasurer {
    pub fn new(advance: f32) -> Self {
        Self { advance }
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn char_width(&self, _c: char, font_size: f32) -> f32 {
        self.advance * font_size
    }
}

/// Advance used for characters the font has no glyph for, in em.
const MISSING_GLYPH_ADVANCE: f32 = 0.5;

/// Horizontal advances read from a TrueType/OpenType font.
#[derive(Debug, Clone)]
pub struct FontFileMeasurer {
    advances: HashMap<char, f32>,
    family: Option<String>,
}

impl FontFileMeasurer {
    /// Parse a font and read the advances of its Basic Multilingual Plane
    /// glyphs.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let face = Face::parse(data, 0).map_err(|e| Error::Font(e.to_string()))?;
        let units_per_em = f32::from(face.units_per_em().max(1));

        let advances: HashMap<char, f32> = (0..=0xFFFF_u32)
            .filter_map(char::from_u32)
            .filter_map(|c| {
                let glyph = face.glyph_index(c)?;
                let advance = face.glyph_hor_advance(glyph)?;
                Some((c, f32::from(advance) / units_per_em))
            })
            .collect();

        let family = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|name| name.to_string());
        debug!("layout: font {family:?} with {} mapped glyphs", advances.len());

        Ok(Self { advances, family })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

impl TextMeasurer for FontFileMeasurer {
    fn char_width(&self, c: char, font_size: f32) -> f32 {
        self.advances.get(&c).copied().unwrap_or(MISSING_GLYPH_ADVANCE) * font_size
    }
}

/// Base font size for a word, before the multiplier.
///
/// ≤12 characters get the largest size, then 13..=18, 19..=24 and >24.
pub fn font_size_for(word: &str, sizes: &[f32; 4]) -> f32 {
    match word.chars().count() {
        0..=12 => sizes[0],
        13..=18 => sizes[1],
        19..=24 => sizes[2],
        _ => sizes[3],
    }
}

/// Offset from the word's left edge to the center of its ORP glyph.
///
/// One-character words are centred on that character. Longer words anchor
/// on the second character: first width plus half the second.
pub fn orp_offset(word: &str, font_size: f32, measurer: &dyn TextMeasurer) -> f32 {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (None, _) => 0.0,
        (Some(only), None) => measurer.char_width(only, font_size) / 2.0,
        (Some(first), Some(second)) => {
            measurer.char_width(first, font_size) + measurer.char_width(second, font_size) / 2.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    word: String,
    font_name: String,
    multiplier: u32,
}

/// Computes word layouts and caches them.
///
/// The cache allows concurrent readers; writes are serialized by the lock.
/// Changing the font or multiplier drops every cached entry, and
/// [`retain_words`](Self::retain_words) prunes it to a working set.
pub struct LayoutService {
    measurer: Box<dyn TextMeasurer>,
    config: RwLock<LayoutConfig>,
    cache: RwLock<HashMap<LayoutKey, WordLayoutData>>,
}

impl LayoutService {
    pub fn new(measurer: Box<dyn TextMeasurer>, config: LayoutConfig) -> Self {
        Self {
            measurer,
            config: RwLock::new(config),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn monospace(config: LayoutConfig) -> Self {
        Self::new(Box::new(MonospaceMeasurer::default()), config)
    }

    pub fn config(&self) -> LayoutConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Switch font and multiplier. Returns whether anything changed; when
    /// it did the cache is emptied.
    pub fn set_font(&self, font_name: &str, multiplier: f32) -> bool {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        if config.font_name == font_name && config.font_size_multiplier == multiplier {
            return false;
        }
        config.font_name = font_name.to_string();
        config.font_size_multiplier = multiplier;
        drop(config);

        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        debug!("layout: font set to {font_name} x{multiplier}, cache cleared");
        true
    }

    /// Layout for `word`, served from the cache when possible.
    pub fn layout(&self, word: &str) -> WordLayoutData {
        let config = self.config();
        let key = LayoutKey {
            word: word.to_string(),
            font_name: config.font_name.clone(),
            multiplier: config.font_size_multiplier.to_bits(),
        };
        if let Some(hit) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return hit.clone();
        }

        let layout = self.compute_with(word, &config);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, layout.clone());
        layout
    }

    /// Layout for `word` without touching the cache.
    pub fn compute(&self, word: &str) -> WordLayoutData {
        self.compute_with(word, &self.config())
    }

    fn compute_with(&self, word: &str, config: &LayoutConfig) -> WordLayoutData {
        let font_size = font_size_for(word, &config.font_sizes) * config.font_size_multiplier;
        WordLayoutData {
            word: word.to_string(),
            font_size,
            orp_offset: orp_offset(word, font_size, self.measurer.as_ref()),
        }
    }

    /// Full rendered width of `word` at the size its layout uses.
    pub fn word_width(&self, layout: &WordLayoutData) -> f32 {
        self.measurer.text_width(&layout.word, layout.font_size)
    }

    /// Drop cached layouts for words outside `keep`.
    pub fn retain_words<'w>(&self, keep: impl IntoIterator<Item = &'w str>) {
        let keep: HashSet<&str> = keep.into_iter().collect();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let before = cache.len();
        cache.retain(|key, _| keep.contains(key.word.as_str()));
        if cache.len() < before {
            debug!("layout: pruned cache from {before} to {} entries", cache.len());
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for LayoutService {
    fn default() -> Self {
        Self::monospace(LayoutConfig::default())
    }
}
