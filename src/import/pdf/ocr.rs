//! Text recognition for pages without a text layer.
//!
//! Recognition itself is an external service behind [`TextRecognizer`]. This
//! module only filters and orders what the service returns.

use super::sections::TextLine;

/// Axis-aligned box in page-relative units: `0.0..=1.0`, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One recognised run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedRegion {
    pub text: String,
    pub bounds: Bounds,
    /// `0.0..=1.0`.
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("text recognition failed: {0}")]
pub struct RecognitionError(pub String);

/// An OCR service. Implementations render the page themselves from the
/// document bytes; rendering scratch files must not outlive the call.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, document: &[u8], page_index: usize) -> Result<Vec<RecognizedRegion>, RecognitionError>;
}

/// Drop low-confidence regions and regions centred in the top or bottom
/// `margin` of the page, then order the rest top to bottom, left to right.
pub fn regions_to_lines(regions: Vec<RecognizedRegion>, margin: f32, min_confidence: f32) -> Vec<TextLine> {
    let mut kept: Vec<RecognizedRegion> = regions
        .into_iter()
        .filter(|r| r.confidence >= min_confidence)
        .filter(|r| {
            let center = r.bounds.center_y();
            center >= margin && center <= 1.0 - margin
        })
        .filter(|r| !r.text.trim().is_empty())
        .collect();

    kept.sort_by(|a, b| {
        a.bounds
            .y
            .total_cmp(&b.bounds.y)
            .then(a.bounds.x.total_cmp(&b.bounds.x))
    });

    // Recognised text carries no usable font size.
    kept.into_iter().map(|r| TextLine::new(r.text.trim(), 0.0)).collect()
}
