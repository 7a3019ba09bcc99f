//! Page text and outline access.

use std::collections::HashMap;

use log::{debug, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;

use super::cmap::{ToUnicode, decode_pdf_string};
use super::sections::{OutlineEntry, TextLine};

/// Where PDF text comes from. Section detection only sees this trait.
pub trait PdfSource {
    fn page_count(&self) -> usize;

    /// Lines of a page's native text layer in content order.
    fn page_lines(&self, page_index: usize) -> Result<Vec<TextLine>>;

    /// Outline entries in depth-first order; empty when there is none.
    fn outline(&self) -> Vec<OutlineEntry>;
}

/// TJ adjustments more negative than this (thousandths of an em) are word gaps.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Baseline movement, in text space units, that starts a new line.
const LINE_TOLERANCE: f32 = 1.0;

/// [`PdfSource`] over a document parsed by lopdf.
pub struct LopdfSource {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl LopdfSource {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    fn fonts(&self, page_id: ObjectId) -> HashMap<Vec<u8>, FontDecoder> {
        let fonts = match self.doc.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                debug!("pdf: no fonts for page {page_id:?}: {e}");
                return HashMap::new();
            }
        };
        fonts
            .into_iter()
            .map(|(name, dict)| (name, FontDecoder::from_dict(&self.doc, dict)))
            .collect()
    }
}

impl PdfSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_lines(&self, page_index: usize) -> Result<Vec<TextLine>> {
        let Some(&page_id) = self.pages.get(page_index) else {
            return Ok(Vec::new());
        };
        let content = Content::decode(&self.doc.get_page_content(page_id)?)?;
        let fonts = self.fonts(page_id);

        let mut walker = TextWalker::new(&fonts);
        for op in &content.operations {
            walker.apply(&op.operator, &op.operands);
        }
        Ok(walker.finish())
    }

    fn outline(&self) -> Vec<OutlineEntry> {
        match self.doc.get_toc() {
            Ok(toc) => toc
                .toc
                .into_iter()
                .filter(|entry| entry.page > 0)
                .map(|entry| OutlineEntry {
                    title: entry.title,
                    page_index: entry.page - 1,
                    level: entry.level,
                })
                .collect(),
            Err(e) => {
                debug!("pdf: no outline: {e}");
                Vec::new()
            }
        }
    }
}

/// How the strings shown with one font are turned into text.
#[derive(Debug, Clone, Default)]
struct FontDecoder {
    to_unicode: Option<ToUnicode>,
}

impl FontDecoder {
    fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                ToUnicode::parse(&String::from_utf8_lossy(&data))
            });
        Self { to_unicode }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match &self.to_unicode {
            Some(cmap) => cmap.decode(bytes),
            None => decode_pdf_string(bytes),
        }
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    if operands.len() < N {
        return None;
    }
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

/// Follows the text state through a content stream and groups shown text
/// into lines by baseline.
struct TextWalker<'a> {
    fonts: &'a HashMap<Vec<u8>, FontDecoder>,
    font: Option<Vec<u8>>,
    font_size: f32,
    /// Vertical scale of the text matrix.
    scale: f32,
    leading: f32,
    y: f32,
    line_y: Option<f32>,
    pending_space: bool,
    line: String,
    line_size: f32,
    lines: Vec<TextLine>,
    missing_fonts: usize,
}

impl<'a> TextWalker<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, FontDecoder>) -> Self {
        Self {
            fonts,
            font: None,
            font_size: 0.0,
            scale: 1.0,
            leading: 0.0,
            y: 0.0,
            line_y: None,
            pending_space: false,
            line: String::new(),
            line_size: 0.0,
            lines: Vec::new(),
            missing_fonts: 0,
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "BT" => {
                self.scale = 1.0;
                self.y = 0.0;
            }
            "Tf" => {
                if let [Object::Name(name), size] = operands {
                    self.font = Some(name.clone());
                    self.font_size = number(size).unwrap_or(self.font_size);
                }
            }
            "Tm" => {
                if let Some([_, _, c, d, _, f]) = numbers::<6>(operands) {
                    let scale = (c * c + d * d).sqrt();
                    self.scale = if scale > 0.0 { scale } else { 1.0 };
                    self.y = f;
                }
            }
            "Td" | "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    if operator == "TD" {
                        self.leading = -ty * self.scale;
                    }
                    self.y += ty * self.scale;
                    if ty == 0.0 && tx != 0.0 {
                        self.pending_space = true;
                    }
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    self.leading = leading * self.scale;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if number(other).is_some_and(|n| n < TJ_SPACE_THRESHOLD) {
                                    self.pending_space = true;
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn next_line(&mut self) {
        self.y -= self.leading;
    }

    fn show(&mut self, bytes: &[u8]) {
        let fonts = self.fonts;
        let text = match self.font.as_ref().and_then(|name| fonts.get(name)) {
            Some(decoder) => decoder.decode(bytes),
            None => {
                self.missing_fonts += 1;
                decode_pdf_string(bytes)
            }
        };
        if text.is_empty() {
            return;
        }

        if let Some(line_y) = self.line_y
            && (line_y - self.y).abs() > LINE_TOLERANCE
        {
            self.flush();
        }
        self.line_y = Some(self.y);

        if self.pending_space && !self.line.is_empty() && !self.line.ends_with(' ') {
            self.line.push(' ');
        }
        self.pending_space = false;
        self.line.push_str(&text);
        self.line_size = self.line_size.max(self.font_size * self.scale);
    }

    fn flush(&mut self) {
        let text = self.line.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            self.lines.push(TextLine::new(text, self.line_size));
        }
        self.line.clear();
        self.line_size = 0.0;
        self.pending_space = false;
    }

    fn finish(mut self) -> Vec<TextLine> {
        self.flush();
        if self.missing_fonts > 0 {
            warn!("pdf: {} text runs shown without a known font", self.missing_fonts);
        }
        self.lines
    }
}
