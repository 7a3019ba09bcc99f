//! RTF import.
//!
//! A byte lexer feeds a small reducer that tracks group state. Formatting is
//! discarded; paragraph and line breaks become newlines so heading detection
//! still sees line structure. Ignorable destinations (font and color tables,
//! stylesheets, document info, pictures, headers and footers, anything marked
//! `\*`) are skipped with their whole group.

use memchr::memchr3;

use crate::error::{Error, Result};
use crate::model::ParseResult;
use crate::util::decode_with_label;

use super::Extractor;

const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "footnote",
    "object",
    "fldinst",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "revtbl",
    "filetbl",
    "generator",
    "themedata",
    "colorschememapping",
    "datastore",
    "latentstyles",
    "xmlnstbl",
    "bkmkstart",
    "bkmkend",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RtfExtractor;

impl Extractor for RtfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult> {
        let text = rtf_to_text(bytes)?;
        Ok(ParseResult::text_only(text))
    }
}

/// Convert an RTF document to plain text.
pub fn rtf_to_text(bytes: &[u8]) -> Result<String> {
    let bytes = crate::util::strip_bom(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let bytes = &bytes[start..];
    if !bytes.starts_with(b"{\\rtf") {
        return Err(Error::InvalidRtf("missing {\\rtf header".into()));
    }

    let mut reducer = RtfReducer::default();
    for token in Lexer::new(bytes) {
        reducer.step(token);
    }
    reducer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    GroupStart,
    GroupEnd,
    Control { word: &'a str, param: Option<i32> },
    Symbol(u8),
    Hex(u8),
    Text(&'a [u8]),
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn control(&mut self) -> Option<Token<'a>> {
        // self.pos is just past the backslash
        let first = *self.input.get(self.pos)?;

        if first == b'\'' {
            let hex = self.input.get(self.pos + 1..self.pos + 3)?;
            self.pos += 3;
            // A malformed pair is dropped; the text after it still counts.
            return Some(
                std::str::from_utf8(hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .map_or(Token::Symbol(b'\''), Token::Hex),
            );
        }

        if !first.is_ascii_alphabetic() {
            self.pos += 1;
            return Some(Token::Symbol(first));
        }

        let word_start = self.pos;
        while self.input.get(self.pos).is_some_and(u8::is_ascii_alphabetic) {
            self.pos += 1;
        }
        let word = std::str::from_utf8(&self.input[word_start..self.pos]).unwrap_or_default();

        let param_start = self.pos;
        if self.input.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while self.input.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        let param = std::str::from_utf8(&self.input[param_start..self.pos])
            .ok()
            .and_then(|p| p.parse().ok());
        if param.is_none() {
            self.pos = param_start;
        }

        if self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }

        if word == "bin" {
            let skip = param.unwrap_or(0).max(0) as usize;
            self.pos = (self.pos + skip).min(self.input.len());
        }

        Some(Token::Control { word, param })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let byte = *self.input.get(self.pos)?;
            match byte {
                b'{' => {
                    self.pos += 1;
                    return Some(Token::GroupStart);
                }
                b'}' => {
                    self.pos += 1;
                    return Some(Token::GroupEnd);
                }
                b'\\' => {
                    self.pos += 1;
                    match self.control() {
                        Some(token) => return Some(token),
                        None => {
                            // truncated escape at end of input
                            self.pos = self.input.len();
                            return None;
                        }
                    }
                }
                b'\r' | b'\n' => self.pos += 1,
                _ => {
                    let rest = &self.input[self.pos..];
                    let len = memchr3(b'\\', b'{', b'}', rest).unwrap_or(rest.len());
                    let len = rest[..len]
                        .iter()
                        .position(|&b| b == b'\r' || b == b'\n')
                        .unwrap_or(len);
                    self.pos += len;
                    return Some(Token::Text(&rest[..len]));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    skip: bool,
    unicode_skip: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            skip: false,
            unicode_skip: 1,
        }
    }
}

struct RtfReducer {
    out: String,
    /// Undecoded code-page bytes (text runs and `\'hh` escapes).
    pending: Vec<u8>,
    code_page: String,
    state: GroupState,
    stack: Vec<GroupState>,
    /// Fallback characters still to drop after a `\uN`.
    fallback: usize,
    depth_seen: bool,
}

impl Default for RtfReducer {
    fn default() -> Self {
        Self {
            out: String::new(),
            pending: Vec::new(),
            code_page: "windows-1252".to_string(),
            state: GroupState::default(),
            stack: Vec::new(),
            fallback: 0,
            depth_seen: false,
        }
    }
}

impl RtfReducer {
    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = decode_with_label(&self.pending, &self.code_page);
            self.out.push_str(&text);
            self.pending.clear();
        }
    }

    fn emit(&mut self, s: &str) {
        if !self.state.skip {
            self.flush();
            self.out.push_str(s);
        }
    }

    fn step(&mut self, token: Token<'_>) {
        match token {
            Token::GroupStart => {
                self.flush();
                self.depth_seen = true;
                self.stack.push(self.state);
                self.fallback = 0;
            }
            Token::GroupEnd => {
                self.flush();
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
                self.fallback = 0;
            }
            Token::Text(bytes) => {
                let skipped = self.fallback.min(bytes.len());
                self.fallback -= skipped;
                if !self.state.skip {
                    self.pending.extend_from_slice(&bytes[skipped..]);
                }
            }
            Token::Hex(byte) => {
                if self.fallback > 0 {
                    self.fallback -= 1;
                } else if !self.state.skip {
                    self.pending.push(byte);
                }
            }
            Token::Symbol(symbol) => {
                self.fallback = 0;
                match symbol {
                    b'*' => self.state.skip = true,
                    b'\\' => self.emit("\\"),
                    b'{' => self.emit("{"),
                    b'}' => self.emit("}"),
                    b'~' => self.emit("\u{a0}"),
                    b'_' => self.emit("-"),
                    b'\n' | b'\r' => self.emit("\n"),
                    _ => {}
                }
            }
            Token::Control { word, param } => self.control(word, param),
        }
    }

    fn control(&mut self, word: &str, param: Option<i32>) {
        if word != "u" {
            self.fallback = 0;
        }
        if SKIPPED_DESTINATIONS.contains(&word) {
            self.state.skip = true;
            return;
        }
        match word {
            "par" | "line" | "sect" | "page" | "row" => self.emit("\n"),
            "tab" | "cell" => self.emit("\t"),
            "emdash" => self.emit("\u{2014}"),
            "endash" => self.emit("\u{2013}"),
            "lquote" => self.emit("\u{2018}"),
            "rquote" => self.emit("\u{2019}"),
            "ldblquote" => self.emit("\u{201c}"),
            "rdblquote" => self.emit("\u{201d}"),
            "bullet" => self.emit("\u{2022}"),
            "emspace" | "enspace" | "qmspace" => self.emit(" "),
            "uc" => self.state.unicode_skip = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(code) = param {
                    // Values above 32767 are written as negative 16-bit numbers.
                    let code = (if code < 0 { code + 65536 } else { code }) as u32;
                    if let Some(c) = char::from_u32(code) {
                        let mut buf = [0u8; 4];
                        self.emit(c.encode_utf8(&mut buf));
                    }
                    self.fallback = self.state.unicode_skip;
                }
            }
            "ansicpg" => {
                if let Some(cp) = param {
                    self.flush();
                    self.code_page = format!("windows-{cp}");
                }
            }
            "mac" => self.code_page = "macintosh".to_string(),
            _ => {}
        }
    }

    fn finish(mut self) -> Result<String> {
        self.flush();
        if !self.depth_seen {
            return Err(Error::InvalidRtf("no groups".into()));
        }
        let text = self
            .out
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paragraphs() {
        let rtf = br"{\rtf1\ansi\deff0{\fonttbl{\f0 Times New Roman;}}{\colortbl;\red0\green0\blue0;}
\f0\fs24 Hello \b world\b0.\par
Second line.\par}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "Hello world.\nSecond line.");
    }

    #[test]
    fn test_ignorable_destination() {
        let rtf = br"{\rtf1{\*\generator Writer 1.0;}{\info{\title Secret}}Visible\par}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "Visible");
    }

    #[test]
    fn test_hex_escapes_use_code_page() {
        let rtf = br"{\rtf1\ansi\ansicpg1252 caf\'e9\par}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "café");

        let cyrillic = br"{\rtf1\ansi\ansicpg1251 \'cf\'f0\'e8\'e2\'e5\'f2\par}";
        assert_eq!(rtf_to_text(cyrillic).unwrap(), "Привет");
    }

    #[test]
    fn test_malformed_hex_escape_keeps_following_text() {
        let rtf = br"{\rtf1 first part \'zz second part\par third\par}";
        let text = rtf_to_text(rtf).unwrap();
        assert_eq!(
            text.split_whitespace().collect::<Vec<_>>(),
            vec!["first", "part", "second", "part", "third"]
        );
        assert_eq!(rtf_to_text(br"{\rtf1 tail\'4").unwrap(), "tail");
    }

    #[test]
    fn test_unicode_with_fallback() {
        let rtf = br"{\rtf1\uc1 \u8212?dash \u-3913?x}";
        // 65536 - 3913 = 61623 (private use), fallback '?' dropped both times
        let text = rtf_to_text(rtf).unwrap();
        assert!(text.starts_with("\u{2014}dash "));
        assert!(!text.contains('?'));

        let two = br"{\rtf1\uc2 \u233\'65\'65 ok}";
        assert_eq!(rtf_to_text(two).unwrap(), "é ok");
    }

    #[test]
    fn test_escaped_braces_and_tabs() {
        let rtf = br"{\rtf1 a\{b\}\tab c\\d}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "a{b}\tc\\d");
    }

    #[test]
    fn test_bin_data_skipped() {
        let mut rtf = b"{\\rtf1 before{\\bin4 {}\\x} after}".to_vec();
        rtf.push(b'\n');
        assert_eq!(rtf_to_text(&rtf).unwrap(), "before after");
    }

    #[test]
    fn test_rejects_non_rtf() {
        assert!(matches!(rtf_to_text(b"plain text"), Err(Error::InvalidRtf(_))));
        assert!(RtfExtractor.parse(b"<html></html>").is_none());
    }

    #[test]
    fn test_heading_lines_survive() {
        let rtf = br"{\rtf1 CHAPTER ONE\par The story begins.\par}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "CHAPTER ONE\nThe story begins.");
    }
}
