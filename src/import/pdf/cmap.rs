//! `ToUnicode` CMaps and PDF string decoding.

use std::collections::HashMap;

use encoding_rs::{UTF_16BE, WINDOWS_1252};

/// Character-code to Unicode mapping read from a font's `ToUnicode` stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicode {
    /// Bytes per character code, taken from the first mapping.
    code_len: usize,
    map: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Open,
    Close,
}

impl ToUnicode {
    /// Parse `bfchar` and `bfrange` blocks. Returns `None` when the stream
    /// holds no usable mapping.
    pub fn parse(cmap: &str) -> Option<Self> {
        let mut this = Self::default();

        for block in blocks(cmap, "beginbfchar", "endbfchar") {
            let tokens = tokenize(block);
            for pair in tokens.chunks_exact(2) {
                if let [Token::Hex(src), Token::Hex(dst)] = pair {
                    this.insert(src, utf16_to_string(dst));
                }
            }
        }

        for block in blocks(cmap, "beginbfrange", "endbfrange") {
            let mut tokens = tokenize(block).into_iter();
            while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) = (tokens.next(), tokens.next()) {
                let (lo_code, hi_code) = (code_value(&lo), code_value(&hi));
                match tokens.next() {
                    Some(Token::Hex(dst)) => {
                        let base = utf16_units(&dst);
                        for (i, code) in (lo_code..=hi_code).enumerate().take(0x1_0000) {
                            let mut units = base.clone();
                            if let Some(last) = units.last_mut() {
                                *last = last.wrapping_add(i as u16);
                            }
                            this.insert_code(code, lo.len(), String::from_utf16_lossy(&units));
                        }
                    }
                    Some(Token::Open) => {
                        let mut code = lo_code;
                        for token in tokens.by_ref() {
                            match token {
                                Token::Hex(dst) => {
                                    this.insert_code(code, lo.len(), utf16_to_string(&dst));
                                    code += 1;
                                }
                                Token::Close => break,
                                Token::Open => {}
                            }
                        }
                    }
                    _ => break,
                }
            }
        }

        (!this.map.is_empty()).then_some(this)
    }

    fn insert(&mut self, src: &[u8], text: String) {
        self.insert_code(code_value(src), src.len(), text);
    }

    fn insert_code(&mut self, code: u32, len: usize, text: String) {
        if self.code_len == 0 {
            self.code_len = len.clamp(1, 4);
        }
        self.map.insert(code, text);
    }

    /// Decode a shown string. Unmapped single-byte codes fall back to
    /// Windows-1252; unmapped multi-byte codes are dropped.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let width = self.code_len.max(1);
        let mut out = String::new();
        for chunk in bytes.chunks(width) {
            match self.map.get(&code_value(chunk)) {
                Some(text) => out.push_str(text),
                None if width == 1 => out.push_str(&WINDOWS_1252.decode_without_bom_handling(chunk).0),
                None => {}
            }
        }
        out
    }
}

/// Decode a PDF string shown with a font lacking a `ToUnicode` map.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return UTF_16BE.decode_without_bom_handling(rest).0.into_owned();
    }
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

fn blocks<'a>(cmap: &'a str, begin: &'a str, end: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    cmap.match_indices(begin).filter_map(move |(start, _)| {
        let body = &cmap[start + begin.len()..];
        body.find(end).map(|stop| &body[..stop])
    })
}

fn tokenize(block: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = block.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '<' => {
                let rest = &block[i + 1..];
                let Some(end) = rest.find('>') else {
                    break;
                };
                tokens.push(Token::Hex(hex_bytes(&rest[..end])));
                for _ in 0..=end {
                    chars.next();
                }
            }
            '[' => tokens.push(Token::Open),
            ']' => tokens.push(Token::Close),
            _ => {}
        }
    }
    tokens
}

fn hex_bytes(hex: &str) -> Vec<u8> {
    let digits: Vec<u8> = hex
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => hi << 4 | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0, |acc, &b| acc << 8 | u32::from(b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [lo] => u16::from(*lo),
            _ => 0,
        })
        .collect()
}

fn utf16_to_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <0041>
endbfchar
2 beginbfrange
<0020> <0022> <0061>
<0030> <0031> [<0066006C> <2014>]
endbfrange
endcmap";

    #[test]
    fn test_bfchar_and_bfrange() {
        let cmap = ToUnicode::parse(CMAP).unwrap();
        assert_eq!(cmap.decode(&[0x00, 0x11, 0x00, 0x03, 0x00, 0x20, 0x00, 0x22]), "A ac");
        assert_eq!(cmap.decode(&[0x00, 0x30, 0x00, 0x31]), "fl\u{2014}");
    }

    #[test]
    fn test_unmapped_multibyte_dropped() {
        let cmap = ToUnicode::parse(CMAP).unwrap();
        assert_eq!(cmap.decode(&[0x00, 0x11, 0x7F, 0x7F]), "A");
    }

    #[test]
    fn test_single_byte_fallback() {
        let cmap = ToUnicode::parse("beginbfchar\n<01> <0041>\nendbfchar").unwrap();
        assert_eq!(cmap.decode(&[0x01, b'b', 0xE9]), "Abé");
    }

    #[test]
    fn test_empty_cmap() {
        assert!(ToUnicode::parse("begincmap endcmap").is_none());
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"caf\xe9"), "café");
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
    }
}
