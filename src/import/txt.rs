//! Plain text import.

use crate::error::{Error, Result};
use crate::model::ParseResult;
use crate::util::decode_plain_text;

use super::Extractor;

/// Decodes plain text; structure comes later from heading detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxtExtractor;

impl Extractor for TxtExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult> {
        let text = decode_plain_text(bytes)
            .ok_or_else(|| Error::Encoding("text is not UTF-8, UTF-16 or Latin-1".into()))?;
        // CRLF and lone CR both end a line for the heading detector.
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        Ok(ParseResult::text_only(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        let result = TxtExtractor.extract("naïve café".as_bytes()).unwrap();
        assert_eq!(result.text, "naïve café");
        assert!(result.navigation_points.is_empty());
    }

    #[test]
    fn test_latin1_fallback() {
        let result = TxtExtractor.extract(b"caf\xe9 cr\xe8me").unwrap();
        assert_eq!(result.text, "café crème");
    }

    #[test]
    fn test_utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi there".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(TxtExtractor.extract(&bytes).unwrap().text, "hi there");
    }

    #[test]
    fn test_line_endings_normalised() {
        let result = TxtExtractor.extract(b"# One\r\nbody\rmore").unwrap();
        assert_eq!(result.text, "# One\nbody\nmore");
    }
}
