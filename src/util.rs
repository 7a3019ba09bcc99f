//! Byte decoding and small markup helpers shared by the extractors.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Decode plain-text bytes with the TXT cascade.
///
/// Order:
/// 1. A UTF-8 or UTF-16 byte order mark selects that encoding
/// 2. Strict UTF-8 (ASCII is a subset, so ASCII input is accepted here)
/// 3. Latin-1, served by Windows-1252 which is its superset
///
/// Returns `None` only when every step reports malformed input.
pub fn decode_plain_text(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, malformed) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if !malformed {
            return Some(text);
        }
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return Some(text);
    }

    WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Decode markup bytes (XML/XHTML), handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the encoding named in the `<?xml encoding="..."?>`
///    declaration
/// 3. Falls back to Windows-1252 (common in old ebooks)
pub fn decode_markup(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(label) = declared_encoding(bytes)
        && let Some(encoding) = Encoding::for_label(label.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = WINDOWS_1252.decode(bytes);
    result
}

/// Decode bytes with a named code page (e.g. `"windows-1251"`), falling back
/// to Windows-1252 for unknown labels.
pub fn decode_with_label(bytes: &[u8], label: &str) -> String {
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(WINDOWS_1252);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Read the `encoding` pseudo-attribute of an XML declaration, if present.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(200)];
    let decl_end = memchr::memmem::find(head, b"?>")?;
    let decl = String::from_utf8_lossy(&head[..decl_end]);
    let start = decl.find("encoding=")? + "encoding=".len();
    let rest = &decl[start..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &rest[1..];
    let end = value.find(quote)?;
    Some(value[..end].to_string())
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Extract local name from namespaced XML name (e.g., "w:pStyle" -> "pStyle").
pub fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML/HTML entity references (without the surrounding `&` and `;`).
pub fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some(" ".to_string()),
        _ => {}
    }

    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

/// Replace `&name;` references in an attribute value, leaving unknown ones as-is.
pub fn unescape_entities(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';') {
            Some(semi) if semi <= 10 => match resolve_entity(&tail[..semi]) {
                Some(resolved) => {
                    out.push_str(&resolved);
                    rest = &tail[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = tail;
                }
            },
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        let with_bom = &[0xEF, 0xBB, 0xBF, b'h', b'i'];
        assert_eq!(strip_bom(with_bom), b"hi");
        assert_eq!(strip_bom(b"hello"), b"hello");
        assert_eq!(strip_bom(&[]), &[] as &[u8]);

        // Partial BOM (not stripped)
        let partial = &[0xEF, 0xBB, b'x'];
        assert_eq!(strip_bom(partial), partial);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"pStyle"), b"pStyle");
        assert_eq!(local_name(b"w:pStyle"), b"pStyle");
        assert_eq!(local_name(b"dc:title"), b"title");
        assert_eq!(local_name(b""), b"");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some("&".to_string()));
        assert_eq!(resolve_entity("nbsp"), Some(" ".to_string()));
        assert_eq!(resolve_entity("#65"), Some("A".to_string()));
        assert_eq!(resolve_entity("#x2019"), Some("\u{2019}".to_string()));
        assert_eq!(resolve_entity("invalid"), None);
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("a &amp; b"), "a & b");
        assert_eq!(unescape_entities("ch%201.xhtml"), "ch%201.xhtml");
        assert_eq!(unescape_entities("AT&T"), "AT&T");
        assert_eq!(unescape_entities("&bogus; &lt;"), "&bogus; <");
    }

    #[test]
    fn test_decode_plain_text_cascade() {
        assert_eq!(decode_plain_text(b"plain ascii").unwrap(), "plain ascii");
        assert_eq!(
            decode_plain_text("caf\u{e9}".as_bytes()).unwrap(),
            "caf\u{e9}"
        );
        // Latin-1 byte 0xE9 is not valid UTF-8 on its own
        assert_eq!(decode_plain_text(b"caf\xe9").unwrap(), "caf\u{e9}");

        // UTF-16LE with BOM
        let utf16: Vec<u8> = [0xFF, 0xFE, b'h', 0, b'i', 0].to_vec();
        assert_eq!(decode_plain_text(&utf16).unwrap(), "hi");
    }

    #[test]
    fn test_decode_markup_declared_encoding() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><p>caf\xe9</p>";
        assert!(decode_markup(bytes).contains("caf\u{e9}"));
    }
}
