//! Streaming XML as a lazy sequence of simplified events.
//!
//! Format readers (container.xml, OPF, NCX, EPUB nav, DOCX body) are
//! [`XmlReducer`]s: accumulator structs folded over [`XmlEvents`]. Element and
//! attribute names are reported by local name (`w:pStyle` → `pStyle`), empty
//! elements appear as a start immediately followed by an end, and entity
//! references are resolved into text.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::Result;
use crate::util::{local_name, resolve_entity, unescape_entities};

/// An element start with its attributes, names in local form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl XmlElement {
    /// Value of the attribute with local name `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(local_name(start.name().as_ref())).into_owned();
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
                let raw = String::from_utf8_lossy(attr.value.as_ref());
                let value = unescape_entities(&raw).into_owned();
                (key, value)
            })
            .collect();
        Self { name, attributes }
    }
}

/// One step of a document walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    Start(XmlElement),
    End(String),
    Text(Cow<'a, str>),
}

/// Lazy iterator of [`XmlEvent`]s over a string.
pub struct XmlEvents<'a> {
    reader: Reader<&'a [u8]>,
    pending_end: Option<String>,
    finished: bool,
}

impl<'a> XmlEvents<'a> {
    /// Iterate `content`. With `trim_text`, whitespace-only text between
    /// elements is skipped.
    pub fn new(content: &'a str, trim_text: bool) -> Self {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(trim_text);
        Self {
            reader,
            pending_end: None,
            finished: false,
        }
    }
}

impl<'a> Iterator for XmlEvents<'a> {
    type Item = Result<XmlEvent<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(name) = self.pending_end.take() {
            return Some(Ok(XmlEvent::End(name)));
        }
        if self.finished {
            return None;
        }

        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => return Some(Ok(XmlEvent::Start(XmlElement::from_start(&e)))),
                Ok(Event::Empty(e)) => {
                    let element = XmlElement::from_start(&e);
                    self.pending_end = Some(element.name.clone());
                    return Some(Ok(XmlEvent::Start(element)));
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).into_owned();
                    return Some(Ok(XmlEvent::End(name)));
                }
                Ok(Event::Text(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    return Some(Ok(XmlEvent::Text(Cow::Owned(text))));
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    return Some(Ok(XmlEvent::Text(Cow::Owned(text))));
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        return Some(Ok(XmlEvent::Text(Cow::Owned(resolved))));
                    }
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                _ => {}
            }
        }
    }
}

/// A per-format state machine folded over a document's events.
pub trait XmlReducer {
    type Output;

    /// Whether whitespace-only text nodes are skipped.
    const TRIM_TEXT: bool = true;

    fn step(&mut self, event: XmlEvent<'_>);

    fn finish(self) -> Result<Self::Output>;
}

/// Fold `reducer` over every event in `content`, stopping at the first
/// malformed construct.
pub fn reduce<R: XmlReducer>(content: &str, reducer: R) -> Result<R::Output> {
    let reducer = XmlEvents::new(content, R::TRIM_TEXT).try_fold(reducer, |mut acc, event| {
        acc.step(event?);
        Ok::<_, crate::Error>(acc)
    })?;
    reducer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_element_becomes_start_and_end() {
        let events: Vec<_> = XmlEvents::new(r#"<a><b x="1"/></a>"#, true)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(events.len(), 4);
        match &events[1] {
            XmlEvent::Start(el) => {
                assert!(el.is("b"));
                assert_eq!(el.attr("x"), Some("1"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events[2], XmlEvent::End("b".to_string()));
    }

    #[test]
    fn test_namespaced_names_are_local() {
        let events: Vec<_> = XmlEvents::new(r#"<w:p><w:pStyle w:val="Title"/></w:p>"#, true)
            .collect::<Result<_>>()
            .unwrap();
        match &events[1] {
            XmlEvent::Start(el) => {
                assert_eq!(el.name, "pStyle");
                assert_eq!(el.attr("val"), Some("Title"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_entities_resolve_into_text() {
        let text: String = XmlEvents::new("<t>Fish &amp; chips</t>", false)
            .filter_map(|e| match e {
                Ok(XmlEvent::Text(t)) => Some(t.into_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Fish & chips");
    }

    #[test]
    fn test_attribute_entities() {
        let events: Vec<_> = XmlEvents::new(r#"<a href="x.html?a=1&amp;b=2"/>"#, true)
            .collect::<Result<_>>()
            .unwrap();
        match &events[0] {
            XmlEvent::Start(el) => assert_eq!(el.attr("href"), Some("x.html?a=1&b=2")),
            other => panic!("unexpected {other:?}"),
        }
    }

    struct CountElements(usize);

    impl XmlReducer for CountElements {
        type Output = usize;

        fn step(&mut self, event: XmlEvent<'_>) {
            if let XmlEvent::Start(_) = event {
                self.0 += 1;
            }
        }

        fn finish(self) -> Result<usize> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_reduce() {
        assert_eq!(reduce("<a><b/><c>t</c></a>", CountElements(0)).unwrap(), 3);
    }

    #[test]
    fn test_reduce_reports_malformed_xml() {
        assert!(reduce("<a><b></a>", CountElements(0)).is_err());
    }
}
