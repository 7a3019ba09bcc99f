//! EPUB package documents: container.xml, the OPF, the NCX and the EPUB 3
//! navigation document, each as an [`XmlReducer`].

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::xml::{XmlEvent, XmlReducer};

/// Finds `rootfile[full-path]` in `META-INF/container.xml`.
#[derive(Default)]
pub struct ContainerReducer {
    full_path: Option<String>,
}

impl XmlReducer for ContainerReducer {
    type Output = String;

    fn step(&mut self, event: XmlEvent<'_>) {
        if let XmlEvent::Start(el) = event
            && el.is("rootfile")
            && self.full_path.is_none()
        {
            self.full_path = el.attr("full-path").map(str::to_string);
        }
    }

    fn finish(self) -> Result<String> {
        self.full_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidEpub("no rootfile found in container.xml".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == name))
    }

    pub fn is_ncx(&self) -> bool {
        self.media_type == "application/x-dtbncx+xml"
            || self.href.to_ascii_lowercase().ends_with(".ncx")
    }
}

/// Manifest, spine order and NCX reference of an OPF package.
#[derive(Debug, Default)]
pub struct Package {
    pub manifest: HashMap<String, ManifestItem>,
    /// Manifest ids in reading order.
    pub spine: Vec<String>,
    /// Manifest id named by `spine[toc]`.
    pub toc_id: Option<String>,
}

impl Package {
    /// Manifest href of the NCX: `spine[toc]` first, then any NCX item.
    pub fn ncx_href(&self) -> Option<&str> {
        self.toc_id
            .as_ref()
            .and_then(|id| self.manifest.get(id))
            .or_else(|| {
                let mut ncx: Vec<_> = self.manifest.iter().filter(|(_, item)| item.is_ncx()).collect();
                // HashMap order is unstable; pick deterministically.
                ncx.sort_by(|a, b| a.1.href.cmp(&b.1.href));
                ncx.first().map(|(_, item)| *item)
            })
            .map(|item| item.href.as_str())
    }

    /// Manifest href of the EPUB 3 navigation document.
    pub fn nav_href(&self) -> Option<&str> {
        self.manifest
            .values()
            .find(|item| item.has_property("nav"))
            .map(|item| item.href.as_str())
    }
}

#[derive(Default)]
pub struct PackageReducer {
    package: Package,
}

impl XmlReducer for PackageReducer {
    type Output = Package;

    fn step(&mut self, event: XmlEvent<'_>) {
        let XmlEvent::Start(el) = event else {
            return;
        };
        match el.name.as_str() {
            "item" => {
                let (Some(id), Some(href)) = (el.attr("id"), el.attr("href")) else {
                    return;
                };
                self.package.manifest.insert(
                    id.to_string(),
                    ManifestItem {
                        href: href.to_string(),
                        media_type: el.attr("media-type").unwrap_or_default().to_string(),
                        properties: el.attr("properties").map(str::to_string),
                    },
                );
            }
            "itemref" => {
                if let Some(idref) = el.attr("idref") {
                    self.package.spine.push(idref.to_string());
                }
            }
            "spine" => self.package.toc_id = el.attr("toc").map(str::to_string),
            _ => {}
        }
    }

    fn finish(self) -> Result<Package> {
        if self.package.spine.is_empty() {
            return Err(Error::InvalidEpub("OPF has an empty spine".into()));
        }
        Ok(self.package)
    }
}

/// A table of contents entry: title and the href it points at, as written
/// in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLink {
    pub title: String,
    pub href: String,
}

/// Flattens NCX `navPoint`s in document order.
#[derive(Default)]
pub struct NcxReducer {
    links: Vec<TocLink>,
    /// Label text of each open navPoint.
    labels: Vec<String>,
    in_text: bool,
}

impl XmlReducer for NcxReducer {
    type Output = Vec<TocLink>;

    const TRIM_TEXT: bool = false;

    fn step(&mut self, event: XmlEvent<'_>) {
        match event {
            XmlEvent::Start(el) => match el.name.as_str() {
                "navPoint" => self.labels.push(String::new()),
                "text" => self.in_text = !self.labels.is_empty(),
                "content" => {
                    // navLabel precedes content inside a navPoint
                    if let (Some(src), Some(label)) = (el.attr("src"), self.labels.last()) {
                        let title = label.split_whitespace().collect::<Vec<_>>().join(" ");
                        if !title.is_empty() {
                            self.links.push(TocLink {
                                title,
                                href: src.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            },
            XmlEvent::End(name) => match name.as_str() {
                "text" => self.in_text = false,
                "navPoint" => {
                    self.labels.pop();
                }
                _ => {}
            },
            XmlEvent::Text(text) => {
                if self.in_text
                    && let Some(label) = self.labels.last_mut()
                {
                    label.push_str(&text);
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<TocLink>> {
        Ok(self.links)
    }
}

/// Collects `<a href>` links inside the table-of-contents `<nav>` of an EPUB 3
/// navigation document. Landmark and page-list navs are ignored.
#[derive(Default)]
pub struct NavReducer {
    links: Vec<TocLink>,
    /// Depth of open `<nav>` elements; the flag marks a toc nav.
    navs: Vec<bool>,
    anchor: Option<TocLink>,
}

impl NavReducer {
    fn in_toc(&self) -> bool {
        self.navs.iter().any(|&toc| toc)
    }
}

impl XmlReducer for NavReducer {
    type Output = Vec<TocLink>;

    const TRIM_TEXT: bool = false;

    fn step(&mut self, event: XmlEvent<'_>) {
        match event {
            XmlEvent::Start(el) => match el.name.as_str() {
                "nav" => {
                    let toc = el
                        .attr("type")
                        .is_none_or(|t| t.split_ascii_whitespace().any(|t| t == "toc"));
                    self.navs.push(toc);
                }
                "a" if self.in_toc() => {
                    self.anchor = el.attr("href").map(|href| TocLink {
                        title: String::new(),
                        href: href.to_string(),
                    });
                }
                _ => {}
            },
            XmlEvent::End(name) => match name.as_str() {
                "nav" => {
                    self.navs.pop();
                }
                "a" => {
                    if let Some(mut link) = self.anchor.take() {
                        link.title = link.title.split_whitespace().collect::<Vec<_>>().join(" ");
                        if !link.title.is_empty() {
                            self.links.push(link);
                        }
                    }
                }
                _ => {}
            },
            XmlEvent::Text(text) => {
                if let Some(link) = self.anchor.as_mut() {
                    link.title.push_str(&text);
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<TocLink>> {
        Ok(self.links)
    }
}
