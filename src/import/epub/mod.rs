//! EPUB import.
//!
//! The spine is walked in reading order; every content document that still
//! has words after HTML stripping becomes one chapter. Chapter titles come
//! from the NCX, or from the EPUB 3 navigation document when the NCX yields
//! none, or default to "Chapter N" counting emitted chapters only.

mod package;

pub use package::{ContainerReducer, NavReducer, NcxReducer, Package, PackageReducer, TocLink};

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::Result;
use crate::model::{NavigationKind, ParseResult};
use crate::navigation::{Anchor, NavigationBuilder};
use crate::text::{count_words, strip_html};
use crate::util::decode_markup;
use crate::xml::{self, XmlReducer};

use super::{Archive, Extractor, parent_dir, resolve_href};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const CONVENTIONAL_NCX: &[&str] = &["toc.ncx", "content.ncx"];

/// Separator placed between chapter texts.
const CHAPTER_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, Default)]
pub struct EpubExtractor;

impl Extractor for EpubExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ParseResult> {
        let mut archive = Archive::new(bytes)?;

        let container = archive.read(CONTAINER_PATH)?;
        let opf_path = xml::reduce(&decode_markup(&container), ContainerReducer::default())?;
        let opf_dir = parent_dir(&opf_path);

        let opf = archive.read(&opf_path)?;
        let package = xml::reduce(&decode_markup(&opf), PackageReducer::default())?;
        debug!(
            "epub: {} manifest items, {} spine entries",
            package.manifest.len(),
            package.spine.len()
        );

        let titles = chapter_titles(&mut archive, &package, &opf_dir);

        let mut texts = Vec::new();
        let mut anchors = Vec::new();
        let mut words = 0;

        for idref in &package.spine {
            let Some(item) = package.manifest.get(idref) else {
                warn!("epub: spine references unknown manifest id {idref}");
                continue;
            };
            if item.media_type.starts_with("image/") {
                continue;
            }

            let path = resolve_href(&opf_dir, &item.href);
            let Some(content) = archive.read_optional(&path)? else {
                warn!("epub: missing spine document {path}");
                continue;
            };

            let text = strip_html(&decode_markup(&content));
            let count = count_words(&text);
            if count == 0 {
                debug!("epub: skipping empty spine item {path}");
                continue;
            }

            let title = titles
                .get(&path)
                .cloned()
                .unwrap_or_else(|| format!("Chapter {}", anchors.len() + 1));
            anchors.push(Anchor::new(title, words, NavigationKind::Chapter));
            words += count;
            texts.push(text);
        }

        let points = NavigationBuilder::from_anchors(anchors, words);
        Ok(ParseResult::new(texts.join(CHAPTER_SEPARATOR), points))
    }
}

/// Map of archive path to chapter title. The first entry pointing at a
/// document wins, so a part title shadows the chapters nested under it.
fn chapter_titles(archive: &mut Archive<'_>, package: &Package, opf_dir: &str) -> HashMap<String, String> {
    let mut titles = HashMap::new();

    if let Some((path, links)) = read_toc(archive, ncx_candidates(package, opf_dir), NcxReducer::default) {
        insert_links(&mut titles, &path, links);
    }
    if titles.is_empty()
        && let Some(nav) = package.nav_href()
    {
        let candidates = vec![resolve_href(opf_dir, nav)];
        if let Some((path, links)) = read_toc(archive, candidates, NavReducer::default) {
            insert_links(&mut titles, &path, links);
        }
    }

    debug!("epub: {} titled documents", titles.len());
    titles
}

fn ncx_candidates(package: &Package, opf_dir: &str) -> Vec<String> {
    let mut candidates: Vec<String> = package
        .ncx_href()
        .map(|href| resolve_href(opf_dir, href))
        .into_iter()
        .collect();
    for name in CONVENTIONAL_NCX {
        candidates.push(format!("{opf_dir}{name}"));
        candidates.push((*name).to_string());
    }
    candidates.dedup();
    candidates
}

/// Parse the first candidate present in the archive. A malformed table of
/// contents only costs the titles, never the book.
fn read_toc<R>(
    archive: &mut Archive<'_>,
    candidates: Vec<String>,
    reducer: impl Fn() -> R,
) -> Option<(String, Vec<TocLink>)>
where
    R: XmlReducer<Output = Vec<TocLink>>,
{
    for path in candidates {
        match archive.read_optional(&path) {
            Ok(Some(bytes)) => {
                return match xml::reduce(&decode_markup(&bytes), reducer()) {
                    Ok(links) => Some((path, links)),
                    Err(e) => {
                        warn!("epub: ignoring unreadable table of contents {path}: {e}");
                        None
                    }
                };
            }
            Ok(None) => {}
            Err(e) => {
                warn!("epub: cannot read {path}: {e}");
                return None;
            }
        }
    }
    None
}

fn insert_links(titles: &mut HashMap<String, String>, toc_path: &str, links: Vec<TocLink>) {
    let base = parent_dir(toc_path);
    for link in links {
        titles
            .entry(resolve_href(&base, &link.href))
            .or_insert(link.title);
    }
}
