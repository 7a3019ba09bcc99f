//! In-memory ZIP access for DOCX and EPUB.

use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};

/// A ZIP archive over borrowed bytes. Entries are decompressed into owned
/// buffers; nothing touches the filesystem.
pub struct Archive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Archive<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// Read an entry by exact path, falling back to a case-insensitive match.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let name = match self.zip.index_for_name(path) {
            Some(_) => path.to_string(),
            None => self
                .zip
                .file_names()
                .find(|n| n.eq_ignore_ascii_case(path))
                .map(str::to_string)
                .ok_or_else(|| Error::MissingEntry(path.to_string()))?,
        };

        let mut file = match self.zip.by_name(&name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(Error::MissingEntry(path.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read an entry, treating absence as `None` and other failures as errors.
    pub fn read_optional(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.read(path) {
            Ok(data) => Ok(Some(data)),
            Err(Error::MissingEntry(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.zip.index_for_name(path).is_some()
            || self.zip.file_names().any(|n| n.eq_ignore_ascii_case(path))
    }
}

/// Resolve `href` against the directory `base` ("OEBPS/"), dropping any
/// fragment, percent-decoding, and normalising `.`/`..` segments.
pub fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let href = percent_encoding::percent_decode_str(href).decode_utf8_lossy();

    let joined = if href.starts_with('/') {
        href.trim_start_matches('/').to_string()
    } else {
        format!("{base}{href}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Directory portion of an archive path including the trailing slash, or "".
pub fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[..=i].to_string(),
        None => String::new(),
    }
}
