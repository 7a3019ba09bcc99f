//! Error types for speedread operations.

use thiserror::Error;

/// Errors that can occur while extracting text or loading configuration.
///
/// Extractors surface these through [`Extractor::extract`]; the document
/// facade absorbs them into "no result" after logging.
///
/// [`Extractor::extract`]: crate::import::Extractor::extract
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Invalid DOCX: {0}")]
    InvalidDocx(String),

    #[error("Invalid RTF: {0}")]
    InvalidRtf(String),

    #[error("Missing archive entry: {0}")]
    MissingEntry(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not decode text: {0}")]
    Encoding(String),

    #[error("Invalid font: {0}")]
    Font(String),

    #[error("No readable text in document")]
    EmptyDocument,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
