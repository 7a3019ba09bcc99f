//! Off-thread document loading.
//!
//! Extraction and tokenization of a large book take long enough to stall
//! playback, so [`DocumentLoader::spawn`] runs them on a worker thread. The
//! owner of the [`PlaybackEngine`](crate::engine::PlaybackEngine) receives a
//! single [`PreparedDocument`] through the returned [`LoadTask`] and installs
//! it with [`load_prepared`](crate::engine::PlaybackEngine::load_prepared).

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use log::{error, info};

use crate::config::ReaderConfig;
use crate::document::ReadingDocument;
use crate::error::{Error, Result};
use crate::import::{DocumentParser, SharedContent};
use crate::text::{tokenize, word_ranges};

/// A document with its words already split.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub document: ReadingDocument,
    pub words: Vec<String>,
    /// Byte ranges of `words` in `document.content`; absent for very large
    /// documents.
    pub char_ranges: Option<Vec<Range<usize>>>,
}

impl PreparedDocument {
    pub fn new(document: ReadingDocument, paragraph_mapping_limit: usize) -> Self {
        let words = tokenize(&document.content);
        let char_ranges =
            (words.len() < paragraph_mapping_limit).then(|| word_ranges(&document.content));
        Self {
            document,
            words,
            char_ranges,
        }
    }
}

/// What to load.
#[derive(Debug, Clone)]
pub enum LoadRequest {
    File(PathBuf),
    Shared { name: String, content: SharedContent },
}

impl LoadRequest {
    fn name(&self) -> String {
        match self {
            Self::File(path) => ReadingDocument::name_for_path(path),
            Self::Shared { name, .. } => name.clone(),
        }
    }
}

/// Parses and tokenizes documents, inline or on a worker thread.
#[derive(Clone)]
pub struct DocumentLoader {
    parser: Arc<DocumentParser>,
    paragraph_mapping_limit: usize,
    words_per_minute: u32,
}

impl DocumentLoader {
    pub fn new(parser: DocumentParser, config: &ReaderConfig) -> Self {
        Self {
            parser: Arc::new(parser),
            paragraph_mapping_limit: config.playback.paragraph_mapping_limit,
            words_per_minute: config.playback.words_per_minute,
        }
    }

    /// Load on the calling thread.
    pub fn load(&self, request: LoadRequest) -> Result<PreparedDocument> {
        let name = request.name();
        let result = match request {
            LoadRequest::File(path) => self.parser.extract_file(&path)?,
            LoadRequest::Shared { content, .. } => self.parser.extract_shared(content)?,
        };
        let document = ReadingDocument::from_parse_result(name, result)
            .with_words_per_minute(self.words_per_minute);
        Ok(PreparedDocument::new(document, self.paragraph_mapping_limit))
    }

    /// Load on a worker thread.
    pub fn spawn(&self, request: LoadRequest) -> Result<LoadTask> {
        let (tx, rx) = mpsc::sync_channel(1);
        let loader = self.clone();

        thread::Builder::new()
            .name("speedread-loader".into())
            .spawn(move || {
                let result = loader.load(request);
                match &result {
                    Ok(prepared) => info!(
                        "loader: {} ready, {} words",
                        prepared.document.name,
                        prepared.words.len()
                    ),
                    Err(e) => error!("loader: {e}"),
                }
                // The receiver may have been dropped; nothing to do then.
                let _ = tx.send(result);
            })?;

        Ok(LoadTask { rx, done: false })
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(DocumentParser::default(), &ReaderConfig::default())
    }
}

/// Handle to a load running on a worker. Yields its result once.
pub struct LoadTask {
    rx: Receiver<Result<PreparedDocument>>,
    done: bool,
}

impl LoadTask {
    /// Block until the worker finishes.
    pub fn wait(self) -> Result<PreparedDocument> {
        self.rx.recv().map_err(|_| worker_gone())?
    }

    /// The result if it is ready. Returns `None` while the worker is busy
    /// and after the result was taken.
    pub fn try_take(&mut self) -> Option<Result<PreparedDocument>> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(worker_gone()))
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

fn worker_gone() -> Error {
    Error::Io(std::io::Error::other("loader worker exited without a result"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::engine::PlaybackEngine;

    #[test]
    fn test_load_shared_text() {
        let prepared = DocumentLoader::default()
            .load(LoadRequest::Shared {
                name: "clip".into(),
                content: SharedContent::Text("alpha beta gamma".into()),
            })
            .unwrap();
        assert_eq!(prepared.words, vec!["alpha", "beta", "gamma"]);
        assert_eq!(prepared.document.name, "clip");
        assert_eq!(prepared.document.total_words, 3);
        assert_eq!(prepared.char_ranges.as_deref(), Some(&[0..5, 6..10, 11..16][..]));
    }

    #[test]
    fn test_spawn_hands_result_to_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        std::fs::write(&path, "It was a dark and stormy night.").unwrap();

        let mut task = DocumentLoader::default().spawn(LoadRequest::File(path)).unwrap();
        let prepared = loop {
            if let Some(result) = task.try_take() {
                break result.unwrap();
            }
            thread::sleep(Duration::from_millis(5));
        };
        assert!(task.try_take().is_none());

        let mut engine = PlaybackEngine::default();
        let document = engine.load_prepared(prepared);
        assert_eq!(document.name, "story");
        assert_eq!(engine.total_words(), 7);
        assert_eq!(engine.navigation_points().len(), 1);
        assert_eq!(engine.char_range(6), Some(25..31));
    }

    #[test]
    fn test_spawn_reports_failure() {
        let task = DocumentLoader::default()
            .spawn(LoadRequest::File(PathBuf::from("missing.xyz")))
            .unwrap();
        assert!(matches!(task.wait(), Err(Error::UnsupportedFormat(_))));
    }
}
