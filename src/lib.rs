//! # speedread
//!
//! Turns documents into a word stream and plays it back one word at a time
//! (rapid serial visual presentation).
//!
//! ## Features
//!
//! - Extract text from TXT, RTF, HTML, DOCX, EPUB and PDF
//! - Navigation from chapters, styles, outlines or detected headings, with a
//!   fixed-size page fallback
//! - Playback pacing with punctuation pauses and ORP-anchored layout
//! - Substring word search with cyclic result navigation
//! - Background loading for large books
//!
//! ## Quick Start
//!
//! ```no_run
//! use speedread::{DocumentParser, PlaybackEngine};
//!
//! let parser = DocumentParser::default();
//! let result = parser.parse_file("book.epub").expect("readable document");
//!
//! let mut engine = PlaybackEngine::default();
//! engine.load_text(&result.text, 0, "Menlo", 1.0);
//! engine.set_navigation_points(result.navigation_points);
//!
//! let tick = engine.play().unwrap();
//! std::thread::sleep(tick.delay());
//! engine.fire_tick(tick);
//! println!("{:?}", engine.current_word());
//! ```
//!
//! ## Playback without a UI thread
//!
//! ```
//! use std::ops::ControlFlow;
//! use speedread::{PlaybackEngine, Player, PlayerExit};
//!
//! let mut engine = PlaybackEngine::default();
//! engine.load_text("Short and sweet.", 0, "Menlo", 1.0);
//!
//! let mut seen = Vec::new();
//! let exit = Player::with_sleep(|_| {}).run(&mut engine, |e| {
//!     seen.extend(e.current_word().map(str::to_string));
//!     ControlFlow::Continue(())
//! });
//! assert_eq!(exit, PlayerExit::Completed);
//! assert_eq!(seen, ["Short", "and", "sweet."]);
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod import;
pub mod loader;
pub mod model;
pub mod navigation;
pub mod text;
pub(crate) mod util;
pub(crate) mod xml;

pub use config::ReaderConfig;
pub use document::ReadingDocument;
pub use engine::{PlaybackEngine, PlaybackState, Player, PlayerExit, ScheduledTick, TickOutcome};
pub use error::{Error, Result};
pub use import::{DocumentParser, Extractor, Format, SharedContent};
pub use loader::{DocumentLoader, LoadRequest, LoadTask, PreparedDocument};
pub use model::{NavigationKind, NavigationPoint, ParseResult, SearchResult, WordLayoutData};
pub use navigation::NavigationBuilder;
pub use text::tokenize;
