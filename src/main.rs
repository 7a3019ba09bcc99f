//! speedread - RSVP reader for the terminal

use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use env_logger::Env;

use speedread::engine::clamp_wpm;
use speedread::{
    DocumentLoader, DocumentParser, LoadRequest, PlaybackEngine, Player, PlayerExit, ReaderConfig,
    ReadingDocument,
};

/// Terminal columns the ORP character is pinned to.
const TERMINAL_COLUMNS: f32 = 60.0;

#[derive(Parser)]
#[command(name = "speedread")]
#[command(version, about = "Read documents one word at a time", long_about = None)]
#[command(after_help = "EXAMPLES:
    speedread -i paper.pdf              Show word count and sections
    speedread --play --wpm 450 book.epub
    speedread -s whale moby-dick.txt    List matches with context")]
struct Cli {
    /// Input file (TXT, RTF, HTML, DOCX, EPUB or PDF)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Show word count and navigation points
    #[arg(short, long)]
    info: bool,

    /// Print the imported document as JSON
    #[arg(long, conflicts_with_all = ["info", "play"])]
    json: bool,

    /// Search for words containing QUERY
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,

    /// Case-sensitive search
    #[arg(long, requires = "search")]
    case_sensitive: bool,

    /// Play the document in the terminal
    #[arg(short, long)]
    play: bool,

    /// Words per minute
    #[arg(short, long)]
    wpm: Option<u32>,

    /// Word index to start playing from
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => ReaderConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => ReaderConfig::default(),
    };
    if let Some(wpm) = cli.wpm {
        config.playback.words_per_minute = clamp_wpm(wpm);
    }

    let loader = DocumentLoader::new(DocumentParser::new(&config), &config);
    let mut prepared = loader
        .spawn(LoadRequest::File(cli.input.clone()))
        .and_then(|task| task.wait())
        .map_err(|e| format!("could not extract content from {}: {e}", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&prepared.document).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    let mut engine = PlaybackEngine::from_config(&config);
    prepared.document.current_word_index = cli.start;
    let document = engine.load_prepared(prepared);

    if cli.info || (cli.search.is_none() && !cli.play) {
        show_info(&document);
    }
    if let Some(query) = &cli.search {
        show_search(&mut engine, query, cli.case_sensitive);
    }
    if cli.play {
        play(&mut engine, document, &config, cli.quiet);
    }
    Ok(())
}

fn show_info(document: &ReadingDocument) {
    println!("Name: {}", document.name);
    println!("Words: {}", document.total_words);
    println!("Navigation points: {}", document.navigation_points.len());
    for point in &document.navigation_points {
        let indent = "  ".repeat(usize::from(point.level.unwrap_or(1).saturating_sub(1)));
        println!(
            "  {indent}{:>8}  {} ({:?}, {} words)",
            point.word_start_index,
            point.title,
            point.kind,
            point.len()
        );
    }
}

fn show_search(engine: &mut PlaybackEngine, query: &str, case_sensitive: bool) {
    let results = engine.search(query, case_sensitive);
    println!("{} matches for {query:?}", results.len());
    for result in results {
        println!("{:>8}  {}", result.word_index, result.context_snippet);
    }
}

fn play(engine: &mut PlaybackEngine, document: ReadingDocument, config: &ReaderConfig, quiet: bool) {
    let document = Arc::new(Mutex::new(document));
    let record = Arc::clone(&document);
    engine.set_checkpoint_hook(move |index, wpm| {
        if let Ok(mut doc) = record.lock() {
            doc.apply_checkpoint(index, wpm);
        }
    });

    let anchor = (TERMINAL_COLUMNS * config.layout.anchor_ratio) as usize;
    let mut stdout = std::io::stdout();
    let exit = Player::new().run(engine, |e| {
        if let Some(layout) = e.current_layout() {
            let pad = anchor.saturating_sub(layout.orp_char_index());
            let _ = write!(stdout, "\r\x1b[2K{}{}", " ".repeat(pad), layout.word);
            let _ = stdout.flush();
        }
        ControlFlow::Continue(())
    });
    println!();

    if !quiet {
        let doc = document.lock().map(|d| d.clone());
        if let Ok(doc) = doc {
            match exit {
                PlayerExit::Completed => println!("Finished {} ({} words)", doc.name, doc.total_words),
                PlayerExit::Stopped => println!("Stopped at word {} ({:.1}%)", doc.current_word_index, doc.progress()),
                PlayerExit::Empty => println!("Nothing to play"),
            }
        }
    }
}
