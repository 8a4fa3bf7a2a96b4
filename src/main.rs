//! chapterflow - Entry Point

use chapterflow::layout::MonospaceEngine;
use chapterflow::model::{AppError, ChapterId, InvalidChapterId, Viewport};
use chapterflow::preferences::JsonPreferences;
use chapterflow::reader::{Reader, ReaderOptions};
use chapterflow::source::DirSource;
use chapterflow::view::TuiError;
use chapterflow::view_state::ScrollToOptions;
use clap::Parser;
use std::path::PathBuf;
use std::rc::Rc;
use tokio::task::LocalSet;
use tracing::info;

/// chapterflow - read a directory of chapters in the terminal
#[derive(Parser, Debug)]
#[command(name = "chapterflow")]
#[command(version)]
#[command(about = "Paginated terminal reader for long-form documents split into chapters")]
pub struct Args {
    /// Directory with one .txt or .md file per chapter, ordered by file name
    pub dir: PathBuf,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Body font size in pixels (overrides config and saved preference)
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Chapter id (file stem) to open at
    #[arg(long, value_parser = parse_chapter_id)]
    pub chapter: Option<ChapterId>,
}

fn parse_chapter_id(raw: &str) -> Result<ChapterId, InvalidChapterId> {
    ChapterId::new(raw)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = chapterflow::config::resolve(args.config.clone(), args.font_size)
        .map_err(AppError::from)?;

    let _log_guard = chapterflow::logging::init(&config.log_file_path).map_err(AppError::from)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| AppError::from(TuiError::from(e)))?;
    let local = LocalSet::new();
    local.block_on(&runtime, run(args, config))?;

    Ok(())
}

async fn run(args: Args, config: chapterflow::config::ResolvedConfig) -> Result<(), AppError> {
    let source = DirSource::new(&args.dir);
    let chapters = source.scan().map_err(|e| AppError::Document {
        path: args.dir.clone(),
        reason: e.to_string(),
    })?;
    info!(dir = ?args.dir, chapters = chapters.len(), "Document opened");

    let options = ReaderOptions {
        settings: config.engine_settings(),
        font: config.font_config(),
        viewport: Viewport::default(),
    };
    let preferences = JsonPreferences::new(config.preferences_path.clone());
    let mut reader = Reader::new(
        chapters,
        Rc::new(source),
        Rc::new(MonospaceEngine::new()),
        options,
        Box::new(preferences),
    )?;

    // An explicit size beats the saved preference.
    if let Some(size) = args.font_size {
        reader.set_font_size(size);
    }
    if let Some(id) = &args.chapter {
        reader.scroll_to_chapter_id(id, ScrollToOptions::instant())?;
    }
    reader.on_chapter_visible(|chapter| {
        if let Some(chapter) = chapter {
            info!(chapter = %chapter.id, title = %chapter.title, "Chapter visible");
        }
    });

    chapterflow::view::run_reader(reader).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        // Help returns Err with DisplayHelp, which is success
        let result = Args::try_parse_from(["chapterflow", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let err = Args::try_parse_from(["chapterflow", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_dir_is_required() {
        let err = Args::try_parse_from(["chapterflow"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["chapterflow", "book"]);
        assert_eq!(args.dir, PathBuf::from("book"));
        assert_eq!(args.config, None);
        assert_eq!(args.font_size, None);
        assert_eq!(args.chapter, None);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "chapterflow",
            "book",
            "--config",
            "/tmp/c.toml",
            "--font-size",
            "22",
            "--chapter",
            "003_storm",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(args.font_size, Some(22.0));
        assert_eq!(args.chapter, Some(ChapterId::new("003_storm").unwrap()));
    }

    #[test]
    fn test_blank_chapter_is_rejected() {
        let result = Args::try_parse_from(["chapterflow", "book", "--chapter", " "]);
        assert!(result.is_err());
    }

    #[test]
    fn test_font_size_must_be_numeric() {
        let result = Args::try_parse_from(["chapterflow", "book", "--font-size", "big"]);
        assert!(result.is_err());
    }
}
