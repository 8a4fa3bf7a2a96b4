//! Error types for chapterflow.
//!
//! This module defines the engine's error taxonomy using `thiserror`. Errors compose via
//! `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level binary error wrapping configuration, logging, input and
//!   terminal failures
//! - [`LoadError`] - Text source failures (transient, per chapter)
//! - [`LayoutError`] - Layout primitive failures (fatal for paginated rendering)
//! - [`ComputeError`] - Either of the above, raised while computing a chapter's pages
//! - [`ReaderError`] - Misuse of the reader API (unknown chapter ids)
//!
//! # Error Recovery Strategy
//!
//! Load failures are **non-fatal**: the chapter stays unresolved, a placeholder is drawn,
//! and the next visibility pass retries. Layout failures are **fatal for the paginated
//! renderer only**: they are reported once and the reader switches to continuous
//! rendering for the rest of the session. Neither is ever surfaced as a panic.

use crate::model::chapter::ChapterId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to resolve a chapter's text.
///
/// `Clone` so a single in-flight request can hand the same outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The source has no text for this chapter.
    #[error("No text for chapter {chapter}")]
    NotFound {
        /// Chapter that could not be resolved.
        chapter: ChapterId,
    },

    /// The chapter carries no source reference and the source needs one.
    #[error("Chapter {chapter} has no source reference")]
    MissingSourceRef {
        /// Chapter missing its reference.
        chapter: ChapterId,
    },

    /// I/O failure while reading the chapter.
    #[error("Failed to read chapter {chapter}: {reason}")]
    Io {
        /// Chapter being read.
        chapter: ChapterId,
        /// Underlying error message.
        reason: String,
    },
}

/// Failure inside the layout primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The primitive rejected or failed on the chapter.
    #[error("Layout failed for chapter {chapter}: {reason}")]
    Failed {
        /// Chapter being laid out.
        chapter: ChapterId,
        /// Description from the primitive.
        reason: String,
    },

    /// The content box has no usable area.
    #[error("Content box {width}x{height} cannot hold text")]
    InvalidBox {
        /// Box width in pixels.
        width: String,
        /// Box height in pixels.
        height: String,
    },
}

impl LayoutError {
    /// Build an [`LayoutError::InvalidBox`] from pixel sides.
    pub fn invalid_box(width: f32, height: f32) -> Self {
        Self::InvalidBox {
            width: format!("{width}"),
            height: format!("{height}"),
        }
    }
}

/// Failure while computing a chapter's pages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// Text could not be resolved. Transient.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The layout primitive failed. Fatal for paginated rendering.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl ComputeError {
    /// True for failures that must trigger the paginated fallback.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Layout(_))
    }
}

/// Errors returned by reader navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// No chapter with this id exists in the session.
    #[error("Unknown chapter: {0}")]
    UnknownChapter(ChapterId),

    /// The session holds no chapters.
    #[error("Document has no chapters")]
    NoChapters,
}

/// Top-level application error for the `chapterflow` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Log file could not be set up.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Document directory could not be opened.
    #[error("Cannot open document at {path}: {reason}")]
    Document {
        /// Directory that was opened.
        path: PathBuf,
        /// Underlying error message.
        reason: String,
    },

    /// Reader API misuse, e.g. an unknown start chapter.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Terminal or TUI rendering error.
    #[error(transparent)]
    Terminal(#[from] crate::view::TuiError),
}
