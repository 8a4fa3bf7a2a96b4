//! Text source adapters.
//!
//! A text source resolves a chapter to its raw text, asynchronously, from whatever
//! backing store holds it:
//! - [`MemorySource`] for embedded documents and tests
//! - [`DirSource`] for a directory with one UTF-8 file per chapter
//!
//! Resolution may fail; the engine treats every [`LoadError`] as a transient,
//! per-chapter failure.

use crate::model::{Chapter, LoadError};
use futures_util::future::LocalBoxFuture;

pub mod dir;
pub mod memory;

pub use dir::DirSource;
pub use memory::MemorySource;

/// Future returned by [`TextSource::resolve`].
///
/// Owns everything it needs so it can outlive the call that created it.
pub type LoadFuture = LocalBoxFuture<'static, Result<String, LoadError>>;

/// Resolves chapter references to raw text.
///
/// Implementations are driven on a single thread; the returned future does not need
/// to be `Send`.
pub trait TextSource {
    /// Start resolving the text of `chapter`.
    fn resolve(&self, chapter: &Chapter) -> LoadFuture;
}
