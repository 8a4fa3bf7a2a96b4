//! In-memory text source.

use super::{LoadFuture, TextSource};
use crate::model::{Chapter, ChapterId, LoadError};
use futures_util::future::{self, FutureExt};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Text source backed by a map of chapter id to text.
///
/// Resolves immediately. Counts resolutions and can be told to fail specific
/// chapters, which makes it the workhorse of the cache and renderer tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    texts: RefCell<HashMap<ChapterId, String>>,
    failing: RefCell<HashSet<ChapterId>>,
    resolves: Cell<usize>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from `(id, text)` pairs.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = (ChapterId, S)>,
        S: Into<String>,
    {
        let source = Self::new();
        for (id, text) in texts {
            source.insert(id, text);
        }
        source
    }

    /// Add or replace a chapter's text.
    pub fn insert(&self, id: ChapterId, text: impl Into<String>) {
        self.texts.borrow_mut().insert(id, text.into());
    }

    /// Make every subsequent resolve of `id` fail with an I/O error.
    pub fn fail(&self, id: ChapterId) {
        self.failing.borrow_mut().insert(id);
    }

    /// Stop failing `id`.
    pub fn recover(&self, id: &ChapterId) {
        self.failing.borrow_mut().remove(id);
    }

    /// Number of resolve calls made so far.
    pub fn resolve_count(&self) -> usize {
        self.resolves.get()
    }
}

impl TextSource for MemorySource {
    fn resolve(&self, chapter: &Chapter) -> LoadFuture {
        self.resolves.set(self.resolves.get() + 1);

        let result = if self.failing.borrow().contains(&chapter.id) {
            Err(LoadError::Io {
                chapter: chapter.id.clone(),
                reason: "simulated failure".to_string(),
            })
        } else {
            self.texts
                .borrow()
                .get(&chapter.id)
                .cloned()
                .ok_or_else(|| LoadError::NotFound {
                    chapter: chapter.id.clone(),
                })
        };

        future::ready(result).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    fn chapter(id: &str) -> Chapter {
        Chapter::new(ChapterId::new(id).unwrap(), id, 0)
    }

    #[test]
    fn resolves_known_text() {
        let source = MemorySource::from_texts([(ChapterId::new("a").unwrap(), "alpha")]);
        let text = source.resolve(&chapter("a")).now_or_never();
        assert_eq!(text, Some(Ok("alpha".to_string())));
        assert_eq!(source.resolve_count(), 1);
    }

    #[test]
    fn unknown_chapter_is_not_found() {
        let source = MemorySource::new();
        let result = source.resolve(&chapter("missing")).now_or_never().unwrap();
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn failing_chapter_reports_io_until_recovered() {
        let id = ChapterId::new("a").unwrap();
        let source = MemorySource::from_texts([(id.clone(), "alpha")]);
        source.fail(id.clone());
        let result = source.resolve(&chapter("a")).now_or_never().unwrap();
        assert!(matches!(result, Err(LoadError::Io { .. })));

        source.recover(&id);
        let result = source.resolve(&chapter("a")).now_or_never().unwrap();
        assert_eq!(result, Ok("alpha".to_string()));
    }
}
