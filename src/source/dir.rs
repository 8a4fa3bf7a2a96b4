//! Directory-backed text source: one UTF-8 file per chapter.

use super::{LoadFuture, TextSource};
use crate::model::{Chapter, ChapterId, LoadError};
use futures_util::future::FutureExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions treated as chapter files.
const CHAPTER_EXTENSIONS: &[&str] = &["txt", "md"];

/// Text source reading chapter files from a directory.
///
/// Chapter order is file-name order. Each chapter's `source_ref` is the file name
/// relative to the root, so the chapter list can be persisted and re-resolved.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the chapter files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List chapter files without reading their contents.
    ///
    /// `char_length` is approximated by the file size so heights can be estimated
    /// before any text is loaded.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be listed.
    pub fn scan(&self) -> std::io::Result<Vec<Chapter>> {
        let mut files: Vec<(String, u64)> = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let is_chapter = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CHAPTER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if !is_chapter || !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push((name.to_string(), entry.metadata()?.len()));
            }
        }
        files.sort();

        let chapters = files
            .into_iter()
            .enumerate()
            .filter_map(|(order, (name, len))| {
                let stem = Path::new(&name).file_stem()?.to_str()?.to_string();
                let id = ChapterId::new(stem.clone()).ok()?;
                Some(
                    Chapter::new(id, title_from_stem(&stem), order)
                        .with_char_length(len as usize)
                        .with_source_ref(name),
                )
            })
            .collect::<Vec<_>>();

        debug!(root = ?self.root, count = chapters.len(), "Scanned chapter directory");
        Ok(chapters)
    }
}

/// Derive a display title from a file stem: `012_the-gate` becomes `the-gate`.
fn title_from_stem(stem: &str) -> String {
    let trimmed = stem.trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | ' '));
    if trimmed.is_empty() {
        stem.to_string()
    } else {
        trimmed.replace('_', " ")
    }
}

impl TextSource for DirSource {
    fn resolve(&self, chapter: &Chapter) -> LoadFuture {
        let id = chapter.id.clone();
        let path = chapter
            .source_ref
            .as_ref()
            .map(|name| self.root.join(name));

        async move {
            let path = path.ok_or_else(|| LoadError::MissingSourceRef {
                chapter: id.clone(),
            })?;
            std::fs::read_to_string(&path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => LoadError::NotFound { chapter: id },
                _ => LoadError::Io {
                    chapter: id,
                    reason: e.to_string(),
                },
            })
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn title_strips_numeric_prefix() {
        assert_eq!(title_from_stem("012_the_gate"), "the gate");
        assert_eq!(title_from_stem("003 - Storm"), "Storm");
        assert_eq!(title_from_stem("42"), "42");
    }

    #[test]
    fn scan_orders_by_file_name_and_skips_other_files() {
        let dir = scratch_dir("chapterflow_test_scan");
        fs::write(dir.join("002-second.txt"), "bb").unwrap();
        fs::write(dir.join("001-first.txt"), "a").unwrap();
        fs::write(dir.join("cover.png"), [0u8; 4]).unwrap();

        let chapters = DirSource::new(&dir).scan().unwrap();
        let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(chapters[0].order, 0);
        assert_eq!(chapters[1].char_length, Some(2));
        assert_eq!(chapters[1].source_ref.as_deref(), Some("002-second.txt"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn resolve_reads_file_contents() {
        let dir = scratch_dir("chapterflow_test_resolve");
        fs::write(dir.join("001-only.txt"), "hello world").unwrap();

        let source = DirSource::new(&dir);
        let chapters = source.scan().unwrap();
        let text = source.resolve(&chapters[0]).now_or_never().unwrap();
        assert_eq!(text, Ok("hello world".to_string()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn resolve_without_source_ref_fails() {
        let source = DirSource::new(std::env::temp_dir());
        let chapter = Chapter::new(ChapterId::new("x").unwrap(), "x", 0);
        let result = source.resolve(&chapter).now_or_never().unwrap();
        assert!(matches!(result, Err(LoadError::MissingSourceRef { .. })));
    }

    #[test]
    fn resolve_missing_file_is_not_found() {
        let source = DirSource::new(std::env::temp_dir().join("chapterflow_test_nowhere"));
        let chapter =
            Chapter::new(ChapterId::new("x").unwrap(), "x", 0).with_source_ref("x.txt");
        let result = source.resolve(&chapter).now_or_never().unwrap();
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }
}
