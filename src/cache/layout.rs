//! Signature-keyed store of computed pages.

use super::text::TextCache;
use crate::layout::{LayoutEngine, LayoutRequest};
use crate::model::{Chapter, ChapterId, ComputeError, ContentBox, FontConfig, LayoutSignature, Page};
use lru::LruCache;
use std::cell::RefCell;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Smallest capacity that keeps the current chapter and both neighbours resident.
pub const MIN_LAYOUT_CAPACITY: usize = 3;

/// Pages computed for one chapter under one signature.
#[derive(Debug, Clone)]
pub struct LayoutCacheEntry {
    /// Signature the pages were computed under.
    pub signature: LayoutSignature,
    /// Page-broken token sequences.
    pub pages: Rc<[Page]>,
}

type LayoutKey = (ChapterId, LayoutSignature);

struct LayoutCacheInner {
    text: TextCache,
    engine: Rc<dyn LayoutEngine>,
    entries: RefCell<LruCache<LayoutKey, LayoutCacheEntry>>,
    pending: RefCell<HashSet<LayoutKey>>,
}

/// Bounded store of page-token sequences per chapter and signature.
///
/// A hit requires exact signature equality: after any viewport or font change every
/// entry computed under the old signature is unreachable, even before it is evicted.
/// Entries for different signatures of one chapter never replace each other, so a
/// computation that finishes late cannot displace the pages of the current signature.
/// Cheap to clone: clones share one store.
#[derive(Clone)]
pub struct LayoutCache {
    inner: Rc<LayoutCacheInner>,
}

/// Marks a `(chapter, signature)` computation as outstanding until dropped.
#[derive(Debug)]
pub struct PendingLayout {
    cache: Weak<LayoutCacheInner>,
    key: Option<LayoutKey>,
}

impl Drop for PendingLayout {
    fn drop(&mut self) {
        if let (Some(inner), Some(key)) = (self.cache.upgrade(), self.key.take()) {
            inner.pending.borrow_mut().remove(&key);
        }
    }
}

impl std::fmt::Debug for LayoutCacheInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCacheInner")
            .field("len", &self.entries.borrow().len())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl LayoutCache {
    /// Create a cache computing pages with `engine`, reading text through `text`.
    ///
    /// Capacity is raised to [`MIN_LAYOUT_CAPACITY`] if lower.
    pub fn new(text: TextCache, engine: Rc<dyn LayoutEngine>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(MIN_LAYOUT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Rc::new(LayoutCacheInner {
                text,
                engine,
                entries: RefCell::new(LruCache::new(capacity)),
                pending: RefCell::new(HashSet::new()),
            }),
        }
    }

    /// Pages for `id` computed under exactly `signature`. Touches recency on hit.
    pub fn get(&self, id: &ChapterId, signature: &LayoutSignature) -> Option<Rc<[Page]>> {
        self.inner
            .entries
            .borrow_mut()
            .get(&(id.clone(), signature.clone()))
            .map(|entry| entry.pages.clone())
    }

    /// Page count for `id` under `signature`, without touching recency.
    pub fn page_count(&self, id: &ChapterId, signature: &LayoutSignature) -> Option<usize> {
        self.inner
            .entries
            .borrow()
            .peek(&(id.clone(), signature.clone()))
            .map(|entry| entry.pages.len())
    }

    /// Claim the computation of `(id, signature)`.
    ///
    /// Returns `None` if it is already outstanding. The claim is released when the
    /// returned guard is dropped.
    pub fn try_begin(&self, id: &ChapterId, signature: &LayoutSignature) -> Option<PendingLayout> {
        let key = (id.clone(), signature.clone());
        if !self.inner.pending.borrow_mut().insert(key.clone()) {
            return None;
        }
        Some(PendingLayout {
            cache: Rc::downgrade(&self.inner),
            key: Some(key),
        })
    }

    /// True while `(id, signature)` is being computed.
    pub fn is_pending(&self, id: &ChapterId, signature: &LayoutSignature) -> bool {
        self.inner
            .pending
            .borrow()
            .contains(&(id.clone(), signature.clone()))
    }

    /// Compute (or reuse) the pages of `chapter` for `content_box` and `font`.
    ///
    /// Resolves the chapter's text through the text cache first. The result is stored
    /// under the signature of *this* request, so a computation that finishes after a
    /// font or viewport change lands in an unreachable entry beside the current one.
    ///
    /// # Errors
    ///
    /// [`ComputeError::Load`] when the text cannot be resolved,
    /// [`ComputeError::Layout`] when the layout primitive fails.
    pub async fn compute(
        &self,
        chapter: &Chapter,
        content_box: ContentBox,
        font: &FontConfig,
    ) -> Result<Rc<[Page]>, ComputeError> {
        let signature = LayoutSignature::new(content_box, font);
        if let Some(pages) = self.get(&chapter.id, &signature) {
            return Ok(pages);
        }

        let body = self.inner.text.ensure(chapter).await?;
        let request = LayoutRequest {
            chapter: chapter.id.clone(),
            title: chapter.title.clone(),
            body,
            content_box,
            font: font.clone(),
        };
        let pages: Rc<[Page]> = self.inner.engine.layout(request).await?.into();

        debug!(chapter = %chapter.id, pages = pages.len(), "Chapter paginated");
        self.inner.entries.borrow_mut().put(
            (chapter.id.clone(), signature.clone()),
            LayoutCacheEntry {
                signature,
                pages: pages.clone(),
            },
        );
        Ok(pages)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        debug!("Layout cache cleared");
        self.inner.entries.borrow_mut().clear();
    }

    /// Number of stored entries, reachable or not.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Text cache this layout cache reads through.
    pub fn text_cache(&self) -> &TextCache {
        &self.inner.text
    }
}

impl std::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}
