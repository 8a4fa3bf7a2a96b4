//! LRU cache of resolved chapter text with in-flight de-duplication.

use crate::model::{Chapter, ChapterId, LoadError};
use crate::source::TextSource;
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use lru::LruCache;
use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::rc::{Rc, Weak};
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome shared by every waiter of one text request.
pub type TextResult = Result<Rc<str>, LoadError>;

type InFlight = Shared<LocalBoxFuture<'static, TextResult>>;

/// A settled cache entry.
#[derive(Debug, Clone)]
pub struct TextCacheEntry {
    /// Resolved chapter text.
    pub text: Rc<str>,
    /// Last time the entry was read or inserted.
    pub last_accessed_at: Instant,
}

struct TextCacheInner {
    source: Rc<dyn TextSource>,
    entries: RefCell<LruCache<ChapterId, TextCacheEntry>>,
    in_flight: RefCell<HashMap<ChapterId, InFlight>>,
}

/// Bounded least-recently-used store of chapter text.
///
/// Cheap to clone: clones share one store. Only this type mutates its entries.
///
/// # Invariants
/// - `len() <= capacity()` after every operation
/// - at most one outstanding source request per chapter
/// - eviction only removes settled entries, never in-flight requests
#[derive(Clone)]
pub struct TextCache {
    inner: Rc<TextCacheInner>,
}

impl TextCache {
    /// Create a cache over `source`. A capacity of 0 is treated as 1.
    pub fn new(source: Rc<dyn TextSource>, capacity: usize) -> Self {
        Self {
            inner: Rc::new(TextCacheInner {
                source,
                entries: RefCell::new(LruCache::new(non_zero(capacity))),
                in_flight: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Settled text for `id`, touching its recency.
    pub fn get(&self, id: &ChapterId) -> Option<Rc<str>> {
        let mut entries = self.inner.entries.borrow_mut();
        let entry = entries.get_mut(id)?;
        entry.last_accessed_at = Instant::now();
        Some(entry.text.clone())
    }

    /// True when `id` is settled in the cache. Does not touch recency.
    pub fn contains(&self, id: &ChapterId) -> bool {
        self.inner.entries.borrow().contains(id)
    }

    /// True while a source request for `id` is outstanding.
    pub fn is_loading(&self, id: &ChapterId) -> bool {
        self.inner.in_flight.borrow().contains_key(id)
    }

    /// Last access time of a settled entry.
    pub fn last_accessed(&self, id: &ChapterId) -> Option<Instant> {
        self.inner
            .entries
            .borrow()
            .peek(id)
            .map(|entry| entry.last_accessed_at)
    }

    /// Resolve `chapter`'s text, loading it through the source if needed.
    ///
    /// Hits return immediately and touch recency. Concurrent calls for a chapter that
    /// is already loading await the same request and receive the same value. The
    /// request is registered eagerly, before the returned future is first polled.
    pub fn ensure(&self, chapter: &Chapter) -> LocalBoxFuture<'static, TextResult> {
        if let Some(text) = self.get(&chapter.id) {
            debug!(chapter = %chapter.id, "Text cache hit");
            return futures_util::future::ready(Ok(text)).boxed_local();
        }

        if let Some(pending) = self.inner.in_flight.borrow().get(&chapter.id) {
            debug!(chapter = %chapter.id, "Joining in-flight text request");
            return pending.clone().boxed_local();
        }

        debug!(chapter = %chapter.id, "Text cache miss, resolving");
        let request = self.inner.source.resolve(chapter);
        let weak: Weak<TextCacheInner> = Rc::downgrade(&self.inner);
        let id = chapter.id.clone();

        let shared = async move {
            let result: TextResult = request.await.map(Rc::from);
            if let Some(inner) = weak.upgrade() {
                TextCache { inner }.settle(&id, &result);
            }
            result
        }
        .boxed_local()
        .shared();

        self.inner
            .in_flight
            .borrow_mut()
            .insert(chapter.id.clone(), shared.clone());
        shared.boxed_local()
    }

    fn settle(&self, id: &ChapterId, result: &TextResult) {
        self.inner.in_flight.borrow_mut().remove(id);
        match result {
            Ok(text) => {
                let entry = TextCacheEntry {
                    text: text.clone(),
                    last_accessed_at: Instant::now(),
                };
                if let Some((evicted, _)) = self.inner.entries.borrow_mut().push(id.clone(), entry) {
                    if &evicted != id {
                        debug!(chapter = %evicted, "Evicted chapter text");
                    }
                }
                debug!(chapter = %id, chars = text.chars().count(), "Chapter text cached");
            }
            Err(err) => {
                warn!(chapter = %id, error = %err, "Chapter text failed to load");
            }
        }
    }

    /// Evict least-recently-used entries beyond the capacity. Returns how many.
    pub fn prune(&self) -> usize {
        let mut entries = self.inner.entries.borrow_mut();
        let capacity = entries.cap().get();
        let mut evicted = 0;
        while entries.len() > capacity {
            if entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    /// Change the capacity, evicting least-recently-used entries that no longer fit.
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = non_zero(capacity);
        let mut entries = self.inner.entries.borrow_mut();
        if entries.cap() != capacity {
            debug!(from = entries.cap().get(), to = capacity.get(), "Resizing text cache");
            entries.resize(capacity);
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.entries.borrow().cap().get()
    }

    /// Number of settled entries.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// True when no entries are settled.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Settled chapter ids, most recently used first.
    pub fn ids(&self) -> Vec<ChapterId> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl std::fmt::Debug for TextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("in_flight", &self.inner.in_flight.borrow().len())
            .finish()
    }
}

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use futures_util::FutureExt;

    fn id(s: &str) -> ChapterId {
        ChapterId::new(s).expect("valid id")
    }

    fn chapter(s: &str) -> Chapter {
        Chapter::new(id(s), s.to_uppercase(), 0)
    }

    fn setup(ids: &[&str], capacity: usize) -> (Rc<MemorySource>, TextCache) {
        let source = Rc::new(MemorySource::from_texts(
            ids.iter().map(|s| (id(s), format!("text of {s}"))),
        ));
        let cache = TextCache::new(source.clone(), capacity);
        (source, cache)
    }

    fn ensure_now(cache: &TextCache, s: &str) -> TextResult {
        cache
            .ensure(&chapter(s))
            .now_or_never()
            .expect("memory source resolves immediately")
    }

    #[test]
    fn ensure_loads_and_caches() {
        let (source, cache) = setup(&["a"], 4);
        assert_eq!(ensure_now(&cache, "a").unwrap().as_ref(), "text of a");
        assert!(cache.contains(&id("a")));
        assert_eq!(cache.get(&id("a")).as_deref(), Some("text of a"));
        ensure_now(&cache, "a").unwrap();
        assert_eq!(source.resolve_count(), 1, "second ensure must hit the cache");
    }

    #[test]
    fn get_on_missing_is_none() {
        let (_source, cache) = setup(&["a"], 4);
        assert!(cache.get(&id("a")).is_none());
    }

    #[test]
    fn lru_order_a_b_c_a_keeps_c_and_a() {
        let (_source, cache) = setup(&["a", "b", "c"], 2);
        for s in ["a", "b", "c", "a"] {
            ensure_now(&cache, s).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.ids(), vec![id("a"), id("c")]);
        assert!(!cache.contains(&id("b")));
    }

    #[test]
    fn concurrent_ensure_shares_one_request() {
        let (source, cache) = setup(&["a"], 4);
        let first = cache.ensure(&chapter("a"));
        let second = cache.ensure(&chapter("a"));
        assert!(cache.is_loading(&id("a")));

        let (r1, r2) = futures_util::future::join(first, second)
            .now_or_never()
            .unwrap();
        assert_eq!(source.resolve_count(), 1);
        assert_eq!(r1.unwrap(), r2.unwrap());
        assert!(!cache.is_loading(&id("a")));
    }

    #[test]
    fn failed_load_leaves_nothing_behind() {
        let (source, cache) = setup(&["a"], 4);
        source.fail(id("a"));
        assert!(ensure_now(&cache, "a").is_err());
        assert!(!cache.contains(&id("a")));
        assert!(!cache.is_loading(&id("a")));

        source.recover(&id("a"));
        assert!(ensure_now(&cache, "a").is_ok());
        assert_eq!(source.resolve_count(), 2);
    }

    #[test]
    fn shrinking_capacity_evicts_oldest() {
        let (_source, cache) = setup(&["a", "b", "c"], 3);
        for s in ["a", "b", "c"] {
            ensure_now(&cache, s).unwrap();
        }
        cache.set_capacity(1);
        assert_eq!(cache.ids(), vec![id("c")]);
        assert_eq!(cache.prune(), 0);
    }

    #[test]
    fn eviction_spares_in_flight_requests() {
        let (source, cache) = setup(&["a", "b"], 1);
        let pending = cache.ensure(&chapter("a"));
        ensure_now(&cache, "b").unwrap();
        cache.set_capacity(1);
        assert!(cache.is_loading(&id("a")));

        assert!(pending.now_or_never().unwrap().is_ok());
        assert_eq!(cache.ids(), vec![id("a")]);
        assert_eq!(source.resolve_count(), 2);
    }

    #[test]
    fn zero_capacity_is_treated_as_one() {
        let (_source, cache) = setup(&["a"], 0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn get_touches_last_accessed() {
        let (_source, cache) = setup(&["a"], 2);
        ensure_now(&cache, "a").unwrap();
        let before = cache.last_accessed(&id("a")).unwrap();
        cache.get(&id("a"));
        let after = cache.last_accessed(&id("a")).unwrap();
        assert!(after >= before);
    }
}
