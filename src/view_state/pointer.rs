//! Page pointer and the paginated scroll algorithm.
//!
//! The paginated renderer tracks its position as a [`PagePointer`] plus a sub-page
//! offset in pixels. [`scroll_by`] moves that position by a pixel delta, walking page
//! and chapter boundaries one at a time. It is a pure function of its inputs so it can
//! be tested and benchmarked without a renderer.

/// Position of the current page. Orders by reading position.
///
/// # Invariants
/// - `chapter_index < chapter_count`
/// - `page_index < page_count(chapter_index)`, or `0` when the count is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PagePointer {
    /// Index of the chapter in reading order.
    pub chapter_index: usize,
    /// Index of the page within the chapter.
    pub page_index: usize,
}

impl PagePointer {
    /// Create a pointer.
    pub fn new(chapter_index: usize, page_index: usize) -> Self {
        Self {
            chapter_index,
            page_index,
        }
    }
}

/// Pointer plus sub-page pixel offset.
///
/// # Invariants
/// - `0 <= offset < content_height`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    /// Current page.
    pub pointer: PagePointer,
    /// Pixels scrolled past the top of the current page.
    pub offset: f32,
}

impl ScrollState {
    /// State at `(chapter_index, page_index, offset)`.
    pub fn at(chapter_index: usize, page_index: usize, offset: f32) -> Self {
        Self {
            pointer: PagePointer::new(chapter_index, page_index),
            offset,
        }
    }
}

/// Geometry the scroll algorithm needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page height in pixels (the content box height).
    pub content_height: f32,
    /// Extra pixels consumed when crossing into another chapter.
    pub preserve: f32,
}

impl PageGeometry {
    /// Geometry with no preserve overlap.
    pub fn new(content_height: f32) -> Self {
        Self {
            content_height,
            preserve: 0.0,
        }
    }

    /// Set the preserve overlap in pixels.
    pub fn with_preserve(mut self, preserve: f32) -> Self {
        self.preserve = if preserve.is_finite() {
            preserve.max(0.0)
        } else {
            0.0
        };
        self
    }
}

/// Page counts per chapter, as far as they are known.
pub trait PageCounts {
    /// Number of chapters.
    fn chapter_count(&self) -> usize;

    /// Pages in chapter `index`, or `None` while it has not been paginated.
    fn page_count(&self, index: usize) -> Option<usize>;

    /// Pages in chapter `index` as seen by navigation: unknown counts as one.
    fn effective_page_count(&self, index: usize) -> usize {
        self.page_count(index).unwrap_or(1).max(1)
    }
}

impl PageCounts for [Option<usize>] {
    fn chapter_count(&self) -> usize {
        self.len()
    }

    fn page_count(&self, index: usize) -> Option<usize> {
        self.get(index).copied().flatten()
    }
}

impl PageCounts for Vec<Option<usize>> {
    fn chapter_count(&self) -> usize {
        self.len()
    }

    fn page_count(&self, index: usize) -> Option<usize> {
        self.as_slice().page_count(index)
    }
}

impl PageCounts for [usize] {
    fn chapter_count(&self) -> usize {
        self.len()
    }

    fn page_count(&self, index: usize) -> Option<usize> {
        self.get(index).copied()
    }
}

/// Result of a scroll, with whether any clamping was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOutcome {
    /// New position.
    pub state: ScrollState,
    /// True when the walk hit the document edge or the offset was clamped.
    pub clamped: bool,
}

/// Bring `pointer` within the known bounds.
pub fn clamp_pointer<P: PageCounts + ?Sized>(pointer: PagePointer, pages: &P) -> PagePointer {
    let count = pages.chapter_count();
    if count == 0 {
        return PagePointer::default();
    }
    let chapter_index = pointer.chapter_index.min(count - 1);
    let page_index = match pages.page_count(chapter_index) {
        Some(n) => pointer.page_index.min(n.max(1) - 1),
        None => 0,
    };
    PagePointer::new(chapter_index, page_index)
}

/// Page after `pointer`, and whether reaching it crosses into the next chapter.
///
/// `None` at the last page of the last chapter.
pub fn next_page<P: PageCounts + ?Sized>(pointer: PagePointer, pages: &P) -> Option<(PagePointer, bool)> {
    if pointer.page_index + 1 < pages.effective_page_count(pointer.chapter_index) {
        return Some((PagePointer::new(pointer.chapter_index, pointer.page_index + 1), false));
    }
    (pointer.chapter_index + 1 < pages.chapter_count())
        .then(|| (PagePointer::new(pointer.chapter_index + 1, 0), true))
}

/// Page before `pointer`, and whether reaching it crosses into the previous chapter.
///
/// Crossing lands on the previous chapter's last page, or page 0 when its count is
/// unknown. `None` at the first page of the first chapter.
pub fn prev_page<P: PageCounts + ?Sized>(pointer: PagePointer, pages: &P) -> Option<(PagePointer, bool)> {
    if pointer.page_index > 0 {
        return Some((PagePointer::new(pointer.chapter_index, pointer.page_index - 1), false));
    }
    if pointer.chapter_index == 0 {
        return None;
    }
    let chapter_index = pointer.chapter_index - 1;
    let last = pages.page_count(chapter_index).map_or(0, |n| n.saturating_sub(1));
    Some((PagePointer::new(chapter_index, last), true))
}

/// Move `state` by `delta` pixels.
///
/// Forward, each full page of offset advances one page; crossing into the next chapter
/// consumes an extra `preserve` pixels. Backward mirrors this. Only the walk matching
/// the sign of `delta` runs, so a crossing is never undone within one call. The walk
/// stops at either end of the document and the offset is then clamped to
/// `[0, content_height - 1]`. Non-finite deltas are ignored.
pub fn scroll_by<P: PageCounts + ?Sized>(
    state: ScrollState,
    delta: f32,
    geometry: PageGeometry,
    pages: &P,
) -> ScrollState {
    scroll(state, delta, geometry, pages).state
}

/// [`scroll_by`], also reporting whether clamping occurred.
pub fn scroll<P: PageCounts + ?Sized>(
    state: ScrollState,
    delta: f32,
    geometry: PageGeometry,
    pages: &P,
) -> ScrollOutcome {
    let mut pointer = clamp_pointer(state.pointer, pages);
    let mut clamped = pointer != state.pointer;
    let height = geometry.content_height;

    if pages.chapter_count() == 0 || !(height > 0.0) || !height.is_finite() {
        return ScrollOutcome {
            state: ScrollState { pointer, offset: 0.0 },
            clamped: true,
        };
    }

    let delta = if delta.is_finite() { delta } else { 0.0 };
    let base = if state.offset.is_finite() { state.offset } else { 0.0 };
    let mut offset = base + delta;

    while delta > 0.0 && offset >= height {
        match next_page(pointer, pages) {
            Some((next, crossed)) => {
                pointer = next;
                offset -= height + if crossed { geometry.preserve } else { 0.0 };
            }
            None => {
                clamped = true;
                break;
            }
        }
    }

    while delta < 0.0 && offset < 0.0 {
        match prev_page(pointer, pages) {
            Some((prev, crossed)) => {
                pointer = prev;
                offset += height + if crossed { geometry.preserve } else { 0.0 };
            }
            None => {
                clamped = true;
                break;
            }
        }
    }

    let max_offset = (height - 1.0).max(0.0);
    let bounded = offset.clamp(0.0, max_offset);
    clamped |= bounded != offset;

    ScrollOutcome {
        state: ScrollState {
            pointer,
            offset: bounded,
        },
        clamped,
    }
}
