//! Paginated renderer - one page at a time with seamless boundary crossing.
//!
//! Position is a [`ScrollState`]: a page pointer plus a sub-page offset. A frame draws
//! the previous, current and next page stacked vertically, shifted up by the offset,
//! so scrolling across a page or chapter boundary never shows a gap.
//!
//! Pages come from the [`LayoutCache`](crate::cache::LayoutCache). Whenever the
//! pointer moves, the current chapter and its immediate neighbours are requested in
//! the background. A layout primitive failure is fatal: it is raised once through the
//! [`FatalSignal`] and no further layout work is issued. Text load failures are not:
//! the chapter shows a failed placeholder and is retried after it leaves the
//! `current ± 1` window and re-enters it.

use super::context::RenderContext;
use super::navigation::ScrollSurface;
use super::pointer::{self, clamp_pointer, PageCounts, PageGeometry, PagePointer, ScrollState};
use super::scene::{BlockContent, Scene, SceneBlock};
use crate::model::{ComputeError, ContentBox, FontConfig, LayoutError, LayoutSignature, Viewport};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// One-shot channel for the first fatal layout error of a session.
///
/// Cheap to clone: clones share one slot.
#[derive(Debug, Clone, Default)]
pub struct FatalSignal {
    slot: Rc<RefCell<Option<LayoutError>>>,
}

impl FatalSignal {
    /// Create an unraised signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `err`. Only the first error is kept; returns false if already raised.
    pub fn raise(&self, err: LayoutError) -> bool {
        let mut slot = self.slot.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    /// True once any error has been raised.
    pub fn is_raised(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// The raised error, if any.
    pub fn error(&self) -> Option<LayoutError> {
        self.slot.borrow().clone()
    }
}

/// Page counts as currently known to the layout cache.
struct CachedPageCounts<'a> {
    ctx: &'a RenderContext,
    signature: &'a LayoutSignature,
}

impl PageCounts for CachedPageCounts<'_> {
    fn chapter_count(&self) -> usize {
        self.ctx.chapter_count()
    }

    fn page_count(&self, index: usize) -> Option<usize> {
        let chapter = self.ctx.chapter(index)?;
        self.ctx.layout.page_count(&chapter.id, self.signature)
    }
}

/// Reading position to restore once a chapter is re-paginated.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingRestore {
    chapter_index: usize,
    progress: f32,
}

/// Renders the document one page at a time.
#[derive(Debug)]
pub struct PaginatedRenderer {
    ctx: RenderContext,
    viewport: Viewport,
    font: FontConfig,
    state: ScrollState,
    fatal: FatalSignal,
    load_failures: Rc<RefCell<HashSet<usize>>>,
    restore: Option<PendingRestore>,
}

impl PaginatedRenderer {
    /// Mount at the first page and request the first chapters.
    ///
    /// Must be called inside a `LocalSet`.
    pub fn new(ctx: RenderContext, viewport: Viewport, font: FontConfig, fatal: FatalSignal) -> Self {
        let renderer = Self {
            ctx,
            viewport,
            font,
            state: ScrollState::default(),
            fatal,
            load_failures: Rc::new(RefCell::new(HashSet::new())),
            restore: None,
        };
        renderer.request_window();
        renderer.ctx.scheduler.request_redraw();
        renderer
    }

    /// Current position.
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current font.
    pub fn font(&self) -> &FontConfig {
        &self.font
    }

    /// Index of the chapter the current page belongs to.
    pub fn current_chapter_index(&self) -> Option<usize> {
        (self.ctx.chapter_count() > 0).then_some(self.state.pointer.chapter_index)
    }

    /// Box every page is laid out into.
    pub fn content_box(&self) -> ContentBox {
        self.viewport.content_box(self.ctx.settings.padding)
    }

    /// Signature of the current viewport and font.
    pub fn signature(&self) -> LayoutSignature {
        LayoutSignature::new(self.content_box(), &self.font)
    }

    fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.content_box().height)
            .with_preserve(self.ctx.settings.preserve_px(&self.font))
    }

    /// Pages known for chapter `index` under the current signature.
    pub fn page_count(&self, index: usize) -> Option<usize> {
        let signature = self.signature();
        CachedPageCounts {
            ctx: &self.ctx,
            signature: &signature,
        }
        .page_count(index)
    }

    /// Scroll by `delta` pixels.
    pub fn scroll_by(&mut self, delta: f32) {
        let signature = self.signature();
        let counts = CachedPageCounts {
            ctx: &self.ctx,
            signature: &signature,
        };
        let next = pointer::scroll_by(self.state, delta, self.geometry(), &counts);
        self.move_to(next);
    }

    /// Jump to the first page of chapter `index`, clamped to the last chapter.
    pub fn scroll_to_chapter(&mut self, index: usize) {
        self.restore = None;
        self.move_to(ScrollState::at(index, 0, 0.0));
    }

    /// Jump to the first page of the document.
    pub fn scroll_to_top(&mut self) {
        self.scroll_to_chapter(0);
    }

    fn move_to(&mut self, next: ScrollState) {
        let signature = self.signature();
        let counts = CachedPageCounts {
            ctx: &self.ctx,
            signature: &signature,
        };
        let next = ScrollState {
            pointer: clamp_pointer(next.pointer, &counts),
            ..next
        };
        if next == self.state {
            return;
        }
        let previous = self.state.pointer;
        self.state = next;
        if previous != next.pointer {
            debug!(
                chapter = next.pointer.chapter_index,
                page = next.pointer.page_index,
                "Page pointer moved"
            );
            if previous.chapter_index != next.pointer.chapter_index {
                self.forget_failures_outside_window();
            }
            self.request_window();
        }
        self.ctx.scheduler.request_redraw();
    }

    /// Change the viewport. Old layouts become unreachable; the position is restored
    /// proportionally once the current chapter is re-paginated.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.remember_progress();
        self.viewport = viewport;
        self.reset_to_chapter_start();
    }

    /// Change the font. Clears the layout cache and forces a redraw; the position is
    /// restored proportionally once the current chapter is re-paginated.
    pub fn set_font(&mut self, font: FontConfig) {
        if font == self.font {
            return;
        }
        self.remember_progress();
        self.font = font;
        self.ctx.layout.clear();
        self.reset_to_chapter_start();
    }

    fn remember_progress(&mut self) {
        let pointer = self.state.pointer;
        if let Some(count) = self.page_count(pointer.chapter_index) {
            let progress = pointer.page_index as f32 / count.max(1) as f32;
            self.restore = Some(PendingRestore {
                chapter_index: pointer.chapter_index,
                progress,
            });
        }
    }

    fn reset_to_chapter_start(&mut self) {
        self.state.pointer.page_index = 0;
        self.state.offset = 0.0;
        self.request_window();
        self.ctx.scheduler.request_redraw();
    }

    /// Apply cache fills: restore a pending proportional position, re-clamp the
    /// pointer against the page counts now known, and re-request any window chapter
    /// that has no pages under the current signature.
    pub fn refresh(&mut self) {
        if let Some(restore) = self.restore {
            if restore.chapter_index != self.state.pointer.chapter_index {
                self.restore = None;
            } else if let Some(count) = self.page_count(restore.chapter_index) {
                let page = ((restore.progress * count as f32).floor() as usize).min(count.saturating_sub(1));
                debug!(chapter = restore.chapter_index, page, "Restored reading position");
                self.restore = None;
                self.state.pointer.page_index = page;
                self.ctx.scheduler.request_redraw();
            }
        }

        let signature = self.signature();
        let counts = CachedPageCounts {
            ctx: &self.ctx,
            signature: &signature,
        };
        let clamped = clamp_pointer(self.state.pointer, &counts);
        let max_offset = (self.content_box().height - 1.0).max(0.0);
        let offset = self.state.offset.clamp(0.0, max_offset);
        if clamped != self.state.pointer || offset != self.state.offset {
            self.state = ScrollState {
                pointer: clamped,
                offset,
            };
            self.ctx.scheduler.request_redraw();
        }
        self.request_window();
    }

    fn window(&self) -> std::ops::RangeInclusive<usize> {
        let current = self.state.pointer.chapter_index;
        let last = self.ctx.chapter_count().saturating_sub(1);
        current.saturating_sub(1)..=(current + 1).min(last)
    }

    fn forget_failures_outside_window(&self) {
        let window = self.window();
        self.load_failures
            .borrow_mut()
            .retain(|index| window.contains(index));
    }

    fn request_window(&self) {
        if self.ctx.chapter_count() == 0 {
            return;
        }
        for index in self.window() {
            self.request_pagination(index);
        }
    }

    fn request_pagination(&self, index: usize) {
        if self.fatal.is_raised() || self.load_failures.borrow().contains(&index) {
            return;
        }
        let Some(chapter) = self.ctx.chapter(index) else {
            return;
        };
        let signature = self.signature();
        if self.ctx.layout.page_count(&chapter.id, &signature).is_some() {
            return;
        }
        let Some(guard) = self.ctx.layout.try_begin(&chapter.id, &signature) else {
            return;
        };

        debug!(chapter = %chapter.id, "Requesting pagination");
        let chapters = self.ctx.chapters.clone();
        let layout = self.ctx.layout.clone();
        let scheduler = self.ctx.scheduler.clone();
        let failures = self.load_failures.clone();
        let fatal = self.fatal.clone();
        let content_box = self.content_box();
        let font = self.font.clone();

        self.ctx.scheduler.spawn(async move {
            let chapter = &chapters[index];
            let result = layout.compute(chapter, content_box, &font).await;
            drop(guard);
            match result {
                Ok(pages) => {
                    debug!(chapter = %chapter.id, pages = pages.len(), "Pagination ready");
                }
                Err(ComputeError::Load(err)) => {
                    warn!(chapter = %chapter.id, error = %err, "Chapter unavailable, showing placeholder");
                    failures.borrow_mut().insert(index);
                }
                Err(ComputeError::Layout(err)) => {
                    error!(chapter = %chapter.id, error = %err, "Layout primitive failed");
                    fatal.raise(err);
                }
            }
            scheduler.request_redraw();
        });
    }

    /// Read-only scroll geometry.
    pub fn surface(&self) -> ScrollSurface {
        ScrollSurface::Paginated {
            pointer: self.state.pointer,
            offset: self.state.offset,
            content_height: self.content_box().height,
        }
    }

    /// Previous, current and next page placed around the offset.
    pub fn scene(&self) -> Scene {
        let mut scene = Scene::default();
        if self.ctx.chapter_count() == 0 {
            return scene;
        }

        let signature = self.signature();
        let counts = CachedPageCounts {
            ctx: &self.ctx,
            signature: &signature,
        };
        let height = self.content_box().height;
        let current = self.state.pointer;
        let offset = self.state.offset;

        if let Some((previous, _)) = pointer::prev_page(current, &counts) {
            scene.blocks.push(self.page_block(previous, -height - offset, &signature));
        }
        scene.blocks.push(self.page_block(current, -offset, &signature));
        if let Some((next, _)) = pointer::next_page(current, &counts) {
            scene.blocks.push(self.page_block(next, height - offset, &signature));
        }
        scene
    }

    fn page_block(&self, at: PagePointer, top: f32, signature: &LayoutSignature) -> SceneBlock {
        let page = self
            .ctx
            .chapter(at.chapter_index)
            .and_then(|chapter| self.ctx.layout.get(&chapter.id, signature))
            .and_then(|pages| pages.get(at.page_index).cloned());

        let content = match page {
            Some(page) => BlockContent::Tokens(page.tokens().to_vec()),
            None if self.load_failures.borrow().contains(&at.chapter_index) => BlockContent::Failed,
            None => BlockContent::Loading,
        };

        SceneBlock {
            chapter_index: at.chapter_index,
            page_index: Some(at.page_index),
            top,
            content,
        }
    }
}
