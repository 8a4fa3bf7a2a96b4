//! Reader facade - one navigation interface over two renderers.
//!
//! A reader starts in [`RenderMode::Paginated`]. If the layout primitive ever fails,
//! the paginated renderer raises the session's [`FatalSignal`] and the next
//! [`pump`](Reader::pump) swaps in the continuous renderer for the rest of the
//! session. The swap is one-way: nothing switches back.
//!
//! Both renderers share one [`RenderContext`], so cached text and the chapter list
//! survive the swap.

use crate::cache::{LayoutCache, TextCache};
use crate::layout::LayoutEngine;
use crate::model::{into_reading_order, Chapter, ChapterId, FontConfig, ReaderError, Viewport};
use crate::preferences::PreferenceStore;
use crate::scheduler::FrameScheduler;
use crate::source::TextSource;
use crate::view_state::{
    ContinuousRenderer, EngineSettings, FatalSignal, PaginatedRenderer, RenderContext, Scene,
    ScrollBehavior, ScrollSurface, ScrollToOptions,
};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Which renderer is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Discrete pages. The initial mode.
    Paginated,
    /// Virtualized scrolling. Entered at most once, after a fatal layout failure.
    Continuous,
}

/// Settings, font and viewport a reader starts with.
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    /// Runtime knobs.
    pub settings: EngineSettings,
    /// Initial font. The stored font size, if any, overrides `body_size`.
    pub font: FontConfig,
    /// Initial viewport.
    pub viewport: Viewport,
}

#[derive(Debug)]
enum ActiveRenderer {
    Paginated(PaginatedRenderer),
    Continuous(ContinuousRenderer),
}

impl ActiveRenderer {
    fn mode(&self) -> RenderMode {
        match self {
            Self::Paginated(_) => RenderMode::Paginated,
            Self::Continuous(_) => RenderMode::Continuous,
        }
    }

    fn current_chapter_index(&self) -> Option<usize> {
        match self {
            Self::Paginated(r) => r.current_chapter_index(),
            Self::Continuous(r) => r.current_chapter_index(),
        }
    }

    fn font(&self) -> &FontConfig {
        match self {
            Self::Paginated(r) => r.font(),
            Self::Continuous(r) => r.font(),
        }
    }

    fn viewport(&self) -> Viewport {
        match self {
            Self::Paginated(r) => r.viewport(),
            Self::Continuous(r) => r.viewport(),
        }
    }
}

type ChapterVisibleCallback = Box<dyn FnMut(Option<&Chapter>)>;

/// Entry point for embedding the engine.
///
/// Must be created and driven inside a tokio `LocalSet`: renderers spawn their
/// background work with `spawn_local`.
pub struct Reader {
    ctx: RenderContext,
    renderer: ActiveRenderer,
    fatal: FatalSignal,
    preferences: Box<dyn PreferenceStore>,
    on_chapter_visible: Option<ChapterVisibleCallback>,
    last_visible: Option<Option<usize>>,
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("mode", &self.mode())
            .field("renderer", &self.renderer)
            .field("fatal", &self.fatal)
            .finish_non_exhaustive()
    }
}

impl Reader {
    /// Create a reader over `chapters`, mounting the paginated renderer.
    ///
    /// Chapters are sorted into reading order by their `order` field.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::NoChapters`] when `chapters` is empty.
    pub fn new(
        chapters: Vec<Chapter>,
        source: Rc<dyn TextSource>,
        engine: Rc<dyn LayoutEngine>,
        options: ReaderOptions,
        preferences: Box<dyn PreferenceStore>,
    ) -> Result<Self, ReaderError> {
        if chapters.is_empty() {
            return Err(ReaderError::NoChapters);
        }
        let chapters: Rc<[Chapter]> = into_reading_order(chapters).into();
        let settings = options.settings;

        let text = TextCache::new(source, settings.text_cache_paginated);
        let layout = LayoutCache::new(text.clone(), engine, settings.layout_cache_capacity);
        let scheduler = FrameScheduler::new();

        let mut font = options.font;
        if let Some(stored) = preferences.font_size() {
            font = font.with_body_size(settings.clamp_font_size(stored));
        }

        info!(
            chapters = chapters.len(),
            font_size = font.body_size,
            "Reader created in paginated mode"
        );

        let ctx = RenderContext::new(chapters, text, layout, scheduler, settings);
        let fatal = FatalSignal::new();
        let renderer = PaginatedRenderer::new(ctx.clone(), options.viewport, font, fatal.clone());

        Ok(Self {
            ctx,
            renderer: ActiveRenderer::Paginated(renderer),
            fatal,
            preferences,
            on_chapter_visible: None,
            last_visible: None,
        })
    }

    /// Mounted renderer.
    pub fn mode(&self) -> RenderMode {
        self.renderer.mode()
    }

    /// Chapters in reading order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.ctx.chapters
    }

    /// Session text cache.
    pub fn text_cache(&self) -> &TextCache {
        &self.ctx.text
    }

    /// Session layout cache.
    pub fn layout_cache(&self) -> &LayoutCache {
        &self.ctx.layout
    }

    /// Session settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.ctx.settings
    }

    /// Session frame scheduler.
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.ctx.scheduler
    }

    /// Current font.
    pub fn font(&self) -> &FontConfig {
        self.renderer.font()
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.renderer.viewport()
    }

    /// Chapter currently being read.
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.renderer
            .current_chapter_index()
            .and_then(|index| self.ctx.chapter(index))
    }

    /// Paginated renderer, while mounted.
    pub fn paginated(&self) -> Option<&PaginatedRenderer> {
        match &self.renderer {
            ActiveRenderer::Paginated(r) => Some(r),
            ActiveRenderer::Continuous(_) => None,
        }
    }

    /// Continuous renderer, once mounted.
    pub fn continuous(&self) -> Option<&ContinuousRenderer> {
        match &self.renderer {
            ActiveRenderer::Continuous(r) => Some(r),
            ActiveRenderer::Paginated(_) => None,
        }
    }

    /// Scroll by `delta` pixels.
    pub fn scroll_by(&mut self, delta: f32) {
        match &mut self.renderer {
            ActiveRenderer::Paginated(r) => r.scroll_by(delta),
            ActiveRenderer::Continuous(r) => r.scroll_by(delta),
        }
        self.notify_chapter_visible();
    }

    /// Navigate to the start of the chapter with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownChapter`] when no chapter has this id.
    pub fn scroll_to_chapter_id(&mut self, id: &ChapterId, options: ScrollToOptions) -> Result<(), ReaderError> {
        let index = self
            .ctx
            .index_of(id)
            .ok_or_else(|| ReaderError::UnknownChapter(id.clone()))?;
        self.go_to_chapter(index, options);
        Ok(())
    }

    fn go_to_chapter(&mut self, index: usize, options: ScrollToOptions) {
        debug!(index, "Navigating to chapter");
        match &mut self.renderer {
            ActiveRenderer::Paginated(r) => r.scroll_to_chapter(index),
            ActiveRenderer::Continuous(r) => r.scroll_to_chapter(index, options),
        }
        self.notify_chapter_visible();
    }

    /// Navigate to the next (`step > 0`) or previous chapter, staying in bounds.
    pub fn step_chapter(&mut self, step: isize, options: ScrollToOptions) {
        let Some(current) = self.renderer.current_chapter_index() else {
            return;
        };
        let last = self.ctx.chapter_count().saturating_sub(1);
        let target = current.saturating_add_signed(step).min(last);
        self.go_to_chapter(target, options);
    }

    /// Navigate to the top of the document.
    pub fn scroll_to_top(&mut self, behavior: ScrollBehavior) {
        match &mut self.renderer {
            ActiveRenderer::Paginated(r) => r.scroll_to_top(),
            ActiveRenderer::Continuous(r) => r.scroll_to_top(behavior),
        }
        self.notify_chapter_visible();
    }

    /// Snapshot of the mounted renderer's scroll geometry.
    pub fn current_scroll_surface(&self) -> ScrollSurface {
        match &self.renderer {
            ActiveRenderer::Paginated(r) => r.surface(),
            ActiveRenderer::Continuous(r) => r.surface(),
        }
    }

    /// Resize the reading surface.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        match &mut self.renderer {
            ActiveRenderer::Paginated(r) => r.set_viewport(viewport),
            ActiveRenderer::Continuous(r) => r.set_viewport(viewport),
        }
    }

    /// Change the body font size (zoom). Returns the size applied after clamping.
    ///
    /// The new size is persisted; a persistence failure is logged and otherwise
    /// ignored.
    pub fn set_font_size(&mut self, size: f32) -> f32 {
        let size = self.ctx.settings.clamp_font_size(size);
        if size == self.renderer.font().body_size {
            return size;
        }
        let font = self.renderer.font().with_body_size(size);
        info!(font_size = size, "Font size changed");
        match &mut self.renderer {
            ActiveRenderer::Paginated(r) => r.set_font(font),
            ActiveRenderer::Continuous(r) => r.set_font(font),
        }
        if let Err(err) = self.preferences.set_font_size(size) {
            warn!(error = %err, "Font size not saved");
        }
        size
    }

    /// Register the callback invoked whenever the visible chapter changes.
    ///
    /// Called immediately with the current chapter.
    pub fn on_chapter_visible(&mut self, callback: impl FnMut(Option<&Chapter>) + 'static) {
        self.on_chapter_visible = Some(Box::new(callback));
        self.last_visible = None;
        self.notify_chapter_visible();
    }

    fn notify_chapter_visible(&mut self) {
        let current = self.renderer.current_chapter_index();
        if self.last_visible == Some(current) {
            return;
        }
        self.last_visible = Some(current);
        if let Some(callback) = self.on_chapter_visible.as_mut() {
            callback(current.and_then(|index| self.ctx.chapters.get(index)));
        }
    }

    /// Perform the fallback to continuous rendering if a fatal layout error was raised.
    ///
    /// Returns true on the call that performs the switch.
    pub fn pump(&mut self) -> bool {
        let ActiveRenderer::Paginated(paginated) = &self.renderer else {
            return false;
        };
        let Some(err) = self.fatal.error() else {
            return false;
        };

        let target = paginated.current_chapter_index().unwrap_or(0);
        let viewport = paginated.viewport();
        let font = paginated.font().clone();
        error!(error = %err, chapter = target, "Paginated rendering failed, switching to continuous mode");

        self.ctx
            .text
            .set_capacity(self.ctx.settings.text_cache_continuous);
        let continuous = ContinuousRenderer::new(self.ctx.clone(), viewport, font, target);
        self.renderer = ActiveRenderer::Continuous(continuous);
        self.ctx.scheduler.request_redraw();
        info!(mode = ?RenderMode::Continuous, "Renderer switched");
        true
    }

    /// Produce the next frame.
    ///
    /// Advances animations to `now`, applies pending cache fills and the fallback, and
    /// returns a scene only if a redraw was requested since the previous frame.
    pub fn frame(&mut self, now: Instant) -> Option<Scene> {
        self.pump();
        let scene = match &mut self.renderer {
            ActiveRenderer::Paginated(r) => {
                r.refresh();
                self.ctx.scheduler.take_redraw().then(|| r.scene())
            }
            ActiveRenderer::Continuous(r) => {
                r.advance(now);
                r.refresh();
                self.ctx.scheduler.take_redraw().then(|| r.scene())
            }
        };
        self.notify_chapter_visible();
        scene
    }

    /// Wait for every outstanding background task.
    pub async fn settle(&self) {
        self.ctx.scheduler.settle().await;
    }
}
