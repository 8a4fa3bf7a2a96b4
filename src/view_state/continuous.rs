//! Continuous renderer - the whole document as one virtualized column.
//!
//! Every chapter owns a slot in a [`HeightIndex`]. Slots start with an estimate derived
//! from the chapter's character count and are replaced by the measured height once the
//! chapter's text is in the text cache. Only chapters intersecting the viewport are
//! drawn, and only those plus `lookahead_chapters` on each side are kept loaded.
//!
//! When a chapter that lies entirely above the scroll position changes height, the
//! scroll position moves by the same amount so the text on screen stays put.

use super::context::RenderContext;
use super::height_index::HeightIndex;
use super::navigation::{ScrollBehavior, ScrollSurface, ScrollToOptions};
use super::scene::{BlockContent, Scene, SceneBlock};
use super::visible_range::ChapterRange;
use crate::layout::flow::{columns_for, flow_chapter, wrap_paragraph};
use crate::model::{Chapter, ContentBox, FontConfig, LayoutToken, Viewport};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollTarget {
    Top,
    Chapter(usize),
}

#[derive(Debug, Clone, Copy)]
struct ScrollAnimation {
    from: f32,
    target: ScrollTarget,
    // Set on the first frame so the animation starts when it is first drawn.
    started: Option<Instant>,
    duration: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Highlight {
    chapter: usize,
    until: Option<Instant>,
}

/// Renders all chapters as one scrollable column.
#[derive(Debug)]
pub struct ContinuousRenderer {
    ctx: RenderContext,
    viewport: Viewport,
    font: FontConfig,
    heights: HeightIndex,
    measured: Vec<bool>,
    /// Tokens of the chapters in the current window, flowed from cached text. Dropped
    /// as chapters leave the window and on every font or viewport change.
    flowed: HashMap<usize, Rc<[LayoutToken]>>,
    scroll_top: f32,
    window: ChapterRange,
    animation: Option<ScrollAnimation>,
    highlight: Option<Highlight>,
    load_failures: Rc<RefCell<HashSet<usize>>>,
}

impl ContinuousRenderer {
    /// Mount with chapter `start_chapter` at the top of the viewport.
    ///
    /// Must be called inside a `LocalSet`.
    pub fn new(ctx: RenderContext, viewport: Viewport, font: FontConfig, start_chapter: usize) -> Self {
        let count = ctx.chapter_count();
        let mut renderer = Self {
            ctx,
            viewport,
            font,
            heights: HeightIndex::new(count),
            measured: vec![false; count],
            flowed: HashMap::new(),
            scroll_top: 0.0,
            window: ChapterRange::default(),
            animation: None,
            highlight: None,
            load_failures: Rc::new(RefCell::new(HashSet::new())),
        };
        renderer.estimate_all();
        let top = renderer.resolve(ScrollTarget::Chapter(start_chapter));
        renderer.scroll_top = top;
        renderer.update_window();
        renderer.ctx.scheduler.request_redraw();
        renderer
    }

    /// Pixels scrolled from the top of the document.
    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current font.
    pub fn font(&self) -> &FontConfig {
        &self.font
    }

    /// Chapter heights, estimated or measured.
    pub fn heights(&self) -> &HeightIndex {
        &self.heights
    }

    /// True once chapter `index` has a measured height.
    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    /// Chapters kept loaded: the visible range widened by the lookahead.
    pub fn window(&self) -> ChapterRange {
        self.window
    }

    /// True while a smooth scroll is running.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Chapter highlighted after navigation, if the highlight has not expired.
    pub fn highlighted(&self) -> Option<usize> {
        self.highlight.map(|h| h.chapter)
    }

    /// Box text is flowed into.
    pub fn content_box(&self) -> ContentBox {
        self.viewport.content_box(self.ctx.settings.padding)
    }

    fn content_height(&self) -> f32 {
        self.content_box().height
    }

    fn max_scroll(&self) -> f32 {
        (self.heights.total() as f32 - self.content_height()).max(0.0)
    }

    /// Last chapter whose top is at or above the scroll position plus the lead-in.
    pub fn current_chapter_index(&self) -> Option<usize> {
        let count = self.ctx.chapter_count();
        if count == 0 {
            return None;
        }
        let position = (self.scroll_top + self.ctx.settings.lead_in_px).max(0.0).floor() as usize;
        Some(self.heights.lower_bound(position).unwrap_or(count - 1))
    }

    /// Estimated height of `chapter` before its text is known.
    ///
    /// Title block, then `ceil(chars / chars_per_line)` body lines with
    /// `chars_per_line = floor(content_width / body_size)`, then the chapter gap.
    pub fn estimate_height(&self, chapter: &Chapter) -> usize {
        let width = self.content_box().width;
        let font = &self.font;
        let settings = &self.ctx.settings;

        let title = chapter.title.trim();
        let title_px = if title.is_empty() {
            0.0
        } else {
            let lines = wrap_paragraph(title, columns_for(width, font.title_advance())).len();
            lines as f32 * font.title_line_px() + font.title_spacing
        };

        let chars = chapter.char_length.unwrap_or(settings.fallback_chapter_chars);
        let chars_per_line = columns_for(width, font.body_size);
        let lines = chars.div_ceil(chars_per_line);
        let body_px = lines as f32 * font.body_line_px();

        whole_px(title_px + body_px + settings.chapter_gap)
    }

    fn estimate_all(&mut self) {
        let estimates: Vec<usize> = self
            .ctx
            .chapters
            .iter()
            .map(|chapter| self.estimate_height(chapter))
            .collect();
        self.heights = HeightIndex::from_heights(estimates);
        self.measured = vec![false; self.ctx.chapter_count()];
        self.flowed.clear();
    }

    fn resolve(&self, target: ScrollTarget) -> f32 {
        match target {
            ScrollTarget::Top => 0.0,
            ScrollTarget::Chapter(index) => (self.heights.offset_of(index) as f32).min(self.max_scroll()),
        }
    }

    fn set_scroll_top(&mut self, value: f32) {
        let value = value.clamp(0.0, self.max_scroll());
        if value != self.scroll_top {
            self.scroll_top = value;
            self.update_window();
            self.ctx.scheduler.request_redraw();
        }
    }

    /// Scroll by `delta` pixels, cancelling any running animation.
    pub fn scroll_by(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.animation = None;
        self.set_scroll_top(self.scroll_top + delta);
    }

    /// Scroll to the start of chapter `index`.
    pub fn scroll_to_chapter(&mut self, index: usize, options: ScrollToOptions) {
        if index >= self.ctx.chapter_count() {
            return;
        }
        self.scroll_to(ScrollTarget::Chapter(index), options.behavior);
        if options.highlight {
            self.highlight = Some(Highlight {
                chapter: index,
                until: None,
            });
            self.ctx.scheduler.request_redraw();
        }
    }

    /// Scroll to the top of the document.
    pub fn scroll_to_top(&mut self, behavior: ScrollBehavior) {
        self.scroll_to(ScrollTarget::Top, behavior);
    }

    fn scroll_to(&mut self, target: ScrollTarget, behavior: ScrollBehavior) {
        let duration = self.ctx.settings.smooth_scroll;
        match behavior {
            ScrollBehavior::Smooth if !duration.is_zero() => {
                self.animation = Some(ScrollAnimation {
                    from: self.scroll_top,
                    target,
                    started: None,
                    duration,
                });
                self.ctx.scheduler.request_redraw();
            }
            _ => {
                self.animation = None;
                let top = self.resolve(target);
                self.set_scroll_top(top);
            }
        }
    }

    /// Step the smooth scroll and highlight expiry to `now`.
    pub fn advance(&mut self, now: Instant) {
        if let Some(mut animation) = self.animation {
            let started = *animation.started.get_or_insert(now);
            let elapsed = now.saturating_duration_since(started).as_secs_f32();
            let t = (elapsed / animation.duration.as_secs_f32()).min(1.0);
            let eased = 1.0 - (1.0 - t).powi(3);
            let target = self.resolve(animation.target);

            if t >= 1.0 {
                self.animation = None;
                self.set_scroll_top(target);
            } else {
                self.animation = Some(animation);
                self.set_scroll_top(animation.from + (target - animation.from) * eased);
                self.ctx.scheduler.request_redraw();
            }
        }

        if let Some(mut highlight) = self.highlight {
            match highlight.until {
                None => {
                    highlight.until = Some(now + self.ctx.settings.highlight);
                    self.highlight = Some(highlight);
                }
                Some(until) if now >= until => {
                    self.highlight = None;
                    self.ctx.scheduler.request_redraw();
                }
                Some(_) => {}
            }
        }
    }

    /// Change the viewport, re-estimating every chapter and keeping the current
    /// chapter anchored.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.relayout(|renderer| renderer.viewport = viewport);
        }
    }

    /// Change the font, re-estimating every chapter and keeping the current chapter
    /// anchored.
    pub fn set_font(&mut self, font: FontConfig) {
        if font != self.font {
            self.relayout(|renderer| renderer.font = font);
        }
    }

    fn relayout(&mut self, change: impl FnOnce(&mut Self)) {
        let anchor = self.current_chapter_index().unwrap_or(0);
        let fraction = if anchor < self.heights.len() {
            let height = self.heights.height(anchor).max(1) as f32;
            ((self.scroll_top - self.heights.offset_of(anchor) as f32) / height).clamp(0.0, 1.0)
        } else {
            0.0
        };

        change(self);
        self.animation = None;
        self.estimate_all();

        let top = if anchor < self.heights.len() {
            self.heights.offset_of(anchor) as f32 + fraction * self.heights.height(anchor) as f32
        } else {
            0.0
        };
        self.scroll_top = top.clamp(0.0, self.max_scroll());
        debug!(anchor, scroll_top = self.scroll_top, "Continuous layout re-estimated");
        self.update_window();
        self.ctx.scheduler.request_redraw();
    }

    /// Replace estimates with measurements for loaded chapters in the window.
    pub fn refresh(&mut self) {
        let mut changed = false;
        for index in self.window.indices() {
            if self.flowed.contains_key(&index) {
                continue;
            }
            let Some(chapter) = self.ctx.chapters.get(index) else {
                continue;
            };
            let Some(text) = self.ctx.text.get(&chapter.id) else {
                continue;
            };

            let tokens: Rc<[LayoutToken]> =
                flow_chapter(&chapter.title, &text, self.content_box().width, &self.font).into();
            if !self.measured[index] {
                let body: f32 = tokens.iter().map(|t| t.height).sum();
                self.apply_height(index, whole_px(body + self.ctx.settings.chapter_gap));
                self.measured[index] = true;
            }
            self.flowed.insert(index, tokens);
            changed = true;
        }

        if changed {
            self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll());
            self.update_window();
            self.ctx.scheduler.request_redraw();
        }
    }

    fn apply_height(&mut self, index: usize, height: usize) {
        let old = self.heights.height(index);
        if old == height {
            return;
        }
        let bottom = self.heights.offset_of(index + 1) as f32;
        self.heights.set(index, height);
        if bottom <= self.scroll_top {
            let delta = height as f32 - old as f32;
            self.scroll_top += delta;
            if let Some(animation) = self.animation.as_mut() {
                animation.from += delta;
            }
        }
        debug!(chapter = index, estimated = old, measured = height, "Chapter measured");
    }

    fn visible(&self) -> ChapterRange {
        let count = self.ctx.chapter_count();
        if count == 0 {
            return ChapterRange::default();
        }
        let top = self.scroll_top.max(0.0).floor() as usize;
        let bottom = (self.scroll_top + self.content_height()).ceil().max(0.0) as usize;
        let start = self.heights.lower_bound(top).unwrap_or(count - 1);
        let end = match bottom.checked_sub(1) {
            Some(last_px) => self.heights.lower_bound(last_px).map_or(count, |i| i + 1),
            None => start + 1,
        };
        ChapterRange::new(start, end.max(start + 1))
    }

    fn update_window(&mut self) {
        let count = self.ctx.chapter_count();
        let window = self
            .visible()
            .widened(self.ctx.settings.lookahead_chapters, count);
        if window != self.window {
            debug!(start = window.start, end = window.end, "Continuous window moved");
            self.load_failures
                .borrow_mut()
                .retain(|index| window.contains(*index));
            self.flowed.retain(|index, _| window.contains(*index));
            self.window = window;
        }
        self.ensure_window();
    }

    fn ensure_window(&self) {
        for index in self.window.indices() {
            let Some(chapter) = self.ctx.chapters.get(index) else {
                continue;
            };
            if self.load_failures.borrow().contains(&index)
                || self.ctx.text.contains(&chapter.id)
                || self.ctx.text.is_loading(&chapter.id)
            {
                continue;
            }

            let request = self.ctx.text.ensure(chapter);
            let id = chapter.id.clone();
            let failures = self.load_failures.clone();
            let scheduler = self.ctx.scheduler.clone();
            self.ctx.scheduler.spawn(async move {
                if let Err(err) = request.await {
                    warn!(chapter = %id, error = %err, "Chapter unavailable, showing placeholder");
                    failures.borrow_mut().insert(index);
                }
                scheduler.request_redraw();
            });
        }
    }

    /// Read-only scroll geometry.
    pub fn surface(&self) -> ScrollSurface {
        ScrollSurface::Continuous {
            scroll_top: self.scroll_top,
            scroll_height: self.heights.total() as f32,
            viewport_height: self.content_height(),
        }
    }

    /// Visible chapters, each cut down to the tokens that intersect the viewport.
    pub fn scene(&self) -> Scene {
        let height = self.content_height();
        let mut scene = Scene {
            blocks: Vec::new(),
            highlight: self.highlighted(),
        };

        for index in self.visible().indices() {
            let chapter_top = self.heights.offset_of(index) as f32 - self.scroll_top;
            let Some(tokens) = self.flowed.get(&index) else {
                let content = if self.load_failures.borrow().contains(&index) {
                    BlockContent::Failed
                } else {
                    BlockContent::Loading
                };
                scene.blocks.push(SceneBlock {
                    chapter_index: index,
                    page_index: None,
                    top: chapter_top,
                    content,
                });
                continue;
            };

            let mut y = chapter_top;
            let mut first_top = None;
            let mut run = Vec::new();
            for token in tokens.iter() {
                if y >= height {
                    break;
                }
                let bottom = y + token.height;
                if bottom > 0.0 {
                    first_top.get_or_insert(y);
                    run.push(token.clone());
                }
                y = bottom;
            }

            if let Some(top) = first_top {
                scene.blocks.push(SceneBlock {
                    chapter_index: index,
                    page_index: None,
                    top,
                    content: BlockContent::Tokens(run),
                });
            }
        }
        scene
    }
}

fn whole_px(px: f32) -> usize {
    if px.is_finite() {
        px.max(0.0).ceil() as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{LayoutCache, TextCache};
    use crate::layout::MonospaceEngine;
    use crate::model::ChapterId;
    use crate::scheduler::FrameScheduler;
    use crate::source::MemorySource;
    use crate::view_state::{EngineSettings, ScrollToOptions};
    use tokio::task::LocalSet;

    fn context(count: usize) -> RenderContext {
        let chapters: Vec<Chapter> = (0..count)
            .map(|i| Chapter::new(ChapterId::new(format!("c{i}")).unwrap(), format!("Chapter {i}"), i))
            .collect();
        let body = "some words for the body of a chapter\n".repeat(30);
        let source = Rc::new(MemorySource::from_texts(
            chapters.iter().map(|c| (c.id.clone(), body.clone())),
        ));
        let settings = EngineSettings::default();
        let text = TextCache::new(source, settings.text_cache_continuous);
        let layout = LayoutCache::new(text.clone(), Rc::new(MonospaceEngine::new()), settings.layout_cache_capacity);
        RenderContext::new(chapters.into(), text, layout, FrameScheduler::new(), settings)
    }

    #[tokio::test]
    async fn flowed_tokens_follow_the_window() {
        LocalSet::new()
            .run_until(async {
                let ctx = context(12);
                let mut renderer =
                    ContinuousRenderer::new(ctx.clone(), Viewport::new(400.0, 300.0), FontConfig::default(), 0);
                ctx.scheduler.settle().await;
                renderer.refresh();
                assert!(renderer.flowed.contains_key(&0));

                renderer.scroll_to_chapter(11, ScrollToOptions::instant());
                ctx.scheduler.settle().await;
                renderer.refresh();

                let window = renderer.window();
                assert!(!window.contains(0));
                assert!(!renderer.flowed.is_empty());
                assert!(renderer.flowed.keys().all(|index| window.contains(*index)));
            })
            .await;
    }
}
