//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chapterflow::cache::{LayoutCache, TextCache};
use chapterflow::layout::{LayoutEngine, LayoutFuture, LayoutRequest, MonospaceEngine};
use chapterflow::model::{Chapter, ChapterId, FontConfig, LayoutError, LayoutToken, Page};
use chapterflow::preferences::MemoryPreferences;
use chapterflow::reader::{Reader, ReaderOptions};
use chapterflow::scheduler::FrameScheduler;
use chapterflow::source::MemorySource;
use chapterflow::view_state::{EngineSettings, RenderContext};
use futures_util::future::{self, FutureExt};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

pub fn id(s: &str) -> ChapterId {
    ChapterId::new(s).expect("valid chapter id")
}

/// Chapters `c0..cN` titled `Chapter N`, in order.
pub fn chapters(count: usize) -> Vec<Chapter> {
    (0..count)
        .map(|i| Chapter::new(id(&format!("c{i}")), format!("Chapter {i}"), i))
        .collect()
}

/// `paragraphs` paragraphs of ten words each.
pub fn long_text(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|p| format!("paragraph {p} has a handful of plain words in it"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Source holding `long_text(paragraphs)` for every chapter.
pub fn source_for(chapters: &[Chapter], paragraphs: usize) -> Rc<MemorySource> {
    Rc::new(MemorySource::from_texts(
        chapters.iter().map(|c| (c.id.clone(), long_text(paragraphs))),
    ))
}

/// Monospace engine that counts calls and can be told to fail chapters.
#[derive(Default)]
pub struct ScriptedEngine {
    inner: MonospaceEngine,
    calls: Cell<usize>,
    failing: RefCell<HashSet<ChapterId>>,
    fail_all: Cell<bool>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose every layout fails.
    pub fn failing() -> Self {
        let engine = Self::default();
        engine.fail_all.set(true);
        engine
    }

    pub fn fail(&self, id: ChapterId) {
        self.failing.borrow_mut().insert(id);
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl LayoutEngine for ScriptedEngine {
    fn layout(&self, request: LayoutRequest) -> LayoutFuture {
        self.calls.set(self.calls.get() + 1);
        if self.fail_all.get() || self.failing.borrow().contains(&request.chapter) {
            return future::ready(Err(LayoutError::Failed {
                chapter: request.chapter,
                reason: "scripted failure".to_string(),
            }))
            .boxed_local();
        }
        self.inner.layout(request)
    }
}

/// Engine producing a fixed number of one-line pages per chapter.
pub struct FixedPagesEngine {
    pages: Vec<usize>,
    ids: Vec<ChapterId>,
}

impl FixedPagesEngine {
    pub fn new(chapters: &[Chapter], pages: Vec<usize>) -> Self {
        Self {
            ids: chapters.iter().map(|c| c.id.clone()).collect(),
            pages,
        }
    }
}

impl LayoutEngine for FixedPagesEngine {
    fn layout(&self, request: LayoutRequest) -> LayoutFuture {
        let count = self
            .ids
            .iter()
            .position(|id| *id == request.chapter)
            .and_then(|i| self.pages.get(i).copied())
            .unwrap_or(1);
        let line = request.font.body_line_px();
        let pages = (0..count)
            .map(|p| Page::new(vec![LayoutToken::body(format!("page {p}"), line)]))
            .collect();
        future::ready(Ok(pages)).boxed_local()
    }
}

/// Small viewport and font so chapters span several pages.
pub fn options() -> ReaderOptions {
    ReaderOptions {
        settings: EngineSettings::default(),
        font: FontConfig::default(),
        viewport: chapterflow::model::Viewport::new(400.0, 300.0),
    }
}

/// Reader over `chapters` with in-memory preferences.
pub fn reader(
    chapters: Vec<Chapter>,
    source: Rc<MemorySource>,
    engine: Rc<dyn LayoutEngine>,
    preferences: Rc<MemoryPreferences>,
) -> Reader {
    Reader::new(chapters, source, engine, options(), Box::new(preferences))
        .expect("non-empty chapter list")
}

/// Render context for driving a renderer directly.
pub fn context(chapters: Vec<Chapter>, source: Rc<MemorySource>) -> RenderContext {
    let settings = EngineSettings::default();
    let text = TextCache::new(source, settings.text_cache_continuous);
    let layout = LayoutCache::new(
        text.clone(),
        Rc::new(MonospaceEngine::new()),
        settings.layout_cache_capacity,
    );
    RenderContext::new(chapters.into(), text, layout, FrameScheduler::new(), settings)
}
