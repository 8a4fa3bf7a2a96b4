//! Session-scoped state shared by both renderers.

use super::settings::EngineSettings;
use crate::cache::{LayoutCache, TextCache};
use crate::model::{Chapter, ChapterId};
use crate::scheduler::FrameScheduler;
use std::collections::HashMap;
use std::rc::Rc;

/// Chapters, caches and scheduler for one reading session.
///
/// Cheap to clone. Handed from one renderer to the next on fallback, so cached text
/// and the chapter list survive the swap.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Chapters in reading order.
    pub chapters: Rc<[Chapter]>,
    /// Resolved chapter text.
    pub text: TextCache,
    /// Computed pages.
    pub layout: LayoutCache,
    /// Redraw coalescing and task tracking.
    pub scheduler: FrameScheduler,
    /// Runtime knobs.
    pub settings: Rc<EngineSettings>,
    index: Rc<HashMap<ChapterId, usize>>,
}

impl RenderContext {
    /// Assemble a context. `chapters` must already be in reading order.
    pub fn new(
        chapters: Rc<[Chapter]>,
        text: TextCache,
        layout: LayoutCache,
        scheduler: FrameScheduler,
        settings: EngineSettings,
    ) -> Self {
        let index = chapters
            .iter()
            .enumerate()
            .map(|(i, chapter)| (chapter.id.clone(), i))
            .collect();
        Self {
            chapters,
            text,
            layout,
            scheduler,
            settings: Rc::new(settings),
            index: Rc::new(index),
        }
    }

    /// Number of chapters.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Reading-order index of the chapter with `id`.
    pub fn index_of(&self, id: &ChapterId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Chapter at `index`.
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }
}
