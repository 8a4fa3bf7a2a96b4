//! Drawable output of one coalesced redraw.

use crate::model::LayoutToken;

/// What a scene block shows.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    /// Positioned tokens, stacked from the block's top.
    Tokens(Vec<LayoutToken>),
    /// Text or pages not available yet.
    Loading,
    /// Text failed to load.
    Failed,
}

/// One chapter (continuous) or one page (paginated) placed on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBlock {
    /// Chapter the block belongs to.
    pub chapter_index: usize,
    /// Page within the chapter, for paginated blocks.
    pub page_index: Option<usize>,
    /// Top of the block relative to the top of the content box. May be negative.
    pub top: f32,
    /// Block content.
    pub content: BlockContent,
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    /// Blocks in top-to-bottom order.
    pub blocks: Vec<SceneBlock>,
    /// Chapter currently highlighted after navigation.
    pub highlight: Option<usize>,
}

impl Scene {
    /// True when nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks belonging to `chapter_index`.
    pub fn blocks_for(&self, chapter_index: usize) -> impl Iterator<Item = &SceneBlock> {
        self.blocks
            .iter()
            .filter(move |block| block.chapter_index == chapter_index)
    }
}
