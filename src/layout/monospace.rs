//! Reference layout primitive built on [`flow`](super::flow).

use super::flow::flow_chapter;
use super::{LayoutEngine, LayoutFuture, LayoutRequest};
use crate::model::{LayoutError, LayoutToken, Page, TokenKind};
use futures_util::future::{self, FutureExt};

/// Greedy paginator over cell-width flowed text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceEngine;

impl MonospaceEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }

    /// Lay out synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidBox`] when the content box has no area.
    pub fn layout_now(&self, request: &LayoutRequest) -> Result<Vec<Page>, LayoutError> {
        let content_box = request.content_box;
        if content_box.is_empty() {
            return Err(LayoutError::invalid_box(content_box.width, content_box.height));
        }
        let tokens = flow_chapter(&request.title, &request.body, content_box.width, &request.font);
        Ok(paginate(tokens, content_box.height))
    }
}

impl LayoutEngine for MonospaceEngine {
    fn layout(&self, request: LayoutRequest) -> LayoutFuture {
        future::ready(self.layout_now(&request)).boxed_local()
    }
}

/// Break a token column into pages no taller than `page_height`.
///
/// Gaps are dropped at the top of a page. A token taller than a page gets a page of
/// its own. Always returns at least one page.
pub fn paginate(tokens: Vec<LayoutToken>, page_height: f32) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page::default();
    let mut used = 0.0f32;

    for token in tokens {
        if current.is_empty() && token.kind == TokenKind::Space {
            continue;
        }
        if !current.is_empty() && used + token.height > page_height {
            pages.push(std::mem::take(&mut current));
            used = 0.0;
            if token.kind == TokenKind::Space {
                continue;
            }
        }
        used += token.height;
        current.push(token);
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}
