//! Layout primitive contract and the reference monospace implementation.
//!
//! The engine never measures glyphs itself. It hands a chapter's title and body to a
//! [`LayoutEngine`] together with the content box and font, and receives page-broken
//! token sequences back. [`MonospaceEngine`] implements the contract with cell-width
//! text flow; [`flow`] is also used by the continuous renderer to measure heights.

use crate::model::{ChapterId, ContentBox, FontConfig, LayoutError, Page};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;

pub mod flow;
pub mod monospace;

pub use monospace::MonospaceEngine;

/// Everything the layout primitive needs to paginate one chapter.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    /// Chapter being laid out, for error reporting.
    pub chapter: ChapterId,
    /// Heading text.
    pub title: String,
    /// Resolved body text.
    pub body: Rc<str>,
    /// Box each page must fit into.
    pub content_box: ContentBox,
    /// Font parameters.
    pub font: FontConfig,
}

/// Future returned by [`LayoutEngine::layout`].
pub type LayoutFuture = LocalBoxFuture<'static, Result<Vec<Page>, LayoutError>>;

/// External layout primitive: text + box + font in, pages of positioned tokens out.
///
/// May fail. A failure is the only source of the paginated renderer's fatal fallback.
pub trait LayoutEngine {
    /// Paginate one chapter.
    fn layout(&self, request: LayoutRequest) -> LayoutFuture;
}
