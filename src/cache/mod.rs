//! Session-scoped caches shared by both renderers.
//!
//! - [`TextCache`]: bounded LRU of resolved chapter text, de-duplicating in-flight loads
//! - [`LayoutCache`]: bounded store of computed pages keyed by chapter and
//!   [`LayoutSignature`](crate::model::LayoutSignature)
//!
//! Both are cheap-to-clone handles over one shared store, so a renderer swap hands the
//! same caches to the next renderer without copying anything.

pub mod layout;
pub mod text;

pub use layout::{LayoutCache, LayoutCacheEntry, PendingLayout, MIN_LAYOUT_CAPACITY};
pub use text::{TextCache, TextCacheEntry, TextResult};
