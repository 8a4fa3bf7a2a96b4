//! View-state layer - positions, renderers and the drawable scene
//!
//! Both renderers read from the session caches in
//! [`RenderContext`](context::RenderContext) and never draw directly: every change
//! requests a redraw, and the reader builds one [`Scene`](scene::Scene) per frame.
//!
//! # Module Structure
//!
//! - `pointer`: PagePointer, ScrollState and the pure paginated scroll algorithm
//! - `height_index`: HeightIndex - O(log n) chapter offsets via Fenwick tree
//! - `visible_range`: ChapterRange - chapters intersecting the viewport
//! - `settings`: EngineSettings - runtime knobs from configuration
//! - `navigation`: scroll behaviors and the ScrollSurface snapshot
//! - `scene`: Scene - output of one coalesced redraw
//! - `context`: RenderContext - chapters, caches and scheduler for one session
//! - `paginated`: PaginatedRenderer and the FatalSignal
//! - `continuous`: ContinuousRenderer

pub mod context;
pub mod continuous;
pub mod height_index;
pub mod navigation;
pub mod paginated;
pub mod pointer;
pub mod scene;
pub mod settings;
pub mod visible_range;

pub use context::RenderContext;
pub use continuous::ContinuousRenderer;
pub use navigation::{ScrollBehavior, ScrollSurface, ScrollToOptions};
pub use paginated::{FatalSignal, PaginatedRenderer};
pub use pointer::{PageGeometry, PagePointer, ScrollState};
pub use scene::{BlockContent, Scene, SceneBlock};
pub use settings::EngineSettings;
