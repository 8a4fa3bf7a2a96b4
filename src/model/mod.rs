//! Domain model - chapters, geometry, pages and errors.
//!
//! Pure data types with no I/O. Everything the caches and renderers exchange is
//! defined here.

pub mod chapter;
pub mod error;
pub mod metrics;
pub mod page;

pub use chapter::{into_reading_order, Chapter, ChapterId, InvalidChapterId};
pub use error::{AppError, ComputeError, LayoutError, LoadError, ReaderError};
pub use metrics::{ContentBox, FontConfig, LayoutSignature, Padding, Viewport};
pub use page::{LayoutToken, Page, TokenKind};
