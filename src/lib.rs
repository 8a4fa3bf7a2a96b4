//! chapterflow
//!
//! Reading-surface engine for long-form documents split into chapters. Text is
//! loaded on demand through a [`source::TextSource`], paginated by a
//! [`layout::LayoutEngine`], and presented by one of two renderers behind the
//! [`reader::Reader`] facade: discrete pages, or a virtualized continuous scroll
//! that takes over when pagination fails.
//!
//! Pure state lives in `model`, `cache` and `view_state`; the terminal shell in
//! `view` and the binary are the only code that touches the terminal.

pub mod cache;
pub mod config;
pub mod layout;
pub mod logging;
pub mod model;
pub mod preferences;
pub mod reader;
pub mod scheduler;
pub mod source;
pub mod view;
pub mod view_state;
