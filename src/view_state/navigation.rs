//! Navigation options and the read-only scroll surface snapshot.

use super::pointer::PagePointer;

/// How a programmatic scroll moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Animate towards the target.
    #[default]
    Smooth,
    /// Jump straight to the target.
    Instant,
}

/// Options for [`scroll_to_chapter_id`](crate::reader::Reader::scroll_to_chapter_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollToOptions {
    /// Animation behavior. Paginated rendering always jumps.
    pub behavior: ScrollBehavior,
    /// Briefly highlight the target chapter.
    pub highlight: bool,
}

impl Default for ScrollToOptions {
    fn default() -> Self {
        Self {
            behavior: ScrollBehavior::Smooth,
            highlight: true,
        }
    }
}

impl ScrollToOptions {
    /// Jump without animation or highlight.
    pub fn instant() -> Self {
        Self {
            behavior: ScrollBehavior::Instant,
            highlight: false,
        }
    }
}

/// Snapshot of the mounted renderer's scroll geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollSurface {
    /// Paginated position.
    Paginated {
        /// Current page.
        pointer: PagePointer,
        /// Pixels scrolled into the current page.
        offset: f32,
        /// Page height in pixels.
        content_height: f32,
    },
    /// Continuous position.
    Continuous {
        /// Pixels scrolled from the top of the document.
        scroll_top: f32,
        /// Total document height in pixels (estimated where not yet measured).
        scroll_height: f32,
        /// Visible text height in pixels.
        viewport_height: f32,
    },
}

impl ScrollSurface {
    /// Scroll progress through the document in `[0, 1]` for continuous surfaces.
    pub fn fraction(&self) -> Option<f32> {
        match *self {
            Self::Continuous {
                scroll_top,
                scroll_height,
                viewport_height,
            } => {
                let range = scroll_height - viewport_height;
                Some(if range > 0.0 {
                    (scroll_top / range).clamp(0.0, 1.0)
                } else {
                    0.0
                })
            }
            Self::Paginated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_smooth_with_highlight() {
        let options = ScrollToOptions::default();
        assert_eq!(options.behavior, ScrollBehavior::Smooth);
        assert!(options.highlight);
    }

    #[test]
    fn continuous_fraction_is_bounded() {
        let surface = ScrollSurface::Continuous {
            scroll_top: 500.0,
            scroll_height: 1000.0,
            viewport_height: 500.0,
        };
        assert_eq!(surface.fraction(), Some(1.0));

        let short = ScrollSurface::Continuous {
            scroll_top: 0.0,
            scroll_height: 100.0,
            viewport_height: 500.0,
        };
        assert_eq!(short.fraction(), Some(0.0));
    }
}
