//! Runtime knobs shared by both renderers.

use crate::model::{FontConfig, Padding};
use std::time::Duration;

/// Engine settings resolved from configuration.
///
/// Fixed for a session; font size is the only geometry input that changes at runtime
/// and lives in [`FontConfig`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Padding between the viewport edge and the text.
    pub padding: Padding,
    /// Body lines swallowed when crossing a chapter boundary in paginated mode.
    pub preserve_overlap_lines: f32,
    /// Chapters kept loaded on each side of the visible window.
    pub lookahead_chapters: usize,
    /// Distance below the scroll position that still counts as "reading" a chapter.
    pub lead_in_px: f32,
    /// How long a navigated-to chapter stays highlighted.
    pub highlight: Duration,
    /// Duration of a smooth scroll.
    pub smooth_scroll: Duration,
    /// Text cache capacity while the continuous renderer is mounted.
    pub text_cache_continuous: usize,
    /// Text cache capacity while the paginated renderer is mounted.
    pub text_cache_paginated: usize,
    /// Layout cache capacity.
    pub layout_cache_capacity: usize,
    /// Character count assumed for chapters that do not declare one.
    pub fallback_chapter_chars: usize,
    /// Vertical gap after each chapter in continuous mode.
    pub chapter_gap: f32,
    /// Smallest body font size a zoom may set.
    pub min_font_size: f32,
    /// Largest body font size a zoom may set.
    pub max_font_size: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            padding: Padding::new(24.0, 16.0),
            preserve_overlap_lines: 0.85,
            lookahead_chapters: 2,
            lead_in_px: 8.0,
            highlight: Duration::from_millis(1500),
            smooth_scroll: Duration::from_millis(300),
            text_cache_continuous: 24,
            text_cache_paginated: 6,
            layout_cache_capacity: 12,
            fallback_chapter_chars: 8000,
            chapter_gap: 48.0,
            min_font_size: 10.0,
            max_font_size: 48.0,
        }
    }
}

impl EngineSettings {
    /// Preserve overlap in pixels for `font`.
    pub fn preserve_px(&self, font: &FontConfig) -> f32 {
        (self.preserve_overlap_lines * font.body_line_px()).max(0.0)
    }

    /// Clamp a requested body font size to the configured bounds.
    ///
    /// Non-finite requests fall back to the lower bound.
    pub fn clamp_font_size(&self, size: f32) -> f32 {
        let (lo, hi) = if self.min_font_size <= self.max_font_size {
            (self.min_font_size, self.max_font_size)
        } else {
            (self.max_font_size, self.min_font_size)
        };
        if size.is_finite() {
            size.clamp(lo, hi)
        } else {
            lo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserve_is_fraction_of_body_line() {
        let settings = EngineSettings::default();
        let font = FontConfig::default();
        let expected = 0.85 * font.body_line_px();
        assert!((settings.preserve_px(&font) - expected).abs() < 1e-4);
    }

    #[test]
    fn font_size_is_clamped() {
        let settings = EngineSettings::default();
        assert_eq!(settings.clamp_font_size(2.0), 10.0);
        assert_eq!(settings.clamp_font_size(99.0), 48.0);
        assert_eq!(settings.clamp_font_size(20.0), 20.0);
        assert_eq!(settings.clamp_font_size(f32::NAN), 10.0);
    }

    #[test]
    fn inverted_bounds_still_clamp() {
        let settings = EngineSettings {
            min_font_size: 30.0,
            max_font_size: 20.0,
            ..EngineSettings::default()
        };
        assert_eq!(settings.clamp_font_size(25.0), 25.0);
        assert_eq!(settings.clamp_font_size(5.0), 20.0);
    }
}
