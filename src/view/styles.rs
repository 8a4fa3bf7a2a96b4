//! Reader styling.
//!
//! Distinct styles for titles, body text, placeholders, the navigation highlight and
//! the status line. Honors `NO_COLOR`.

use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Whether color output is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Colors are enabled unless `NO_COLOR` is set (to any value).
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Explicit setting, for tests.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== ReaderStyles =====

/// Styles used when drawing a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReaderStyles {
    /// Chapter heading lines.
    pub title: Style,
    /// Body lines.
    pub body: Style,
    /// "Loading" placeholder.
    pub loading: Style,
    /// Placeholder for chapters whose text failed to load.
    pub failed: Style,
    /// Gutter marker for the navigated-to chapter.
    pub highlight: Style,
    /// Status line.
    pub status: Style,
}

impl ReaderStyles {
    /// Styles for the given color configuration.
    ///
    /// Without colors only modifiers (bold, dim, reversed) distinguish elements.
    pub fn with_color_config(config: ColorConfig) -> Self {
        if config.colors_enabled() {
            Self {
                title: Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                body: Style::default(),
                loading: Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
                failed: Style::default().fg(Color::Red),
                highlight: Style::default().fg(Color::Cyan),
                status: Style::default().fg(Color::Black).bg(Color::Gray),
            }
        } else {
            Self {
                title: Style::default().add_modifier(Modifier::BOLD),
                body: Style::default(),
                loading: Style::default().add_modifier(Modifier::DIM),
                failed: Style::default().add_modifier(Modifier::BOLD),
                highlight: Style::default(),
                status: Style::default().add_modifier(Modifier::REVERSED),
            }
        }
    }
}

impl Default for ReaderStyles {
    fn default() -> Self {
        Self::with_color_config(ColorConfig::from_env())
    }
}
