//! Scene and status line widgets.
//!
//! The engine positions everything in pixels. The terminal maps pixels to cells with
//! a fixed [`CellMetrics`]: one column is `cell_width` pixels wide and one row is
//! `cell_height` pixels tall.

use super::styles::ReaderStyles;
use crate::model::{Chapter, FontConfig, Padding, TokenKind, Viewport};
use crate::view_state::{BlockContent, Scene};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Glyph drawn in the left gutter next to a highlighted chapter.
const HIGHLIGHT_MARK: &str = "▌";

/// Pixel size of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// Pixels per column.
    pub cell_width: f32,
    /// Pixels per row.
    pub cell_height: f32,
}

impl CellMetrics {
    /// One column per body advance, one row per body line.
    pub fn from_font(font: &FontConfig) -> Self {
        Self {
            cell_width: positive_or_one(font.advance()),
            cell_height: positive_or_one(font.body_line_px()),
        }
    }

    /// Viewport covering `columns` x `rows` cells.
    pub fn viewport(&self, columns: u16, rows: u16) -> Viewport {
        Viewport::new(
            f32::from(columns) * self.cell_width,
            f32::from(rows) * self.cell_height,
        )
    }

    /// Row containing pixel `y`. Negative above the area.
    pub fn row_of(&self, y: f32) -> i64 {
        (y / self.cell_height).floor() as i64
    }

    /// Whole columns covered by `px` pixels.
    pub fn columns_in(&self, px: f32) -> u16 {
        (px / self.cell_width).round().clamp(0.0, f32::from(u16::MAX)) as u16
    }

    /// Pixels per scroll line.
    pub fn line_px(&self) -> f32 {
        self.cell_height
    }
}

fn positive_or_one(px: f32) -> f32 {
    if px.is_finite() && px > 0.0 {
        px
    } else {
        1.0
    }
}

/// Cut `text` to at most `width` display cells, ending with `…` when shortened.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Draws one [`Scene`] into the text area.
pub struct ReaderView<'a> {
    scene: &'a Scene,
    chapters: &'a [Chapter],
    metrics: CellMetrics,
    padding: Padding,
    styles: &'a ReaderStyles,
}

impl<'a> ReaderView<'a> {
    /// Widget for `scene`, whose chapter indices refer to `chapters`.
    pub fn new(
        scene: &'a Scene,
        chapters: &'a [Chapter],
        metrics: CellMetrics,
        padding: Padding,
        styles: &'a ReaderStyles,
    ) -> Self {
        Self {
            scene,
            chapters,
            metrics,
            padding,
            styles,
        }
    }

    fn title_of(&self, index: usize) -> &str {
        self.chapters
            .get(index)
            .map(|c| c.title.as_str())
            .unwrap_or("")
    }
}

impl Widget for ReaderView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let pad_cols = self
            .metrics
            .columns_in(self.padding.horizontal)
            .min(area.width.saturating_sub(1) / 2);
        let left = area.x + pad_cols;
        let text_width = usize::from(area.width.saturating_sub(pad_cols * 2).max(1));
        let origin = self.padding.vertical;
        let content_height =
            f32::from(area.height) * self.metrics.cell_height - 2.0 * self.padding.vertical;

        let put = |y: f32, text: &str, style: Style, buf: &mut Buffer| -> Option<u16> {
            let row = self.metrics.row_of(origin + y);
            if row < 0 || row >= i64::from(area.height) {
                return None;
            }
            let row = area.y + row as u16;
            buf.set_stringn(left, row, text, text_width, style);
            Some(row)
        };

        for block in &self.scene.blocks {
            let highlighted = self.scene.highlight == Some(block.chapter_index);
            let mut rows = Vec::new();
            match &block.content {
                BlockContent::Tokens(tokens) => {
                    let mut y = block.top;
                    for token in tokens {
                        if let Some(text) = token.text.as_deref() {
                            let style = match token.kind {
                                TokenKind::Title => self.styles.title,
                                _ => self.styles.body,
                            };
                            rows.extend(put(y, text, style, buf));
                        }
                        y += token.height;
                    }
                }
                BlockContent::Loading | BlockContent::Failed => {
                    // Placeholders sit at the first visible row of their block.
                    if block.top >= content_height || block.top + content_height <= 0.0 {
                        continue;
                    }
                    let (text, style) = if matches!(block.content, BlockContent::Loading) {
                        (
                            format!("Loading {}…", self.title_of(block.chapter_index)),
                            self.styles.loading,
                        )
                    } else {
                        (
                            format!("Could not load {}", self.title_of(block.chapter_index)),
                            self.styles.failed,
                        )
                    };
                    rows.extend(put(block.top.max(0.0), &text, style, buf));
                }
            }

            if highlighted && left > area.x {
                for row in rows {
                    buf.set_string(left - 1, row, HIGHLIGHT_MARK, self.styles.highlight);
                }
            }
        }
    }
}

/// One-line status bar: left-aligned label, right-aligned position.
pub struct StatusLine<'a> {
    left: &'a str,
    right: &'a str,
    styles: &'a ReaderStyles,
}

impl<'a> StatusLine<'a> {
    /// Status bar with `left` and `right` segments.
    pub fn new(left: &'a str, right: &'a str, styles: &'a ReaderStyles) -> Self {
        Self {
            left,
            right,
            styles,
        }
    }
}

impl Widget for StatusLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let width = usize::from(area.width);
        buf.set_style(area, self.styles.status);

        let right = truncate_to_width(self.right, width);
        let right_width = right.width();
        let left_budget = width.saturating_sub(right_width + 1);
        let left = truncate_to_width(self.left, left_budget);

        buf.set_string(area.x, area.y, &left, self.styles.status);
        if right_width > 0 {
            let x = area.x + (width - right_width) as u16;
            buf.set_string(x, area.y, &right, self.styles.status);
        }
    }
}
