//! Geometry and font parameters that drive layout.

use serde::{Deserialize, Serialize};

/// Width in display cells of one body glyph, as a fraction of the font size.
const CELL_ADVANCE_RATIO: f32 = 0.5;

/// Reading surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Device pixel ratio.
    pub pixel_density: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Viewport {
    /// Create a viewport with a pixel density of 1.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_density: 1.0,
        }
    }

    /// Set the device pixel ratio.
    pub fn with_pixel_density(mut self, pixel_density: f32) -> Self {
        self.pixel_density = pixel_density;
        self
    }

    /// Box available to text once padding is removed.
    pub fn content_box(&self, padding: Padding) -> ContentBox {
        ContentBox::new(
            self.width - 2.0 * padding.horizontal,
            self.height - 2.0 * padding.vertical,
        )
    }
}

/// Padding applied on each side of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    /// Left and right padding in pixels.
    pub horizontal: f32,
    /// Top and bottom padding in pixels.
    pub vertical: f32,
}

impl Padding {
    /// Create padding from horizontal and vertical amounts.
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Text box handed to the layout primitive. Never negative, never NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBox {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels. This is the page height used by pagination.
    pub height: f32,
}

impl ContentBox {
    /// Create a content box, clamping non-finite or negative sides to zero.
    pub fn new(width: f32, height: f32) -> Self {
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }

    /// True when either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Font parameters. Every change invalidates computed layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Font family name passed through to the layout primitive.
    pub family: String,
    /// Body font size in pixels.
    pub body_size: f32,
    /// Body line height as a multiple of `body_size`.
    pub line_height: f32,
    /// Title font size in pixels.
    pub title_size: f32,
    /// Title line height as a multiple of `title_size`.
    pub title_line_height: f32,
    /// Space below the title in pixels.
    pub title_spacing: f32,
    /// Space between paragraphs in pixels.
    pub paragraph_spacing: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "serif".to_string(),
            body_size: 18.0,
            line_height: 1.8,
            title_size: 26.0,
            title_line_height: 1.4,
            title_spacing: 24.0,
            paragraph_spacing: 8.0,
        }
    }
}

impl FontConfig {
    /// Height of one body line in pixels.
    pub fn body_line_px(&self) -> f32 {
        self.body_size * self.line_height
    }

    /// Height of one title line in pixels.
    pub fn title_line_px(&self) -> f32 {
        self.title_size * self.title_line_height
    }

    /// Pixel width of one body display cell.
    pub fn advance(&self) -> f32 {
        self.body_size * CELL_ADVANCE_RATIO
    }

    /// Pixel width of one title display cell.
    pub fn title_advance(&self) -> f32 {
        self.title_size * CELL_ADVANCE_RATIO
    }

    /// Copy with a different body size. Title size scales proportionally.
    pub fn with_body_size(&self, body_size: f32) -> Self {
        let scale = if self.body_size > 0.0 {
            body_size / self.body_size
        } else {
            1.0
        };
        Self {
            body_size,
            title_size: self.title_size * scale,
            ..self.clone()
        }
    }
}

/// Cache key capturing everything that can change a chapter's pagination.
///
/// Compares floats bit-for-bit: two signatures are equal only when the
/// content box and every font parameter are exactly equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutSignature {
    width: u32,
    height: u32,
    family: String,
    font: [u32; 6],
}

impl LayoutSignature {
    /// Derive the signature for a content box and font.
    pub fn new(content_box: ContentBox, font: &FontConfig) -> Self {
        Self {
            width: content_box.width.to_bits(),
            height: content_box.height.to_bits(),
            family: font.family.clone(),
            font: [
                font.body_size.to_bits(),
                font.line_height.to_bits(),
                font.title_size.to_bits(),
                font.title_line_height.to_bits(),
                font.title_spacing.to_bits(),
                font.paragraph_spacing.to_bits(),
            ],
        }
    }
}
