//! Positioned layout tokens and pages.

/// Kind of a layout token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// One line of the chapter heading.
    Title,
    /// One line of body text.
    Body,
    /// Vertical gap without text.
    Space,
}

/// A vertically stacked unit of laid-out content.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutToken {
    /// Token kind.
    pub kind: TokenKind,
    /// Text content, absent for [`TokenKind::Space`].
    pub text: Option<String>,
    /// Height in pixels.
    pub height: f32,
}

impl LayoutToken {
    /// A title line.
    pub fn title(text: impl Into<String>, height: f32) -> Self {
        Self {
            kind: TokenKind::Title,
            text: Some(text.into()),
            height,
        }
    }

    /// A body line.
    pub fn body(text: impl Into<String>, height: f32) -> Self {
        Self {
            kind: TokenKind::Body,
            text: Some(text.into()),
            height,
        }
    }

    /// A vertical gap.
    pub fn space(height: f32) -> Self {
        Self {
            kind: TokenKind::Space,
            text: None,
            height,
        }
    }
}

/// The largest contiguous span of one chapter that fits one content box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    tokens: Vec<LayoutToken>,
}

impl Page {
    /// Create a page from tokens in top-to-bottom order.
    pub fn new(tokens: Vec<LayoutToken>) -> Self {
        Self { tokens }
    }

    /// Tokens in top-to-bottom order.
    pub fn tokens(&self) -> &[LayoutToken] {
        &self.tokens
    }

    /// Append a token at the bottom.
    pub fn push(&mut self, token: LayoutToken) {
        self.tokens.push(token);
    }

    /// Sum of token heights.
    pub fn height(&self) -> f32 {
        self.tokens.iter().map(|t| t.height).sum()
    }

    /// True when the page holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<Vec<LayoutToken>> for Page {
    fn from(tokens: Vec<LayoutToken>) -> Self {
        Self::new(tokens)
    }
}
