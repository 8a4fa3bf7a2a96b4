//! Cell-width text flow.
//!
//! Turns a chapter into a single column of [`LayoutToken`]s: wrapped title lines, a
//! title gap, then wrapped body lines with paragraph gaps. Widths are measured in
//! display cells (`unicode-width`), so wide CJK glyphs take two cells.

use crate::model::{FontConfig, LayoutToken};
use textwrap::Options;

/// Number of display cells that fit in `width` pixels at `advance` pixels per cell.
///
/// Always at least one so degenerate boxes still make progress.
pub fn columns_for(width: f32, advance: f32) -> usize {
    if advance <= 0.0 || !width.is_finite() || width <= 0.0 {
        return 1;
    }
    ((width / advance).floor() as usize).max(1)
}

/// Wrap one paragraph into lines of at most `columns` display cells.
///
/// Breaks at word boundaries where possible and between wide glyphs otherwise.
pub fn wrap_paragraph(text: &str, columns: usize) -> Vec<String> {
    let options = Options::new(columns.max(1)).break_words(true);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Flow a chapter into tokens for a column `width` pixels wide.
pub fn flow_chapter(title: &str, body: &str, width: f32, font: &FontConfig) -> Vec<LayoutToken> {
    let mut tokens = Vec::new();

    let title = title.trim();
    if !title.is_empty() {
        let title_columns = columns_for(width, font.title_advance());
        for line in wrap_paragraph(title, title_columns) {
            tokens.push(LayoutToken::title(line, font.title_line_px()));
        }
        if font.title_spacing > 0.0 {
            tokens.push(LayoutToken::space(font.title_spacing));
        }
    }

    let columns = columns_for(width, font.advance());
    let line_px = font.body_line_px();
    let mut first = true;
    for paragraph in body.lines().map(str::trim).filter(|p| !p.is_empty()) {
        if !first && font.paragraph_spacing > 0.0 {
            tokens.push(LayoutToken::space(font.paragraph_spacing));
        }
        first = false;
        for line in wrap_paragraph(paragraph, columns) {
            tokens.push(LayoutToken::body(line, line_px));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TokenKind;

    fn font() -> FontConfig {
        FontConfig {
            family: "mono".into(),
            body_size: 10.0,
            line_height: 2.0,
            title_size: 20.0,
            title_line_height: 1.5,
            title_spacing: 10.0,
            paragraph_spacing: 5.0,
        }
    }

    #[test]
    fn columns_floor_and_never_zero() {
        assert_eq!(columns_for(100.0, 5.0), 20);
        assert_eq!(columns_for(104.0, 5.0), 20);
        assert_eq!(columns_for(1.0, 5.0), 1);
        assert_eq!(columns_for(0.0, 5.0), 1);
        assert_eq!(columns_for(f32::NAN, 5.0), 1);
    }

    #[test]
    fn wrap_breaks_at_words() {
        let lines = wrap_paragraph("the quick brown fox", 10);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn wrap_counts_wide_glyphs_as_two_cells() {
        let lines = wrap_paragraph("天地玄黄宇宙洪荒", 4);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.chars().count() == 2));
    }

    #[test]
    fn flow_emits_title_gap_and_paragraph_gaps() {
        // 50px wide at 5px per cell -> 10 columns; title: 10px per cell -> 5 columns.
        let tokens = flow_chapter("Intro", "first line\n\nsecond", 50.0, &font());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Title,
                TokenKind::Space,
                TokenKind::Body,
                TokenKind::Space,
                TokenKind::Body,
            ]
        );
        assert_eq!(tokens[0].height, 30.0);
        assert_eq!(tokens[2].height, 20.0);
    }

    #[test]
    fn flow_without_title_starts_with_body() {
        let tokens = flow_chapter("  ", "text", 50.0, &font());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Body);
    }

    #[test]
    fn flowed_heights_sum_title_gap_and_lines() {
        // title 30 + gap 10 + one line 20
        let tokens = flow_chapter("Intro", "short", 50.0, &font());
        let height: f32 = tokens.iter().map(|t| t.height).sum();
        assert_eq!(height, 60.0);
    }
}
