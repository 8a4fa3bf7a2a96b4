//! Continuous renderer: height estimation, measurement, anchoring and the
//! load window.

mod common;

use chapterflow::model::{FontConfig, Viewport};
use chapterflow::view_state::visible_range::ChapterRange;
use chapterflow::view_state::{
    BlockContent, ContinuousRenderer, RenderContext, ScrollBehavior, ScrollToOptions,
};
use common::{chapters, context, id, source_for};
use std::time::{Duration, Instant};
use tokio::task::LocalSet;

fn viewport() -> Viewport {
    Viewport::new(400.0, 300.0)
}

async fn settle(renderer: &mut ContinuousRenderer, ctx: &RenderContext) {
    for _ in 0..8 {
        ctx.scheduler.settle().await;
        renderer.refresh();
        if ctx.scheduler.pending_tasks() == 0 {
            break;
        }
    }
}

#[tokio::test]
async fn estimates_are_replaced_by_measurements() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(5);
            let source = source_for(&chapters, 30);
            let ctx = context(chapters, source);
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 0);

            let estimate = renderer.estimate_height(&ctx.chapters[0]);
            assert!(!renderer.is_measured(0));
            assert_eq!(renderer.heights().height(0), estimate);

            settle(&mut renderer, &ctx).await;

            assert!(renderer.is_measured(0));
            assert_ne!(renderer.heights().height(0), estimate);
        })
        .await;
}

#[tokio::test]
async fn measuring_chapters_above_keeps_the_current_chapter_in_place() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(8);
            let source = source_for(&chapters, 40);
            let ctx = context(chapters, source);
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 3);
            assert_eq!(renderer.scroll_top(), renderer.heights().offset_of(3) as f32);

            settle(&mut renderer, &ctx).await;

            assert!(renderer.is_measured(1) && renderer.is_measured(2));
            assert_eq!(renderer.scroll_top(), renderer.heights().offset_of(3) as f32);
            assert_eq!(renderer.current_chapter_index(), Some(3));
        })
        .await;
}

#[tokio::test]
async fn window_covers_visible_chapters_plus_lookahead() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(8);
            let source = source_for(&chapters, 40);
            let ctx = context(chapters, source.clone());
            let renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 0);

            let lookahead = ctx.settings.lookahead_chapters;
            assert_eq!(renderer.window(), ChapterRange::new(0, 1 + lookahead));
            ctx.scheduler.settle().await;
            assert_eq!(source.resolve_count(), 1 + lookahead);
            assert!(!ctx.text.contains(&id("c5")));
        })
        .await;
}

#[tokio::test]
async fn failed_chapter_shows_placeholder_without_retry() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(4);
            let source = source_for(&chapters, 40);
            source.fail(id("c0"));
            let ctx = context(chapters, source.clone());
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 0);
            settle(&mut renderer, &ctx).await;

            let scene = renderer.scene();
            let first = scene.blocks_for(0).next().expect("block for chapter 0");
            assert_eq!(first.content, BlockContent::Failed);

            let resolves = source.resolve_count();
            renderer.scroll_by(1.0);
            renderer.refresh();
            ctx.scheduler.settle().await;
            assert_eq!(source.resolve_count(), resolves, "failure is not retried while in the window");
        })
        .await;
}

#[tokio::test]
async fn smooth_navigation_animates_and_highlights() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(6);
            let source = source_for(&chapters, 40);
            let ctx = context(chapters, source);
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 0);
            settle(&mut renderer, &ctx).await;

            renderer.scroll_to_chapter(2, ScrollToOptions::default());
            assert!(renderer.is_animating());
            assert_eq!(renderer.highlighted(), Some(2));

            let start = Instant::now();
            renderer.advance(start);
            renderer.advance(start + ctx.settings.smooth_scroll / 2);
            let midway = renderer.scroll_top();
            assert!(midway > 0.0);

            renderer.advance(start + ctx.settings.smooth_scroll);
            assert!(!renderer.is_animating());
            assert_eq!(renderer.current_chapter_index(), Some(2));
            assert!(renderer.scroll_top() >= midway);

            renderer.advance(start + ctx.settings.highlight + Duration::from_millis(1));
            assert_eq!(renderer.highlighted(), None);
        })
        .await;
}

#[tokio::test]
async fn instant_scroll_to_top_without_highlight() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(4);
            let source = source_for(&chapters, 40);
            let ctx = context(chapters, source);
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 2);
            assert!(renderer.scroll_top() > 0.0);

            renderer.scroll_to_top(ScrollBehavior::Instant);
            assert_eq!(renderer.scroll_top(), 0.0);
            assert_eq!(renderer.highlighted(), None);
        })
        .await;
}

#[tokio::test]
async fn scroll_is_clamped_to_document() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(3);
            let source = source_for(&chapters, 5);
            let ctx = context(chapters, source);
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 0);
            settle(&mut renderer, &ctx).await;

            renderer.scroll_by(-100.0);
            assert_eq!(renderer.scroll_top(), 0.0);

            renderer.scroll_by(1.0e9);
            let total = renderer.heights().total() as f32;
            let visible = renderer.content_box().height;
            assert_eq!(renderer.scroll_top(), (total - visible).max(0.0));
        })
        .await;
}

#[tokio::test]
async fn zoom_re_estimates_and_keeps_anchor() {
    LocalSet::new()
        .run_until(async {
            let chapters = chapters(8);
            let source = source_for(&chapters, 40);
            let ctx = context(chapters, source);
            let mut renderer = ContinuousRenderer::new(ctx.clone(), viewport(), FontConfig::default(), 3);
            settle(&mut renderer, &ctx).await;

            let bigger = FontConfig::default().with_body_size(24.0);
            renderer.set_font(bigger);
            assert!(!renderer.is_measured(3));
            assert_eq!(renderer.current_chapter_index(), Some(3));
        })
        .await;
}
