//! Scroll performance benchmarks.
//!
//! Measures the paginated scroll walk and the continuous renderer's offset index
//! on documents with thousands of chapters.
//!
//! Run with: cargo bench --bench scroll_benchmark

#![allow(missing_docs)] // criterion macros generate undocumented items

use chapterflow::view_state::height_index::HeightIndex;
use chapterflow::view_state::pointer::{scroll_by, PageGeometry, ScrollState};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Scroll distance in the document.
#[derive(Debug, Clone, Copy)]
enum Distance {
    Line,
    Page,
    Chapter,
    Document,
}

impl Distance {
    /// Get the distance name for benchmark IDs.
    fn name(&self) -> &'static str {
        match self {
            Distance::Line => "line",
            Distance::Page => "page",
            Distance::Chapter => "chapter",
            Distance::Document => "document",
        }
    }

    /// Pixels for this distance with `pages_per_chapter` pages of `height`.
    fn pixels(&self, height: f32, pages_per_chapter: usize, chapters: usize) -> f32 {
        match self {
            Distance::Line => 32.0,
            Distance::Page => height,
            Distance::Chapter => height * pages_per_chapter as f32,
            Distance::Document => height * (pages_per_chapter * chapters) as f32,
        }
    }
}

/// Paginated scroll walk across known page counts.
fn bench_paginated_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("paginated_scroll");
    let chapters = 2_000;
    let pages_per_chapter = 12;
    let pages = vec![pages_per_chapter; chapters];
    let geometry = PageGeometry::new(900.0).with_preserve(27.0);

    for distance in [
        Distance::Line,
        Distance::Page,
        Distance::Chapter,
        Distance::Document,
    ] {
        let delta = distance.pixels(geometry.content_height, pages_per_chapter, chapters);
        group.bench_with_input(
            BenchmarkId::from_parameter(distance.name()),
            &delta,
            |b, &delta| {
                b.iter(|| {
                    scroll_by(
                        black_box(ScrollState::at(chapters / 2, 0, 0.0)),
                        black_box(delta),
                        geometry,
                        pages.as_slice(),
                    )
                })
            },
        );
    }
    group.finish();
}

/// Offset lookup and height updates in the continuous renderer's index.
fn bench_height_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("height_index");
    for chapters in [1_000usize, 10_000, 100_000] {
        let heights: Vec<usize> = (0..chapters).map(|i| 2_000 + (i * 37) % 900).collect();
        let mut index = HeightIndex::from_heights(heights);
        let total = index.total();

        group.bench_with_input(BenchmarkId::new("lower_bound", chapters), &total, |b, &total| {
            b.iter(|| index.lower_bound(black_box(total / 2)))
        });

        group.bench_function(BenchmarkId::new("set", chapters), |b| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 7919) % chapters;
                index.set(black_box(i), black_box(2_500));
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_paginated_scroll, bench_height_index);
criterion_main!(benches);
