//! Property-based tests for the paginated scroll algorithm.
//!
//! Properties Under Test:
//! - Any sequence of scrolls leaves a valid pointer and an offset inside the page
//! - Scrolling forward then back by the same amount returns to the start unless
//!   either move was clamped, with or without a preserve overlap

use chapterflow::view_state::pointer::{scroll, scroll_by, PageGeometry, ScrollState};
use proptest::prelude::*;

// ===== Arbitrary Strategies =====

/// Page counts for 1-6 chapters of 1-8 pages each.
fn arb_page_counts() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=8, 1..=6)
}

/// Whole-pixel page height and preserve overlap below half a page.
fn arb_geometry() -> impl Strategy<Value = PageGeometry> {
    (50u32..=1200).prop_flat_map(|height| {
        (0u32..height / 2).prop_map(move |preserve| {
            PageGeometry::new(height as f32).with_preserve(preserve as f32)
        })
    })
}

/// Preserve overlap small enough that most crossings keep a non-negative offset.
fn arb_small_preserve_geometry() -> impl Strategy<Value = PageGeometry> {
    (200u32..=1200).prop_flat_map(|height| {
        (1u32..height / 8).prop_map(move |preserve| {
            PageGeometry::new(height as f32).with_preserve(preserve as f32)
        })
    })
}

/// A start state that is valid for `pages` and `height`.
fn arb_state(pages: Vec<usize>, height: u32) -> impl Strategy<Value = ScrollState> {
    (0..pages.len()).prop_flat_map(move |chapter| {
        let page_count = pages[chapter];
        (0..page_count, 0..height).prop_map(move |(page, offset)| ScrollState::at(chapter, page, offset as f32))
    })
}

proptest! {
    /// Property: pointer stays within known counts, offset within [0, H-1].
    #[test]
    fn prop_pointer_invariant_holds(
        pages in arb_page_counts(),
        geometry in arb_geometry(),
        deltas in prop::collection::vec(-5000i32..=5000, 1..40),
    ) {
        let mut state = ScrollState::default();
        for delta in deltas {
            state = scroll_by(state, delta as f32, geometry, pages.as_slice());
            let chapter = state.pointer.chapter_index;
            prop_assert!(chapter < pages.len());
            prop_assert!(state.pointer.page_index < pages[chapter]);
            prop_assert!(state.offset >= 0.0);
            prop_assert!(state.offset <= geometry.content_height - 1.0);
        }
    }

    /// Property: forward then backward by d returns to the start.
    #[test]
    fn prop_round_trip_without_preserve(
        (pages, height, start) in (arb_page_counts(), 50u32..=1200).prop_flat_map(|(pages, height)| {
            let state = arb_state(pages.clone(), height);
            (Just(pages), Just(height), state)
        }),
        distance in 0u32..20_000,
    ) {
        let geometry = PageGeometry::new(height as f32);
        let forward = scroll(start, distance as f32, geometry, pages.as_slice());
        prop_assume!(!forward.clamped);
        let back = scroll(forward.state, -(distance as f32), geometry, pages.as_slice());
        prop_assume!(!back.clamped);
        prop_assert_eq!(back.state, start);
    }

    /// Property: the round trip also holds when chapter crossings consume the
    /// preserve overlap.
    #[test]
    fn prop_round_trip_across_preserved_crossings(
        (pages, geometry, start) in (arb_page_counts(), arb_small_preserve_geometry()).prop_flat_map(|(pages, geometry)| {
            let state = arb_state(pages.clone(), geometry.content_height as u32);
            (Just(pages), Just(geometry), state)
        }),
        fraction in 0.0f64..1.0,
    ) {
        let document = pages.iter().sum::<usize>() as f64 * f64::from(geometry.content_height);
        let distance = (fraction * document).floor() as f32;
        let forward = scroll(start, distance, geometry, pages.as_slice());
        prop_assume!(!forward.clamped);
        let back = scroll(forward.state, -distance, geometry, pages.as_slice());
        prop_assume!(!back.clamped);
        prop_assert_eq!(back.state, start);
    }

    /// Property: scrolling is monotonic in reading position.
    #[test]
    fn prop_forward_never_moves_back(
        pages in arb_page_counts(),
        geometry in arb_geometry(),
        delta in 0i32..=5000,
    ) {
        let start = ScrollState::default();
        let next = scroll_by(start, delta as f32, geometry, pages.as_slice());
        prop_assert!(next.pointer >= start.pointer);
    }
}

#[test]
fn documented_three_chapter_scenario() {
    let pages = [2usize, 1, 3];
    let geometry = PageGeometry::new(1000.0).with_preserve(100.0);
    let state = scroll_by(ScrollState::default(), 2500.0, geometry, &pages[..]);
    assert_eq!(state, ScrollState::at(1, 0, 400.0));
}

#[test]
fn unknown_page_counts_treat_chapters_as_one_page() {
    let pages: Vec<Option<usize>> = vec![None, None, Some(2)];
    let geometry = PageGeometry::new(100.0);
    let state = scroll_by(ScrollState::default(), 150.0, geometry, &pages);
    assert_eq!(state, ScrollState::at(1, 0, 50.0));
}
