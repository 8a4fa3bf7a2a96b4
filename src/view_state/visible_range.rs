//! Range of chapters intersecting the viewport

/// Half-open range of chapter indices `[start, end)`.
///
/// Produced by the continuous renderer from the height index, then widened by the
/// lookahead to decide which chapters to keep loaded.
///
/// # Invariants
/// - `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChapterRange {
    /// First chapter in range (inclusive).
    pub start: usize,
    /// End of range (exclusive).
    pub end: usize,
}

impl ChapterRange {
    /// Create a range. An inverted range collapses to empty at `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of chapters in range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when no chapter is in range.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Iterate over chapter indices in range.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        self.start..self.end
    }

    /// True when `index` is in range.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    /// Extend by `by` chapters on both sides, bounded to `[0, count)`.
    pub fn widened(&self, by: usize, count: usize) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(
            self.start.saturating_sub(by),
            self.end.saturating_add(by).min(count),
        )
    }
}
