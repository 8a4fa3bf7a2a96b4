//! HeightIndex - O(log n) chapter offsets via Fenwick tree
//!
//! The continuous renderer keeps one height per chapter (estimated or measured) and
//! needs the top offset of any chapter and the chapter under any scroll position.
//! Heights change one chapter at a time as measurements arrive, so a Fenwick tree
//! keeps both queries logarithmic.
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `prefix_sum` / `offset_of` / `height`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `push`: O(log n)
//! - `total`: O(log n)
//! - `len`: O(1)

/// Cumulative chapter heights in whole pixels.
///
/// Supports:
/// - setting one chapter's height
/// - the top offset of a chapter (`offset_of`)
/// - the chapter containing a vertical offset (`lower_bound`)
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage (1-indexed internally, 0-indexed API)
    tree: Vec<isize>,
    /// Number of valid entries (len <= tree.len())
    len: usize,
}

impl HeightIndex {
    /// Creates an empty index with room for `capacity` chapters.
    ///
    /// ```
    /// # use chapterflow::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::new(100);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            len: 0,
        }
    }

    /// Builds an index from a sequence of heights.
    pub fn from_heights(heights: impl IntoIterator<Item = usize>) -> Self {
        let heights = heights.into_iter();
        let mut index = Self::new(heights.size_hint().0);
        for height in heights {
            index.push(height);
        }
        index
    }

    /// Sets the height of chapter `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// ```
    /// # use chapterflow::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(10);
    /// index.push(5);
    /// index.set(0, 10);
    /// assert_eq!(index.height(0), 10);
    /// ```
    pub fn set(&mut self, index: usize, height: usize) {
        assert!(
            index < self.len,
            "index {} out of bounds (len: {})",
            index,
            self.len
        );

        let delta = height as isize - self.height(index) as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
        }
    }

    /// Cumulative height up to and including `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.len,
            "index {} out of bounds (len: {})",
            index,
            self.len
        );

        let sum = fenwick::array::prefix_sum(&self.tree, index);
        sum.max(0) as usize
    }

    /// Height of chapter `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn height(&self, index: usize) -> usize {
        if index == 0 {
            self.prefix_sum(0)
        } else {
            self.prefix_sum(index) - self.prefix_sum(index - 1)
        }
    }

    /// Top offset of chapter `index`: the sum of every height before it.
    ///
    /// `offset_of(len())` is the total height.
    ///
    /// ```
    /// # use chapterflow::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([10, 20, 15]);
    /// assert_eq!(index.offset_of(0), 0);
    /// assert_eq!(index.offset_of(2), 30);
    /// assert_eq!(index.offset_of(3), 45);
    /// ```
    pub fn offset_of(&self, index: usize) -> usize {
        if index == 0 || self.is_empty() {
            0
        } else {
            self.prefix_sum(index.min(self.len) - 1)
        }
    }

    /// First index whose cumulative height exceeds `value`, i.e. the chapter
    /// containing vertical offset `value`.
    ///
    /// Returns `None` if `value >= total()` or the index is empty.
    ///
    /// ```
    /// # use chapterflow::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([10, 20, 15]);
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(1));
    /// assert_eq!(index.lower_bound(44), Some(2));
    /// assert_eq!(index.lower_bound(45), None);
    /// ```
    pub fn lower_bound(&self, value: usize) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        // Entry i covers [prefix_sum(i-1), prefix_sum(i))
        let mut left = 0;
        let mut right = self.len;

        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > value {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len).then_some(left)
    }

    /// Total height of all chapters.
    pub fn total(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.prefix_sum(self.len - 1)
        }
    }

    /// Number of chapters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when there are no chapters.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a chapter with the given height, growing storage if needed.
    pub fn push(&mut self, height: usize) {
        if self.len >= self.tree.len() {
            self.grow();
        }

        let idx = self.len;
        self.len += 1;
        fenwick::array::update(&mut self.tree, idx, height as isize);
    }

    // Nodes past the old end cover earlier entries too, so the tree is rebuilt
    // rather than zero-extended.
    fn grow(&mut self) {
        let heights: Vec<usize> = (0..self.len).map(|i| self.height(i)).collect();
        self.tree = vec![0; self.tree.len().max(1) * 2];
        for (i, height) in heights.into_iter().enumerate() {
            fenwick::array::update(&mut self.tree, i, height as isize);
        }
    }

    /// Clears all entries, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.tree.iter_mut().for_each(|slot| *slot = 0);
        self.len = 0;
    }
}
