use bitvec::prelude::*;

/// The set of still-possible patterns for every cell, with cached counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    pattern_count: usize,
    possibilities: Vec<BitVec>,
    counts: Vec<usize>,
}

impl Wave {
    /// Creates a wave where every pattern is possible in every cell.
    pub fn new(cell_count: usize, pattern_count: usize) -> Self {
        Self {
            pattern_count,
            possibilities: vec![bitvec![1; pattern_count]; cell_count],
            counts: vec![pattern_count; cell_count],
        }
    }

    /// Makes every pattern possible again.
    pub fn reset(&mut self) {
        for set in &mut self.possibilities {
            set.fill(true);
        }
        self.counts.fill(self.pattern_count);
    }

    pub fn cell_count(&self) -> usize {
        self.counts.len()
    }

    pub const fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    pub fn get(&self, index: usize, pattern: usize) -> bool {
        self.possibilities[index][pattern]
    }

    pub fn count(&self, index: usize) -> usize {
        self.counts[index]
    }

    pub fn possibilities(&self, index: usize) -> &BitSlice {
        &self.possibilities[index]
    }

    pub fn possible_patterns(&self, index: usize) -> impl Iterator<Item = usize> + Clone + '_ {
        self.possibilities[index].iter_ones()
    }

    /// The single remaining pattern, if the cell is decided.
    pub fn decided_pattern(&self, index: usize) -> Option<usize> {
        if self.counts[index] == 1 {
            self.possibilities[index].first_one()
        } else {
            None
        }
    }

    /// Clears a possibility. Returns `true` if the cell has none left.
    pub(crate) fn remove_possibility(&mut self, index: usize, pattern: usize) -> bool {
        debug_assert!(self.possibilities[index][pattern]);
        self.possibilities[index].set(pattern, false);
        self.counts[index] -= 1;
        self.counts[index] == 0
    }

    pub(crate) fn add_possibility(&mut self, index: usize, pattern: usize) {
        debug_assert!(!self.possibilities[index][pattern]);
        self.possibilities[index].set(pattern, true);
        self.counts[index] += 1;
    }
}
