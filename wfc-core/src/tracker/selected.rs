use super::Tracker;
use crate::wave::Wave;
use bitvec::prelude::*;

/// Three-valued answer to "is this cell one of these patterns?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadstate {
    /// None of the possible patterns are in the set.
    No,
    /// Some are, some are not.
    Maybe,
    /// Every possible pattern is in the set.
    Yes,
}

impl Quadstate {
    /// `true` unless the answer is definitely no.
    pub const fn possible(self) -> bool {
        !matches!(self, Self::No)
    }

    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    pub const fn is_no(self) -> bool {
        matches!(self, Self::No)
    }
}

/// Counts, per cell, how many of a fixed pattern set are still possible.
#[derive(Debug, Clone)]
pub struct SelectedTracker {
    patterns: BitVec,
    selected: Vec<usize>,
}

impl SelectedTracker {
    pub fn new(patterns: BitVec, wave: &Wave) -> Self {
        let mut tracker = Self {
            patterns,
            selected: Vec::new(),
        };
        tracker.reset(wave);
        tracker
    }

    pub fn patterns(&self) -> &BitSlice {
        &self.patterns
    }

    /// Possible patterns of the cell that are in the set.
    pub fn selected_count(&self, index: usize) -> usize {
        self.selected[index]
    }

    pub fn get(&self, wave: &Wave, index: usize) -> Quadstate {
        let selected = self.selected[index];
        if selected == 0 {
            Quadstate::No
        } else if selected == wave.count(index) {
            Quadstate::Yes
        } else {
            Quadstate::Maybe
        }
    }
}

impl Tracker for SelectedTracker {
    fn reset(&mut self, wave: &Wave) {
        self.selected = (0..wave.cell_count())
            .map(|index| {
                wave.possible_patterns(index)
                    .filter(|&p| self.patterns[p])
                    .count()
            })
            .collect();
    }

    fn do_ban(&mut self, _wave: &Wave, index: usize, pattern: usize) {
        if self.patterns[pattern] {
            self.selected[index] -= 1;
        }
    }

    fn undo_ban(&mut self, _wave: &Wave, index: usize, pattern: usize) {
        if self.patterns[pattern] {
            self.selected[index] += 1;
        }
    }
}
