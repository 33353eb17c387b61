use crate::tracker::{EntropyTracker, HeapEntropyTracker, Tracker};
use crate::wave::Wave;
use bitvec::slice::BitSlice;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strategy for choosing which cell to decide next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum IndexPickerKind {
    /// Lowest entropy, found by scanning every cell.
    #[default]
    Entropy,
    /// Lowest entropy, kept in a priority queue.
    HeapEntropy,
    /// First undecided cell in index order.
    Ordered,
}

/// Picks the first active undecided cell in index order.
#[derive(Debug, Clone)]
pub struct OrderedIndexPicker {
    active: Vec<bool>,
}

impl OrderedIndexPicker {
    pub const fn new(active: Vec<bool>) -> Self {
        Self { active }
    }

    pub fn pick(&self, wave: &Wave) -> Option<usize> {
        (0..wave.cell_count()).find(|&index| self.active[index] && wave.count(index) > 1)
    }
}

/// The configured cell picker. Entropy-based pickers also track bans.
#[derive(Debug, Clone)]
pub enum IndexPicker {
    Entropy(EntropyTracker),
    HeapEntropy(HeapEntropyTracker),
    Ordered(OrderedIndexPicker),
}

impl IndexPicker {
    pub fn new<R: Rng + ?Sized>(kind: IndexPickerKind, frequencies: &[f64], active: Vec<bool>, rng: &mut R) -> Self {
        match kind {
            IndexPickerKind::Entropy => Self::Entropy(EntropyTracker::new(frequencies, active)),
            IndexPickerKind::HeapEntropy => Self::HeapEntropy(HeapEntropyTracker::new(
                frequencies,
                active,
                StdRng::seed_from_u64(rng.gen()),
            )),
            IndexPickerKind::Ordered => Self::Ordered(OrderedIndexPicker::new(active)),
        }
    }

    pub fn pick<R: Rng + ?Sized>(&mut self, wave: &Wave, rng: &mut R) -> Option<usize> {
        match self {
            Self::Entropy(tracker) => tracker.pick(wave, rng),
            Self::HeapEntropy(tracker) => tracker.pick(wave),
            Self::Ordered(picker) => picker.pick(wave),
        }
    }

    pub fn set_frequencies(&mut self, frequencies: &[f64], wave: &Wave) {
        match self {
            Self::Entropy(tracker) => tracker.set_frequencies(frequencies, wave),
            Self::HeapEntropy(tracker) => tracker.set_frequencies(frequencies, wave),
            Self::Ordered(_) => {}
        }
    }
}

impl Tracker for IndexPicker {
    fn reset(&mut self, wave: &Wave) {
        match self {
            Self::Entropy(tracker) => tracker.reset(wave),
            Self::HeapEntropy(tracker) => tracker.reset(wave),
            Self::Ordered(_) => {}
        }
    }

    fn do_ban(&mut self, wave: &Wave, index: usize, pattern: usize) {
        match self {
            Self::Entropy(tracker) => tracker.do_ban(wave, index, pattern),
            Self::HeapEntropy(tracker) => tracker.do_ban(wave, index, pattern),
            Self::Ordered(_) => {}
        }
    }

    fn undo_ban(&mut self, wave: &Wave, index: usize, pattern: usize) {
        match self {
            Self::Entropy(tracker) => tracker.undo_ban(wave, index, pattern),
            Self::HeapEntropy(tracker) => tracker.undo_ban(wave, index, pattern),
            Self::Ordered(_) => {}
        }
    }
}

/// Chooses a possible pattern with probability proportional to its frequency.
#[derive(Debug, Clone)]
pub struct WeightedRandomPatternPicker {
    frequencies: Vec<f64>,
}

impl WeightedRandomPatternPicker {
    pub fn new(frequencies: &[f64]) -> Self {
        Self {
            frequencies: frequencies.to_vec(),
        }
    }

    pub fn set_frequency(&mut self, pattern: usize, frequency: f64) {
        self.frequencies[pattern] = frequency;
    }

    /// Picks among the cell's possible patterns.
    pub fn pick<R: Rng + ?Sized>(&self, wave: &Wave, index: usize, rng: &mut R) -> Option<usize> {
        self.pick_from(wave.possible_patterns(index), rng)
    }

    /// Picks among the cell's possible patterns that are also in `candidates`.
    pub fn pick_within<R: Rng + ?Sized>(
        &self,
        wave: &Wave,
        index: usize,
        candidates: &BitSlice,
        rng: &mut R,
    ) -> Option<usize> {
        self.pick_from(
            wave.possible_patterns(index).filter(|&p| candidates[p]),
            rng,
        )
    }

    /// Draws `r` in `[0, total)` and walks the patterns in index order,
    /// subtracting weights until `r` drops to zero. Rounding can leave `r`
    /// slightly positive, so the last pattern is the fallback.
    fn pick_from<I, R>(&self, patterns: I, rng: &mut R) -> Option<usize>
    where
        I: Iterator<Item = usize> + Clone,
        R: Rng + ?Sized,
    {
        let total: f64 = patterns.clone().map(|p| self.frequencies[p]).sum();
        let mut remaining = total * rng.gen::<f64>();
        let mut last = None;
        for pattern in patterns {
            remaining -= self.frequencies[pattern];
            if remaining <= 0.0 {
                return Some(pattern);
            }
            last = Some(pattern);
        }
        last
    }
}
