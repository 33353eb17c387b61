use super::Tracker;
use crate::wave::Wave;
use rand::Rng;

/// Running sums for one cell's Shannon entropy.
///
/// With frequencies `f`, `sum = Σf`, `plogp_sum = Σ f·ln f` and
/// `H = ln(sum) - plogp_sum / sum`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct EntropyValues {
    pub plogp_sum: f64,
    pub sum: f64,
    pub entropy: f64,
}

impl EntropyValues {
    fn recompute(&mut self) {
        self.entropy = if self.sum > 0.0 {
            self.sum.ln() - self.plogp_sum / self.sum
        } else {
            0.0
        };
    }

    pub(crate) fn remove(&mut self, frequency: f64, plogp: f64) {
        self.sum -= frequency;
        self.plogp_sum -= plogp;
        self.recompute();
    }

    pub(crate) fn add(&mut self, frequency: f64, plogp: f64) {
        self.sum += frequency;
        self.plogp_sum += plogp;
        self.recompute();
    }
}

/// Precomputed `f·ln f` for each frequency.
pub(crate) fn plogp_table(frequencies: &[f64]) -> Vec<f64> {
    frequencies.iter().map(|&f| f * f.ln()).collect()
}

/// Computes every cell's entropy values from the wave.
pub(crate) fn compute_values(wave: &Wave, frequencies: &[f64], plogp: &[f64]) -> Vec<EntropyValues> {
    (0..wave.cell_count())
        .map(|index| {
            let mut values = EntropyValues::default();
            for pattern in wave.possible_patterns(index) {
                values.sum += frequencies[pattern];
                values.plogp_sum += plogp[pattern];
            }
            values.recompute();
            values
        })
        .collect()
}

/// Keeps per-cell entropies up to date and picks the undecided cell with
/// the lowest entropy by scanning.
#[derive(Debug, Clone)]
pub struct EntropyTracker {
    frequencies: Vec<f64>,
    plogp: Vec<f64>,
    values: Vec<EntropyValues>,
    active: Vec<bool>,
}

impl EntropyTracker {
    pub fn new(frequencies: &[f64], active: Vec<bool>) -> Self {
        Self {
            frequencies: frequencies.to_vec(),
            plogp: plogp_table(frequencies),
            values: Vec::new(),
            active,
        }
    }

    /// Entropy of a cell's remaining patterns.
    pub fn entropy(&self, index: usize) -> f64 {
        self.values[index].entropy
    }

    pub fn set_frequencies(&mut self, frequencies: &[f64], wave: &Wave) {
        self.frequencies = frequencies.to_vec();
        self.plogp = plogp_table(frequencies);
        self.reset(wave);
    }

    /// Picks uniformly among the active, undecided cells of minimal entropy.
    ///
    /// The first pass finds the minimum and counts ties, then one random
    /// draw selects which tie to return.
    pub fn pick<R: Rng + ?Sized>(&self, wave: &Wave, rng: &mut R) -> Option<usize> {
        let mut min = f64::INFINITY;
        let mut ties = 0usize;
        for index in self.candidates(wave) {
            let entropy = self.values[index].entropy;
            if entropy < min {
                min = entropy;
                ties = 1;
            } else if entropy == min {
                ties += 1;
            }
        }
        if ties == 0 {
            return None;
        }
        let target = ((ties as f64 * rng.gen::<f64>()) as usize).min(ties - 1);
        self.candidates(wave)
            .filter(|&index| self.values[index].entropy == min)
            .nth(target)
    }

    fn candidates<'a>(&'a self, wave: &'a Wave) -> impl Iterator<Item = usize> + 'a {
        (0..wave.cell_count()).filter(move |&index| self.active[index] && wave.count(index) > 1)
    }
}

impl Tracker for EntropyTracker {
    fn reset(&mut self, wave: &Wave) {
        self.values = compute_values(wave, &self.frequencies, &self.plogp);
    }

    fn do_ban(&mut self, _wave: &Wave, index: usize, pattern: usize) {
        self.values[index].remove(self.frequencies[pattern], self.plogp[pattern]);
    }

    fn undo_ban(&mut self, _wave: &Wave, index: usize, pattern: usize) {
        self.values[index].add(self.frequencies[pattern], self.plogp[pattern]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_entropy_is_ln_count() {
        let wave = Wave::new(1, 3);
        let mut tracker = EntropyTracker::new(&[1.0, 1.0, 1.0], vec![true]);
        tracker.reset(&wave);
        assert!((tracker.entropy(0) - 3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn ban_and_undo_restore_entropy() {
        let mut wave = Wave::new(1, 3);
        let mut tracker = EntropyTracker::new(&[1.0, 2.0, 3.0], vec![true]);
        tracker.reset(&wave);
        let before = tracker.entropy(0);
        wave.remove_possibility(0, 1);
        tracker.do_ban(&wave, 0, 1);
        let expected = compute_values(&wave, &[1.0, 2.0, 3.0], &plogp_table(&[1.0, 2.0, 3.0]))[0];
        assert!((tracker.entropy(0) - expected.entropy).abs() < 1e-12);
        wave.add_possibility(0, 1);
        tracker.undo_ban(&wave, 0, 1);
        assert!((tracker.entropy(0) - before).abs() < 1e-12);
    }

    #[test]
    fn picks_lowest_entropy_and_skips_decided_cells() {
        let mut wave = Wave::new(3, 3);
        let mut tracker = EntropyTracker::new(&[1.0, 1.0, 1.0], vec![true; 3]);
        tracker.reset(&wave);
        // Cell 0 decided, cell 2 down to two patterns.
        for pattern in [0, 1] {
            wave.remove_possibility(0, pattern);
            tracker.do_ban(&wave, 0, pattern);
        }
        wave.remove_possibility(2, 0);
        tracker.do_ban(&wave, 2, 0);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(tracker.pick(&wave, &mut rng), Some(2));
    }

    #[test]
    fn inactive_cells_are_never_picked() {
        let wave = Wave::new(2, 2);
        let mut tracker = EntropyTracker::new(&[1.0, 1.0], vec![false, false]);
        tracker.reset(&wave);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(tracker.pick(&wave, &mut rng), None);
    }
}
