use super::Tracker;
use crate::wave::Wave;

/// Records which cells changed since the log was last drained.
///
/// Each cell appears at most once per drain; a generation stamp avoids
/// clearing the per-cell marks on every drain.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    changed: Vec<usize>,
    stamps: Vec<u32>,
    generation: u32,
    all_changed: bool,
}

impl ChangeTracker {
    pub fn new(cell_count: usize) -> Self {
        Self {
            changed: Vec::new(),
            stamps: vec![0; cell_count],
            generation: 1,
            all_changed: true,
        }
    }

    pub fn mark(&mut self, index: usize) {
        if self.all_changed || self.stamps[index] == self.generation {
            return;
        }
        self.stamps[index] = self.generation;
        self.changed.push(index);
    }

    /// `true` if a reset happened since the last drain, meaning every cell
    /// must be treated as changed.
    pub const fn all_changed(&self) -> bool {
        self.all_changed
    }

    /// Number of distinct cells logged since the last drain.
    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && !self.all_changed
    }

    /// Returns the changed cells (all of them after a reset) and starts a
    /// new log.
    pub fn take_changes(&mut self) -> Vec<usize> {
        let changes = if self.all_changed {
            (0..self.stamps.len()).collect()
        } else {
            std::mem::take(&mut self.changed)
        };
        self.clear();
        changes
    }

    /// Starts a new log without reporting anything.
    pub fn clear(&mut self) {
        self.changed.clear();
        self.all_changed = false;
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamps.fill(0);
            self.generation = 1;
        }
    }
}

impl Tracker for ChangeTracker {
    fn reset(&mut self, _wave: &Wave) {
        self.changed.clear();
        self.all_changed = true;
    }

    fn do_ban(&mut self, _wave: &Wave, index: usize, _pattern: usize) {
        self.mark(index);
    }

    fn undo_ban(&mut self, _wave: &Wave, index: usize, _pattern: usize) {
        self.mark(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_cell_once() {
        let wave = Wave::new(4, 2);
        let mut tracker = ChangeTracker::new(4);
        tracker.reset(&wave);
        assert_eq!(tracker.take_changes(), vec![0, 1, 2, 3]);
        tracker.do_ban(&wave, 2, 0);
        tracker.do_ban(&wave, 2, 1);
        tracker.undo_ban(&wave, 1, 0);
        assert_eq!(tracker.take_changes(), vec![2, 1]);
        assert!(tracker.take_changes().is_empty());
        tracker.mark(2);
        assert_eq!(tracker.len(), 1);
    }
}
