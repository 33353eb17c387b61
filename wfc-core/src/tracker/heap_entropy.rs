use super::entropy::{compute_values, plogp_table, EntropyValues};
use super::{ChangeTracker, Tracker};
use crate::wave::Wave;
use float_ord::FloatOrd;
use log::trace;
use rand::rngs::StdRng;
use rand::Rng;

type Key = (FloatOrd<f64>, FloatOrd<f64>);

/// Binary min-heap over cell indices that supports removal and key changes
/// through a position table.
#[derive(Debug, Clone, Default)]
struct IndexedHeap {
    items: Vec<(Key, usize)>,
    positions: Vec<Option<usize>>,
}

impl IndexedHeap {
    fn with_cells(cell_count: usize) -> Self {
        Self {
            items: Vec::new(),
            positions: vec![None; cell_count],
        }
    }

    fn peek(&self) -> Option<usize> {
        self.items.first().map(|&(_, cell)| cell)
    }

    fn contains(&self, cell: usize) -> bool {
        self.positions[cell].is_some()
    }

    /// Replaces the heap contents and heapifies in linear time.
    fn rebuild(&mut self, items: Vec<(Key, usize)>) {
        self.positions.fill(None);
        self.items = items;
        for (position, &(_, cell)) in self.items.iter().enumerate() {
            self.positions[cell] = Some(position);
        }
        for position in (0..self.items.len() / 2).rev() {
            self.sift_down(position);
        }
    }

    fn insert(&mut self, cell: usize, key: Key) {
        let position = self.items.len();
        self.items.push((key, cell));
        self.positions[cell] = Some(position);
        self.sift_up(position);
    }

    fn remove(&mut self, cell: usize) {
        let Some(position) = self.positions[cell].take() else {
            return;
        };
        let last = self.items.len() - 1;
        if position != last {
            self.items.swap(position, last);
            self.positions[self.items[position].1] = Some(position);
        }
        self.items.pop();
        if position < self.items.len() {
            self.sift_down(position);
            self.sift_up(position);
        }
    }

    fn change_key(&mut self, cell: usize, key: Key) {
        let Some(position) = self.positions[cell] else {
            return;
        };
        let old = self.items[position].0;
        self.items[position].0 = key;
        if key < old {
            self.sift_up(position);
        } else {
            self.sift_down(position);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        self.positions[self.items[a].1] = Some(a);
        self.positions[self.items[b].1] = Some(b);
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.items[position].0 < self.items[parent].0 {
                self.swap(position, parent);
                position = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut smallest = position;
            if left < self.items.len() && self.items[left].0 < self.items[smallest].0 {
                smallest = left;
            }
            if right < self.items.len() && self.items[right].0 < self.items[smallest].0 {
                smallest = right;
            }
            if smallest == position {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }
}

/// Entropy-based cell picker backed by a priority queue.
///
/// Bans only log which cells changed; the heap is brought up to date lazily
/// when a pick is requested, either cell by cell or with a full rebuild when
/// more than half the cells changed. Exact entropy ties are broken by a
/// random key drawn per cell at reset.
#[derive(Debug, Clone)]
pub struct HeapEntropyTracker {
    frequencies: Vec<f64>,
    plogp: Vec<f64>,
    values: Vec<EntropyValues>,
    tiebreak: Vec<f64>,
    active: Vec<bool>,
    heap: IndexedHeap,
    changes: ChangeTracker,
    rng: StdRng,
}

impl HeapEntropyTracker {
    pub fn new(frequencies: &[f64], active: Vec<bool>, rng: StdRng) -> Self {
        let cell_count = active.len();
        Self {
            frequencies: frequencies.to_vec(),
            plogp: plogp_table(frequencies),
            values: Vec::new(),
            tiebreak: Vec::new(),
            active,
            heap: IndexedHeap::with_cells(cell_count),
            changes: ChangeTracker::new(cell_count),
            rng,
        }
    }

    pub fn entropy(&self, index: usize) -> f64 {
        self.values[index].entropy
    }

    pub fn set_frequencies(&mut self, frequencies: &[f64], wave: &Wave) {
        self.frequencies = frequencies.to_vec();
        self.plogp = plogp_table(frequencies);
        self.reset(wave);
    }

    fn key(&self, index: usize) -> Key {
        (
            FloatOrd(self.values[index].entropy),
            FloatOrd(self.tiebreak[index]),
        )
    }

    fn is_candidate(&self, wave: &Wave, index: usize) -> bool {
        self.active[index] && wave.count(index) > 1
    }

    fn sync(&mut self, wave: &Wave) {
        let cell_count = self.active.len();
        if self.changes.all_changed() || self.changes.len() * 2 > cell_count {
            let items = (0..cell_count)
                .filter(|&index| self.is_candidate(wave, index))
                .map(|index| (self.key(index), index))
                .collect();
            self.heap.rebuild(items);
            self.changes.clear();
            trace!("Rebuilt entropy heap");
            return;
        }
        for index in self.changes.take_changes() {
            let live = self.is_candidate(wave, index);
            let key = self.key(index);
            match (self.heap.contains(index), live) {
                (true, true) => self.heap.change_key(index, key),
                (true, false) => self.heap.remove(index),
                (false, true) => self.heap.insert(index, key),
                (false, false) => {}
            }
        }
    }

    /// The active, undecided cell with the lowest entropy.
    pub fn pick(&mut self, wave: &Wave) -> Option<usize> {
        self.sync(wave);
        self.heap.peek()
    }
}

impl Tracker for HeapEntropyTracker {
    fn reset(&mut self, wave: &Wave) {
        self.values = compute_values(wave, &self.frequencies, &self.plogp);
        let rng = &mut self.rng;
        self.tiebreak = (0..wave.cell_count()).map(|_| rng.gen::<f64>()).collect();
        self.changes.reset(wave);
    }

    fn do_ban(&mut self, wave: &Wave, index: usize, pattern: usize) {
        self.values[index].remove(self.frequencies[pattern], self.plogp[pattern]);
        self.changes.do_ban(wave, index, pattern);
    }

    fn undo_ban(&mut self, wave: &Wave, index: usize, pattern: usize) {
        self.values[index].add(self.frequencies[pattern], self.plogp[pattern]);
        self.changes.undo_ban(wave, index, pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn key(entropy: f64) -> Key {
        (FloatOrd(entropy), FloatOrd(0.0))
    }

    #[test]
    fn heap_orders_and_updates_keys() {
        let mut heap = IndexedHeap::with_cells(4);
        heap.insert(0, key(3.0));
        heap.insert(1, key(1.0));
        heap.insert(2, key(2.0));
        assert_eq!(heap.peek(), Some(1));
        heap.change_key(0, key(0.5));
        assert_eq!(heap.peek(), Some(0));
        heap.remove(0);
        assert_eq!(heap.peek(), Some(1));
        heap.change_key(1, key(5.0));
        assert_eq!(heap.peek(), Some(2));
        assert!(!heap.contains(0));
        heap.rebuild(vec![(key(4.0), 3), (key(0.1), 2)]);
        assert_eq!(heap.peek(), Some(2));
        assert!(!heap.contains(1));
    }

    #[test]
    fn picks_minimum_after_incremental_changes() {
        let mut wave = Wave::new(4, 3);
        let mut tracker =
            HeapEntropyTracker::new(&[1.0, 1.0, 1.0], vec![true; 4], StdRng::seed_from_u64(3));
        tracker.reset(&wave);
        assert!(tracker.pick(&wave).is_some());

        wave.remove_possibility(3, 0);
        tracker.do_ban(&wave, 3, 0);
        assert_eq!(tracker.pick(&wave), Some(3));

        wave.remove_possibility(3, 1);
        tracker.do_ban(&wave, 3, 1);
        assert_ne!(tracker.pick(&wave), Some(3));

        wave.add_possibility(3, 1);
        tracker.undo_ban(&wave, 3, 1);
        assert_eq!(tracker.pick(&wave), Some(3));
    }
}
