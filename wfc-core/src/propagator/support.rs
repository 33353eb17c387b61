use crate::topology::GridTopology;
use wfc_rules::PatternModel;

/// Per `(cell, pattern, direction)` count of patterns in the neighbouring
/// cell that still support the pattern.
///
/// The count for direction `d` is taken over the neighbour reached by
/// moving along `d`. A pattern whose count reaches zero in any direction
/// that has a neighbour can be banned.
#[derive(Debug, Clone)]
pub struct SupportCounts {
    pattern_count: usize,
    direction_count: usize,
    counts: Vec<u32>,
}

impl SupportCounts {
    pub fn new(cell_count: usize, pattern_count: usize, direction_count: usize) -> Self {
        Self {
            pattern_count,
            direction_count,
            counts: vec![0; cell_count * pattern_count * direction_count],
        }
    }

    /// Resets every counter to the full compatibility count of its pattern.
    pub fn reset(&mut self, model: &PatternModel) {
        let stride = self.pattern_count * self.direction_count;
        for cell in self.counts.chunks_mut(stride) {
            for (slot, count) in cell.iter_mut().enumerate() {
                let pattern = slot / self.direction_count;
                let direction = slot % self.direction_count;
                *count = u32::try_from(model.compatible(pattern, direction).len()).unwrap_or(u32::MAX);
            }
        }
    }

    const fn slot(&self, index: usize, pattern: usize, direction: usize) -> usize {
        (index * self.pattern_count + pattern) * self.direction_count + direction
    }

    pub fn get(&self, index: usize, pattern: usize, direction: usize) -> u32 {
        self.counts[self.slot(index, pattern, direction)]
    }

    /// Decrements a counter and returns the new value.
    pub fn decrement(&mut self, index: usize, pattern: usize, direction: usize) -> u32 {
        let slot = self.slot(index, pattern, direction);
        self.counts[slot] = self.counts[slot].saturating_sub(1);
        self.counts[slot]
    }

    pub fn increment(&mut self, index: usize, pattern: usize, direction: usize) {
        let slot = self.slot(index, pattern, direction);
        self.counts[slot] += 1;
    }

    /// Patterns that have no support at all toward an existing neighbour.
    /// These can never be placed at that cell.
    pub fn unsupported(&self, topology: &GridTopology) -> Vec<(usize, usize)> {
        let mut result = Vec::new();
        for index in (0..topology.index_count()).filter(|&i| topology.is_active(i)) {
            for pattern in 0..self.pattern_count {
                let starved = (0..self.direction_count).any(|direction| {
                    topology.try_move(index, direction).is_some()
                        && self.get(index, pattern, direction) == 0
                });
                if starved {
                    result.push((index, pattern));
                }
            }
        }
        result
    }
}
