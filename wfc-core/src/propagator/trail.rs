use std::collections::VecDeque;

/// A choice the solver made and may have to take back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub index: usize,
    pub pattern: usize,
    /// Length of the ban log when the decision was made.
    trail_len: usize,
}

/// Undo log of bans plus the bounded stack of decision points.
///
/// Bans are only logged while at least one decision is retained; with no
/// decision to return to, a ban can never be undone. When the stack is full
/// the oldest decision is forgotten and its bans become permanent.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    bans: Vec<(usize, usize)>,
    decisions: VecDeque<Decision>,
    capacity: Option<usize>,
}

impl Trail {
    /// `capacity` bounds the retained decisions; `None` keeps them all.
    pub const fn new(capacity: Option<usize>) -> Self {
        Self {
            bans: Vec::new(),
            decisions: VecDeque::new(),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.bans.clear();
        self.decisions.clear();
    }

    pub fn depth(&self) -> usize {
        self.decisions.len()
    }

    pub const fn can_backtrack(&self) -> bool {
        !matches!(self.capacity, Some(0))
    }

    pub fn record_ban(&mut self, index: usize, pattern: usize) {
        if !self.decisions.is_empty() {
            self.bans.push((index, pattern));
        }
    }

    /// Opens a decision point. Returns `false` if backtracking is disabled,
    /// in which case nothing is retained.
    pub fn push_decision(&mut self, index: usize, pattern: usize) -> bool {
        if !self.can_backtrack() {
            return false;
        }
        if let Some(capacity) = self.capacity {
            while self.decisions.len() >= capacity {
                self.drop_oldest();
            }
        }
        self.decisions.push_back(Decision {
            index,
            pattern,
            trail_len: self.bans.len(),
        });
        true
    }

    /// Closes the latest decision point, returning it along with the bans
    /// made since, oldest first.
    pub fn pop_decision(&mut self) -> Option<(Decision, Vec<(usize, usize)>)> {
        let decision = self.decisions.pop_back()?;
        let bans = self.bans.split_off(decision.trail_len);
        Some((decision, bans))
    }

    /// Forgets the oldest decision. Bans logged before the next decision can
    /// no longer be reached and are discarded.
    fn drop_oldest(&mut self) {
        if self.decisions.pop_front().is_none() {
            return;
        }
        let keep_from = self.decisions.front().map_or(self.bans.len(), |d| d.trail_len);
        self.bans.drain(..keep_from);
        for decision in &mut self.decisions {
            decision.trail_len -= keep_from;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bans_are_logged_only_under_a_decision() {
        let mut trail = Trail::new(None);
        trail.record_ban(0, 0);
        assert!(trail.push_decision(1, 2));
        trail.record_ban(1, 0);
        trail.record_ban(2, 1);
        let (decision, bans) = trail.pop_decision().unwrap();
        assert_eq!((decision.index, decision.pattern), (1, 2));
        assert_eq!(bans, vec![(1, 0), (2, 1)]);
        assert!(trail.pop_decision().is_none());
    }

    #[test]
    fn bounded_stack_forgets_oldest() {
        let mut trail = Trail::new(Some(2));
        trail.push_decision(0, 0);
        trail.record_ban(9, 9);
        trail.push_decision(1, 0);
        trail.record_ban(1, 1);
        trail.push_decision(2, 0);
        trail.record_ban(2, 1);
        assert_eq!(trail.depth(), 2);

        let (latest, bans) = trail.pop_decision().unwrap();
        assert_eq!(latest.index, 2);
        assert_eq!(bans, vec![(2, 1)]);
        let (earlier, bans) = trail.pop_decision().unwrap();
        assert_eq!(earlier.index, 1);
        assert_eq!(bans, vec![(1, 1)]);
        assert!(trail.pop_decision().is_none());
    }

    #[test]
    fn zero_capacity_disables_backtracking() {
        let mut trail = Trail::new(Some(0));
        assert!(!trail.push_decision(0, 0));
        trail.record_ban(0, 1);
        assert_eq!(trail.depth(), 0);
        assert!(trail.pop_decision().is_none());
    }
}
