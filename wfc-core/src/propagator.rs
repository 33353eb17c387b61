use crate::picker::{IndexPicker, IndexPickerKind, WeightedRandomPatternPicker};
use crate::topology::GridTopology;
use crate::tracker::{ChangeTracker, Quadstate, SelectedTracker, Tracker};
use crate::wave::Wave;
use crate::{Contradiction, Resolution, WfcError};
use bitvec::prelude::*;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use wfc_rules::PatternModel;

pub mod support;
pub mod trail;

use support::SupportCounts;
use trail::Trail;

/// Notified when the solver commits to a choice or takes one back.
pub trait ChoiceObserver {
    /// Called before the bans that enforce the choice are made.
    fn make_choice(&mut self, index: usize, pattern: usize);

    /// Called after the latest choice has been undone.
    fn backtrack(&mut self);
}

/// Tuning knobs for a [`WavePropagator`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropagatorOptions {
    pub index_picker: IndexPickerKind,
    /// Decision points retained for backtracking. `None` keeps every one,
    /// `Some(0)` disables backtracking.
    pub max_backtrack_depth: Option<usize>,
    /// Seed for all random choices. `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for PropagatorOptions {
    fn default() -> Self {
        Self {
            index_picker: IndexPickerKind::default(),
            max_backtrack_depth: Some(0),
            seed: None,
        }
    }
}

impl PropagatorOptions {
    pub fn builder() -> PropagatorOptionsBuilder {
        PropagatorOptionsBuilder::default()
    }
}

/// Builder for [`PropagatorOptions`].
#[derive(Debug, Default)]
pub struct PropagatorOptionsBuilder {
    options: PropagatorOptions,
}

impl PropagatorOptionsBuilder {
    #[must_use]
    pub fn index_picker(mut self, kind: IndexPickerKind) -> Self {
        self.options.index_picker = kind;
        self
    }

    /// Retains at most `depth` decision points.
    #[must_use]
    pub fn max_backtrack_depth(mut self, depth: usize) -> Self {
        self.options.max_backtrack_depth = Some(depth);
        self
    }

    /// Retains every decision point.
    #[must_use]
    pub fn unbounded_backtracking(mut self) -> Self {
        self.options.max_backtrack_depth = None;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    pub fn build(self) -> PropagatorOptions {
        self.options
    }
}

/// Counters accumulated since the last [`WavePropagator::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropagatorStats {
    pub decisions: u64,
    pub backtracks: u64,
    /// Every ban, whether requested, chosen or propagated.
    pub bans: u64,
}

/// Arc-consistency engine over a [`Wave`].
///
/// Banning pattern `q` at a cell decrements, for every neighbour and every
/// pattern compatible with `q` toward that neighbour, a support counter;
/// patterns whose support drops to zero are queued and banned in turn until
/// the queue is empty. All mutation goes through [`ban`](Self::ban),
/// [`select`](Self::select) and the decision operations so that every
/// tracker sees every change.
pub struct WavePropagator {
    model: PatternModel,
    topology: GridTopology,
    wave: Wave,
    support: SupportCounts,
    trail: Trail,
    queue: VecDeque<(usize, usize)>,
    index_picker: IndexPicker,
    pattern_picker: WeightedRandomPatternPicker,
    selected: Vec<SelectedTracker>,
    changes: Vec<ChangeTracker>,
    observers: Vec<Box<dyn ChoiceObserver>>,
    rng: StdRng,
    status: Resolution,
    contradiction: Option<Contradiction>,
    stats: PropagatorStats,
}

impl fmt::Debug for WavePropagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WavePropagator")
            .field("patterns", &self.wave.pattern_count())
            .field("cells", &self.wave.cell_count())
            .field("status", &self.status)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl WavePropagator {
    /// Creates a propagator and runs the initial propagation.
    ///
    /// The result may already be contradictory; check
    /// [`status`](Self::status).
    pub fn new(
        model: PatternModel,
        topology: GridTopology,
        options: &PropagatorOptions,
    ) -> Result<Self, WfcError> {
        if model.directions() != topology.directions() {
            return Err(WfcError::ConfigurationError(format!(
                "model uses {:?} directions but the topology uses {:?}",
                model.directions(),
                topology.directions()
            )));
        }
        let cell_count = topology.index_count();
        let pattern_count = model.pattern_count();
        let mut rng = options
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let index_picker = IndexPicker::new(
            options.index_picker,
            model.frequencies(),
            topology.active_mask(),
            &mut rng,
        );
        let mut propagator = Self {
            wave: Wave::new(cell_count, pattern_count),
            support: SupportCounts::new(cell_count, pattern_count, topology.direction_count()),
            trail: Trail::new(options.max_backtrack_depth),
            queue: VecDeque::new(),
            index_picker,
            pattern_picker: WeightedRandomPatternPicker::new(model.frequencies()),
            selected: Vec::new(),
            changes: Vec::new(),
            observers: Vec::new(),
            rng,
            status: Resolution::Undecided,
            contradiction: None,
            stats: PropagatorStats::default(),
            model,
            topology,
        };
        propagator.clear();
        Ok(propagator)
    }

    /// Returns to the initial state: every pattern possible, except those
    /// that can never be supported by an existing neighbour.
    pub fn clear(&mut self) -> Resolution {
        self.wave.reset();
        self.support.reset(&self.model);
        self.trail.clear();
        self.queue.clear();
        self.status = Resolution::Undecided;
        self.contradiction = None;
        self.stats = PropagatorStats::default();
        self.index_picker.reset(&self.wave);
        for tracker in &mut self.selected {
            tracker.reset(&self.wave);
        }
        for tracker in &mut self.changes {
            tracker.reset(&self.wave);
        }
        for (index, pattern) in self.support.unsupported(&self.topology) {
            if self.status == Resolution::Contradiction {
                break;
            }
            if self.wave.get(index, pattern) {
                self.internal_ban(index, pattern);
            }
        }
        self.propagate()
    }

    pub const fn status(&self) -> Resolution {
        self.status
    }

    /// The reason for the current contradiction, if any.
    pub const fn contradiction(&self) -> Option<&Contradiction> {
        self.contradiction.as_ref()
    }

    pub const fn wave(&self) -> &Wave {
        &self.wave
    }

    pub const fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub const fn model(&self) -> &PatternModel {
        &self.model
    }

    pub const fn stats(&self) -> PropagatorStats {
        self.stats
    }

    pub const fn ban_count(&self) -> u64 {
        self.stats.bans
    }

    /// Decision points currently available to backtrack to.
    pub fn backtrack_depth(&self) -> usize {
        self.trail.depth()
    }

    /// Bans one pattern at a cell and propagates. Does nothing once the
    /// propagator is contradictory.
    pub fn ban(&mut self, index: usize, pattern: usize) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        if self.wave.get(index, pattern) {
            self.internal_ban(index, pattern);
        }
        self.propagate()
    }

    /// Bans every pattern of `patterns` at a cell, then propagates.
    pub fn ban_patterns(&mut self, index: usize, patterns: &BitSlice) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        let banned: Vec<usize> = self
            .wave
            .possible_patterns(index)
            .filter(|&p| patterns.get(p).is_some_and(|bit| *bit))
            .collect();
        for pattern in banned {
            if self.status == Resolution::Contradiction {
                break;
            }
            self.internal_ban(index, pattern);
        }
        self.propagate()
    }

    /// Bans every pattern at a cell that is not in `patterns`, then
    /// propagates.
    pub fn select(&mut self, index: usize, patterns: &BitSlice) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        self.ban_outside(index, patterns);
        self.propagate()
    }

    /// Runs queued bans to a fixpoint.
    pub fn propagate(&mut self) -> Resolution {
        while let Some((index, pattern)) = self.queue.pop_front() {
            if self.status == Resolution::Contradiction {
                break;
            }
            if self.wave.get(index, pattern) {
                self.internal_ban(index, pattern);
            }
        }
        if self.status == Resolution::Contradiction {
            self.queue.clear();
        }
        self.status
    }

    /// Marks the propagator contradictory. The first reason is kept.
    pub fn set_contradiction(&mut self, reason: Contradiction) {
        if self.status != Resolution::Contradiction {
            debug!("Contradiction: {reason}");
            self.status = Resolution::Contradiction;
            self.contradiction = Some(reason);
        }
        self.queue.clear();
    }

    /// Changes a pattern's frequency and refreshes everything derived
    /// from frequencies.
    pub fn reweight(&mut self, pattern: usize, frequency: f64) -> Result<(), WfcError> {
        self.model.set_frequency(pattern, frequency)?;
        self.pattern_picker.set_frequency(pattern, frequency);
        self.index_picker
            .set_frequencies(self.model.frequencies(), &self.wave);
        Ok(())
    }

    /// Registers a tracker over a pattern set and returns its id.
    pub fn add_selected_tracker(&mut self, patterns: BitVec) -> usize {
        self.selected.push(SelectedTracker::new(patterns, &self.wave));
        self.selected.len() - 1
    }

    pub fn quadstate(&self, tracker: usize, index: usize) -> Quadstate {
        self.selected[tracker].get(&self.wave, index)
    }

    /// Registers a change log and returns its id. The first drain reports
    /// every cell.
    pub fn add_change_tracker(&mut self) -> usize {
        self.changes
            .push(ChangeTracker::new(self.wave.cell_count()));
        self.changes.len() - 1
    }

    pub fn take_changes(&mut self, tracker: usize) -> Vec<usize> {
        self.changes[tracker].take_changes()
    }

    pub fn add_choice_observer(&mut self, observer: Box<dyn ChoiceObserver>) {
        self.observers.push(observer);
    }

    /// The next cell to decide, or `None` when every active cell is decided.
    pub fn pick_cell(&mut self) -> Option<usize> {
        self.index_picker.pick(&self.wave, &mut self.rng)
    }

    /// A frequency-weighted random pattern among the cell's possibilities.
    pub fn pick_pattern(&mut self, index: usize) -> Option<usize> {
        self.pattern_picker.pick(&self.wave, index, &mut self.rng)
    }

    /// Like [`pick_pattern`](Self::pick_pattern), restricted to
    /// `candidates`.
    pub fn pick_pattern_within(&mut self, index: usize, candidates: &BitSlice) -> Option<usize> {
        self.pattern_picker
            .pick_within(&self.wave, index, candidates, &mut self.rng)
    }

    /// Records that every active cell is decided.
    pub(crate) fn mark_decided(&mut self) {
        if self.status == Resolution::Undecided {
            self.status = Resolution::Decided;
        }
    }

    /// Commits `pattern` at `index` as a decision point, bans the other
    /// patterns there and propagates.
    pub fn make_choice(&mut self, index: usize, pattern: usize) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        trace!("Choosing pattern {pattern} at cell {index}");
        for observer in &mut self.observers {
            observer.make_choice(index, pattern);
        }
        self.stats.decisions += 1;
        self.trail.push_decision(index, pattern);
        let others: Vec<usize> = self
            .wave
            .possible_patterns(index)
            .filter(|&p| p != pattern)
            .collect();
        for other in others {
            if self.status == Resolution::Contradiction {
                break;
            }
            self.internal_ban(index, other);
        }
        self.propagate()
    }

    /// Undoes the latest decision, then bans the pattern it chose and
    /// propagates. Returns `false` if there was no decision to undo.
    ///
    /// The result can itself be a contradiction, in which case the caller
    /// backtracks again.
    pub fn backtrack_once(&mut self) -> bool {
        let Some((decision, _)) = self.revert_decision() else {
            return false;
        };
        self.stats.backtracks += 1;
        debug!(
            "Backtracked out of pattern {} at cell {} (depth now {})",
            decision.pattern,
            decision.index,
            self.trail.depth()
        );
        for observer in &mut self.observers {
            observer.backtrack();
        }
        if self.wave.get(decision.index, decision.pattern) {
            self.internal_ban(decision.index, decision.pattern);
        }
        self.propagate();
        true
    }

    /// Pops the latest decision and restores the state from just before it.
    pub(crate) fn revert_decision(&mut self) -> Option<(trail::Decision, usize)> {
        let (decision, bans) = self.trail.pop_decision()?;
        let undone = bans.len();
        for &(index, pattern) in bans.iter().rev() {
            self.undo_ban(index, pattern);
        }
        self.queue.clear();
        self.status = Resolution::Undecided;
        self.contradiction = None;
        Some((decision, undone))
    }

    fn ban_outside(&mut self, index: usize, patterns: &BitSlice) {
        let banned: Vec<usize> = self
            .wave
            .possible_patterns(index)
            .filter(|&p| !patterns.get(p).is_some_and(|bit| *bit))
            .collect();
        for pattern in banned {
            if self.status == Resolution::Contradiction {
                break;
            }
            self.internal_ban(index, pattern);
        }
    }

    fn internal_ban(&mut self, index: usize, pattern: usize) {
        trace!("Ban pattern {pattern} at cell {index}");
        let emptied = self.wave.remove_possibility(index, pattern);
        self.trail.record_ban(index, pattern);
        self.stats.bans += 1;
        self.index_picker.do_ban(&self.wave, index, pattern);
        for tracker in &mut self.selected {
            tracker.do_ban(&self.wave, index, pattern);
        }
        for tracker in &mut self.changes {
            tracker.do_ban(&self.wave, index, pattern);
        }

        let directions = self.topology.directions();
        for direction in directions.directions() {
            let Some(neighbour) = self.topology.try_move(index, direction) else {
                continue;
            };
            let inverse = directions.inverse(direction);
            for &other in self.model.compatible(pattern, direction) {
                if self.support.decrement(neighbour, other, inverse) == 0
                    && self.wave.get(neighbour, other)
                {
                    self.queue.push_back((neighbour, other));
                }
            }
        }

        if emptied {
            self.set_contradiction(Contradiction::empty_cell(index));
        }
    }

    fn undo_ban(&mut self, index: usize, pattern: usize) {
        self.wave.add_possibility(index, pattern);
        let directions = self.topology.directions();
        for direction in directions.directions() {
            let Some(neighbour) = self.topology.try_move(index, direction) else {
                continue;
            };
            let inverse = directions.inverse(direction);
            for &other in self.model.compatible(pattern, direction) {
                self.support.increment(neighbour, other, inverse);
            }
        }
        self.index_picker.undo_ban(&self.wave, index, pattern);
        for tracker in &mut self.selected {
            tracker.undo_ban(&self.wave, index, pattern);
        }
        for tracker in &mut self.changes {
            tracker.undo_ban(&self.wave, index, pattern);
        }
    }
}
