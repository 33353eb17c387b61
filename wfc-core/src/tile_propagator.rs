use crate::constraint::TileConstraint;
use crate::grid::Grid;
use crate::propagator::{ChoiceObserver, PropagatorOptions, PropagatorStats, WavePropagator};
use crate::topology::GridTopology;
use crate::tracker::Quadstate;
use crate::wave::Wave;
use crate::{Contradiction, Resolution, WfcError};
use bitvec::prelude::*;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fmt;
use wfc_rules::{PatternModel, Tile, TileMapping};

/// A set of tiles together with the patterns that display them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    tiles: Vec<Tile>,
    patterns: BitVec,
}

impl TileSet {
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn patterns(&self) -> &BitSlice {
        &self.patterns
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        self.tiles.contains(tile)
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Handle to a tile-set tracker created with
/// [`TilePropagator::create_selected_tracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectedTrackerId(usize);

/// Handle to a change log created with
/// [`TilePropagator::create_change_tracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeTrackerId(usize);

/// Builder for [`TilePropagator`].
pub struct TilePropagatorBuilder {
    model: PatternModel,
    mapping: TileMapping,
    topology: GridTopology,
    options: PropagatorOptions,
    constraints: Vec<Box<dyn TileConstraint>>,
}

impl TilePropagatorBuilder {
    pub fn new(model: PatternModel, mapping: TileMapping, topology: GridTopology) -> Self {
        Self {
            model,
            mapping,
            topology,
            options: PropagatorOptions::default(),
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(mut self, options: PropagatorOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: impl TileConstraint + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Builds the propagator and runs [`TilePropagator::initialize`].
    pub fn build(self) -> Result<TilePropagator, WfcError> {
        if self.mapping.pattern_count() != self.model.pattern_count() {
            return Err(WfcError::ConfigurationError(format!(
                "tile mapping covers {} patterns but the model has {}",
                self.mapping.pattern_count(),
                self.model.pattern_count()
            )));
        }
        let propagator = WavePropagator::new(self.model, self.topology, &self.options)?;
        let mut tiles = TilePropagator {
            propagator,
            mapping: self.mapping,
            constraints: self.constraints,
        };
        tiles.initialize()?;
        Ok(tiles)
    }
}

/// Tile-level control surface over a [`WavePropagator`], with global
/// constraints checked after every change.
///
/// `step` decides one cell and recovers from contradictions by
/// backtracking (when enabled). `ban` and `select` apply the caller's
/// restriction and check constraints, but never backtrack past it.
pub struct TilePropagator {
    propagator: WavePropagator,
    mapping: TileMapping,
    constraints: Vec<Box<dyn TileConstraint>>,
}

impl fmt::Debug for TilePropagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.constraints.iter().map(|c| c.name()).collect();
        f.debug_struct("TilePropagator")
            .field("propagator", &self.propagator)
            .field("tiles", &self.mapping.tiles().len())
            .field("constraints", &names)
            .finish()
    }
}

impl TilePropagator {
    /// A propagator without constraints.
    pub fn new(
        model: PatternModel,
        mapping: TileMapping,
        topology: GridTopology,
        options: PropagatorOptions,
    ) -> Result<Self, WfcError> {
        TilePropagatorBuilder::new(model, mapping, topology)
            .options(options)
            .build()
    }

    /// A propagator whose tiles are the pattern indices themselves.
    pub fn from_patterns(
        model: PatternModel,
        topology: GridTopology,
        options: PropagatorOptions,
    ) -> Result<Self, WfcError> {
        let mapping = TileMapping::identity(model.pattern_count());
        Self::new(model, mapping, topology, options)
    }

    /// Clears the wave, lets every constraint apply its initial
    /// restrictions and checks them to a fixpoint.
    pub fn initialize(&mut self) -> Result<Resolution, WfcError> {
        self.propagator.clear();
        let mut constraints = std::mem::take(&mut self.constraints);
        let mut result = Ok(());
        for constraint in &mut constraints {
            if let Err(e) = constraint.init(self) {
                result = Err(e);
                break;
            }
        }
        self.constraints = constraints;
        result?;
        self.check_constraints();
        info!(
            "Initialized {} cells with {} patterns and {} constraint(s): {:?}",
            self.topology().active_count(),
            self.model().pattern_count(),
            self.constraints.len(),
            self.status()
        );
        Ok(self.status())
    }

    pub const fn status(&self) -> Resolution {
        self.propagator.status()
    }

    pub const fn contradiction(&self) -> Option<&Contradiction> {
        self.propagator.contradiction()
    }

    /// Marks the solve contradictory, e.g. from a constraint check.
    pub fn set_contradiction(&mut self, reason: Contradiction) {
        self.propagator.set_contradiction(reason);
    }

    pub const fn stats(&self) -> PropagatorStats {
        self.propagator.stats()
    }

    pub const fn topology(&self) -> &GridTopology {
        self.propagator.topology()
    }

    pub const fn model(&self) -> &PatternModel {
        self.propagator.model()
    }

    pub const fn mapping(&self) -> &TileMapping {
        &self.mapping
    }

    pub const fn wave(&self) -> &Wave {
        self.propagator.wave()
    }

    pub const fn propagator(&self) -> &WavePropagator {
        &self.propagator
    }

    /// Resolves tiles to their patterns. Unknown tiles are an error.
    pub fn tile_set<'a>(&self, tiles: impl IntoIterator<Item = &'a Tile>) -> Result<TileSet, WfcError> {
        let tiles: Vec<Tile> = tiles.into_iter().cloned().collect();
        let patterns = self.mapping.pattern_set(&tiles)?;
        Ok(TileSet { tiles, patterns })
    }

    /// Tracks, per cell, whether the cell is one of `tiles`.
    pub fn create_selected_tracker(&mut self, tiles: &TileSet) -> SelectedTrackerId {
        SelectedTrackerId(self.propagator.add_selected_tracker(tiles.patterns.clone()))
    }

    pub fn quadstate(&self, tracker: SelectedTrackerId, index: usize) -> Quadstate {
        self.propagator.quadstate(tracker.0, index)
    }

    pub fn create_change_tracker(&mut self) -> ChangeTrackerId {
        ChangeTrackerId(self.propagator.add_change_tracker())
    }

    /// Cells whose possibilities changed since the last call with this
    /// tracker. The first call reports every cell.
    pub fn take_changes(&mut self, tracker: ChangeTrackerId) -> Vec<usize> {
        self.propagator.take_changes(tracker.0)
    }

    pub fn add_choice_observer(&mut self, observer: Box<dyn ChoiceObserver>) {
        self.propagator.add_choice_observer(observer);
    }

    /// Removes `tiles` from the cell's possibilities.
    pub fn ban(&mut self, index: usize, tiles: &TileSet) -> Resolution {
        self.propagator.ban_patterns(index, &tiles.patterns);
        self.check_constraints();
        self.status()
    }

    /// Restricts the cell to `tiles`.
    pub fn select(&mut self, index: usize, tiles: &TileSet) -> Resolution {
        self.propagator.select(index, &tiles.patterns);
        self.check_constraints();
        self.status()
    }

    pub fn ban_tile(&mut self, index: usize, tile: &Tile) -> Result<Resolution, WfcError> {
        let tiles = self.tile_set([tile])?;
        Ok(self.ban(index, &tiles))
    }

    pub fn select_tile(&mut self, index: usize, tile: &Tile) -> Result<Resolution, WfcError> {
        let tiles = self.tile_set([tile])?;
        Ok(self.select(index, &tiles))
    }

    /// Decides one cell: picks a cell and a pattern, propagates, checks
    /// constraints and backtracks out of any contradiction.
    pub fn step(&mut self) -> Resolution {
        if self.status() != Resolution::Undecided {
            return self.status();
        }
        let Some(index) = self.propagator.pick_cell() else {
            self.propagator.mark_decided();
            debug!("All cells decided");
            return self.status();
        };
        match self.propagator.pick_pattern(index) {
            Some(pattern) => {
                self.propagator.make_choice(index, pattern);
            }
            None => self
                .propagator
                .set_contradiction(Contradiction::empty_cell(index)),
        }
        self.settle()
    }

    /// Steps until the solve is decided or contradictory, or `max_steps`
    /// steps have been taken.
    pub fn run(&mut self, max_steps: Option<u64>) -> Resolution {
        let mut steps = 0u64;
        while self.status() == Resolution::Undecided {
            if max_steps.is_some_and(|max| steps >= max) {
                break;
            }
            self.step();
            steps += 1;
        }
        self.status()
    }

    /// Undoes the latest decision and rules out the pattern it chose.
    /// Returns the status unchanged if there is no decision to undo.
    pub fn backtrack(&mut self) -> Resolution {
        if self.propagator.backtrack_once() {
            self.settle()
        } else {
            self.status()
        }
    }

    /// Decides a cell with a random pattern among those showing one of
    /// `tiles`. The choice can be backtracked like any other.
    pub fn select_random_within(&mut self, index: usize, tiles: &TileSet) -> Resolution {
        if self.status() == Resolution::Contradiction {
            return self.status();
        }
        match self.propagator.pick_pattern_within(index, &tiles.patterns) {
            Some(pattern) => {
                self.propagator.make_choice(index, pattern);
            }
            None => self.propagator.set_contradiction(
                Contradiction::new("propagator", "no allowed tile remains").at(index),
            ),
        }
        self.settle()
    }

    /// Changes the frequency of a pattern for subsequent choices.
    pub fn reweight_pattern(&mut self, pattern: usize, frequency: f64) -> Result<(), WfcError> {
        self.propagator.reweight(pattern, frequency)
    }

    pub fn possibilities(&self, index: usize) -> &BitSlice {
        self.wave().possibilities(index)
    }

    pub fn count(&self, index: usize) -> usize {
        self.wave().count(index)
    }

    /// Distinct tiles still possible at a cell, sorted.
    pub fn possible_tiles(&self, index: usize) -> Vec<Tile> {
        self.wave()
            .possible_patterns(index)
            .filter_map(|pattern| self.mapping.tile_of(pattern))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The tile at a cell once every remaining pattern shows the same tile.
    pub fn decided_tile(&self, index: usize) -> Option<&Tile> {
        let mut patterns = self.wave().possible_patterns(index);
        let first = self.mapping.tile_of(patterns.next()?)?;
        patterns
            .all(|pattern| self.mapping.tile_of(pattern) == Some(first))
            .then_some(first)
    }

    /// The decided tile of every cell; `None` for undecided and inactive
    /// cells.
    pub fn to_tile_array(&self) -> Grid<Option<Tile>> {
        let topology = self.topology();
        let data = (0..topology.index_count())
            .map(|index| {
                if topology.is_active(index) {
                    self.decided_tile(index).cloned()
                } else {
                    None
                }
            })
            .collect();
        Grid {
            width: topology.width(),
            height: topology.height(),
            depth: topology.depth(),
            data,
        }
    }

    /// `(decided, total)` over active cells.
    pub fn progress(&self) -> (usize, usize) {
        let topology = self.topology();
        let wave = self.wave();
        let decided = (0..topology.index_count())
            .filter(|&index| topology.is_active(index) && wave.count(index) == 1)
            .count();
        (decided, topology.active_count())
    }

    /// Checks constraints and backtracks until the state is consistent or
    /// no decision is left to undo.
    fn settle(&mut self) -> Resolution {
        loop {
            self.check_constraints();
            if self.status() != Resolution::Contradiction {
                return self.status();
            }
            if !self.propagator.backtrack_once() {
                if let Some(reason) = self.contradiction() {
                    warn!("Unrecoverable contradiction: {reason}");
                }
                return self.status();
            }
        }
    }

    /// Runs every constraint until none of them bans anything more.
    fn check_constraints(&mut self) {
        if self.constraints.is_empty() {
            return;
        }
        let mut constraints = std::mem::take(&mut self.constraints);
        loop {
            let bans = self.propagator.ban_count();
            for constraint in &mut constraints {
                if self.status() == Resolution::Contradiction {
                    break;
                }
                constraint.check(self);
            }
            if self.status() == Resolution::Contradiction || self.propagator.ban_count() == bans {
                break;
            }
        }
        self.constraints = constraints;
    }
}
