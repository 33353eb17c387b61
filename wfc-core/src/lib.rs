//! Core library for the Wave Function Collapse algorithm implementation.
//!
//! The solver works on a [`PatternModel`](wfc_rules::PatternModel) over a
//! [`GridTopology`]: a [`WavePropagator`] keeps the per-cell pattern sets
//! consistent with arc-consistency support counting, optionally
//! backtracking out of contradictions, and a [`TilePropagator`] layers
//! tile-level queries and global [`constraint`]s on top.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use wfc_rules::RulesError;

/// Global constraints such as path connectivity and parity.
pub mod constraint;
/// Generic 3D grid used for solver output.
pub mod grid;
/// Cell and pattern selection heuristics.
pub mod picker;
/// Arc-consistency propagation, the undo trail and backtracking.
pub mod propagator;
/// The step loop with progress reporting and cancellation.
pub mod runner;
/// Tile-level facade over the pattern propagator.
pub mod tile_propagator;
/// Cell indexing and neighbourhoods.
pub mod topology;
/// Incremental observers of wave changes.
pub mod tracker;
/// Per-cell pattern possibility sets.
pub mod wave;

pub use crate::constraint::{
    AcyclicConstraint, ConnectedConstraint, LoopConstraint, ParityConstraint, PathSpec,
    TileConstraint,
};
pub use crate::grid::Grid;
pub use crate::picker::IndexPickerKind;
pub use crate::propagator::{ChoiceObserver, PropagatorOptions, PropagatorStats, WavePropagator};
pub use crate::runner::{run, ProgressCallback, RunConfig, RunConfigBuilder, RunReport};
pub use crate::tile_propagator::{TilePropagator, TilePropagatorBuilder, TileSet};
pub use crate::topology::GridTopology;
pub use crate::tracker::Quadstate;
pub use crate::wave::Wave;

/// Overall state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Resolution {
    /// Some cell still has more than one possible pattern.
    #[default]
    Undecided,
    /// Every active cell holds exactly one pattern.
    Decided,
    /// Some cell has no possible pattern left, or a constraint failed.
    Contradiction,
}

/// Why a solve became contradictory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contradiction {
    /// What detected the contradiction, e.g. `"propagator"` or a constraint name.
    pub source: String,
    pub message: String,
    /// The offending cell, when one can be named.
    pub cell: Option<usize>,
}

impl Contradiction {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            cell: None,
        }
    }

    #[must_use]
    pub fn at(mut self, cell: usize) -> Self {
        self.cell = Some(cell);
        self
    }

    /// A cell ran out of possible patterns.
    pub(crate) fn empty_cell(cell: usize) -> Self {
        Self::new("propagator", "no possible patterns remain").at(cell)
    }
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)?;
        if let Some(cell) = self.cell {
            write!(f, " at cell {cell}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while configuring or running the solver.
#[derive(Error, Debug)]
pub enum WfcError {
    /// The solve ended in a contradiction that backtracking could not resolve.
    #[error("Contradiction: {0}")]
    Contradiction(Contradiction),
    /// The model or tile data was invalid.
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),
    /// An error related to invalid configuration (e.g. mismatched directions).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// A mask did not match the topology's cell count.
    #[error("Mask has {actual} entries but the topology has {expected} cells")]
    MaskSize {
        /// Cells in the topology.
        expected: usize,
        /// Entries in the mask.
        actual: usize,
    },
    /// WFC run was interrupted by an external signal (e.g., Ctrl+C).
    #[error("WFC run interrupted by signal")]
    Interrupted,
    /// WFC exceeded the configured maximum number of iterations.
    #[error("Maximum iterations ({0}) reached")]
    MaxIterationsReached(u64),
}

/// Boundary handling applied to every axis of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BoundaryCondition {
    /// Cells on the edge have no neighbours beyond it.
    #[default]
    Finite,
    /// The grid wraps around.
    Periodic,
}

/// Information about the current state of a run, passed to progress callbacks.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// Active cells holding exactly one pattern.
    pub decided_cells: usize,
    /// Active cells in the topology.
    pub total_cells: usize,
    /// Time elapsed since the run started.
    pub elapsed_time: Duration,
    /// Steps completed so far.
    pub iterations: u64,
    /// Backtracks performed so far.
    pub backtracks: u64,
}
