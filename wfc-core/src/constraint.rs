use crate::tile_propagator::TilePropagator;
use crate::WfcError;

pub mod acyclic;
pub mod connected;
pub mod graph;
pub mod loop_constraint;
pub mod parity;
pub mod path;

pub use acyclic::AcyclicConstraint;
pub use connected::ConnectedConstraint;
pub use loop_constraint::LoopConstraint;
pub use parity::ParityConstraint;
pub use path::{PathSpec, PathView};

/// A global rule checked after propagation settles.
///
/// Constraints act only through the propagator's public operations
/// (`select`, `ban`, `set_contradiction`), so trackers observe every change
/// and backtracking undoes them like any other ban.
pub trait TileConstraint {
    /// Short name used as the source of contradictions.
    fn name(&self) -> &'static str;

    /// Registers trackers and applies initial restrictions. Called on every
    /// [`TilePropagator::initialize`].
    fn init(&mut self, propagator: &mut TilePropagator) -> Result<(), WfcError>;

    /// Inspects the current state, banning or selecting what it can infer,
    /// or reporting a contradiction.
    fn check(&mut self, propagator: &mut TilePropagator);
}
