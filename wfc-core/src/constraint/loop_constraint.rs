use super::graph::articulation_points;
use super::path::{PathSpec, PathView};
use super::TileConstraint;
use crate::tile_propagator::TilePropagator;
use crate::{Contradiction, WfcError};

const NAME: &str = "loop";

/// Requires the path to form loops: no single node may be the only link
/// between two relevant parts of the path.
#[derive(Debug, Clone)]
pub struct LoopConstraint {
    spec: PathSpec,
    view: Option<PathView>,
}

impl LoopConstraint {
    pub const fn new(spec: PathSpec) -> Self {
        Self { spec, view: None }
    }
}

impl TileConstraint for LoopConstraint {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, propagator: &mut TilePropagator) -> Result<(), WfcError> {
        if self.view.is_none() {
            self.view = Some(self.spec.view(propagator)?);
        }
        Ok(())
    }

    fn check(&mut self, propagator: &mut TilePropagator) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        view.update(propagator);
        let view = &*view;

        let result = articulation_points(view.graph(), &view.could_be_path, &view.must_be_relevant);
        if let Some(node) = result.is_articulation.iter().position(|&a| a) {
            propagator.set_contradiction(
                Contradiction::new(NAME, "path has a cut point").at(view.cell(node)),
            );
        }
    }
}
