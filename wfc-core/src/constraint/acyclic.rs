use super::graph::{components, find_cycle};
use super::path::{PathSpec, PathView};
use super::TileConstraint;
use crate::tile_propagator::TilePropagator;
use crate::{Contradiction, Resolution, WfcError};

const NAME: &str = "acyclic";

/// Forbids the path from closing a cycle.
///
/// A node that could still become path is ruled out once two of its
/// neighbours are already path and joined to each other, since making it
/// path would close a loop.
#[derive(Debug, Clone)]
pub struct AcyclicConstraint {
    spec: PathSpec,
    view: Option<PathView>,
}

impl AcyclicConstraint {
    pub const fn new(spec: PathSpec) -> Self {
        Self { spec, view: None }
    }
}

impl TileConstraint for AcyclicConstraint {
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
        let graph = view.graph();

        if let Some(node) = find_cycle(graph, &view.must_be_path) {
            propagator.set_contradiction(
                Contradiction::new(NAME, "path contains a cycle").at(view.cell(node)),
            );
            return;
        }

        let component = components(graph, &view.must_be_path);
        for node in 0..graph.node_count() {
            if !view.could_be_path[node] || view.must_be_path[node] {
                continue;
            }
            let mut seen = Vec::new();
            let closes_loop = graph.neighbours(node).iter().any(|&next| {
                let Some(id) = component[next] else {
                    return false;
                };
                if seen.contains(&id) {
                    true
                } else {
                    seen.push(id);
                    false
                }
            });
            if closes_loop && view.ban_path(propagator, node) == Resolution::Contradiction {
                return;
            }
        }
    }
}
