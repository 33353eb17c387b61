use super::graph::articulation_points;
use super::path::{PathSpec, PathView};
use super::TileConstraint;
use crate::tile_propagator::TilePropagator;
use crate::{Contradiction, Resolution, WfcError};
use log::trace;

const NAME: &str = "connected";

/// Requires every relevant part of the path to be joined in a single
/// connected component.
///
/// Nodes that every route between relevant nodes has to pass through are
/// forced into the path, and relevant nodes that the component can no
/// longer reach are removed.
#[derive(Debug, Clone)]
pub struct ConnectedConstraint {
    spec: PathSpec,
    view: Option<PathView>,
}

impl ConnectedConstraint {
    pub const fn new(spec: PathSpec) -> Self {
        Self { spec, view: None }
    }
}

impl TileConstraint for ConnectedConstraint {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, propagator: &mut TilePropagator) -> Result<(), WfcError> {
        if self.view.is_none() {
            self.view = Some(self.spec.view(propagator)?);
        }
        if let Some(view) = &self.view {
            let nodes: Vec<usize> = view.relevant_cell_nodes().collect();
            for node in nodes {
                if view.select_path(propagator, node) == Resolution::Contradiction {
                    break;
                }
            }
        }
        Ok(())
    }

    fn check(&mut self, propagator: &mut TilePropagator) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        view.update(propagator);
        let view = &*view;

        let node_count = view.graph().node_count();
        if let Some(node) =
            (0..node_count).find(|&n| view.must_be_relevant[n] && !view.could_be_path[n])
        {
            propagator.set_contradiction(
                Contradiction::new(NAME, "a relevant cell cannot be part of the path")
                    .at(view.cell(node)),
            );
            return;
        }

        let result = articulation_points(view.graph(), &view.could_be_path, &view.must_be_relevant);
        if result.component_count > 1 {
            propagator.set_contradiction(Contradiction::new(
                NAME,
                format!(
                    "path is split into {} disconnected components",
                    result.component_count
                ),
            ));
            return;
        }
        if result.component_count == 0 {
            return;
        }

        for node in 0..node_count {
            if result.is_articulation[node] && !view.must_be_path[node] {
                trace!("Connected: forcing path at cell {}", view.cell(node));
                if view.select_path(propagator, node) == Resolution::Contradiction {
                    return;
                }
            }
        }
        for node in 0..node_count {
            if view.could_be_relevant[node] && result.component[node].is_none() {
                trace!("Connected: cell {} is cut off", view.cell(node));
                if view.ban_relevant(propagator, node) == Resolution::Contradiction {
                    return;
                }
            }
        }
    }
}
