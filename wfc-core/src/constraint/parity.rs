use super::TileConstraint;
use crate::tile_propagator::{SelectedTrackerId, TilePropagator, TileSet};
use crate::tracker::Quadstate;
use crate::{Contradiction, Resolution, WfcError};
use log::trace;
use std::collections::VecDeque;
use wfc_rules::Tile;

const NAME: &str = "parity";

#[derive(Debug, Clone)]
struct ParityTrackers {
    exits: Vec<SelectedTrackerId>,
    odd: SelectedTrackerId,
    odd_tiles: TileSet,
}

/// Keeps the number of odd-exit tiles even within every region.
///
/// Each path edge joins two exits, so a region that no edge can leave holds
/// an even number of exits in total, hence an even number of tiles with an
/// odd exit count. Regions are grown across edges both of whose exits are
/// still possible. A region with one undetermined cell has that cell's
/// parity forced; with none, an odd total is a contradiction.
#[derive(Debug, Clone)]
pub struct ParityConstraint {
    exits: Vec<(Tile, Vec<usize>)>,
    trackers: Option<ParityTrackers>,
}

impl ParityConstraint {
    /// `exits` lists, per tile, the directions it has exits in.
    pub fn new(exits: impl IntoIterator<Item = (Tile, Vec<usize>)>) -> Self {
        Self {
            exits: exits.into_iter().collect(),
            trackers: None,
        }
    }

    fn create_trackers(&self, propagator: &mut TilePropagator) -> Result<ParityTrackers, WfcError> {
        let directions = propagator.topology().directions();
        for (_, list) in &self.exits {
            for &direction in list {
                directions.check(direction)?;
            }
        }
        let mut exits = Vec::with_capacity(directions.count());
        for direction in directions.directions() {
            let tiles = self
                .exits
                .iter()
                .filter(|(_, list)| list.contains(&direction))
                .map(|(tile, _)| tile);
            let tiles = propagator.tile_set(tiles)?;
            exits.push(propagator.create_selected_tracker(&tiles));
        }
        let odd_tiles = propagator.tile_set(
            self.exits
                .iter()
                .filter(|(_, list)| list.len() % 2 == 1)
                .map(|(tile, _)| tile),
        )?;
        let odd = propagator.create_selected_tracker(&odd_tiles);
        Ok(ParityTrackers {
            exits,
            odd,
            odd_tiles,
        })
    }
}

impl TileConstraint for ParityConstraint {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, propagator: &mut TilePropagator) -> Result<(), WfcError> {
        if self.trackers.is_none() {
            self.trackers = Some(self.create_trackers(propagator)?);
        }
        Ok(())
    }

    fn check(&mut self, propagator: &mut TilePropagator) {
        let Some(trackers) = &self.trackers else {
            return;
        };
        let topology = propagator.topology().clone();
        let directions = topology.directions();
        let mut visited = vec![false; topology.index_count()];
        let mut queue = VecDeque::new();

        for start in 0..topology.index_count() {
            if visited[start] || !topology.is_active(start) {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);
            let mut odd = false;
            let mut undetermined = Vec::new();
            while let Some(cell) = queue.pop_front() {
                match propagator.quadstate(trackers.odd, cell) {
                    Quadstate::Yes => odd = !odd,
                    Quadstate::Maybe => undetermined.push(cell),
                    Quadstate::No => {}
                }
                for direction in directions.directions() {
                    if !propagator.quadstate(trackers.exits[direction], cell).possible() {
                        continue;
                    }
                    let Some(neighbour) = topology.try_move(cell, direction) else {
                        continue;
                    };
                    let facing = trackers.exits[directions.inverse(direction)];
                    if !visited[neighbour] && propagator.quadstate(facing, neighbour).possible() {
                        visited[neighbour] = true;
                        queue.push_back(neighbour);
                    }
                }
            }

            match undetermined.as_slice() {
                [] if odd => {
                    propagator.set_contradiction(
                        Contradiction::new(NAME, "region has an odd number of odd-exit tiles")
                            .at(start),
                    );
                    return;
                }
                &[cell] => {
                    trace!("Parity: forcing cell {cell} to be {}", if odd { "odd" } else { "even" });
                    let status = if odd {
                        propagator.select(cell, &trackers.odd_tiles)
                    } else {
                        propagator.ban(cell, &trackers.odd_tiles)
                    };
                    if status == Resolution::Contradiction {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}
