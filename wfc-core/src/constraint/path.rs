use super::graph::SimpleGraph;
use crate::tile_propagator::{SelectedTrackerId, TilePropagator, TileSet};
use crate::{Resolution, WfcError};
use wfc_rules::Tile;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathTiles {
    /// Cells holding one of these tiles are path.
    Cells(Vec<Tile>),
    /// Each tile lists the directions it has exits in.
    Edged(Vec<(Tile, Vec<usize>)>),
}

/// Which tiles form a path, and which cells or tiles the path has to reach.
///
/// Without relevant cells or tiles, every path node is relevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    tiles: PathTiles,
    relevant_cells: Vec<usize>,
    relevant_tiles: Vec<Tile>,
}

impl PathSpec {
    /// A path made of whole cells: any cell holding one of `tiles`.
    pub fn tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        Self {
            tiles: PathTiles::Cells(tiles.into_iter().collect()),
            relevant_cells: Vec::new(),
            relevant_tiles: Vec::new(),
        }
    }

    /// A path through tile exits. Two neighbouring cells are joined when
    /// both tiles have an exit facing the other.
    pub fn edged(exits: impl IntoIterator<Item = (Tile, Vec<usize>)>) -> Self {
        Self {
            tiles: PathTiles::Edged(exits.into_iter().collect()),
            relevant_cells: Vec::new(),
            relevant_tiles: Vec::new(),
        }
    }

    /// Cells the path must pass through.
    #[must_use]
    pub fn with_relevant_cells(mut self, cells: impl IntoIterator<Item = usize>) -> Self {
        self.relevant_cells = cells.into_iter().collect();
        self
    }

    /// Tiles that must all be joined by the path.
    #[must_use]
    pub fn with_relevant_tiles(mut self, tiles: impl IntoIterator<Item = Tile>) -> Self {
        self.relevant_tiles = tiles.into_iter().collect();
        self
    }

    pub fn relevant_cells(&self) -> &[usize] {
        &self.relevant_cells
    }

    /// Registers the trackers the view reads and builds its graph.
    pub(crate) fn view(&self, propagator: &mut TilePropagator) -> Result<PathView, WfcError> {
        let topology = propagator.topology().clone();
        if let Some(&bad) = self
            .relevant_cells
            .iter()
            .find(|&&cell| cell >= topology.index_count())
        {
            return Err(WfcError::ConfigurationError(format!(
                "relevant cell {bad} is outside the topology"
            )));
        }

        let (graph, stride, node_tiles) = match &self.tiles {
            PathTiles::Cells(tiles) => (
                SimpleGraph::cells(&topology),
                1,
                vec![propagator.tile_set(tiles)?],
            ),
            PathTiles::Edged(exits) => {
                let directions = topology.directions();
                for (_, list) in exits {
                    for &direction in list {
                        directions.check(direction)?;
                    }
                }
                let mut node_tiles = Vec::with_capacity(directions.count() + 1);
                for direction in directions.directions() {
                    let tiles = exits
                        .iter()
                        .filter(|(_, list)| list.contains(&direction))
                        .map(|(tile, _)| tile);
                    node_tiles.push(propagator.tile_set(tiles)?);
                }
                node_tiles.push(propagator.tile_set(exits.iter().map(|(tile, _)| tile))?);
                (SimpleGraph::edged(&topology), directions.count() + 1, node_tiles)
            }
        };
        let node_trackers = node_tiles
            .iter()
            .map(|tiles| propagator.create_selected_tracker(tiles))
            .collect();
        let relevant_tiles = if self.relevant_tiles.is_empty() {
            None
        } else {
            let tiles = propagator.tile_set(&self.relevant_tiles)?;
            Some((propagator.create_selected_tracker(&tiles), tiles))
        };
        let mut relevant_cells = vec![false; topology.index_count()];
        for &cell in &self.relevant_cells {
            relevant_cells[cell] = true;
        }

        let node_count = graph.node_count();
        Ok(PathView {
            graph,
            stride,
            node_tiles,
            node_trackers,
            relevant_tiles,
            has_relevance: !self.relevant_cells.is_empty() || !self.relevant_tiles.is_empty(),
            relevant_cells,
            could_be_path: vec![false; node_count],
            must_be_path: vec![false; node_count],
            could_be_relevant: vec![false; node_count],
            must_be_relevant: vec![false; node_count],
        })
    }
}

/// The path as seen from the current wave: which graph nodes could or must
/// be path, and which could or must be relevant.
///
/// For a cell path there is one node per cell. For an edged path each cell
/// contributes one node per exit direction and a centre node last.
#[derive(Debug, Clone)]
pub struct PathView {
    graph: SimpleGraph,
    stride: usize,
    node_tiles: Vec<TileSet>,
    node_trackers: Vec<SelectedTrackerId>,
    relevant_tiles: Option<(SelectedTrackerId, TileSet)>,
    has_relevance: bool,
    relevant_cells: Vec<bool>,
    pub could_be_path: Vec<bool>,
    pub must_be_path: Vec<bool>,
    pub could_be_relevant: Vec<bool>,
    pub must_be_relevant: Vec<bool>,
}

impl PathView {
    pub const fn graph(&self) -> &SimpleGraph {
        &self.graph
    }

    /// The cell a node belongs to.
    pub const fn cell(&self, node: usize) -> usize {
        node / self.stride
    }

    fn is_centre(&self, node: usize) -> bool {
        node % self.stride == self.stride - 1
    }

    /// The tiles that make `node` part of the path.
    pub fn path_tiles(&self, node: usize) -> &TileSet {
        &self.node_tiles[node % self.stride]
    }

    /// Recomputes the node arrays from the propagator's trackers.
    pub fn update(&mut self, propagator: &TilePropagator) {
        let topology = propagator.topology();
        for node in 0..self.graph.node_count() {
            let cell = self.cell(node);
            let state = if topology.is_active(cell) {
                Some(propagator.quadstate(self.node_trackers[node % self.stride], cell))
            } else {
                None
            };
            let could = state.is_some_and(|q| q.possible());
            let must = state.is_some_and(|q| q.is_yes());
            self.could_be_path[node] = could;
            self.must_be_path[node] = must;

            if !self.has_relevance {
                self.could_be_relevant[node] = could;
                self.must_be_relevant[node] = must;
                continue;
            }
            if !self.is_centre(node) || !topology.is_active(cell) {
                self.could_be_relevant[node] = false;
                self.must_be_relevant[node] = false;
                continue;
            }
            let forced = self.relevant_cells[cell];
            let tiles = self
                .relevant_tiles
                .as_ref()
                .map(|(tracker, _)| propagator.quadstate(*tracker, cell));
            self.could_be_relevant[node] = forced || tiles.is_some_and(|q| q.possible());
            self.must_be_relevant[node] = forced || tiles.is_some_and(|q| q.is_yes());
        }
    }

    /// Forces `node` to be path.
    pub fn select_path(&self, propagator: &mut TilePropagator, node: usize) -> Resolution {
        propagator.select(self.cell(node), self.path_tiles(node))
    }

    /// Forbids `node` from being path.
    pub fn ban_path(&self, propagator: &mut TilePropagator, node: usize) -> Resolution {
        propagator.ban(self.cell(node), self.path_tiles(node))
    }

    /// Forbids `node` from being relevant: bans the relevant tiles when
    /// those are configured, the path tiles otherwise.
    pub fn ban_relevant(&self, propagator: &mut TilePropagator, node: usize) -> Resolution {
        match &self.relevant_tiles {
            Some((_, tiles)) => propagator.ban(self.cell(node), tiles),
            None => self.ban_path(propagator, node),
        }
    }

    /// The centre node of each relevant cell. For cell paths that is the
    /// cell itself.
    pub fn relevant_cell_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.relevant_cells
            .iter()
            .enumerate()
            .filter(|&(_, &relevant)| relevant)
            .map(|(cell, _)| cell * self.stride + self.stride - 1)
    }
}
