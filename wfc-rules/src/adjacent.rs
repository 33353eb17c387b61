//! Models where each cell holds one tile and only direct neighbours are
//! constrained.

use crate::direction::DirectionSet;
use crate::mapping::TileMapping;
use crate::model::PatternModel;
use crate::sample::Sample;
use crate::tile_rotation::{require_quarter_turns, TileRotation};
use crate::types::{RulesError, Tile};
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// Builds a [`PatternModel`] with one pattern per tile from explicit
/// adjacency facts and/or samples.
#[derive(Debug, Clone)]
pub struct AdjacentModel {
    directions: DirectionSet,
    tiles: Vec<Tile>,
    tile_index: HashMap<Tile, usize>,
    frequencies: Vec<Option<f64>>,
    /// Tiles whose frequency came from `set_frequency`.
    explicit: Vec<bool>,
    adjacency: Vec<Vec<BTreeSet<usize>>>,
}

impl AdjacentModel {
    pub fn new(directions: DirectionSet) -> Self {
        Self {
            directions,
            tiles: Vec::new(),
            tile_index: HashMap::new(),
            frequencies: Vec::new(),
            explicit: Vec::new(),
            adjacency: Vec::new(),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn tile_id(&mut self, tile: &Tile) -> usize {
        if let Some(&id) = self.tile_index.get(tile) {
            return id;
        }
        let id = self.tiles.len();
        self.tiles.push(tile.clone());
        self.tile_index.insert(tile.clone(), id);
        self.frequencies.push(None);
        self.explicit.push(false);
        self.adjacency
            .push(vec![BTreeSet::new(); self.directions.count()]);
        id
    }

    /// Sets a tile's frequency, registering the tile if needed.
    pub fn set_frequency(&mut self, tile: &Tile, frequency: f64) -> Result<(), RulesError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(RulesError::InvalidFrequency {
                item: format!("tile {tile}"),
                value: frequency,
            });
        }
        let id = self.tile_id(tile);
        self.frequencies[id] = Some(frequency);
        self.explicit[id] = true;
        Ok(())
    }

    /// Allows `dest` one step in `direction` from `source` (and the reverse).
    pub fn add_adjacency(&mut self, source: &Tile, dest: &Tile, direction: usize) -> Result<(), RulesError> {
        self.directions.check(direction)?;
        let s = self.tile_id(source);
        let d = self.tile_id(dest);
        self.adjacency[s][direction].insert(d);
        self.adjacency[d][self.directions.inverse(direction)].insert(s);
        Ok(())
    }

    /// Adds an adjacency and every rotation of it in the table's group.
    /// Rotations that a tile cannot take are skipped.
    pub fn add_rotated_adjacency(
        &mut self,
        source: &Tile,
        dest: &Tile,
        direction: usize,
        rotation: &TileRotation,
    ) -> Result<(), RulesError> {
        self.directions.check(direction)?;
        if !self.directions.is_cartesian() {
            return Err(RulesError::UnsupportedDirections(
                "rotated adjacencies need cartesian directions".to_string(),
            ));
        }
        require_quarter_turns(rotation.group())?;
        let (x, y, z) = self.directions.offset(direction);
        for r in rotation.group().iter() {
            let (Some(s), Some(d)) = (rotation.rotate(source, r), rotation.rotate(dest, r)) else {
                continue;
            };
            let Some((rx, ry)) = r.rotate_offset(x, y) else {
                continue;
            };
            if let Some(rotated) = self.directions.from_offset(rx, ry, z) {
                self.add_adjacency(&s, &d, rotated)?;
            }
        }
        Ok(())
    }

    /// Learns adjacencies and frequencies from a sample. Each occurrence of a
    /// tile adds one to its frequency unless the frequency was set explicitly.
    pub fn add_sample(&mut self, sample: &Sample) -> Result<(), RulesError> {
        let [px, py, pz] = sample.periodicity();
        let (width, height, depth) = (sample.width(), sample.height(), sample.depth());
        for ((z, y, x), tile) in sample.tiles().indexed_iter() {
            let id = self.tile_id(tile);
            if !self.explicit[id] {
                *self.frequencies[id].get_or_insert(0.0) += 1.0;
            }
            for direction in self.directions.directions() {
                let (dx, dy, dz) = self.directions.offset(direction);
                let next = (
                    step(x, dx, width, px),
                    step(y, dy, height, py),
                    step(z, dz, depth, pz),
                );
                if let (Some(nx), Some(ny), Some(nz)) = next {
                    let neighbour = sample.tiles()[(nz, ny, nx)].clone();
                    self.add_adjacency(tile, &neighbour, direction)?;
                }
            }
        }
        Ok(())
    }

    /// Produces the model; tiles without a frequency default to 1.
    pub fn build(&self) -> Result<(PatternModel, TileMapping), RulesError> {
        if self.tiles.is_empty() {
            return Err(RulesError::EmptyModel);
        }
        let propagator = self
            .adjacency
            .iter()
            .map(|lists| lists.iter().map(|set| set.iter().copied().collect()).collect())
            .collect();
        let frequencies = self.frequencies.iter().map(|f| f.unwrap_or(1.0)).collect();
        let model = PatternModel::new(self.directions, propagator, frequencies)?;
        debug!("Built adjacent model with {} tiles", self.tiles.len());
        Ok((model, TileMapping::new(self.tiles.clone())))
    }
}

fn step(position: usize, delta: i32, size: usize, periodic: bool) -> Option<usize> {
    let target = position as i64 + i64::from(delta);
    let size = size as i64;
    if periodic {
        Some(target.rem_euclid(size) as usize)
    } else if (0..size).contains(&target) {
        Some(target as usize)
    } else {
        None
    }
}
