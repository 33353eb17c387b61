//! Learns patterns and their compatibilities from overlapping sample windows.

use crate::direction::DirectionSet;
use crate::mapping::TileMapping;
use crate::model::PatternModel;
use crate::rotation::Rotation;
use crate::sample::Sample;
use crate::tile_rotation::{require_quarter_turns, TileRotation};
use crate::types::{RulesError, Tile};
use log::{debug, info};
use ndarray::Array3;
use std::collections::HashMap;

/// Collects `n`-sized windows from samples and turns them into a
/// [`PatternModel`].
///
/// Every distinct window is a pattern, its frequency is the number of times
/// it was seen, and two patterns are compatible in a direction when they
/// agree on the cells where they overlap after shifting by one step.
#[derive(Debug, Clone)]
pub struct OverlappingModel {
    n: usize,
    directions: DirectionSet,
    rotation: TileRotation,
    patterns: Vec<Vec<Tile>>,
    pattern_index: HashMap<Vec<Tile>, usize>,
    frequencies: Vec<f64>,
}

impl OverlappingModel {
    pub fn new(n: usize, directions: DirectionSet) -> Result<Self, RulesError> {
        if n == 0 {
            return Err(RulesError::MalformedModel(
                "pattern size must be at least 1".to_string(),
            ));
        }
        if !directions.is_cartesian() {
            return Err(RulesError::UnsupportedDirections(format!(
                "overlapping models need cartesian directions, got {directions:?}"
            )));
        }
        Ok(Self {
            n,
            directions,
            rotation: TileRotation::identity(),
            patterns: Vec::new(),
            pattern_index: HashMap::new(),
            frequencies: Vec::new(),
        })
    }

    /// Also learn from every rotation of each sample in the table's group.
    pub fn with_rotations(mut self, rotation: TileRotation) -> Result<Self, RulesError> {
        if rotation.group().len() > 1 {
            require_quarter_turns(rotation.group())?;
        }
        self.rotation = rotation;
        Ok(self)
    }

    pub const fn n(&self) -> usize {
        self.n
    }

    fn window(&self) -> (usize, usize, usize) {
        let nz = if self.directions == DirectionSet::Cartesian3d {
            self.n
        } else {
            1
        };
        (self.n, self.n, nz)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Tiles of a pattern in `(z, y, x)` order.
    pub fn pattern(&self, pattern: usize) -> Option<&[Tile]> {
        self.patterns.get(pattern).map(Vec::as_slice)
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Adds a sample and each of its rotations.
    ///
    /// Rotations for which some tile has no rotated counterpart are skipped.
    pub fn add_sample(&mut self, sample: &Sample) -> Result<(), RulesError> {
        let group = self.rotation.group().clone();
        let mut added = 0;
        for rotation in group.iter() {
            match rotate_sample(sample, rotation, &self.rotation) {
                Some(rotated) => {
                    added += self.add_windows(&rotated)?;
                }
                None => debug!("Skipping sample rotation {rotation}: a tile has no rotated form"),
            }
        }
        info!(
            "Sample {}x{}x{} contributed {added} windows, {} distinct patterns so far",
            sample.width(),
            sample.height(),
            sample.depth(),
            self.patterns.len()
        );
        Ok(())
    }

    fn add_windows(&mut self, sample: &Sample) -> Result<usize, RulesError> {
        let (nx, ny, nz) = self.window();
        let [px, py, pz] = sample.periodicity();
        let (width, height, depth) = (sample.width(), sample.height(), sample.depth());
        let too_small = || RulesError::SampleTooSmall {
            width,
            height,
            depth,
            n: self.n,
        };
        let xs = origins(width, nx, px).ok_or_else(too_small)?;
        let ys = origins(height, ny, py).ok_or_else(too_small)?;
        let zs = origins(depth, nz, pz).ok_or_else(too_small)?;

        let tiles = sample.tiles();
        let mut count = 0;
        for z in zs {
            for y in ys.clone() {
                for x in xs.clone() {
                    let mut window = Vec::with_capacity(nx * ny * nz);
                    for dz in 0..nz {
                        for dy in 0..ny {
                            for dx in 0..nx {
                                let cell = ((z + dz) % depth, (y + dy) % height, (x + dx) % width);
                                window.push(tiles[cell].clone());
                            }
                        }
                    }
                    self.record(window);
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn record(&mut self, window: Vec<Tile>) {
        if let Some(&pattern) = self.pattern_index.get(&window) {
            self.frequencies[pattern] += 1.0;
        } else {
            self.pattern_index.insert(window.clone(), self.patterns.len());
            self.patterns.push(window);
            self.frequencies.push(1.0);
        }
    }

    /// Tiles of `pattern` that overlap a neighbour displaced by `offset`,
    /// in a fixed scan order.
    fn overlap_key(&self, pattern: &[Tile], offset: (i32, i32, i32)) -> Vec<Tile> {
        let (nx, ny, nz) = self.window();
        let range = |size: usize, shift: i32| {
            let size = size as i32;
            shift.max(0)..(size + shift).min(size)
        };
        let mut key = Vec::new();
        for z in range(nz, offset.2) {
            for y in range(ny, offset.1) {
                for x in range(nx, offset.0) {
                    let index = (z as usize * ny + y as usize) * nx + x as usize;
                    key.push(pattern[index].clone());
                }
            }
        }
        key
    }

    /// Computes compatibilities and returns the model with its tile mapping.
    ///
    /// Each pattern displays the tile at its window origin.
    pub fn build(&self) -> Result<(PatternModel, TileMapping), RulesError> {
        if self.patterns.is_empty() {
            return Err(RulesError::EmptyModel);
        }
        let mut propagator = vec![Vec::with_capacity(self.directions.count()); self.patterns.len()];
        for direction in self.directions.directions() {
            let (x, y, z) = self.directions.offset(direction);
            let mut by_key: HashMap<Vec<Tile>, Vec<usize>> = HashMap::new();
            for (pattern, tiles) in self.patterns.iter().enumerate() {
                by_key
                    .entry(self.overlap_key(tiles, (-x, -y, -z)))
                    .or_default()
                    .push(pattern);
            }
            for (pattern, tiles) in self.patterns.iter().enumerate() {
                let compatible = by_key
                    .get(&self.overlap_key(tiles, (x, y, z)))
                    .cloned()
                    .unwrap_or_default();
                propagator[pattern].push(compatible);
            }
        }
        let tiles = self.patterns.iter().map(|p| p[0].clone()).collect();
        let model = PatternModel::new(self.directions, propagator, self.frequencies.clone())?;
        debug!(
            "Built overlapping model: n={}, {} patterns",
            self.n,
            model.pattern_count()
        );
        Ok((model, TileMapping::new(tiles)))
    }
}

fn origins(size: usize, window: usize, periodic: bool) -> Option<std::ops::Range<usize>> {
    if periodic {
        Some(0..size)
    } else if size >= window {
        Some(0..size - window + 1)
    } else {
        None
    }
}

/// Rotates a sample in the xy plane. Periodicity flags for x and y swap on
/// quarter turns.
pub(crate) fn rotate_sample(sample: &Sample, rotation: Rotation, table: &TileRotation) -> Option<Sample> {
    if rotation.is_identity() {
        return Some(sample.clone());
    }
    let (width, height, depth) = (sample.width() as i32, sample.height() as i32, sample.depth());
    let corners = [(0, 0), (width - 1, 0), (0, height - 1), (width - 1, height - 1)];
    let mut min = (i32::MAX, i32::MAX);
    for (x, y) in corners {
        let (rx, ry) = rotation.rotate_offset(x, y)?;
        min = (min.0.min(rx), min.1.min(ry));
    }
    let quarter = rotation.rotate_cw() % 180 != 0;
    let (new_width, new_height) = if quarter {
        (height as usize, width as usize)
    } else {
        (width as usize, height as usize)
    };

    let mut cells: Vec<Option<Tile>> = vec![None; depth * new_height * new_width];
    for ((z, y, x), tile) in sample.tiles().indexed_iter() {
        let (rx, ry) = rotation.rotate_offset(x as i32, y as i32)?;
        let (ox, oy) = ((rx - min.0) as usize, (ry - min.1) as usize);
        cells[(z * new_height + oy) * new_width + ox] = Some(table.rotate(tile, rotation)?);
    }
    let cells: Vec<Tile> = cells.into_iter().collect::<Option<_>>()?;
    let tiles = Array3::from_shape_vec((depth, new_height, new_width), cells).ok()?;
    let [px, py, pz] = sample.periodicity();
    let (px, py) = if quarter { (py, px) } else { (px, py) };
    Some(Sample::new(tiles).with_periodicity(px, py, pz))
}
