use crate::types::{RulesError, Tile};
use ndarray::Array3;

/// An example grid of tiles that models are learned from.
///
/// Tiles are stored in `(z, y, x)` order. Each axis may be flagged periodic,
/// in which case the sample wraps around along it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    tiles: Array3<Tile>,
    periodic: [bool; 3],
}

impl Sample {
    pub const fn new(tiles: Array3<Tile>) -> Self {
        Self {
            tiles,
            periodic: [false; 3],
        }
    }

    /// Builds a single-layer sample from rows of text, one tile per
    /// character.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, RulesError> {
        let grid: Vec<Vec<Tile>> = rows
            .iter()
            .map(|row| row.as_ref().chars().map(Tile::from_char).collect())
            .collect();
        Self::from_layers(vec![grid])
    }

    /// Builds a sample from `layers[z][y][x]`.
    pub fn from_layers(layers: Vec<Vec<Vec<Tile>>>) -> Result<Self, RulesError> {
        let depth = layers.len();
        let height = layers.first().map_or(0, Vec::len);
        let width = layers
            .first()
            .and_then(|layer| layer.first())
            .map_or(0, Vec::len);
        if depth == 0 || height == 0 || width == 0 {
            return Err(RulesError::MalformedSample("sample is empty".to_string()));
        }
        let mut cells = Vec::with_capacity(depth * height * width);
        for (z, layer) in layers.into_iter().enumerate() {
            if layer.len() != height {
                return Err(RulesError::MalformedSample(format!(
                    "layer {z} has {} rows, expected {height}",
                    layer.len()
                )));
            }
            for (y, row) in layer.into_iter().enumerate() {
                if row.len() != width {
                    return Err(RulesError::MalformedSample(format!(
                        "row {y} of layer {z} has {} tiles, expected {width}",
                        row.len()
                    )));
                }
                cells.extend(row);
            }
        }
        let tiles = Array3::from_shape_vec((depth, height, width), cells)
            .map_err(|e| RulesError::MalformedSample(e.to_string()))?;
        Ok(Self::new(tiles))
    }

    /// Marks every axis as periodic (or not).
    #[must_use]
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = [periodic; 3];
        self
    }

    #[must_use]
    pub fn with_periodicity(mut self, x: bool, y: bool, z: bool) -> Self {
        self.periodic = [x, y, z];
        self
    }

    pub const fn tiles(&self) -> &Array3<Tile> {
        &self.tiles
    }

    pub fn width(&self) -> usize {
        self.tiles.dim().2
    }

    pub fn height(&self) -> usize {
        self.tiles.dim().1
    }

    pub fn depth(&self) -> usize {
        self.tiles.dim().0
    }

    /// Periodicity flags in `[x, y, z]` order.
    pub const fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&Tile> {
        self.tiles.get((z, y, x))
    }
}
