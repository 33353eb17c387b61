use crate::types::{RulesError, Tile};
use bitvec::prelude::*;
use std::collections::HashMap;

/// Maps between solver patterns and the tiles they display.
///
/// Several patterns may display the same tile (overlapping models), so a tile
/// maps to a set of patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMapping {
    pattern_tiles: Vec<Tile>,
    tiles: Vec<Tile>,
    tile_patterns: HashMap<Tile, BitVec>,
}

impl TileMapping {
    /// `pattern_tiles[p]` is the tile shown for pattern `p`.
    pub fn new(pattern_tiles: Vec<Tile>) -> Self {
        let pattern_count = pattern_tiles.len();
        let mut tiles = Vec::new();
        let mut tile_patterns: HashMap<Tile, BitVec> = HashMap::new();
        for (pattern, tile) in pattern_tiles.iter().enumerate() {
            let set = tile_patterns.entry(tile.clone()).or_insert_with(|| {
                tiles.push(tile.clone());
                bitvec![0; pattern_count]
            });
            set.set(pattern, true);
        }
        Self {
            pattern_tiles,
            tiles,
            tile_patterns,
        }
    }

    /// One tile per pattern, `Tile::Value(p)` for pattern `p`.
    pub fn identity(pattern_count: usize) -> Self {
        Self::new((0..pattern_count as u32).map(Tile::Value).collect())
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_tiles.len()
    }

    /// Distinct tiles in order of first appearance.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_of(&self, pattern: usize) -> Option<&Tile> {
        self.pattern_tiles.get(pattern)
    }

    pub fn patterns_of(&self, tile: &Tile) -> Option<&BitSlice> {
        self.tile_patterns.get(tile).map(BitVec::as_bitslice)
    }

    /// Union of the pattern sets of `tiles`. Unknown tiles are an error.
    pub fn pattern_set<'a>(&self, tiles: impl IntoIterator<Item = &'a Tile>) -> Result<BitVec, RulesError> {
        let mut set = bitvec![0; self.pattern_count()];
        for tile in tiles {
            let patterns = self
                .tile_patterns
                .get(tile)
                .ok_or_else(|| RulesError::UnknownTile(tile.clone()))?;
            set |= patterns.as_bitslice();
        }
        Ok(set)
    }
}
