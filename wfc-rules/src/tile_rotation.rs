//! Lookup tables describing how individual tiles transform under rotation.

pub mod builder;

use crate::rotation::{Rotation, RotationGroup};
use crate::types::{RulesError, Tile};
use std::collections::HashMap;
use std::str::FromStr;

pub use builder::TileRotationBuilder;

/// What to do when a tile has no explicit counterpart for a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileRotationTreatment {
    /// The rotation has no result; anything that needs it is skipped.
    Missing,
    /// The tile is assumed to look the same under every rotation.
    #[default]
    Unchanged,
    /// A `Tile::Rotated` wrapper is synthesized for the missing slot.
    Generated,
}

/// Common symmetry classes, named after letters with the same symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileSymmetry {
    /// No symmetry.
    F,
    /// Symmetric under a half turn.
    N,
    /// Symmetric under reflection in the x axis.
    T,
    /// Symmetric under a half turn and under reflection.
    I,
    /// Symmetric under reflection in the `/` diagonal, like a `└` corner.
    L,
    /// Symmetric under reflection in the `\` diagonal.
    Backslash,
    /// Symmetric under every rotation and reflection.
    X,
}

impl TileSymmetry {
    /// Rotations that map a tile of this class onto itself. `X` is handled
    /// separately since it covers every member of any group.
    pub(crate) fn generators(self) -> Vec<Rotation> {
        match self {
            Self::F | Self::X => Vec::new(),
            Self::N => vec![Rotation::new(180, false)],
            Self::T => vec![Rotation::new(0, true)],
            Self::I => vec![Rotation::new(180, false), Rotation::new(0, true)],
            Self::L => vec![Rotation::new(90, true)],
            Self::Backslash => vec![Rotation::new(270, true)],
        }
    }
}

impl FromStr for TileSymmetry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "F" => Ok(Self::F),
            "N" => Ok(Self::N),
            "T" => Ok(Self::T),
            "I" => Ok(Self::I),
            "L" => Ok(Self::L),
            "\\" | "Backslash" => Ok(Self::Backslash),
            "X" => Ok(Self::X),
            other => Err(format!("Unknown tile symmetry '{other}'")),
        }
    }
}

/// Immutable rotation table produced by [`TileRotationBuilder`].
#[derive(Debug, Clone)]
pub struct TileRotation {
    group: RotationGroup,
    tables: HashMap<Tile, HashMap<Rotation, Tile>>,
    treatments: HashMap<Tile, TileRotationTreatment>,
    default_treatment: TileRotationTreatment,
}

impl TileRotation {
    pub(crate) fn from_parts(
        group: RotationGroup,
        tables: HashMap<Tile, HashMap<Rotation, Tile>>,
        treatments: HashMap<Tile, TileRotationTreatment>,
        default_treatment: TileRotationTreatment,
    ) -> Self {
        Self {
            group,
            tables,
            treatments,
            default_treatment,
        }
    }

    /// A table that knows no tiles and applies `treatment` to all of them.
    pub fn uniform(group: RotationGroup, treatment: TileRotationTreatment) -> Self {
        Self::from_parts(group, HashMap::new(), HashMap::new(), treatment)
    }

    /// A table for the trivial group: every tile maps to itself.
    pub fn identity() -> Self {
        Self::uniform(RotationGroup::trivial(), TileRotationTreatment::Unchanged)
    }

    pub const fn group(&self) -> &RotationGroup {
        &self.group
    }

    /// Treatment applied to a tile without a table entry.
    pub fn treatment(&self, tile: &Tile) -> TileRotationTreatment {
        self.treatments
            .get(tile)
            .copied()
            .unwrap_or(self.default_treatment)
    }

    /// Rotates a tile. Returns `None` if the rotation is outside the group or
    /// the tile's treatment leaves the slot empty.
    pub fn rotate(&self, tile: &Tile, rotation: Rotation) -> Option<Tile> {
        if rotation.is_identity() {
            return Some(tile.clone());
        }
        if !self.group.contains(rotation) {
            return None;
        }
        if let Tile::Rotated(base, applied) = tile {
            return self.rotate(base, *applied * rotation);
        }
        if let Some(table) = self.tables.get(tile) {
            return table.get(&rotation).cloned();
        }
        match self.treatment(tile) {
            TileRotationTreatment::Missing => None,
            TileRotationTreatment::Unchanged => Some(tile.clone()),
            TileRotationTreatment::Generated => Some(tile.rotated_by(rotation)),
        }
    }

    /// Rotates every tile in a slice, failing if any single rotation fails.
    pub fn rotate_all(&self, tiles: &[Tile], rotation: Rotation) -> Option<Vec<Tile>> {
        tiles.iter().map(|t| self.rotate(t, rotation)).collect()
    }

    /// Tiles that have an explicit table.
    pub fn known_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tables.keys()
    }
}

impl Default for TileRotation {
    fn default() -> Self {
        Self::identity()
    }
}

/// Convenience check used by model builders.
pub(crate) fn require_quarter_turns(group: &RotationGroup) -> Result<(), RulesError> {
    if group.smallest_angle() % 90 == 0 {
        Ok(())
    } else {
        Err(RulesError::UnsupportedRotation(group.smallest_angle()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_treatments() {
        let group = RotationGroup::new(4, false).unwrap();
        let quarter = Rotation::new(90, false);
        let a = Tile::from_char('a');

        let unchanged = TileRotation::uniform(group.clone(), TileRotationTreatment::Unchanged);
        assert_eq!(unchanged.rotate(&a, quarter), Some(a.clone()));

        let missing = TileRotation::uniform(group.clone(), TileRotationTreatment::Missing);
        assert_eq!(missing.rotate(&a, quarter), None);
        assert_eq!(missing.rotate(&a, Rotation::IDENTITY), Some(a.clone()));

        let generated = TileRotation::uniform(group, TileRotationTreatment::Generated);
        let rotated = generated.rotate(&a, quarter).unwrap();
        assert_eq!(rotated, Tile::Rotated(Box::new(a.clone()), quarter));
        // Rotating the wrapper again composes with the stored rotation.
        let back = generated.rotate(&rotated, Rotation::new(270, false));
        assert_eq!(back, Some(a));
    }

    #[test]
    fn rotations_outside_group_fail() {
        let table = TileRotation::identity();
        assert_eq!(
            table.rotate(&Tile::Value(1), Rotation::new(90, false)),
            None
        );
    }

    #[test]
    fn parses_symmetry_names() {
        assert_eq!("L".parse::<TileSymmetry>(), Ok(TileSymmetry::L));
        assert_eq!("\\".parse::<TileSymmetry>(), Ok(TileSymmetry::Backslash));
        assert!("Q".parse::<TileSymmetry>().is_err());
    }
}
