//! Direction sets describing the neighbourhood of a grid cell.
//!
//! Directions are plain indices into the set's offset table, and always come
//! in inverse pairs: `2k` and `2k + 1` point in opposite directions.

use crate::types::RulesError;

const CARTESIAN_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

const HEXAGONAL_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (1, 1, 0),
    (-1, -1, 0),
];

const CARTESIAN_NAMES: [&str; 6] = ["+x", "-x", "+y", "-y", "+z", "-z"];
const HEXAGONAL_NAMES: [&str; 6] = ["+x", "-x", "+y", "-y", "+w", "-w"];

/// The supported neighbourhood shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectionSet {
    /// Four neighbours: ±x, ±y.
    #[default]
    Cartesian2d,
    /// Six neighbours: ±x, ±y, ±z.
    Cartesian3d,
    /// Six neighbours on an axial hex grid: ±x, ±y and the ±(x+y) diagonal.
    Hexagonal2d,
}

impl DirectionSet {
    /// Number of directions in the set.
    pub const fn count(self) -> usize {
        match self {
            Self::Cartesian2d => 4,
            Self::Cartesian3d | Self::Hexagonal2d => 6,
        }
    }

    /// Iterates over every direction index.
    pub fn directions(self) -> std::ops::Range<usize> {
        0..self.count()
    }

    fn table(self) -> &'static [(i32, i32, i32)] {
        match self {
            Self::Cartesian2d => &CARTESIAN_OFFSETS[..4],
            Self::Cartesian3d => &CARTESIAN_OFFSETS,
            Self::Hexagonal2d => &HEXAGONAL_OFFSETS,
        }
    }

    /// Grid offset of a direction.
    ///
    /// # Panics
    ///
    /// Panics if `direction` is out of range; callers only pass indices
    /// obtained from this set.
    pub fn offset(self, direction: usize) -> (i32, i32, i32) {
        self.table()[direction]
    }

    /// The direction pointing the opposite way.
    pub const fn inverse(self, direction: usize) -> usize {
        direction ^ 1
    }

    /// Finds the direction with the given offset, if any.
    pub fn from_offset(self, x: i32, y: i32, z: i32) -> Option<usize> {
        self.table().iter().position(|&o| o == (x, y, z))
    }

    pub const fn is_cartesian(self) -> bool {
        matches!(self, Self::Cartesian2d | Self::Cartesian3d)
    }

    /// Short name of a direction such as `"+x"`.
    pub fn name(self, direction: usize) -> Option<&'static str> {
        let names: &[&str] = match self {
            Self::Hexagonal2d => &HEXAGONAL_NAMES,
            _ => &CARTESIAN_NAMES[..self.count()],
        };
        names.get(direction).copied()
    }

    /// Parses a direction name produced by [`name`](Self::name).
    pub fn parse_name(self, name: &str) -> Option<usize> {
        self.directions()
            .find(|&d| self.name(d).is_some_and(|n| n.eq_ignore_ascii_case(name.trim())))
    }

    /// Returns `direction` if it belongs to the set.
    pub fn check(self, direction: usize) -> Result<usize, RulesError> {
        if direction < self.count() {
            Ok(direction)
        } else {
            Err(RulesError::InvalidDirection {
                direction,
                count: self.count(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_negates_offset() {
        for set in [
            DirectionSet::Cartesian2d,
            DirectionSet::Cartesian3d,
            DirectionSet::Hexagonal2d,
        ] {
            for d in set.directions() {
                let (x, y, z) = set.offset(d);
                assert_eq!(set.offset(set.inverse(d)), (-x, -y, -z));
                assert_eq!(set.from_offset(x, y, z), Some(d));
            }
        }
    }

    #[test]
    fn names_round_trip() {
        let set = DirectionSet::Cartesian3d;
        assert_eq!(set.parse_name("-z"), Some(5));
        assert_eq!(set.parse_name("+X"), Some(0));
        assert_eq!(DirectionSet::Cartesian2d.parse_name("+z"), None);
        assert_eq!(DirectionSet::Hexagonal2d.name(4), Some("+w"));
    }

    #[test]
    fn check_rejects_out_of_range() {
        assert!(DirectionSet::Cartesian2d.check(3).is_ok());
        assert_eq!(
            DirectionSet::Cartesian2d.check(4),
            Err(RulesError::InvalidDirection {
                direction: 4,
                count: 4
            })
        );
    }
}
