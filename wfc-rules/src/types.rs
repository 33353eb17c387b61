use crate::rotation::Rotation;
use std::fmt;
use thiserror::Error;

/// A user-facing tile value.
///
/// Tiles are opaque to the solver: it only ever compares and hashes them.
/// `Rotated` is produced when a rotation table generates a rotated variant of a
/// tile that has no explicit counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tile {
    /// A plain tile identified by an integer value. Text samples store the
    /// character's code point here.
    Value(u32),
    /// A base tile viewed through a rotation.
    Rotated(Box<Tile>, Rotation),
}

impl Tile {
    /// Creates a tile from a character, as used by text samples.
    pub const fn from_char(c: char) -> Self {
        Self::Value(c as u32)
    }

    /// Returns this tile viewed through `rotation`, folding nested wrappers
    /// into one and collapsing identity rotations back to the base tile.
    #[must_use]
    pub fn rotated_by(&self, rotation: Rotation) -> Self {
        let (base, current) = match self {
            Self::Rotated(base, current) => ((**base).clone(), *current),
            Self::Value(_) => (self.clone(), Rotation::IDENTITY),
        };
        let combined = current * rotation;
        if combined.is_identity() {
            base
        } else {
            Self::Rotated(Box::new(base), combined)
        }
    }

    /// Splits a tile into its base and the rotation applied to it.
    pub fn base_and_rotation(&self) -> (&Self, Rotation) {
        match self {
            Self::Rotated(base, rotation) => (base, *rotation),
            Self::Value(_) => (self, Rotation::IDENTITY),
        }
    }
}

impl From<char> for Tile {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => match char::from_u32(*v) {
                Some(c) if !c.is_control() && !c.is_whitespace() => write!(f, "{c}"),
                _ => write!(f, "#{v}"),
            },
            Self::Rotated(base, rotation) => write!(f, "{base}@{rotation}"),
        }
    }
}

/// Errors raised while building rotation tables and pattern models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RulesError {
    /// A rotation group was requested with an order that does not divide 360.
    #[error("Rotational symmetry {0} must be a positive divisor of 360")]
    InvalidSymmetry(u16),
    /// A rotation was used that the configured group does not contain.
    #[error("Rotation {rotation} is not a member of the rotation group {group}")]
    RotationNotInGroup {
        /// The rejected rotation.
        rotation: Rotation,
        /// Display form of the group.
        group: String,
    },
    /// Two different tiles were registered for the same rotation slot.
    #[error(
        "Rotation conflict: {base} rotated by {rotation} is already {existing}, cannot also be {conflicting}"
    )]
    RotationConflict {
        /// The base tile of the rotation subgroup.
        base: Tile,
        /// The rotation slot (relative to `base`).
        rotation: Rotation,
        /// The tile already recorded in the slot.
        existing: Tile,
        /// The tile that was being recorded.
        conflicting: Tile,
    },
    /// The operation only supports certain direction sets.
    #[error("Unsupported directions: {0}")]
    UnsupportedDirections(String),
    /// The operation only supports rotations by multiples of 90 degrees.
    #[error("Rotation by {0} degrees is not supported here; only multiples of 90 are")]
    UnsupportedRotation(u16),
    /// A sample is smaller than the pattern window on a non-periodic axis.
    #[error("Sample of size {width}x{height}x{depth} is too small for pattern size {n}")]
    SampleTooSmall {
        /// Sample width.
        width: usize,
        /// Sample height.
        height: usize,
        /// Sample depth.
        depth: usize,
        /// Pattern window edge length.
        n: usize,
    },
    /// A sample is not a well-formed rectangular array.
    #[error("Malformed sample: {0}")]
    MalformedSample(String),
    /// A pattern or tile frequency was not a positive finite number.
    #[error("Frequency for {item} must be positive and finite, got {value}")]
    InvalidFrequency {
        /// Description of the pattern or tile.
        item: String,
        /// The rejected value.
        value: f64,
    },
    /// The model has no patterns at all.
    #[error("Model has no patterns")]
    EmptyModel,
    /// The compatibility table does not have the expected shape.
    #[error("Malformed compatibility table: {0}")]
    MalformedModel(String),
    /// Compatibility was recorded in one direction but not its inverse.
    #[error(
        "Compatibility is not symmetric: pattern {source_pattern} allows {target_pattern} in direction {direction}, but not the reverse"
    )]
    AsymmetricCompatibility {
        /// Pattern listing the compatibility.
        source_pattern: usize,
        /// Pattern listed as compatible.
        target_pattern: usize,
        /// Direction index of the listing.
        direction: usize,
    },
    /// A tile was referenced that the model does not know about.
    #[error("Unknown tile: {0}")]
    UnknownTile(Tile),
    /// A direction index outside the direction set was used.
    #[error("Direction {direction} is out of range for a set of {count} directions")]
    InvalidDirection {
        /// The rejected index.
        direction: usize,
        /// Number of directions in the set.
        count: usize,
    },
}
