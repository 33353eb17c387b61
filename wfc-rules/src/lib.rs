//! Tiles, rotations and the pattern models the WFC solver consumes.
//!
//! Models are learned from [`Sample`]s, either as overlapping windows
//! ([`OverlappingModel`]) or as direct neighbour relations
//! ([`AdjacentModel`]), and produce a [`PatternModel`] plus a
//! [`TileMapping`] between patterns and tiles.

use thiserror::Error;

pub mod adjacent;
pub mod direction;
pub mod formats;
pub mod loader;
pub mod mapping;
pub mod model;
pub mod overlapping;
pub mod rotation;
pub mod sample;
pub mod sample_set;
pub mod tile_rotation;
pub mod types;

pub use adjacent::AdjacentModel;
pub use direction::DirectionSet;
pub use mapping::TileMapping;
pub use model::PatternModel;
pub use overlapping::OverlappingModel;
pub use rotation::{Rotation, RotationGroup};
pub use sample::Sample;
pub use sample_set::{ModelKind, SampleSet};
pub use tile_rotation::{
    TileRotation, TileRotationBuilder, TileRotationTreatment, TileSymmetry,
};
pub use types::{RulesError, Tile};

/// Errors raised while loading a sample set from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse sample set: {0}")]
    ParseError(String),
    #[error("Invalid sample set data: {0}")]
    InvalidData(String),
    #[error("Invalid rules: {0}")]
    Rules(#[from] RulesError),
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}
