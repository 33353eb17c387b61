use crate::adjacent::AdjacentModel;
use crate::direction::DirectionSet;
use crate::mapping::TileMapping;
use crate::model::PatternModel;
use crate::overlapping::OverlappingModel;
use crate::sample::Sample;
use crate::tile_rotation::TileRotation;
use crate::types::{RulesError, Tile};

/// Which model family a [`SampleSet`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Overlapping windows of edge length `n`.
    Overlapping {
        /// Window edge length.
        n: usize,
    },
    /// One tile per cell, neighbour-only constraints.
    Adjacent,
}

/// Everything needed to build a model: samples, rotation information and,
/// for adjacent models, explicit adjacencies and frequencies.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub kind: ModelKind,
    pub directions: DirectionSet,
    pub rotation: TileRotation,
    pub samples: Vec<Sample>,
    /// `(source, dest, direction)` facts, expanded by `rotation`.
    pub adjacencies: Vec<(Tile, Tile, usize)>,
    pub frequencies: Vec<(Tile, f64)>,
}

impl SampleSet {
    pub fn new(kind: ModelKind, directions: DirectionSet) -> Self {
        Self {
            kind,
            directions,
            rotation: TileRotation::identity(),
            samples: Vec::new(),
            adjacencies: Vec::new(),
            frequencies: Vec::new(),
        }
    }

    /// Builds the pattern model and its tile mapping.
    pub fn build(&self) -> Result<(PatternModel, TileMapping), RulesError> {
        match self.kind {
            ModelKind::Overlapping { n } => {
                let mut model =
                    OverlappingModel::new(n, self.directions)?.with_rotations(self.rotation.clone())?;
                for sample in &self.samples {
                    model.add_sample(sample)?;
                }
                model.build()
            }
            ModelKind::Adjacent => {
                let mut model = AdjacentModel::new(self.directions);
                for (tile, frequency) in &self.frequencies {
                    model.set_frequency(tile, *frequency)?;
                }
                for (source, dest, direction) in &self.adjacencies {
                    if self.rotation.group().len() > 1 {
                        model.add_rotated_adjacency(source, dest, *direction, &self.rotation)?;
                    } else {
                        model.add_adjacency(source, dest, *direction)?;
                    }
                }
                for sample in &self.samples {
                    model.add_sample(sample)?;
                }
                model.build()
            }
        }
    }
}
