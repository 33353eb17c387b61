use crate::formats::FormatParser;
use crate::sample_set::SampleSet;
use crate::LoadError;
#[cfg(feature = "serde")]
use crate::{
    direction::DirectionSet,
    rotation::{Rotation, RotationGroup},
    sample::Sample,
    sample_set::ModelKind,
    tile_rotation::{TileRotation, TileRotationBuilder, TileRotationTreatment, TileSymmetry},
    types::Tile,
};
#[cfg(feature = "serde")]
use log::debug;
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use std::collections::BTreeMap;

/// A parser for sample sets written in RON (Rusty Object Notation).
///
/// ```ron
/// (
///     model: Overlapping(n: 3),
///     symmetry: 4,
///     reflect: true,
///     periodic: true,
///     samples: [["....", ".##.", ".##.", "...."]],
/// )
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RonFormatParser;

impl RonFormatParser {
    pub const fn new() -> Self {
        Self
    }
}

// --- Structs mirroring the RON format ---

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Deserialize, Default)]
enum RonModel {
    Overlapping {
        n: usize,
    },
    #[default]
    Adjacent,
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Deserialize)]
struct RonRotation {
    from: String,
    rotate: i32,
    #[serde(default)]
    reflect: bool,
    to: String,
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Deserialize)]
struct RonSampleFile {
    #[serde(default)]
    model: RonModel,
    #[serde(default)]
    directions: DirectionSet,
    /// Number of rotations to learn from; must divide 360.
    #[serde(default = "default_symmetry")]
    symmetry: u16,
    #[serde(default)]
    reflect: bool,
    /// Whether samples wrap around at their edges.
    #[serde(default)]
    periodic: bool,
    #[serde(default)]
    treatment: TileRotationTreatment,
    /// Symmetry class per tile, e.g. `{"-": "I", "+": "X"}`.
    #[serde(default)]
    tile_symmetries: BTreeMap<String, String>,
    #[serde(default)]
    rotations: Vec<RonRotation>,
    #[serde(default)]
    frequencies: BTreeMap<String, f64>,
    /// `(from, to, direction)` triples such as `("a", "b", "+x")`.
    #[serde(default)]
    adjacency: Vec<(String, String, String)>,
    #[serde(default)]
    samples: Vec<Vec<String>>,
}

#[cfg(feature = "serde")]
const fn default_symmetry() -> u16 {
    1
}

#[cfg(feature = "serde")]
fn tile_name(name: &str) -> Result<Tile, LoadError> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Tile::from_char(c)),
        _ => Err(LoadError::InvalidData(format!(
            "Tile names must be a single character, got '{name}'"
        ))),
    }
}

#[cfg(feature = "serde")]
fn build_rotation(file: &RonSampleFile) -> Result<TileRotation, LoadError> {
    let group = RotationGroup::new(file.symmetry, file.reflect)?;
    if file.tile_symmetries.is_empty() && file.rotations.is_empty() {
        return Ok(TileRotation::uniform(group, file.treatment));
    }
    let mut builder = TileRotationBuilder::new(group, file.treatment);
    for (name, symmetry) in &file.tile_symmetries {
        let symmetry: TileSymmetry = symmetry.parse().map_err(LoadError::InvalidData)?;
        builder.add_symmetry(tile_name(name)?, symmetry)?;
    }
    for rotation in &file.rotations {
        builder.add(
            tile_name(&rotation.from)?,
            Rotation::new(rotation.rotate, rotation.reflect),
            tile_name(&rotation.to)?,
        )?;
    }
    Ok(builder.build()?)
}

impl FormatParser for RonFormatParser {
    #[cfg(feature = "serde")]
    fn parse(&self, content: &str) -> Result<SampleSet, LoadError> {
        let file: RonSampleFile =
            ron::from_str(content).map_err(|e| LoadError::ParseError(e.to_string()))?;

        let kind = match file.model {
            RonModel::Overlapping { n } => ModelKind::Overlapping { n },
            RonModel::Adjacent => ModelKind::Adjacent,
        };
        let mut set = SampleSet::new(kind, file.directions);
        set.rotation = build_rotation(&file)?;

        for rows in &file.samples {
            set.samples
                .push(Sample::from_rows(rows)?.periodic(file.periodic));
        }
        for (from, to, direction) in &file.adjacency {
            let index = file.directions.parse_name(direction).ok_or_else(|| {
                LoadError::InvalidData(format!("Unknown direction name: {direction}"))
            })?;
            set.adjacencies
                .push((tile_name(from)?, tile_name(to)?, index));
        }
        for (name, frequency) in &file.frequencies {
            set.frequencies.push((tile_name(name)?, *frequency));
        }

        if set.samples.is_empty() && set.adjacencies.is_empty() {
            return Err(LoadError::InvalidData(
                "Sample set defines neither samples nor adjacencies".to_string(),
            ));
        }
        if matches!(kind, ModelKind::Overlapping { .. }) && set.samples.is_empty() {
            return Err(LoadError::InvalidData(
                "Overlapping models need at least one sample".to_string(),
            ));
        }
        debug!(
            "Parsed {} sample set: {:?}, {} samples, {} adjacencies",
            self.format_name(),
            kind,
            set.samples.len(),
            set.adjacencies.len()
        );
        Ok(set)
    }

    /// Stub implementation when the `serde` feature is not enabled.
    #[cfg(not(feature = "serde"))]
    fn parse(&self, _content: &str) -> Result<SampleSet, LoadError> {
        Err(LoadError::FeatureNotEnabled(
            "serde (required for RON parsing)".to_string(),
        ))
    }

    fn format_name(&self) -> &'static str {
        "RON"
    }
}

/// Parses a sample set from a RON string.
pub fn parse_ron_sample_set(content: &str) -> Result<SampleSet, LoadError> {
    RonFormatParser::new().parse(content)
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn parses_overlapping_file() {
        let set = parse_ron_sample_set(
            r#"(
                model: Overlapping(n: 2),
                symmetry: 4,
                periodic: true,
                samples: [["ab", "ba"]],
            )"#,
        )
        .unwrap();
        assert_eq!(set.kind, ModelKind::Overlapping { n: 2 });
        assert_eq!(set.rotation.group().len(), 4);
        assert!(set.samples[0].periodicity()[0]);
        let (model, _) = set.build().unwrap();
        assert_eq!(model.pattern_count(), 2);
    }

    #[test]
    fn parses_adjacency_file() {
        let set = parse_ron_sample_set(
            r#"(
                frequencies: {"a": 2.0},
                adjacency: [("a", "b", "+x"), ("a", "a", "+y")],
            )"#,
        )
        .unwrap();
        assert_eq!(set.kind, ModelKind::Adjacent);
        assert_eq!(set.adjacencies.len(), 2);
        assert_eq!(set.adjacencies[1].2, 2);
    }

    #[test]
    fn rejects_unknown_direction_and_long_names() {
        let err = parse_ron_sample_set(r#"(adjacency: [("a", "b", "up")])"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidData(_)), "{err:?}");
        let err = parse_ron_sample_set(r#"(adjacency: [("ab", "b", "+x")])"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidData(_)), "{err:?}");
    }

    #[test]
    fn reports_syntax_errors() {
        let err = parse_ron_sample_set("(samples: [").unwrap_err();
        assert!(matches!(err, LoadError::ParseError(_)));
    }
}
