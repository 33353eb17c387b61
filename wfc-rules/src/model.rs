use crate::direction::DirectionSet;
use crate::types::RulesError;

/// The solver-facing description of a tiling problem.
///
/// `compatible(p, d)` lists the patterns that may sit one step in direction
/// `d` from a cell holding pattern `p`. Lists are sorted and deduplicated,
/// and the relation is symmetric: `q` is in `compatible(p, d)` exactly when
/// `p` is in `compatible(q, inverse(d))`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternModel {
    directions: DirectionSet,
    propagator: Vec<Vec<Vec<usize>>>,
    frequencies: Vec<f64>,
}

impl PatternModel {
    /// Validates and wraps a compatibility table indexed `[pattern][direction]`.
    pub fn new(
        directions: DirectionSet,
        mut propagator: Vec<Vec<Vec<usize>>>,
        frequencies: Vec<f64>,
    ) -> Result<Self, RulesError> {
        let pattern_count = propagator.len();
        if pattern_count == 0 {
            return Err(RulesError::EmptyModel);
        }
        if frequencies.len() != pattern_count {
            return Err(RulesError::MalformedModel(format!(
                "{} frequencies for {pattern_count} patterns",
                frequencies.len()
            )));
        }
        for (pattern, &frequency) in frequencies.iter().enumerate() {
            check_frequency(pattern, frequency)?;
        }
        for (pattern, lists) in propagator.iter_mut().enumerate() {
            if lists.len() != directions.count() {
                return Err(RulesError::MalformedModel(format!(
                    "pattern {pattern} has {} direction lists, expected {}",
                    lists.len(),
                    directions.count()
                )));
            }
            for list in lists.iter_mut() {
                list.sort_unstable();
                list.dedup();
                if let Some(&bad) = list.iter().find(|&&q| q >= pattern_count) {
                    return Err(RulesError::MalformedModel(format!(
                        "pattern {pattern} references unknown pattern {bad}"
                    )));
                }
            }
        }
        for (pattern, lists) in propagator.iter().enumerate() {
            for (direction, list) in lists.iter().enumerate() {
                let inverse = directions.inverse(direction);
                for &other in list {
                    if propagator[other][inverse].binary_search(&pattern).is_err() {
                        return Err(RulesError::AsymmetricCompatibility {
                            source_pattern: pattern,
                            target_pattern: other,
                            direction,
                        });
                    }
                }
            }
        }
        Ok(Self {
            directions,
            propagator,
            frequencies,
        })
    }

    pub const fn directions(&self) -> DirectionSet {
        self.directions
    }

    pub fn pattern_count(&self) -> usize {
        self.frequencies.len()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn frequency(&self, pattern: usize) -> f64 {
        self.frequencies[pattern]
    }

    /// Changes one pattern's frequency.
    pub fn set_frequency(&mut self, pattern: usize, frequency: f64) -> Result<(), RulesError> {
        check_frequency(pattern, frequency)?;
        let count = self.pattern_count();
        let slot = self.frequencies.get_mut(pattern).ok_or_else(|| {
            RulesError::MalformedModel(format!("pattern {pattern} out of range for {count} patterns"))
        })?;
        *slot = frequency;
        Ok(())
    }

    /// Patterns allowed one step in `direction` from `pattern`.
    pub fn compatible(&self, pattern: usize, direction: usize) -> &[usize] {
        &self.propagator[pattern][direction]
    }

    pub fn is_compatible(&self, pattern: usize, other: usize, direction: usize) -> bool {
        self.compatible(pattern, direction)
            .binary_search(&other)
            .is_ok()
    }
}

fn check_frequency(pattern: usize, frequency: f64) -> Result<(), RulesError> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(RulesError::InvalidFrequency {
            item: format!("pattern {pattern}"),
            value: frequency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_compatible(patterns: usize) -> Vec<Vec<Vec<usize>>> {
        vec![vec![(0..patterns).collect(); 4]; patterns]
    }

    #[test]
    fn accepts_symmetric_table() {
        let model = PatternModel::new(DirectionSet::Cartesian2d, all_compatible(2), vec![1.0, 2.0])
            .unwrap();
        assert_eq!(model.pattern_count(), 2);
        assert!(model.is_compatible(0, 1, 3));
    }

    #[test]
    fn rejects_asymmetric_table() {
        let mut table = all_compatible(2);
        // 0 allows 1 to its right, but 1 no longer allows 0 to its left.
        table[1][1] = vec![1];
        let err = PatternModel::new(DirectionSet::Cartesian2d, table, vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, RulesError::AsymmetricCompatibility { .. }), "{err:?}");
    }

    #[test]
    fn rejects_bad_frequencies_and_shapes() {
        assert!(matches!(
            PatternModel::new(DirectionSet::Cartesian2d, all_compatible(1), vec![0.0]),
            Err(RulesError::InvalidFrequency { .. })
        ));
        assert!(matches!(
            PatternModel::new(DirectionSet::Cartesian2d, all_compatible(1), vec![1.0, 1.0]),
            Err(RulesError::MalformedModel(_))
        ));
        assert_eq!(
            PatternModel::new(DirectionSet::Cartesian2d, Vec::new(), Vec::new()),
            Err(RulesError::EmptyModel)
        );
    }

    #[test]
    fn lists_are_normalised() {
        let table = vec![vec![vec![0, 0]; 4]];
        let model = PatternModel::new(DirectionSet::Cartesian2d, table, vec![1.0]).unwrap();
        assert_eq!(model.compatible(0, 0), &[0]);
    }
}
