//! Rotations and reflections of the 2D plane, and the finite groups they form.

use crate::types::RulesError;
use std::fmt;
use std::ops::Mul;

/// A clockwise rotation, optionally preceded by a reflection in the x axis.
///
/// Applying a `Rotation` to a vector first negates x (if `reflect_x` is set)
/// and then rotates clockwise by `rotate_cw` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    rotate_cw: u16,
    reflect_x: bool,
}

impl Rotation {
    /// The rotation that changes nothing.
    pub const IDENTITY: Self = Self {
        rotate_cw: 0,
        reflect_x: false,
    };

    /// Creates a rotation; the angle is normalised into `0..360`.
    pub fn new(rotate_cw: i32, reflect_x: bool) -> Self {
        Self {
            rotate_cw: rotate_cw.rem_euclid(360) as u16,
            reflect_x,
        }
    }

    /// Clockwise angle in degrees, in `0..360`.
    pub const fn rotate_cw(self) -> u16 {
        self.rotate_cw
    }

    /// Whether a reflection is applied before rotating.
    pub const fn reflect_x(self) -> bool {
        self.reflect_x
    }

    pub const fn is_identity(self) -> bool {
        self.rotate_cw == 0 && !self.reflect_x
    }

    /// The rotation that undoes this one. Reflections are their own inverse.
    #[must_use]
    pub fn inverse(self) -> Self {
        if self.reflect_x {
            self
        } else {
            Self::new(-i32::from(self.rotate_cw), false)
        }
    }

    /// Angular distance to the identity, ignoring reflection.
    pub const fn angular_distance(self) -> u16 {
        if self.rotate_cw > 180 {
            360 - self.rotate_cw
        } else {
            self.rotate_cw
        }
    }

    /// Applies the rotation to an integer offset. Returns `None` for angles
    /// that are not a multiple of 90 degrees.
    pub fn rotate_offset(self, x: i32, y: i32) -> Option<(i32, i32)> {
        let x = if self.reflect_x { -x } else { x };
        match self.rotate_cw {
            0 => Some((x, y)),
            90 => Some((-y, x)),
            180 => Some((-x, -y)),
            270 => Some((y, -x)),
            _ => None,
        }
    }
}

/// `a * b` is the rotation that applies `a` first and then `b`.
impl Mul for Rotation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let first = i32::from(self.rotate_cw);
        let first = if rhs.reflect_x { -first } else { first };
        Self::new(
            first + i32::from(rhs.rotate_cw),
            self.reflect_x ^ rhs.reflect_x,
        )
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rotate_cw)?;
        if self.reflect_x {
            write!(f, "r")?;
        }
        Ok(())
    }
}

/// The cyclic or dihedral group generated by rotations of `360 / n` degrees,
/// optionally together with reflections.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationGroup {
    rotational_symmetry: u16,
    reflectional_symmetry: bool,
    smallest_angle: u16,
}

impl RotationGroup {
    /// Creates the group with `rotational_symmetry` rotations, doubled by
    /// reflections if `reflectional_symmetry` is set.
    pub fn new(rotational_symmetry: u16, reflectional_symmetry: bool) -> Result<Self, RulesError> {
        if rotational_symmetry == 0 || 360 % rotational_symmetry != 0 {
            return Err(RulesError::InvalidSymmetry(rotational_symmetry));
        }
        Ok(Self {
            rotational_symmetry,
            reflectional_symmetry,
            smallest_angle: 360 / rotational_symmetry,
        })
    }

    /// The group containing only the identity.
    pub const fn trivial() -> Self {
        Self {
            rotational_symmetry: 1,
            reflectional_symmetry: false,
            smallest_angle: 360,
        }
    }

    pub const fn rotational_symmetry(&self) -> u16 {
        self.rotational_symmetry
    }

    pub const fn reflectional_symmetry(&self) -> bool {
        self.reflectional_symmetry
    }

    pub const fn smallest_angle(&self) -> u16 {
        self.smallest_angle
    }

    pub fn len(&self) -> usize {
        usize::from(self.rotational_symmetry) * if self.reflectional_symmetry { 2 } else { 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, rotation: Rotation) -> bool {
        rotation.rotate_cw() % self.smallest_angle == 0
            && (self.reflectional_symmetry || !rotation.reflect_x())
    }

    /// Like [`contains`](Self::contains), but reports the failure as an error.
    pub fn check_contains(&self, rotation: Rotation) -> Result<(), RulesError> {
        if self.contains(rotation) {
            Ok(())
        } else {
            Err(RulesError::RotationNotInGroup {
                rotation,
                group: self.to_string(),
            })
        }
    }

    /// All members, unreflected rotations first, in increasing angle.
    pub fn iter(&self) -> impl Iterator<Item = Rotation> + '_ {
        let reflections: &[bool] = if self.reflectional_symmetry {
            &[false, true]
        } else {
            &[false]
        };
        reflections.iter().flat_map(move |&reflect| {
            (0..self.rotational_symmetry).map(move |step| {
                Rotation::new(i32::from(step * self.smallest_angle), reflect)
            })
        })
    }
}

impl fmt::Display for RotationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.reflectional_symmetry { "D" } else { "C" };
        write!(f, "{kind}{}", self.rotational_symmetry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_matches_vector_application() {
        let group = RotationGroup::new(4, true).unwrap();
        let offsets = [(1, 0), (0, 1), (2, -1)];
        for a in group.iter() {
            for b in group.iter() {
                for &(x, y) in &offsets {
                    let (ax, ay) = a.rotate_offset(x, y).unwrap();
                    let step = b.rotate_offset(ax, ay).unwrap();
                    let combined = (a * b).rotate_offset(x, y).unwrap();
                    assert_eq!(step, combined, "a={a}, b={b}, v=({x},{y})");
                }
            }
        }
    }

    #[test]
    fn inverse_cancels() {
        let group = RotationGroup::new(4, true).unwrap();
        for r in group.iter() {
            assert!((r * r.inverse()).is_identity(), "{r}");
            assert!((r.inverse() * r).is_identity(), "{r}");
        }
    }

    #[test]
    fn quarter_turn_moves_east_to_south() {
        let quarter = Rotation::new(90, false);
        assert_eq!(quarter.rotate_offset(1, 0), Some((0, 1)));
        assert_eq!(Rotation::new(45, false).rotate_offset(1, 0), None);
    }

    #[test]
    fn angles_are_normalised() {
        assert_eq!(Rotation::new(-90, false).rotate_cw(), 270);
        assert_eq!(Rotation::new(450, true).rotate_cw(), 90);
        assert_eq!(Rotation::new(270, false).angular_distance(), 90);
    }

    #[test]
    fn rejects_symmetry_not_dividing_360() {
        assert_eq!(
            RotationGroup::new(7, false),
            Err(RulesError::InvalidSymmetry(7))
        );
        assert!(RotationGroup::new(0, true).is_err());
    }
}
