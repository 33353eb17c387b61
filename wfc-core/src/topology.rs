use crate::{BoundaryCondition, WfcError};
use wfc_rules::DirectionSet;

/// A rectangular grid of cells with per-axis periodicity and an optional
/// mask of active cells.
///
/// Cells are addressed by a flat index `x + y * width + z * width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTopology {
    directions: DirectionSet,
    width: usize,
    height: usize,
    depth: usize,
    periodic: [bool; 3],
    mask: Option<Vec<bool>>,
}

impl GridTopology {
    pub const fn new(directions: DirectionSet, width: usize, height: usize, depth: usize) -> Self {
        Self {
            directions,
            width,
            height,
            depth,
            periodic: [false; 3],
            mask: None,
        }
    }

    /// A single-layer grid for 2D direction sets.
    pub const fn new_2d(directions: DirectionSet, width: usize, height: usize) -> Self {
        Self::new(directions, width, height, 1)
    }

    #[must_use]
    pub fn with_periodicity(mut self, x: bool, y: bool, z: bool) -> Self {
        self.periodic = [x, y, z];
        self
    }

    #[must_use]
    pub fn with_boundary(self, boundary: BoundaryCondition) -> Self {
        let periodic = matches!(boundary, BoundaryCondition::Periodic);
        self.with_periodicity(periodic, periodic, periodic)
    }

    /// Restricts the topology to cells whose mask entry is `true`. Inactive
    /// cells are never neighbours and are never picked.
    pub fn with_mask(mut self, mask: Vec<bool>) -> Result<Self, WfcError> {
        if mask.len() != self.index_count() {
            return Err(WfcError::MaskSize {
                expected: self.index_count(),
                actual: mask.len(),
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    pub const fn directions(&self) -> DirectionSet {
        self.directions
    }

    pub const fn direction_count(&self) -> usize {
        self.directions.count()
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Periodicity flags in `[x, y, z]` order.
    pub const fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    /// Total number of cells, active or not.
    pub const fn index_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.width + z * self.width * self.height
    }

    pub fn coords(&self, index: usize) -> (usize, usize, usize) {
        let layer = self.width * self.height;
        let z = index / layer;
        let rest = index % layer;
        (rest % self.width, rest / self.width, z)
    }

    pub fn is_active(&self, index: usize) -> bool {
        index < self.index_count() && self.mask.as_ref().map_or(true, |m| m[index])
    }

    pub fn active_mask(&self) -> Vec<bool> {
        (0..self.index_count()).map(|i| self.is_active(i)).collect()
    }

    pub fn active_count(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(self.index_count(), |m| m.iter().filter(|&&a| a).count())
    }

    /// The neighbour of `index` in `direction`, or `None` if the move leaves a
    /// non-periodic axis or lands on an inactive cell.
    ///
    /// # Panics
    ///
    /// Panics if `direction` is not part of the topology's direction set.
    pub fn try_move(&self, index: usize, direction: usize) -> Option<usize> {
        let (x, y, z) = self.coords(index);
        let (dx, dy, dz) = self.directions.offset(direction);
        let nx = wrap(x, dx, self.width, self.periodic[0])?;
        let ny = wrap(y, dy, self.height, self.periodic[1])?;
        let nz = wrap(z, dz, self.depth, self.periodic[2])?;
        let target = self.index_of(nx, ny, nz);
        self.is_active(target).then_some(target)
    }
}

/// Moves one coordinate, wrapping with `rem_euclid` on periodic axes.
fn wrap(position: usize, delta: i32, size: usize, periodic: bool) -> Option<usize> {
    let target = position as i64 + i64::from(delta);
    let size = size as i64;
    if periodic {
        Some(target.rem_euclid(size) as usize)
    } else if (0..size).contains(&target) {
        Some(target as usize)
    } else {
        None
    }
}
