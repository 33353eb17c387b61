/// A dense 3D array in `x`-fastest order, used for solver output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let size = width * height * depth;
        Self {
            width,
            height,
            depth,
            data: vec![T::default(); size],
        }
    }
}

impl<T> Grid<T> {
    /// Wraps existing data; returns `None` if the length does not match.
    pub fn from_vec(width: usize, height: usize, depth: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height * depth).then_some(Self {
            width,
            height,
            depth,
            data,
        })
    }

    /// Returns an immutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        self.index(x, y, z).and_then(|idx| self.data.get(idx))
    }

    /// Returns a mutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
        self.index(x, y, z)
            .and_then(move |idx| self.data.get_mut(idx))
    }

    /// Calculates the 1D index for the given 3D coordinates.
    /// Returns None if the coordinates are out of bounds.
    pub fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.width && y < self.height && z < self.depth {
            Some(z * self.width * self.height + y * self.width + x)
        } else {
            None
        }
    }

    /// Elements in index order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Rows of the layer `z`, top to bottom.
    pub fn rows(&self, z: usize) -> impl Iterator<Item = &[T]> {
        let layer = self.width * self.height;
        let start = (z * layer).min(self.data.len());
        let end = (start + layer).min(self.data.len());
        self.data[start..end].chunks(self.width.max(1))
    }
}
