use anyhow::{anyhow, Result};
use ndarray::Array3;
use rand::{seq::SliceRandom, Rng};
use std::fmt;

/// Position of a cell as `[i, j, k]`, each in `0..n`.
pub type Coord = [usize; 3];

/// An `n x n x n` arrangement of the integers `1..=n³`, each appearing exactly once.
///
/// Cells are stored row-major, so the linear index of `[i, j, k]` is `i*n² + j*n + k`
/// and lexicographic order of coordinates is linear order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    cells: Array3<u32>,
}

impl Lattice {
    /// Uniformly random permutation of `1..=n³` (Fisher-Yates over the ascending sequence).
    pub fn create_random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self> {
        let volume = check_size(n)?;
        let mut values = (1..=volume).collect::<Vec<u32>>();
        values.shuffle(rng);
        Self::from_shape(n, values)
    }

    /// Row-major fill with `1..=n³`.
    pub fn ascending(n: usize) -> Result<Self> {
        let volume = check_size(n)?;
        Self::from_shape(n, (1..=volume).collect())
    }

    /// Builds a lattice from row-major values, rejecting anything that is not a permutation.
    pub fn from_values(n: usize, values: Vec<u32>) -> Result<Self> {
        check_size(n)?;
        if values.len() != n * n * n {
            return Err(anyhow!(
                "Expected {} values for a lattice of size {}, got {}",
                n * n * n,
                n,
                values.len()
            ));
        }
        if let Some(problem) = permutation_problem(&values) {
            return Err(anyhow!("Values are not a permutation of 1..={}: {}", values.len(), problem));
        }
        Self::from_shape(n, values)
    }

    pub fn from_nested(cube: &Vec<Vec<Vec<u32>>>) -> Result<Self> {
        let n = cube.len();
        if cube
            .iter()
            .any(|slice| slice.len() != n || slice.iter().any(|row| row.len() != n))
        {
            return Err(anyhow!("Cube must be exactly {}x{}x{}", n, n, n));
        }
        let values = cube.iter().flatten().flatten().cloned().collect::<Vec<u32>>();
        Self::from_values(n, values)
    }

    fn from_shape(n: usize, values: Vec<u32>) -> Result<Self> {
        let cells = Array3::from_shape_vec((n, n, n), values)?;
        Ok(Self { cells })
    }

    pub fn size(&self) -> usize {
        self.cells.shape()[0]
    }

    /// Number of cells, `n³`.
    pub fn volume(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, coord: Coord) -> u32 {
        self.cells[coord]
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        let n = self.size();
        [index / (n * n), (index / n) % n, index % n]
    }

    pub fn index_of(&self, coord: Coord) -> usize {
        let n = self.size();
        coord[0] * n * n + coord[1] * n + coord[2]
    }

    /// Exchanges two cells. Swapping a cell with itself is a no-op.
    pub fn swap_in_place(&mut self, a: Coord, b: Coord) {
        if a != b {
            self.cells.swap(a, b);
        }
    }

    pub fn swap_indices(&mut self, a: usize, b: usize) {
        let (a, b) = (self.coord_of(a), self.coord_of(b));
        self.swap_in_place(a, b);
    }

    /// Overwrites this lattice with the contents of `src` without reallocating.
    pub fn copy_from(&mut self, src: &Lattice) {
        if self.cells.shape() == src.cells.shape() {
            self.cells.assign(&src.cells);
        } else {
            self.cells = src.cells.clone();
        }
    }

    /// Values in row-major order.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().cloned()
    }

    pub fn indexed_values(&self) -> impl Iterator<Item = (Coord, u32)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((i, j, k), &value)| ([i, j, k], value))
    }

    pub fn is_permutation(&self) -> bool {
        permutation_problem(&self.values().collect::<Vec<u32>>()).is_none()
    }

    pub fn to_nested(&self) -> Vec<Vec<Vec<u32>>> {
        let n = self.size();
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| (0..n).map(|k| self.cells[[i, j, k]]).collect())
                    .collect()
            })
            .collect()
    }

    /// Number of cells whose values differ between two lattices of the same size.
    pub fn hamming_distance(&self, other: &Lattice) -> usize {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size();
        let width = (self.volume().to_string().len()).max(3);
        let border = format!("   +{}", format!("{}+", "-".repeat(width + 2)).repeat(n));
        for i in 0..n {
            writeln!(f, "Slice {}:", i + 1)?;
            writeln!(f, "{}", border)?;
            for j in 0..n {
                write!(f, "   | ")?;
                for k in 0..n {
                    write!(f, "{:>width$} | ", self.cells[[i, j, k]], width = width)?;
                }
                writeln!(f)?;
                writeln!(f, "{}", border)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Number of cells of a lattice of side `n`, which must fit the `u32` cell values.
fn check_size(n: usize) -> Result<u32> {
    if n < 2 {
        return Err(anyhow!("Lattice size must be at least 2, got {}", n));
    }
    n.checked_pow(3)
        .and_then(|volume| u32::try_from(volume).ok())
        .ok_or_else(|| anyhow!("Lattice size {} is too large: n³ must fit in u32", n))
}

fn permutation_problem(values: &[u32]) -> Option<String> {
    let mut seen = vec![false; values.len()];
    for &value in values {
        if value == 0 || value as usize > values.len() {
            return Some(format!("value {} is out of range", value));
        }
        if seen[value as usize - 1] {
            return Some(format!("value {} appears more than once", value));
        }
        seen[value as usize - 1] = true;
    }
    None
}
