use crate::lattice::{Coord, Lattice};
use serde::{Deserialize, Serialize};

/// The sum every qualifying line of a perfect magic cube of side `n` adds up to.
pub fn magic_constant(n: usize) -> i64 {
    (n * (n * n * n + 1) / 2) as i64
}

/// Maps a lattice to a non-negative error; 0 is the optimization goal.
pub trait Objective: Send + Sync {
    fn evaluate(&self, lattice: &Lattice) -> u64;

    /// Error `scratch` would have after swapping `a` and `b`, given that its current
    /// error is `current_error`. `scratch` is left exactly as it was on return.
    fn evaluate_swap(&self, scratch: &mut Lattice, a: Coord, b: Coord, current_error: u64) -> u64 {
        if a == b {
            return current_error;
        }
        scratch.swap_in_place(a, b);
        let error = self.evaluate(scratch);
        scratch.swap_in_place(a, b);
        error
    }
}

/// Which families of in-slice diagonals count towards the magic-sum error.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SliceDiagonals {
    /// Only the diagonals of the `i`-slices.
    Horizontal,
    /// Diagonals of the slices along all three axes.
    #[default]
    All,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Row,
    Column,
    Pillar,
    SpaceDiagonal,
    HorizontalDiagonal,
    VerticalDiagonal,
}

/// Sum of `|line_sum - magic_constant|` over rows, columns, pillars, the two main
/// space diagonals and the covered slice diagonals.
#[derive(Debug, Clone)]
pub struct MagicSum {
    size: usize,
    target: i64,
    coverage: SliceDiagonals,
    lines: Vec<(LineKind, Vec<Coord>)>,
    // line ids through each cell, by linear index
    membership: Vec<Vec<usize>>,
}

impl MagicSum {
    pub fn new(n: usize, coverage: SliceDiagonals) -> Self {
        let mut lines: Vec<(LineKind, Vec<Coord>)> = Vec::new();
        for i in 0..n {
            for j in 0..n {
                lines.push((LineKind::Row, (0..n).map(|k| [i, j, k]).collect()));
            }
        }
        for j in 0..n {
            for k in 0..n {
                lines.push((LineKind::Column, (0..n).map(|i| [i, j, k]).collect()));
            }
        }
        for i in 0..n {
            for k in 0..n {
                lines.push((LineKind::Pillar, (0..n).map(|j| [i, j, k]).collect()));
            }
        }
        lines.push((LineKind::SpaceDiagonal, (0..n).map(|i| [i, i, i]).collect()));
        lines.push((
            LineKind::SpaceDiagonal,
            (0..n).map(|i| [i, i, n - 1 - i]).collect(),
        ));
        for i in 0..n {
            lines.push((
                LineKind::HorizontalDiagonal,
                (0..n).map(|j| [i, j, j]).collect(),
            ));
            lines.push((
                LineKind::HorizontalDiagonal,
                (0..n).map(|j| [i, j, n - 1 - j]).collect(),
            ));
        }
        if coverage == SliceDiagonals::All {
            for j in 0..n {
                lines.push((
                    LineKind::VerticalDiagonal,
                    (0..n).map(|k| [k, j, k]).collect(),
                ));
                lines.push((
                    LineKind::VerticalDiagonal,
                    (0..n).map(|k| [n - 1 - k, j, k]).collect(),
                ));
            }
            for k in 0..n {
                lines.push((
                    LineKind::VerticalDiagonal,
                    (0..n).map(|i| [i, i, k]).collect(),
                ));
                lines.push((
                    LineKind::VerticalDiagonal,
                    (0..n).map(|i| [i, n - 1 - i, k]).collect(),
                ));
            }
        }

        let mut membership = vec![Vec::new(); n * n * n];
        for (id, (_, cells)) in lines.iter().enumerate() {
            for c in cells {
                membership[c[0] * n * n + c[1] * n + c[2]].push(id);
            }
        }

        Self {
            size: n,
            target: magic_constant(n),
            coverage,
            lines,
            membership,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn coverage(&self) -> SliceDiagonals {
        self.coverage
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Deviation of every evaluated line, in evaluation order.
    pub fn line_deviations<'a>(
        &'a self,
        lattice: &'a Lattice,
    ) -> impl Iterator<Item = (LineKind, u64)> + 'a {
        self.lines
            .iter()
            .map(move |(kind, cells)| (*kind, self.deviation(line_sum(lattice, cells))))
    }

    fn deviation(&self, sum: i64) -> u64 {
        (sum - self.target).unsigned_abs()
    }
}

fn line_sum(lattice: &Lattice, cells: &[Coord]) -> i64 {
    cells.iter().map(|&c| lattice.get(c) as i64).sum()
}

impl Objective for MagicSum {
    fn evaluate(&self, lattice: &Lattice) -> u64 {
        debug_assert_eq!(lattice.size(), self.size);
        self.lines
            .iter()
            .map(|(_, cells)| self.deviation(line_sum(lattice, cells)))
            .sum()
    }

    fn evaluate_swap(&self, scratch: &mut Lattice, a: Coord, b: Coord, current_error: u64) -> u64 {
        debug_assert_eq!(scratch.size(), self.size);
        if a == b {
            return current_error;
        }
        let (va, vb) = (scratch.get(a) as i64, scratch.get(b) as i64);
        let through_a = &self.membership[scratch.index_of(a)];
        let through_b = &self.membership[scratch.index_of(b)];

        // lines through both cells keep their sum
        let mut delta = 0i64;
        for (own, other, shift) in [(through_a, through_b, vb - va), (through_b, through_a, va - vb)] {
            for &id in own.iter().filter(|id| !other.contains(id)) {
                let old = line_sum(scratch, &self.lines[id].1);
                delta += self.deviation(old + shift) as i64 - self.deviation(old) as i64;
            }
        }
        (current_error as i64 + delta) as u64
    }
}

/// Sum of `|value - (linear_index + 1)|`; rewards sortedness rather than magic structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalDistance;

impl PositionalDistance {
    fn cell_distance(value: u32, index: usize) -> i64 {
        (value as i64 - (index as i64 + 1)).abs()
    }
}

impl Objective for PositionalDistance {
    fn evaluate(&self, lattice: &Lattice) -> u64 {
        lattice
            .values()
            .enumerate()
            .map(|(index, value)| Self::cell_distance(value, index) as u64)
            .sum()
    }

    fn evaluate_swap(&self, scratch: &mut Lattice, a: Coord, b: Coord, current_error: u64) -> u64 {
        let (ia, ib) = (scratch.index_of(a), scratch.index_of(b));
        let (va, vb) = (scratch.get(a), scratch.get(b));
        let delta = Self::cell_distance(vb, ia) + Self::cell_distance(va, ib)
            - Self::cell_distance(va, ia)
            - Self::cell_distance(vb, ib);
        (current_error as i64 + delta) as u64
    }
}

/// Objective selected for a run. The two landscapes are never mixed within one run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    #[default]
    MagicSum,
    MagicSumHorizontal,
    Positional,
}

impl ObjectiveKind {
    pub fn build(self, n: usize) -> ObjectiveFunction {
        match self {
            ObjectiveKind::MagicSum => {
                ObjectiveFunction::MagicSum(MagicSum::new(n, SliceDiagonals::All))
            }
            ObjectiveKind::MagicSumHorizontal => {
                ObjectiveFunction::MagicSum(MagicSum::new(n, SliceDiagonals::Horizontal))
            }
            ObjectiveKind::Positional => ObjectiveFunction::Positional(PositionalDistance),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectiveFunction {
    MagicSum(MagicSum),
    Positional(PositionalDistance),
}

impl Objective for ObjectiveFunction {
    fn evaluate(&self, lattice: &Lattice) -> u64 {
        match self {
            ObjectiveFunction::MagicSum(o) => o.evaluate(lattice),
            ObjectiveFunction::Positional(o) => o.evaluate(lattice),
        }
    }

    fn evaluate_swap(&self, scratch: &mut Lattice, a: Coord, b: Coord, current_error: u64) -> u64 {
        match self {
            ObjectiveFunction::MagicSum(o) => o.evaluate_swap(scratch, a, b, current_error),
            ObjectiveFunction::Positional(o) => o.evaluate_swap(scratch, a, b, current_error),
        }
    }
}
