pub mod lattice;
pub mod magic_cube;
pub mod objective;

pub use lattice::{Coord, Lattice};
pub use magic_cube::{Challenge, Difficulty, Solution};
pub use objective::{
    magic_constant, LineKind, MagicSum, Objective, ObjectiveFunction, ObjectiveKind,
    PositionalDistance, SliceDiagonals,
};
