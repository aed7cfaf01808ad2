use crate::{
    lattice::Lattice,
    objective::{magic_constant, Objective, ObjectiveFunction, ObjectiveKind},
};
use anyhow::{anyhow, Result};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Difficulty {
    pub size: usize,
    #[serde(default)]
    pub objective: ObjectiveKind,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            size: 5,
            objective: ObjectiveKind::MagicSum,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub cube: Vec<Vec<Vec<u32>>>,
}

impl Solution {
    pub fn to_lattice(&self) -> Result<Lattice> {
        Lattice::from_nested(&self.cube)
    }
}

impl From<&Lattice> for Solution {
    fn from(lattice: &Lattice) -> Self {
        Self {
            cube: lattice.to_nested(),
        }
    }
}

/// A magic cube instance: the lattice size, the objective it is scored by, and the
/// seed search algorithms derive their random streams from.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub seed: [u8; 32],
    pub difficulty: Difficulty,
    pub magic_constant: i64,
    objective: ObjectiveFunction,
}

impl Challenge {
    pub fn generate_instance(seed: &[u8; 32], difficulty: &Difficulty) -> Result<Self> {
        if difficulty.size < 2 {
            return Err(anyhow!(
                "Cube size must be at least 2, got {}",
                difficulty.size
            ));
        }
        debug!(
            "Generating {n}x{n}x{n} instance scored by {:?}, magic constant {}",
            difficulty.objective,
            magic_constant(difficulty.size),
            n = difficulty.size
        );
        Ok(Self {
            seed: seed.clone(),
            difficulty: difficulty.clone(),
            magic_constant: magic_constant(difficulty.size),
            objective: difficulty.objective.build(difficulty.size),
        })
    }

    pub fn size(&self) -> usize {
        self.difficulty.size
    }

    pub fn objective(&self) -> &ObjectiveFunction {
        &self.objective
    }

    pub fn random_lattice<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Lattice> {
        Lattice::create_random(self.size(), rng)
    }

    pub fn evaluate(&self, lattice: &Lattice) -> u64 {
        self.objective.evaluate(lattice)
    }

    pub fn evaluate_error(&self, solution: &Solution) -> Result<u64> {
        let lattice = solution.to_lattice()?;
        if lattice.size() != self.size() {
            return Err(anyhow!(
                "Cube must be exactly {}x{}x{}",
                self.size(),
                self.size(),
                self.size()
            ));
        }
        Ok(self.objective.evaluate(&lattice))
    }

    pub fn verify_solution(&self, solution: &Solution) -> Result<()> {
        let error = self.evaluate_error(solution)?;
        if error > 0 {
            Err(anyhow!(
                "Error ({}) is greater than 0 (objective: {:?})",
                error,
                self.difficulty.objective
            ))
        } else {
            Ok(())
        }
    }
}
