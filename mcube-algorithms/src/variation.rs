use crate::neighbors::random_swap;
use mcube_challenges::{Lattice, Objective};
use rand::Rng;

/// A lattice together with its cached error. The cache is refreshed by every mutating
/// operation, so `fitness` always matches `lattice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    lattice: Lattice,
    fitness: u64,
}

impl Individual {
    pub fn new<O: Objective + ?Sized>(lattice: Lattice, objective: &O) -> Self {
        let fitness = objective.evaluate(&lattice);
        Self { lattice, fitness }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn fitness(&self) -> u64 {
        self.fitness
    }
}

/// Two-phase positional crossover over row-major values.
///
/// Phase 1 copies each of `parent_a`'s values into the matching child cell unless the value
/// is out of range or already placed. Phase 2 fills the cells still empty with `parent_b`'s
/// value at that position when unused, otherwise with the smallest unused value.
///
/// When `parent_a` is a permutation phase 1 fills every cell and the child is a copy of
/// `parent_a`; this is not a textbook cycle crossover. The result is a permutation of
/// `1..=parent_a.len()` for any input.
pub fn crossover_values(parent_a: &[u32], parent_b: &[u32]) -> Vec<u32> {
    let volume = parent_a.len();
    let mut child: Vec<Option<u32>> = vec![None; volume];
    let mut used = vec![false; volume];

    fn take(used: &mut [bool], value: u32) -> bool {
        match (value as usize).checked_sub(1) {
            Some(slot) if slot < used.len() && !used[slot] => {
                used[slot] = true;
                true
            }
            _ => false,
        }
    }

    for (cell, &value) in child.iter_mut().zip(parent_a) {
        if cell.is_none() && take(&mut used, value) {
            *cell = Some(value);
        }
    }

    let mut smallest_unused = 0;
    for (index, cell) in child.iter_mut().enumerate() {
        if cell.is_some() {
            continue;
        }
        let value = match parent_b.get(index) {
            Some(&value) if take(&mut used, value) => value,
            _ => {
                while used[smallest_unused] {
                    smallest_unused += 1;
                }
                used[smallest_unused] = true;
                smallest_unused as u32 + 1
            }
        };
        *cell = Some(value);
    }

    child.into_iter().flatten().collect()
}

/// Crossover of two lattices. The child has `parent_a`'s size; cells `parent_b` does not
/// cover are filled from the smallest unused values. Deterministic: the same parents always
/// give the same child.
pub fn crossover(parent_a: &Lattice, parent_b: &Lattice) -> Lattice {
    let a = parent_a.values().collect::<Vec<u32>>();
    let b = parent_b.values().collect::<Vec<u32>>();
    // crossover_values returns a permutation of 1..=a.len() for any input
    Lattice::from_values(parent_a.size(), crossover_values(&a, &b))
        .expect("crossover always yields a permutation")
}

/// Applies `floor(n³ * rate)` random swaps (positions drawn with replacement) and refreshes
/// the cached fitness. A rate that yields no swaps leaves the individual untouched.
pub fn mutate<O, R>(individual: &mut Individual, rate: f64, objective: &O, rng: &mut R)
where
    O: Objective + ?Sized,
    R: Rng + ?Sized,
{
    let swaps = (individual.lattice.volume() as f64 * rate).floor() as usize;
    if swaps == 0 {
        return;
    }
    let n = individual.lattice.size();
    for _ in 0..swaps {
        let (a, b) = random_swap(n, rng);
        individual.lattice.swap_in_place(a, b);
    }
    individual.fitness = objective.evaluate(&individual.lattice);
}

/// Index of the winner of a `k`-way tournament drawn uniformly with replacement; the lowest
/// error wins and the earliest draw wins ties.
pub fn tournament_select<R: Rng + ?Sized>(population: &[Individual], k: usize, rng: &mut R) -> usize {
    let mut best = rng.gen_range(0..population.len());
    for _ in 1..k {
        let competitor = rng.gen_range(0..population.len());
        if population[competitor].fitness < population[best].fitness {
            best = competitor;
        }
    }
    best
}

/// Index of the first individual with the lowest error.
pub fn best_index(population: &[Individual]) -> usize {
    let mut best = 0;
    for (i, individual) in population.iter().enumerate().skip(1) {
        if individual.fitness < population[best].fitness {
            best = i;
        }
    }
    best
}
