use mcube_challenges::{Coord, Lattice, Objective};
use rand::Rng;

pub fn random_coord<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Coord {
    [rng.gen_range(0..n), rng.gen_range(0..n), rng.gen_range(0..n)]
}

/// Two independently drawn coordinates; they coincide with probability `1/n³`.
pub fn random_swap<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (Coord, Coord) {
    (random_coord(n, rng), random_coord(n, rng))
}

/// A copy of `lattice` with one random pair of cells exchanged.
pub fn random_neighbor<R: Rng + ?Sized>(lattice: &Lattice, rng: &mut R) -> Lattice {
    let mut neighbor = lattice.clone();
    let (a, b) = random_swap(lattice.size(), rng);
    neighbor.swap_in_place(a, b);
    neighbor
}

/// Number of unordered pairs of distinct cells, `C(volume, 2)`.
pub fn pair_count(volume: usize) -> usize {
    volume * volume.saturating_sub(1) / 2
}

/// Every unordered pair of linear indices once, as `(a, b)` with `a < b`, in lexicographic order.
pub fn canonical_pairs(volume: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..volume).flat_map(move |a| ((a + 1)..volume).map(move |b| (a, b)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodBest {
    pub lattice: Lattice,
    pub error: u64,
    pub swap: (Coord, Coord),
}

/// Best single-swap neighbor of `lattice` whose error is at most `current_best_error`.
///
/// Pairs are visited in canonical order and a neighbor replaces the tracked best when its
/// error is `<=` the best so far, so among equal errors the last one visited wins.
/// Returns `None` when every neighbor is worse than `current_best_error`.
///
/// `lattice` is not modified. Trials run against a single scratch copy that is restored
/// after each swap; only the winning neighbor is materialized.
pub fn full_neighborhood_best<O: Objective + ?Sized>(
    lattice: &Lattice,
    current_best_error: u64,
    objective: &O,
) -> Option<NeighborhoodBest> {
    let current_error = objective.evaluate(lattice);
    let mut scratch = lattice.clone();
    let mut threshold = current_best_error;
    let mut best = None;

    for (a, b) in canonical_pairs(lattice.volume()) {
        let (a, b) = (scratch.coord_of(a), scratch.coord_of(b));
        let error = objective.evaluate_swap(&mut scratch, a, b, current_error);
        if error <= threshold {
            threshold = error;
            best = Some(((a, b), error));
        }
    }
    debug_assert!(&scratch == lattice);

    best.map(|(swap, error)| {
        let mut neighbor = lattice.clone();
        neighbor.swap_in_place(swap.0, swap.1);
        NeighborhoodBest {
            lattice: neighbor,
            error,
            swap,
        }
    })
}
