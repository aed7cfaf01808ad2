use mcube_challenges::*;
use rand::{rngs::SmallRng, SeedableRng};

fn assert_permutation(lattice: &Lattice) {
    let mut values = lattice.values().collect::<Vec<u32>>();
    values.sort();
    let expected = (1..=lattice.volume() as u32).collect::<Vec<u32>>();
    assert_eq!(values, expected);
}

#[test]
fn test_create_random_is_permutation() {
    let mut rng = SmallRng::seed_from_u64(1);
    for n in 2..=6 {
        let lattice = Lattice::create_random(n, &mut rng).unwrap();
        assert_eq!(lattice.size(), n);
        assert_eq!(lattice.volume(), n * n * n);
        assert_permutation(&lattice);
        assert!(lattice.is_permutation());
    }
}

#[test]
fn test_create_random_rejects_small_sizes() {
    let mut rng = SmallRng::seed_from_u64(1);
    assert!(Lattice::create_random(0, &mut rng).is_err());
    assert!(Lattice::create_random(1, &mut rng).is_err());
}

#[test]
fn test_create_random_depends_on_seed() {
    let a = Lattice::create_random(5, &mut SmallRng::seed_from_u64(3)).unwrap();
    let b = Lattice::create_random(5, &mut SmallRng::seed_from_u64(3)).unwrap();
    let c = Lattice::create_random(5, &mut SmallRng::seed_from_u64(4)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_ascending_layout() {
    let lattice = Lattice::ascending(5).unwrap();
    assert_eq!(lattice.get([0, 0, 0]), 1);
    assert_eq!(lattice.get([0, 0, 4]), 5);
    assert_eq!(lattice.get([0, 1, 0]), 6);
    assert_eq!(lattice.get([1, 0, 0]), 26);
    assert_eq!(lattice.get([4, 4, 4]), 125);
    for (index, value) in lattice.values().enumerate() {
        assert_eq!(value as usize, index + 1);
    }
}

#[test]
fn test_coord_index_round_trip() {
    let lattice = Lattice::ascending(4).unwrap();
    assert_eq!(lattice.coord_of(0), [0, 0, 0]);
    assert_eq!(lattice.coord_of(21), [1, 1, 1]);
    assert_eq!(lattice.index_of([3, 2, 1]), 57);
    for (coord, value) in lattice.indexed_values() {
        assert_eq!(lattice.index_of(coord) + 1, value as usize);
    }
}

#[test]
fn test_swap_in_place() {
    let mut lattice = Lattice::ascending(3).unwrap();
    lattice.swap_in_place([0, 0, 0], [2, 2, 2]);
    assert_eq!(lattice.get([0, 0, 0]), 27);
    assert_eq!(lattice.get([2, 2, 2]), 1);
    assert_permutation(&lattice);

    let before = lattice.clone();
    lattice.swap_in_place([1, 2, 0], [1, 2, 0]);
    assert_eq!(lattice, before);
}

#[test]
fn test_clone_is_independent() {
    let original = Lattice::ascending(3).unwrap();
    let mut copy = original.clone();
    copy.swap_in_place([0, 0, 0], [0, 0, 1]);
    assert_eq!(original.get([0, 0, 0]), 1);
    assert_eq!(copy.get([0, 0, 0]), 2);
    assert_eq!(original.hamming_distance(&copy), 2);

    let mut target = Lattice::ascending(3).unwrap();
    target.copy_from(&copy);
    assert_eq!(target, copy);
}

#[test]
fn test_from_values_rejects_non_permutations() {
    assert!(Lattice::from_values(2, vec![1, 2, 3, 4, 5, 6, 7, 8]).is_ok());
    assert!(Lattice::from_values(2, vec![1, 2, 3, 4, 5, 6, 7]).is_err());
    assert!(Lattice::from_values(2, vec![1, 1, 3, 4, 5, 6, 7, 8]).is_err());
    assert!(Lattice::from_values(2, vec![0, 2, 3, 4, 5, 6, 7, 8]).is_err());
    assert!(Lattice::from_values(2, vec![9, 2, 3, 4, 5, 6, 7, 8]).is_err());
}

#[test]
fn test_nested_round_trip() {
    let lattice = Lattice::create_random(4, &mut SmallRng::seed_from_u64(9)).unwrap();
    let nested = lattice.to_nested();
    assert_eq!(nested.len(), 4);
    assert_eq!(Lattice::from_nested(&nested).unwrap(), lattice);

    let ragged = vec![vec![vec![1, 2], vec![3, 4]], vec![vec![5, 6], vec![7]]];
    assert!(Lattice::from_nested(&ragged).is_err());
}

#[test]
fn test_display_lists_every_slice() {
    let rendered = Lattice::ascending(2).unwrap().to_string();
    assert!(rendered.contains("Slice 1:"));
    assert!(rendered.contains("Slice 2:"));
    assert!(rendered.contains("|   8 |"));
}

#[test]
fn test_rejects_sizes_beyond_u32_values() {
    // 1625³ is the largest cube whose values fit in u32
    assert!(Lattice::ascending(1626).is_err());
    assert!(Lattice::from_values(1700, Vec::new()).is_err());
    assert!(Lattice::create_random(usize::MAX, &mut SmallRng::seed_from_u64(1)).is_err());
}
