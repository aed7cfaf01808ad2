use anyhow::{anyhow, Result};
use mcube_algorithms::{
    genetic::{self, Genetic},
    simulated_annealing::{self, acceptance_probability, SimulatedAnnealing},
    steepest_ascent::{self, SteepestAscent},
    stochastic_hill_climbing::{self, StochasticHillClimbing},
    *,
};
use mcube_challenges::*;
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::{json, Map, Value};
use std::cell::RefCell;

fn challenge(size: usize, objective: ObjectiveKind) -> Challenge {
    Challenge::generate_instance(&[42u8; 32], &Difficulty { size, objective }).unwrap()
}

fn params(value: Value) -> Option<Map<String, Value>> {
    value.as_object().cloned()
}

#[test]
fn test_acceptance_probability() {
    assert_eq!(acceptance_probability(10, 5, 1.0), 1.0);
    assert_eq!(acceptance_probability(10, 10, 1.0), 1.0);
    assert!((acceptance_probability(10, 20, 10.0) - (-1.0f64).exp()).abs() < 1e-12);
    assert!(acceptance_probability(0, 1000, 1e-3) < 1e-100);
}

#[test]
fn test_annealing_hot_accepts_every_proposal() {
    let challenge = challenge(5, ObjectiveKind::MagicSum);
    let config = simulated_annealing::Config::initialize(&params(json!({
        "initial_temperature": 1e12,
        "cooling_rate": 0.999999,
        "max_iterations": 500,
    })))
    .unwrap();
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut annealing = SimulatedAnnealing::new(&challenge, config, &mut rng).unwrap();
    let outcome = drive(&mut annealing, &mut rng, &mut NoMonitor).unwrap();

    assert_eq!(outcome.termination, Termination::IterationLimit);
    assert_eq!(outcome.iterations, 500);
    assert_eq!(annealing.accepted(), 500);
    assert_eq!(annealing.stuck_occurrences(), 0);
    assert!(outcome.best_error <= outcome.initial_error);
    assert_eq!(challenge.evaluate(annealing.best()), outcome.best_error);
    assert_eq!(challenge.evaluate(annealing.current()), annealing.current_error());
}

#[test]
fn test_annealing_freezes() {
    let challenge = challenge(5, ObjectiveKind::MagicSum);
    let config = simulated_annealing::Config {
        initial_temperature: 1000.0,
        final_temperature: 500.0,
        cooling_rate: 0.5,
        ..Default::default()
    };
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut annealing = SimulatedAnnealing::new(&challenge, config, &mut rng).unwrap();
    let outcome = drive(&mut annealing, &mut rng, &mut NoMonitor).unwrap();
    assert_eq!(outcome.termination, Termination::Frozen);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(annealing.temperature(), 500.0);
}

#[test]
fn test_trace_values_are_probabilities() {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    let config = simulated_annealing::Config {
        max_iterations: 2000,
        ..Default::default()
    };
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut annealing = SimulatedAnnealing::new(&challenge, config, &mut rng).unwrap();
    let mut trace = Vec::new();
    let mut monitor = |progress: &Progress| -> Result<()> {
        trace.push((progress.iteration, progress.trace_value));
        Ok(())
    };
    let outcome = drive(&mut annealing, &mut rng, &mut monitor).unwrap();

    assert_eq!(trace.len(), outcome.iterations);
    for (i, (iteration, value)) in trace.iter().enumerate() {
        assert_eq!(*iteration, i + 1);
        assert!((0.0..=1.0).contains(value));
    }
}

#[test]
fn test_monitor_error_aborts_search() {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut climber = StochasticHillClimbing::new(
        &challenge,
        stochastic_hill_climbing::Config::default(),
        &mut rng,
    )
    .unwrap();
    let mut monitor = |progress: &Progress| -> Result<()> {
        if progress.iteration == 3 {
            Err(anyhow!("disk full"))
        } else {
            Ok(())
        }
    };
    let result = drive(&mut climber, &mut rng, &mut monitor);
    assert_eq!(result.unwrap_err().to_string(), "disk full");
    assert_eq!(climber.iterations(), 3);
}

#[test]
fn test_stochastic_hill_climbing_never_gets_worse() {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    let config = stochastic_hill_climbing::Config {
        max_iterations: 5000,
        report_every: 1000,
    };
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut climber = StochasticHillClimbing::new(&challenge, config, &mut rng).unwrap();
    let mut errors = Vec::new();
    let mut monitor = |progress: &Progress| -> Result<()> {
        errors.push(progress.current_error);
        Ok(())
    };
    let outcome = drive(&mut climber, &mut rng, &mut monitor).unwrap();

    assert!(errors.windows(2).all(|w| w[1] <= w[0]));
    assert!(outcome.best_error <= outcome.initial_error);
    assert_eq!(challenge.evaluate(climber.best()), outcome.best_error);
    assert!(climber.improvements() <= outcome.iterations);
}

#[test]
fn test_zero_budget_terminates_immediately() {
    let challenge = challenge(5, ObjectiveKind::MagicSum);
    for algorithm_id in ALGORITHMS {
        let hyperparameters = match algorithm_id {
            "genetic" => params(json!({ "generations": 0, "population_size": 4 })),
            _ => params(json!({ "max_iterations": 0 })),
        };
        let (outcome, solution) =
            run_algorithm(algorithm_id, &challenge, &hyperparameters, &mut NoMonitor).unwrap();
        assert_eq!(outcome.algorithm, algorithm_id);
        assert_eq!(outcome.termination, Termination::IterationLimit);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best_error, outcome.initial_error);
        assert_eq!(challenge.evaluate_error(&solution).unwrap(), outcome.best_error);
    }
}

#[test]
fn test_solved_start_terminates_immediately() {
    let challenge = challenge(2, ObjectiveKind::Positional);
    let sorted = Lattice::ascending(2).unwrap();
    let mut rng = SmallRng::from_seed(challenge.seed);

    let mut annealing = SimulatedAnnealing::from_lattice(
        &challenge,
        simulated_annealing::Config::default(),
        sorted.clone(),
    )
    .unwrap();
    let outcome = drive(&mut annealing, &mut rng, &mut NoMonitor).unwrap();
    assert_eq!(outcome.termination, Termination::Solved);
    assert_eq!(outcome.iterations, 0);

    let mut climber =
        SteepestAscent::from_lattice(&challenge, steepest_ascent::Config::default(), sorted)
            .unwrap();
    let outcome = drive(&mut climber, &mut rng, &mut NoMonitor).unwrap();
    assert_eq!(outcome.termination, Termination::Solved);
}

#[test]
fn test_steepest_ascent_sorts_reversed_lattice() {
    let challenge = challenge(2, ObjectiveKind::Positional);
    let reversed = Lattice::from_values(2, vec![8, 7, 6, 5, 4, 3, 2, 1]).unwrap();
    let mut climber =
        SteepestAscent::from_lattice(&challenge, steepest_ascent::Config::default(), reversed)
            .unwrap();
    let mut rng = SmallRng::from_seed(challenge.seed);
    let outcome = drive(&mut climber, &mut rng, &mut NoMonitor).unwrap();

    assert_eq!(outcome.termination, Termination::Solved);
    assert_eq!(outcome.initial_error, 32);
    assert_eq!(outcome.best_error, 0);
    assert_eq!(outcome.iterations, 4);
    assert_eq!(climber.best(), &Lattice::ascending(2).unwrap());
    assert_eq!(climber.total_sideways_moves(), 0);
}

#[test]
fn test_steepest_ascent_respects_sideways_cap() {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    let config = steepest_ascent::Config {
        max_sideways_moves: 5,
        max_iterations: 200,
        report_every: 50,
    };
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut climber = SteepestAscent::new(&challenge, config, &mut rng).unwrap();
    let mut errors = Vec::new();
    let mut monitor = |progress: &Progress| -> Result<()> {
        errors.push(progress.current_error);
        Ok(())
    };
    let outcome = drive(&mut climber, &mut rng, &mut monitor).unwrap();

    assert!(climber.sideways_moves() <= 5);
    assert!(errors.windows(2).all(|w| w[1] <= w[0]));
    assert!(outcome.best_error < outcome.initial_error);
    assert_eq!(challenge.evaluate(climber.best()), outcome.best_error);
    assert_ne!(outcome.termination, Termination::Frozen);
}

struct PlateauRun {
    termination: Termination,
    iterations: usize,
    total_sideways_moves: usize,
    sideways_after_each_step: Vec<usize>,
    details: Map<String, Value>,
}

fn run_steepest_from_ascending(max_sideways_moves: usize) -> PlateauRun {
    // no 2x2x2 arrangement scores 0, so the climb ends on a plateau
    let challenge = challenge(2, ObjectiveKind::MagicSum);
    let config = steepest_ascent::Config {
        max_sideways_moves,
        ..Default::default()
    };
    let mut climber =
        SteepestAscent::from_lattice(&challenge, config, Lattice::ascending(2).unwrap()).unwrap();
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut sideways_after_each_step = Vec::new();
    let termination = loop {
        match climber.step(&mut rng) {
            Step::Terminate(reason) => break reason,
            Step::Continue => sideways_after_each_step.push(climber.total_sideways_moves()),
        }
    };
    assert!(climber.best_error() > 0);
    PlateauRun {
        termination,
        iterations: climber.iterations(),
        total_sideways_moves: climber.total_sideways_moves(),
        sideways_after_each_step,
        details: climber.details(),
    }
}

#[test]
fn test_steepest_ascent_without_sideways_moves_stops_on_plateau() {
    let run = run_steepest_from_ascending(0);
    assert_eq!(run.termination, Termination::SidewaysLimit);
    assert_eq!(run.iterations, 5);
    assert_eq!(run.total_sideways_moves, 0);
    assert_eq!(run.details["sideways_moves"], json!(0));
}

#[test]
fn test_steepest_ascent_uses_whole_sideways_budget() {
    let run = run_steepest_from_ascending(3);
    assert_eq!(run.termination, Termination::SidewaysLimit);
    assert_eq!(run.iterations, 8);
    assert_eq!(run.total_sideways_moves, 3);
    assert!(run.sideways_after_each_step.iter().all(|&moves| moves <= 3));
    assert_eq!(run.details["sideways_moves"], json!(3));
}

fn run_genetic(parallel: bool) -> (Termination, Lattice, Vec<u64>, Vec<f64>) {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    let config = genetic::Config {
        population_size: 20,
        generations: 15,
        parallel,
        ..Default::default()
    };
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut genetic = Genetic::new(&challenge, config, &mut rng).unwrap();
    let mut errors = vec![genetic.best_error()];
    let mut rates = vec![genetic.mutation_rate()];
    let termination = loop {
        match genetic.step(&mut rng) {
            Step::Terminate(reason) => break reason,
            Step::Continue => {
                errors.push(genetic.best_error());
                rates.push(genetic.mutation_rate());
                assert_eq!(genetic.population().len(), 20);
            }
        }
    };
    (termination, genetic.best().clone(), errors, rates)
}

#[test]
fn test_genetic_is_independent_of_parallelism() {
    let (parallel, parallel_best, parallel_errors, _) = run_genetic(true);
    let (sequential, sequential_best, sequential_errors, _) = run_genetic(false);
    assert_eq!(parallel, sequential);
    assert_eq!(parallel_errors, sequential_errors);
    assert_eq!(parallel_best, sequential_best);
}

#[test]
fn test_genetic_elitism_and_mutation_bounds() {
    let (termination, best, errors, rates) = run_genetic(true);
    assert!(errors.windows(2).all(|w| w[1] <= w[0]));
    assert!(rates.iter().all(|rate| (0.01..=0.15).contains(rate)));
    assert!(best.is_permutation());
    match termination {
        Termination::IterationLimit => assert_eq!(errors.len(), 16),
        Termination::Solved => assert_eq!(*errors.last().unwrap(), 0),
        other => panic!("unexpected termination {:?}", other),
    }
}

#[test]
fn test_invalid_hyperparameters_rejected() {
    assert!(simulated_annealing::Config::initialize(&params(json!({ "cooling_rate": 1.5 }))).is_err());
    assert!(simulated_annealing::Config::initialize(&params(json!({ "temperature": 5 }))).is_err());
    assert!(genetic::Config::initialize(&params(json!({ "mutation_rate": 0.5 }))).is_err());
    assert!(genetic::Config::initialize(&params(json!({ "population_size": 0 }))).is_err());
    assert!(steepest_ascent::Config::initialize(&params(json!({ "max_sideways_moves": -1 }))).is_err());
    assert!(stochastic_hill_climbing::Config::initialize(&params(json!({ "max_iterations": "many" }))).is_err());
    assert_eq!(
        steepest_ascent::Config::initialize(&None).unwrap(),
        steepest_ascent::Config::default()
    );
}

#[test]
fn test_registry() {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    assert!(run_algorithm("tabu_search", &challenge, &None, &mut NoMonitor).is_err());
    assert!(get_algorithm("tabu_search").is_none());

    for algorithm_id in ALGORITHMS {
        assert!(get_help(algorithm_id).is_some());
        let solve = get_algorithm(algorithm_id).unwrap();
        let saved = RefCell::new(None);
        let save = |solution: &Solution| -> Result<()> {
            *saved.borrow_mut() = Some(solution.clone());
            Ok(())
        };
        let hyperparameters = match algorithm_id {
            "genetic" => params(json!({ "generations": 3, "population_size": 6 })),
            _ => params(json!({ "max_iterations": 50 })),
        };
        solve(&challenge, &save, &hyperparameters).unwrap();
        let solution = saved.into_inner().unwrap();
        assert!(solution.to_lattice().unwrap().is_permutation());
    }
}

#[test]
fn test_runs_are_reproducible() {
    let challenge = challenge(3, ObjectiveKind::MagicSum);
    let hyperparameters = params(json!({ "max_iterations": 300 }));
    let (first, first_solution) =
        run_algorithm("simulated_annealing", &challenge, &hyperparameters, &mut NoMonitor).unwrap();
    let (second, second_solution) =
        run_algorithm("simulated_annealing", &challenge, &hyperparameters, &mut NoMonitor).unwrap();
    assert_eq!(first.best_error, second.best_error);
    assert_eq!(first_solution, second_solution);
}
