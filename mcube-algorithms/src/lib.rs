pub mod genetic;
mod hyperparameters;
pub mod neighbors;
pub mod simulated_annealing;
pub mod steepest_ascent;
pub mod stochastic_hill_climbing;
pub mod strategy;
pub mod variation;

pub use strategy::{drive, NoMonitor, Outcome, Progress, SearchMonitor, Step, Strategy, Termination};

use anyhow::{anyhow, Result};
use mcube_challenges::{Challenge, Solution};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::{Map, Value};

pub type SolveFn =
    fn(&Challenge, &dyn Fn(&Solution) -> Result<()>, &Option<Map<String, Value>>) -> Result<()>;

pub const ALGORITHMS: [&str; 4] = [
    "simulated_annealing",
    "genetic",
    "steepest_ascent",
    "stochastic_hill_climbing",
];

/// Instantiates the strategy registered under `algorithm_id`, drawing its starting state from `rng`.
pub fn build_strategy<'a>(
    algorithm_id: &str,
    challenge: &'a Challenge,
    hyperparameters: &Option<Map<String, Value>>,
    rng: &mut SmallRng,
) -> Result<Box<dyn Strategy + 'a>> {
    Ok(match algorithm_id {
        "simulated_annealing" => {
            let config = simulated_annealing::Config::initialize(hyperparameters)?;
            Box::new(simulated_annealing::SimulatedAnnealing::new(
                challenge, config, rng,
            )?)
        }
        "genetic" => {
            let config = genetic::Config::initialize(hyperparameters)?;
            Box::new(genetic::Genetic::new(challenge, config, rng)?)
        }
        "steepest_ascent" => {
            let config = steepest_ascent::Config::initialize(hyperparameters)?;
            Box::new(steepest_ascent::SteepestAscent::new(challenge, config, rng)?)
        }
        "stochastic_hill_climbing" => {
            let config = stochastic_hill_climbing::Config::initialize(hyperparameters)?;
            Box::new(stochastic_hill_climbing::StochasticHillClimbing::new(
                challenge, config, rng,
            )?)
        }
        _ => {
            return Err(anyhow!(
                "Unknown algorithm '{}'. Expected one of: {}",
                algorithm_id,
                ALGORITHMS.join(", ")
            ))
        }
    })
}

/// Runs `algorithm_id` to termination on `challenge`, seeding from `challenge.seed`.
pub fn run_algorithm(
    algorithm_id: &str,
    challenge: &Challenge,
    hyperparameters: &Option<Map<String, Value>>,
    monitor: &mut dyn SearchMonitor,
) -> Result<(Outcome, Solution)> {
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut strategy = build_strategy(algorithm_id, challenge, hyperparameters, &mut rng)?;
    let outcome = drive(strategy.as_mut(), &mut rng, monitor)?;
    let solution = Solution::from(strategy.best());
    Ok((outcome, solution))
}

pub fn get_algorithm(algorithm_id: &str) -> Option<SolveFn> {
    match algorithm_id {
        "simulated_annealing" => Some(simulated_annealing::solve_challenge),
        "genetic" => Some(genetic::solve_challenge),
        "steepest_ascent" => Some(steepest_ascent::solve_challenge),
        "stochastic_hill_climbing" => Some(stochastic_hill_climbing::solve_challenge),
        _ => None,
    }
}

pub fn get_help(algorithm_id: &str) -> Option<fn()> {
    match algorithm_id {
        "simulated_annealing" => Some(simulated_annealing::help),
        "genetic" => Some(genetic::help),
        "steepest_ascent" => Some(steepest_ascent::help),
        "stochastic_hill_climbing" => Some(stochastic_hill_climbing::help),
        _ => None,
    }
}
