use crate::{
    hyperparameters,
    neighbors::random_swap,
    strategy::{drive, NoMonitor, Step, Strategy, Termination},
};
use anyhow::{anyhow, Result};
use mcube_challenges::{Challenge, Lattice, Objective, Solution};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub max_iterations: usize,
    pub report_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            report_every: 10_000,
        }
    }
}

impl Config {
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        hyperparameters::initialize(Self::default(), hyperparameters)
    }
}

pub struct StochasticHillClimbing<'a> {
    challenge: &'a Challenge,
    config: Config,
    current: Lattice,
    current_error: u64,
    iterations: usize,
    improvements: usize,
}

impl<'a> StochasticHillClimbing<'a> {
    pub fn new(challenge: &'a Challenge, config: Config, rng: &mut SmallRng) -> Result<Self> {
        let lattice = challenge.random_lattice(rng)?;
        Self::from_lattice(challenge, config, lattice)
    }

    pub fn from_lattice(challenge: &'a Challenge, config: Config, lattice: Lattice) -> Result<Self> {
        if lattice.size() != challenge.size() {
            return Err(anyhow!(
                "Starting lattice has size {}, challenge expects {}",
                lattice.size(),
                challenge.size()
            ));
        }
        let current_error = challenge.evaluate(&lattice);
        Ok(Self {
            challenge,
            config,
            current: lattice,
            current_error,
            iterations: 0,
            improvements: 0,
        })
    }

    pub fn improvements(&self) -> usize {
        self.improvements
    }
}

impl<'a> Strategy for StochasticHillClimbing<'a> {
    fn name(&self) -> &'static str {
        "stochastic_hill_climbing"
    }

    fn step(&mut self, rng: &mut SmallRng) -> Step {
        if self.current_error == 0 {
            return Step::Terminate(Termination::Solved);
        }
        if self.iterations >= self.config.max_iterations {
            return Step::Terminate(Termination::IterationLimit);
        }
        self.iterations += 1;

        let (a, b) = random_swap(self.current.size(), rng);
        let new_error = self
            .challenge
            .objective()
            .evaluate_swap(&mut self.current, a, b, self.current_error);
        if new_error < self.current_error {
            self.current.swap_in_place(a, b);
            self.current_error = new_error;
            self.improvements += 1;
        }
        Step::Continue
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn current_error(&self) -> u64 {
        self.current_error
    }

    fn best(&self) -> &Lattice {
        &self.current
    }

    fn best_error(&self) -> u64 {
        self.current_error
    }

    fn report_every(&self) -> usize {
        self.config.report_every
    }

    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert("improvements".to_string(), json!(self.improvements));
        details
    }
}

pub fn solve_challenge(
    challenge: &Challenge,
    save_solution: &dyn Fn(&Solution) -> Result<()>,
    hyperparameters: &Option<Map<String, Value>>,
) -> Result<()> {
    let config = Config::initialize(hyperparameters)?;
    let mut rng = SmallRng::from_seed(challenge.seed);
    let mut climber = StochasticHillClimbing::new(challenge, config, &mut rng)?;
    drive(&mut climber, &mut rng, &mut NoMonitor)?;
    save_solution(&Solution::from(climber.best()))
}

pub fn help() {
    println!("Stochastic hill climbing: one random swap per iteration, kept only if it lowers the error.");
    println!("");
    println!("HYPERPARAMETERS (defaults):");
    println!("  max_iterations: 100000");
    println!("  report_every:   10000");
}
