use crate::{
    hyperparameters,
    neighbors::full_neighborhood_best,
    strategy::{drive, NoMonitor, Step, Strategy, Termination},
};
use anyhow::{anyhow, Result};
use log::debug;
use mcube_challenges::{Challenge, Lattice, Solution};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Consecutive equal-error moves allowed before the plateau walk gives up.
    pub max_sideways_moves: usize,
    pub max_iterations: usize,
    pub report_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_sideways_moves: 100,
            max_iterations: 10_000,
            report_every: 10,
        }
    }
}

impl Config {
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        hyperparameters::initialize(Self::default(), hyperparameters)
    }
}

/// Steepest-ascent hill climbing over the full swap neighborhood, with bounded sideways moves
/// across plateaus.
pub struct SteepestAscent<'a> {
    challenge: &'a Challenge,
    config: Config,
    current: Lattice,
    current_error: u64,
    iterations: usize,
    sideways_moves: usize,
    total_sideways_moves: usize,
    improving_moves: usize,
}

impl<'a> SteepestAscent<'a> {
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
            sideways_moves: 0,
            total_sideways_moves: 0,
            improving_moves: 0,
        })
    }

    /// Sideways moves since the last strict improvement.
    pub fn sideways_moves(&self) -> usize {
        self.sideways_moves
    }

    pub fn total_sideways_moves(&self) -> usize {
        self.total_sideways_moves
    }
}

impl<'a> Strategy for SteepestAscent<'a> {
    fn name(&self) -> &'static str {
        "steepest_ascent"
    }

    fn step(&mut self, _rng: &mut SmallRng) -> Step {
        if self.current_error == 0 {
            return Step::Terminate(Termination::Solved);
        }
        if self.iterations >= self.config.max_iterations {
            return Step::Terminate(Termination::IterationLimit);
        }
        self.iterations += 1;

        let best = match full_neighborhood_best(
            &self.current,
            self.current_error,
            self.challenge.objective(),
        ) {
            Some(best) => best,
            None => {
                debug!("No neighbor is as good as the current lattice. Stopping.");
                return Step::Terminate(Termination::LocalOptimum);
            }
        };

        if best.error < self.current_error {
            self.current = best.lattice;
            self.current_error = best.error;
            self.sideways_moves = 0;
            self.improving_moves += 1;
        } else if self.sideways_moves < self.config.max_sideways_moves {
            self.current = best.lattice;
            self.sideways_moves += 1;
            self.total_sideways_moves += 1;
            debug!("Sideways move: {}", self.sideways_moves);
        } else {
            debug!("Reached sideways move limit. Stopping.");
            return Step::Terminate(Termination::SidewaysLimit);
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
        details.insert("improving_moves".to_string(), json!(self.improving_moves));
        details.insert("sideways_moves".to_string(), json!(self.sideways_moves));
        details.insert(
            "total_sideways_moves".to_string(),
            json!(self.total_sideways_moves),
        );
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
    let mut climber = SteepestAscent::new(challenge, config, &mut rng)?;
    drive(&mut climber, &mut rng, &mut NoMonitor)?;
    save_solution(&Solution::from(climber.best()))
}

pub fn help() {
    println!("Steepest-ascent hill climbing with sideways moves.");
    println!("");
    println!("Every iteration evaluates all C(n^3, 2) swaps and moves to the best one.");
    println!("Equal-error moves are taken until max_sideways_moves consecutive ones have been made.");
    println!("");
    println!("HYPERPARAMETERS (defaults):");
    println!("  max_sideways_moves: 100");
    println!("  max_iterations:     10000");
    println!("  report_every:       10");
}
