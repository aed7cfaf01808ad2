use crate::{
    hyperparameters,
    neighbors::random_swap,
    strategy::{drive, NoMonitor, Step, Strategy, Termination},
};
use anyhow::{anyhow, Result};
use mcube_challenges::{Challenge, Lattice, Objective, Solution};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub initial_temperature: f64,
    /// The search stops once the temperature is at or below this value.
    pub final_temperature: f64,
    /// Multiplicative cooling factor applied after every step.
    pub cooling_rate: f64,
    pub max_iterations: usize,
    /// Consecutive rejected proposals counted as one stuck occurrence.
    pub stuck_threshold: usize,
    pub report_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            final_temperature: 0.0,
            cooling_rate: 0.999,
            max_iterations: 100_000,
            stuck_threshold: 100,
            report_every: 10_000,
        }
    }
}

impl Config {
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        let config = hyperparameters::initialize(Self::default(), hyperparameters)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(anyhow!(
                "initial_temperature must be positive and finite, got {}",
                self.initial_temperature
            ));
        }
        if !(self.final_temperature >= 0.0) {
            return Err(anyhow!(
                "final_temperature must be non-negative, got {}",
                self.final_temperature
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(anyhow!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            ));
        }
        if self.stuck_threshold == 0 {
            return Err(anyhow!("stuck_threshold must be at least 1"));
        }
        Ok(())
    }
}

/// Probability of moving to a neighbor with `new_error` from `current_error` at `temperature`.
pub fn acceptance_probability(current_error: u64, new_error: u64, temperature: f64) -> f64 {
    if new_error < current_error {
        1.0
    } else {
        ((current_error as f64 - new_error as f64) / temperature).exp()
    }
}

pub struct SimulatedAnnealing<'a> {
    challenge: &'a Challenge,
    config: Config,
    current: Lattice,
    current_error: u64,
    best: Lattice,
    best_error: u64,
    temperature: f64,
    iterations: usize,
    last_probability: f64,
    accepted: usize,
    accepted_worse: usize,
    no_improvement: usize,
    stuck_occurrences: usize,
}

impl<'a> SimulatedAnnealing<'a> {
    pub fn new(challenge: &'a Challenge, config: Config, rng: &mut SmallRng) -> Result<Self> {
        let lattice = challenge.random_lattice(rng)?;
        Self::from_lattice(challenge, config, lattice)
    }

    pub fn from_lattice(challenge: &'a Challenge, config: Config, lattice: Lattice) -> Result<Self> {
        config.validate()?;
        if lattice.size() != challenge.size() {
            return Err(anyhow!(
                "Starting lattice has size {}, challenge expects {}",
                lattice.size(),
                challenge.size()
            ));
        }
        let error = challenge.evaluate(&lattice);
        Ok(Self {
            challenge,
            config,
            best: lattice.clone(),
            current: lattice,
            current_error: error,
            best_error: error,
            temperature: config.initial_temperature,
            iterations: 0,
            last_probability: 1.0,
            accepted: 0,
            accepted_worse: 0,
            no_improvement: 0,
            stuck_occurrences: 0,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn current(&self) -> &Lattice {
        &self.current
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn stuck_occurrences(&self) -> usize {
        self.stuck_occurrences
    }
}

impl<'a> Strategy for SimulatedAnnealing<'a> {
    fn name(&self) -> &'static str {
        "simulated_annealing"
    }

    fn step(&mut self, rng: &mut SmallRng) -> Step {
        if self.current_error == 0 {
            return Step::Terminate(Termination::Solved);
        }
        if self.temperature <= self.config.final_temperature {
            return Step::Terminate(Termination::Frozen);
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
        let probability = acceptance_probability(self.current_error, new_error, self.temperature);
        self.last_probability = probability;

        if new_error < self.current_error || probability > rng.gen::<f64>() {
            if new_error > self.current_error {
                self.accepted_worse += 1;
            }
            self.current.swap_in_place(a, b);
            self.current_error = new_error;
            self.accepted += 1;
            self.no_improvement = 0;
            if self.current_error < self.best_error {
                self.best.copy_from(&self.current);
                self.best_error = self.current_error;
            }
        } else {
            self.no_improvement += 1;
        }

        if self.no_improvement >= self.config.stuck_threshold {
            self.stuck_occurrences += 1;
            self.no_improvement = 0;
        }

        self.temperature *= self.config.cooling_rate;
        Step::Continue
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn current_error(&self) -> u64 {
        self.current_error
    }

    fn best(&self) -> &Lattice {
        &self.best
    }

    fn best_error(&self) -> u64 {
        self.best_error
    }

    fn trace_value(&self) -> f64 {
        self.last_probability
    }

    fn report_every(&self) -> usize {
        self.config.report_every
    }

    fn progress_line(&self) -> String {
        format!(
            "Iteration {} - Current Error: {} - Temperature: {:.2}",
            self.iterations, self.current_error, self.temperature
        )
    }

    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert("temperature".to_string(), json!(self.temperature));
        details.insert("accepted".to_string(), json!(self.accepted));
        details.insert("accepted_worse".to_string(), json!(self.accepted_worse));
        details.insert(
            "stuck_occurrences".to_string(),
            json!(self.stuck_occurrences),
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
    let mut annealing = SimulatedAnnealing::new(challenge, config, &mut rng)?;
    drive(&mut annealing, &mut rng, &mut NoMonitor)?;
    save_solution(&Solution::from(annealing.best()))
}

pub fn help() {
    println!("Simulated annealing over single random swaps.");
    println!("");
    println!("A worse neighbor is accepted when exp((current - new) / T) beats a uniform draw.");
    println!("T starts at initial_temperature and is multiplied by cooling_rate every step.");
    println!("");
    println!("HYPERPARAMETERS (defaults):");
    println!("  initial_temperature: 1000.0");
    println!("  final_temperature:   0.0");
    println!("  cooling_rate:        0.999");
    println!("  max_iterations:      100000");
    println!("  stuck_threshold:     100");
    println!("  report_every:        10000");
    println!("");
    println!("Trace values are acceptance probabilities.");
}
