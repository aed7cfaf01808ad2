use crate::{
    hyperparameters,
    strategy::{drive, NoMonitor, Step, Strategy, Termination},
    variation::{best_index, crossover, mutate, tournament_select, Individual},
};
use anyhow::{anyhow, Result};
use log::debug;
use mcube_challenges::{Challenge, Lattice, Solution};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub population_size: usize,
    pub generations: usize,
    pub tournament_size: usize,
    /// Copies of the best individual carried into every new generation.
    pub elitism: usize,
    pub mutation_rate: f64,
    pub min_mutation_rate: f64,
    pub max_mutation_rate: f64,
    /// Raise the rate when the population converges, lower it while it stays diverse.
    pub adaptive_mutation: bool,
    /// Breed offspring on the rayon thread pool.
    pub parallel: bool,
    pub report_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 1000,
            tournament_size: 5,
            elitism: 2,
            mutation_rate: 0.05,
            min_mutation_rate: 0.01,
            max_mutation_rate: 0.15,
            adaptive_mutation: true,
            parallel: true,
            report_every: 100,
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
        if self.population_size == 0 {
            return Err(anyhow!("population_size must be at least 1"));
        }
        if self.tournament_size == 0 {
            return Err(anyhow!("tournament_size must be at least 1"));
        }
        if !(0.0 <= self.min_mutation_rate
            && self.min_mutation_rate <= self.max_mutation_rate
            && self.max_mutation_rate <= 1.0)
        {
            return Err(anyhow!(
                "Mutation rate bounds must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                self.min_mutation_rate,
                self.max_mutation_rate
            ));
        }
        if !(self.min_mutation_rate..=self.max_mutation_rate).contains(&self.mutation_rate) {
            return Err(anyhow!(
                "mutation_rate {} is outside [{}, {}]",
                self.mutation_rate,
                self.min_mutation_rate,
                self.max_mutation_rate
            ));
        }
        Ok(())
    }
}

pub struct Genetic<'a> {
    challenge: &'a Challenge,
    config: Config,
    population: Vec<Individual>,
    best_idx: usize,
    generation: usize,
    mutation_rate: f64,
}

impl<'a> Genetic<'a> {
    pub fn new(challenge: &'a Challenge, config: Config, rng: &mut SmallRng) -> Result<Self> {
        config.validate()?;
        let mut population = Vec::with_capacity(config.population_size);
        for _ in 0..config.population_size {
            let lattice = challenge.random_lattice(rng)?;
            population.push(Individual::new(lattice, challenge.objective()));
        }
        Ok(Self {
            challenge,
            best_idx: best_index(&population),
            population,
            config,
            generation: 0,
            mutation_rate: config.mutation_rate,
        })
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    fn breed(&self, seed: u64) -> Individual {
        let mut rng = SmallRng::seed_from_u64(seed);
        let k = self.config.tournament_size;
        let parent_a = tournament_select(&self.population, k, &mut rng);
        let parent_b = tournament_select(&self.population, k, &mut rng);
        let child = crossover(
            self.population[parent_a].lattice(),
            self.population[parent_b].lattice(),
        );
        let objective = self.challenge.objective();
        let mut child = Individual::new(child, objective);
        mutate(&mut child, self.mutation_rate, objective, &mut rng);
        child
    }

    /// Counts adjacent distinct values among the sorted fitnesses; fewer than half the
    /// population means it has converged.
    fn adapt_mutation_rate(&mut self) {
        let mut fitnesses = self
            .population
            .iter()
            .map(|individual| individual.fitness())
            .collect::<Vec<u64>>();
        fitnesses.sort_unstable();
        let diversity = fitnesses.windows(2).filter(|w| w[0] != w[1]).count();
        if diversity < self.population.len() / 2 {
            self.mutation_rate = (self.mutation_rate * 1.1).min(self.config.max_mutation_rate);
        } else {
            self.mutation_rate = (self.mutation_rate * 0.9).max(self.config.min_mutation_rate);
        }
    }
}

impl<'a> Strategy for Genetic<'a> {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn step(&mut self, rng: &mut SmallRng) -> Step {
        if self.best_error() == 0 {
            return Step::Terminate(Termination::Solved);
        }
        if self.generation >= self.config.generations {
            return Step::Terminate(Termination::IterationLimit);
        }

        let size = self.config.population_size;
        let elites = self.config.elitism.min(size);
        let mut next_generation = Vec::with_capacity(size);
        for _ in 0..elites {
            next_generation.push(self.population[self.best_idx].clone());
        }

        // one seed per offspring, drawn up front so the result does not depend on thread count
        let seeds = (elites..size).map(|_| rng.gen::<u64>()).collect::<Vec<u64>>();
        let parents = &*self;
        let offspring = if parents.config.parallel {
            seeds
                .par_iter()
                .map(|&seed| parents.breed(seed))
                .collect::<Vec<Individual>>()
        } else {
            seeds
                .iter()
                .map(|&seed| parents.breed(seed))
                .collect::<Vec<Individual>>()
        };
        next_generation.extend(offspring);

        self.population = next_generation;
        if self.config.adaptive_mutation {
            self.adapt_mutation_rate();
        }
        self.best_idx = best_index(&self.population);
        self.generation += 1;
        debug!(
            "Generation {}: best {}, mutation rate {:.4}",
            self.generation,
            self.best_error(),
            self.mutation_rate
        );
        Step::Continue
    }

    fn iterations(&self) -> usize {
        self.generation
    }

    /// Error of the best individual of the current population.
    fn current_error(&self) -> u64 {
        self.population[self.best_idx].fitness()
    }

    fn best(&self) -> &Lattice {
        self.population[self.best_idx].lattice()
    }

    fn best_error(&self) -> u64 {
        self.population[self.best_idx].fitness()
    }

    fn trace_value(&self) -> f64 {
        self.best_error() as f64
    }

    fn report_every(&self) -> usize {
        self.config.report_every
    }

    fn progress_line(&self) -> String {
        format!(
            "Generation {}: Best Fitness = {} - Mutation Rate: {:.4}",
            self.generation,
            self.best_error(),
            self.mutation_rate
        )
    }

    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert("generation".to_string(), json!(self.generation));
        details.insert("mutation_rate".to_string(), json!(self.mutation_rate));
        details.insert(
            "population_size".to_string(),
            json!(self.population.len()),
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
    let mut genetic = Genetic::new(challenge, config, &mut rng)?;
    drive(&mut genetic, &mut rng, &mut NoMonitor)?;
    save_solution(&Solution::from(genetic.best()))
}

pub fn help() {
    println!("Generational genetic algorithm with elitism and adaptive mutation.");
    println!("");
    println!("Parents are picked by tournament, recombined by positional crossover and mutated");
    println!("with floor(n^3 * mutation_rate) random swaps. With adaptive_mutation the rate grows");
    println!("by 10% when fewer than half the sorted fitnesses differ from their neighbor and");
    println!("shrinks by 10% otherwise, clamped to [min_mutation_rate, max_mutation_rate].");
    println!("");
    println!("HYPERPARAMETERS (defaults):");
    println!("  population_size:   100");
    println!("  generations:       1000");
    println!("  tournament_size:   5");
    println!("  elitism:           2");
    println!("  mutation_rate:     0.05");
    println!("  min_mutation_rate: 0.01");
    println!("  max_mutation_rate: 0.15");
    println!("  adaptive_mutation: true");
    println!("  parallel:          true");
    println!("  report_every:      100");
}
