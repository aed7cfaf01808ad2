use anyhow::Result;
use log::info;
use logging_timer::time;
use mcube_challenges::Lattice;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Error reached 0.
    Solved,
    /// Iteration or generation budget exhausted.
    IterationLimit,
    /// Temperature fell to the floor.
    Frozen,
    /// No neighbor is as good as the current lattice.
    LocalOptimum,
    /// Plateau walk hit the sideways-move cap.
    SidewaysLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Terminate(Termination),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub iteration: usize,
    pub current_error: u64,
    pub best_error: u64,
    /// Per-step value written to traces: acceptance probability for annealing, error otherwise.
    pub trace_value: f64,
}

/// A search over lattices driven one unit of work (iteration or generation) at a time.
///
/// `step` checks the stopping conditions before doing any work, so a strategy that is
/// already solved or out of budget returns `Step::Terminate` without touching its state.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn step(&mut self, rng: &mut SmallRng) -> Step;

    fn iterations(&self) -> usize;

    fn current_error(&self) -> u64;

    fn best(&self) -> &Lattice;

    fn best_error(&self) -> u64;

    fn trace_value(&self) -> f64 {
        self.current_error() as f64
    }

    /// Iterations between progress log lines.
    fn report_every(&self) -> usize;

    fn progress_line(&self) -> String {
        format!(
            "Iteration {} - Current Error: {} - Best Error: {}",
            self.iterations(),
            self.current_error(),
            self.best_error()
        )
    }

    /// Strategy-specific telemetry reported with the outcome.
    fn details(&self) -> Map<String, Value> {
        Map::new()
    }
}

pub trait SearchMonitor {
    fn on_progress(&mut self, progress: &Progress) -> Result<()>;
}

impl<F> SearchMonitor for F
where
    F: FnMut(&Progress) -> Result<()>,
{
    fn on_progress(&mut self, progress: &Progress) -> Result<()> {
        self(progress)
    }
}

pub struct NoMonitor;

impl SearchMonitor for NoMonitor {
    fn on_progress(&mut self, _progress: &Progress) -> Result<()> {
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Outcome {
    pub algorithm: String,
    pub termination: Termination,
    pub iterations: usize,
    pub initial_error: u64,
    pub best_error: u64,
    pub elapsed_secs: f64,
    pub details: Map<String, Value>,
}

/// Steps `strategy` until it terminates, feeding every step's progress to `monitor`.
///
/// A monitor error aborts the search and is returned as is.
#[time]
pub fn drive(
    strategy: &mut dyn Strategy,
    rng: &mut SmallRng,
    monitor: &mut dyn SearchMonitor,
) -> Result<Outcome> {
    let start = Instant::now();
    let initial_error = strategy.current_error();
    let report_every = strategy.report_every().max(1);
    info!("{}: initial error {}", strategy.name(), initial_error);

    let termination = loop {
        match strategy.step(rng) {
            Step::Terminate(reason) => break reason,
            Step::Continue => {
                let progress = Progress {
                    iteration: strategy.iterations(),
                    current_error: strategy.current_error(),
                    best_error: strategy.best_error(),
                    trace_value: strategy.trace_value(),
                };
                monitor.on_progress(&progress)?;
                if progress.iteration % report_every == 0 {
                    info!("{}: {}", strategy.name(), strategy.progress_line());
                }
            }
        }
    };

    let outcome = Outcome {
        algorithm: strategy.name().to_string(),
        termination,
        iterations: strategy.iterations(),
        initial_error,
        best_error: strategy.best_error(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        details: strategy.details(),
    };
    info!(
        "{}: stopped ({:?}) after {} iterations in {:.2}s, best error {}",
        outcome.algorithm,
        outcome.termination,
        outcome.iterations,
        outcome.elapsed_secs,
        outcome.best_error
    );
    Ok(outcome)
}
