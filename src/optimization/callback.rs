use super::solvers::traits::{OptimizationCallback, SolverResult};
use crate::core::PointSet;
use tracing::info;

/// Callback that ignores progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCallback;

impl OptimizationCallback for NoopCallback {
    fn on_iteration(
        &mut self,
        _iteration: u32,
        _candidates: &PointSet,
        _objective: f64,
        _step: f64,
    ) {
    }
}

/// Iteration record kept by [`SummaryCallback`].
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: u32,
    pub objective: f64,
    pub step: f64,
}

/// Callback for tracking and reporting placement progress
pub struct SummaryCallback {
    verbose: bool,
    keep_positions: bool,
    history: Vec<IterationRecord>,
    positions: Vec<PointSet>,
}

impl SummaryCallback {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            keep_positions: false,
            history: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Also keep a snapshot of the candidates after every iteration.
    pub fn with_positions(mut self) -> Self {
        self.keep_positions = true;
        self
    }

    /// Get iteration history
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn positions(&self) -> &[PointSet] {
        &self.positions
    }

    /// Log the run summary and the full iteration history
    pub fn log_summary(&self, result: &SolverResult) {
        info!(
            status = result.status.as_str(),
            iterations = result.iterations,
            objective = result.objective,
            step = result.step,
            objective_evals = result.objective_evals,
            gradient_evals = result.gradient_evals,
            discarded_terms = result.discarded_terms,
            elapsed_ms = result.elapsed.as_secs_f64() * 1e3,
            "placement summary"
        );
        for record in &self.history {
            info!(
                iteration = record.iteration,
                objective = record.objective,
                step = record.step,
                "history"
            );
        }
    }
}

impl OptimizationCallback for SummaryCallback {
    fn on_iteration(&mut self, iteration: u32, candidates: &PointSet, objective: f64, step: f64) {
        self.history.push(IterationRecord {
            iteration,
            objective,
            step,
        });
        if self.keep_positions {
            self.positions.push(candidates.clone());
        }

        if self.verbose {
            info!(iteration, objective, step, "iteration");
        }
    }

    fn on_finish(&mut self, result: &SolverResult) {
        if self.verbose {
            self.log_summary(result);
        }
    }
}
