use crate::core::{PointSet, Result};
use crate::optimization::problem::Evaluation;
use serde::Serialize;
use std::time::Duration;

/// Terminal state of a descent run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative objective change fell below epsilon, or the gradient vanished.
    Converged,
    /// A tentative objective (or the gradient) stopped being a number.
    Diverged,
    /// Iteration budget used up.
    Exhausted,
    /// Step halving cap reached without finding an improvement.
    Stalled,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::Diverged => "diverged",
            Termination::Exhausted => "exhausted",
            Termination::Stalled => "stalled",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SolverResult {
    pub status: Termination,
    /// Last committed objective.
    pub objective: f64,
    /// Last committed candidate positions.
    pub candidates: PointSet,
    pub iterations: u32,
    /// Initial objective followed by one entry per committed iteration.
    pub trace: Vec<f64>,
    /// Step size when the run ended.
    pub step: f64,
    pub objective_evals: usize,
    pub gradient_evals: usize,
    /// Terms the accumulation policy dropped from `objective`.
    pub discarded_terms: usize,
    pub elapsed: Duration,
}

/// Callback interface for optimization progress
pub trait OptimizationCallback: Send {
    /// Called after every committed iteration.
    fn on_iteration(&mut self, iteration: u32, candidates: &PointSet, objective: f64, step: f64);

    /// Called once with the final result.
    fn on_finish(&mut self, _result: &SolverResult) {}
}

/// What a solver needs from a placement problem.
pub trait Problem: Sync {
    /// Full evaluation, including how many terms were dropped.
    fn evaluate(&self, candidates: &PointSet) -> Evaluation;

    /// Objective value only.
    fn objective(&self, candidates: &PointSet) -> f64 {
        self.evaluate(candidates).value
    }

    fn num_candidates(&self) -> usize;

    /// Starting candidate positions.
    fn initial_candidates(&self) -> &PointSet;
}

/// Solver interface - takes problem and callback
pub trait Solver {
    fn name(&self) -> &str;

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult>;
}
