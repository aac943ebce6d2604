pub mod dataset;

use crate::core::{Domain, PlacementConfig, PointSet, Result, validate_inputs};
use crate::optimization::{
    GradientDescent, NoopCallback, OptimizationCallback, PlacementProblem, Solver, SolverResult,
    Termination,
};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a placement run, ready for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct PlacementResult {
    pub status: Termination,
    pub objective: f64,
    pub initial_objective: f64,
    pub candidates: PointSet,
    pub iterations: u32,
    /// Initial objective followed by every committed objective.
    pub trace: Vec<f64>,
    pub step: f64,
    pub objective_evals: usize,
    pub gradient_evals: usize,
    pub discarded_terms: usize,
    pub elapsed_ms: f64,
    pub threads: usize,
}

impl PlacementResult {
    fn from_solver(result: SolverResult, threads: usize) -> Self {
        Self {
            status: result.status,
            objective: result.objective,
            initial_objective: result.trace.first().copied().unwrap_or(result.objective),
            candidates: result.candidates,
            iterations: result.iterations,
            trace: result.trace,
            step: result.step,
            objective_evals: result.objective_evals,
            gradient_evals: result.gradient_evals,
            discarded_terms: result.discarded_terms,
            elapsed_ms: result.elapsed.as_secs_f64() * 1e3,
            threads,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Final candidate coordinates as `(xs, ys)`.
    pub fn into_coords(self) -> (Vec<f64>, Vec<f64>) {
        self.candidates.into_coords()
    }
}

/// Entry point: validates inputs, owns the worker pool, runs the descent.
#[derive(Clone, Debug, Default)]
pub struct Optimizer {
    pub domain: Domain,
    pub config: PlacementConfig,
}

impl Optimizer {
    pub fn new(domain: Domain, config: PlacementConfig) -> Self {
        Self { domain, config }
    }

    pub fn optimize(&self, existing: &PointSet, candidates: &PointSet) -> Result<PlacementResult> {
        self.optimize_with_callback(existing, candidates, &mut NoopCallback)
    }

    /// Run on raw coordinate arrays.
    pub fn optimize_coords(
        &self,
        existing_x: Vec<f64>,
        existing_y: Vec<f64>,
        candidate_x: Vec<f64>,
        candidate_y: Vec<f64>,
    ) -> Result<PlacementResult> {
        let existing = PointSet::new(existing_x, existing_y)?;
        let candidates = PointSet::new(candidate_x, candidate_y)?;
        self.optimize(&existing, &candidates)
    }

    pub fn optimize_with_callback(
        &self,
        existing: &PointSet,
        candidates: &PointSet,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<PlacementResult> {
        validate_inputs(existing, candidates, &self.domain, &self.config)?;

        let threads = self.config.worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("siteopt-worker-{i}"))
            .build()?;

        let problem = PlacementProblem::new(existing, candidates, self.domain);
        let mut solver = GradientDescent::from_config(&self.config);

        info!(
            existing = existing.len(),
            candidates = candidates.len(),
            threads,
            solver = solver.name(),
            "placement start"
        );
        debug!(config = ?self.config, domain = ?self.domain, "placement settings");

        let result = pool.install(|| solver.solve(&problem, callback))?;
        Ok(PlacementResult::from_solver(result, threads))
    }
}
