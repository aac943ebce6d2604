use super::traits::{OptimizationCallback, Problem, Solver, SolverResult, Termination};
use crate::core::{PlacementConfig, PlacementError, PointSet, Result};
use crate::optimization::gradient::{Direction, GradientEstimator, GradientVector};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Mutable state of a run. Only the descent loop touches it.
struct OptimizationState {
    candidates: PointSet,
    step: f64,
    objective: f64,
    previous_objective: f64,
    discarded: usize,
}

impl OptimizationState {
    fn new(candidates: PointSet, objective: f64, discarded: usize, step: f64) -> Self {
        Self {
            candidates,
            step,
            objective,
            previous_objective: objective,
            discarded,
        }
    }

    /// `candidates - step * gradient`, coordinate-wise.
    fn tentative(&self, gradient: &GradientVector) -> PointSet {
        let mut trial = self.candidates.clone();
        for (x, g) in trial.xs_mut().iter_mut().zip(&gradient.dx) {
            *x -= self.step * g;
        }
        for (y, g) in trial.ys_mut().iter_mut().zip(&gradient.dy) {
            *y -= self.step * g;
        }
        trial
    }

    fn commit(&mut self, candidates: PointSet, objective: f64, discarded: usize) {
        self.candidates = candidates;
        self.previous_objective = self.objective;
        self.objective = objective;
        self.discarded = discarded;
    }
}

enum StepOutcome {
    Accepted {
        candidates: PointSet,
        objective: f64,
        discarded: usize,
        halvings: u32,
    },
    Diverged,
    Stalled,
}

#[derive(Default)]
struct Counters {
    objective_evals: usize,
    gradient_evals: usize,
}

/// `|new - old| / (|new| + |old|)`, 0 when both are zero.
fn relative_change(new: f64, old: f64) -> f64 {
    let scale = new.abs() + old.abs();
    if scale == 0.0 {
        0.0
    } else {
        (new - old).abs() / scale
    }
}

/// Gradient descent with a finite-difference gradient, backtracking step
/// halving and optimistic step growth.
pub struct GradientDescent {
    max_iter: u32,
    epsilon: f64,
    difference_step: f64,
    initial_step: f64,
    max_halvings: u32,
    step_growth: f64,
    step_shrink: f64,
}

impl GradientDescent {
    pub fn new(max_iter: u32, epsilon: f64) -> Self {
        let defaults = PlacementConfig::default();
        Self {
            max_iter,
            epsilon,
            difference_step: defaults.difference_step,
            initial_step: defaults.initial_step,
            max_halvings: defaults.max_halvings,
            step_growth: defaults.step_growth,
            step_shrink: defaults.step_shrink,
        }
    }

    pub fn from_config(config: &PlacementConfig) -> Self {
        Self {
            max_iter: config.max_iterations,
            epsilon: config.epsilon,
            difference_step: config.difference_step,
            initial_step: config.initial_step,
            max_halvings: config.max_halvings,
            step_growth: config.step_growth,
            step_shrink: config.step_shrink,
        }
    }

    pub fn with_difference_step(mut self, h: f64) -> Self {
        self.difference_step = h;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn with_max_halvings(mut self, max_halvings: u32) -> Self {
        self.max_halvings = max_halvings;
        self
    }

    /// Try `candidates - step * gradient`, halving the step until the
    /// objective does not increase.
    fn backtrack(
        &self,
        problem: &dyn Problem,
        state: &mut OptimizationState,
        gradient: &GradientVector,
        counters: &mut Counters,
    ) -> StepOutcome {
        let mut halvings = 0;
        loop {
            let trial = state.tentative(gradient);
            let eval = problem.evaluate(&trial);
            counters.objective_evals += 1;

            if eval.value.is_nan() {
                return StepOutcome::Diverged;
            }

            if eval.value <= state.objective {
                if halvings == 0 {
                    state.step *= self.step_growth;
                }
                return StepOutcome::Accepted {
                    candidates: trial,
                    objective: eval.value,
                    discarded: eval.discarded,
                    halvings,
                };
            }

            if halvings == self.max_halvings {
                return StepOutcome::Stalled;
            }
            state.step *= self.step_shrink;
            halvings += 1;
        }
    }

    fn finish(
        &self,
        state: OptimizationState,
        status: Termination,
        iterations: u32,
        trace: Vec<f64>,
        counters: Counters,
        started: Instant,
    ) -> SolverResult {
        let result = SolverResult {
            status,
            objective: state.objective,
            candidates: state.candidates,
            iterations,
            trace,
            step: state.step,
            objective_evals: counters.objective_evals,
            gradient_evals: counters.gradient_evals,
            discarded_terms: state.discarded,
            elapsed: started.elapsed(),
        };

        match status {
            Termination::Diverged | Termination::Stalled => warn!(
                status = status.as_str(),
                iterations,
                objective = result.objective,
                step = result.step,
                "descent stopped early"
            ),
            _ => info!(
                status = status.as_str(),
                iterations,
                objective = result.objective,
                elapsed_ms = result.elapsed.as_secs_f64() * 1e3,
                "descent finished"
            ),
        }
        result
    }
}

impl Solver for GradientDescent {
    fn name(&self) -> &str {
        "GradientDescent"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult> {
        let started = Instant::now();
        let m = problem.num_candidates();
        if m == 0 {
            return Err(PlacementError::NoCandidates);
        }

        let estimator = GradientEstimator::new(self.difference_step);
        let mut counters = Counters::default();

        let initial = problem.initial_candidates().clone();
        let first = problem.evaluate(&initial);
        counters.objective_evals += 1;
        if first.discarded > 0 {
            warn!(discarded = first.discarded, "initial objective dropped non-finite terms");
        }

        if !first.value.is_finite() {
            warn!(objective = first.value, "starting objective is not finite");
            return Err(PlacementError::NonFiniteObjective { value: first.value });
        }

        let mut state =
            OptimizationState::new(initial, first.value, first.discarded, self.initial_step);
        let mut trace = vec![state.objective];

        let mut status = Termination::Exhausted;
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;

            let direction = estimator.estimate_from(problem, &state.candidates, state.objective);
            counters.objective_evals += 2 * m;
            counters.gradient_evals += 1;

            let gradient = match direction {
                Direction::Descent(gradient) => gradient,
                Direction::Flat => {
                    debug!(iteration = iterations, "gradient vanished");
                    status = Termination::Converged;
                    break;
                }
                Direction::NonFinite => {
                    status = Termination::Diverged;
                    break;
                }
            };

            let (candidates, objective, discarded, halvings) =
                match self.backtrack(problem, &mut state, &gradient, &mut counters) {
                    StepOutcome::Accepted {
                        candidates,
                        objective,
                        discarded,
                        halvings,
                    } => (candidates, objective, discarded, halvings),
                    StepOutcome::Diverged => {
                        status = Termination::Diverged;
                        break;
                    }
                    StepOutcome::Stalled => {
                        status = Termination::Stalled;
                        break;
                    }
                };

            let accuracy = relative_change(objective, state.objective);
            debug!(
                iteration = iterations,
                objective,
                accuracy,
                step = state.step,
                halvings,
                "descent step"
            );

            if accuracy < self.epsilon {
                status = Termination::Converged;
                break;
            }

            state.commit(candidates, objective, discarded);
            trace.push(state.objective);
            callback.on_iteration(iterations, &state.candidates, state.objective, state.step);
        }

        debug!(
            previous_objective = state.previous_objective,
            objective = state.objective,
            "last committed objectives"
        );
        let result = self.finish(state, status, iterations, trace, counters, started);
        callback.on_finish(&result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AccumulationPolicy, Domain, Point};
    use crate::optimization::callback::{NoopCallback, SummaryCallback};
    use crate::optimization::problem::{Evaluation, PlacementProblem};

    /// Objective where only the +x finite-difference probe looks better than
    /// the start, so every real step is rejected.
    struct UphillProblem {
        initial: PointSet,
    }

    impl Problem for UphillProblem {
        fn evaluate(&self, candidates: &PointSet) -> Evaluation {
            let p = candidates.point(0);
            let start = self.initial.point(0);
            let value = if p == start {
                1.0
            } else if p.x == start.x + 0.01 && p.y == start.y {
                0.0
            } else {
                2.0
            };
            Evaluation {
                value,
                discarded: 0,
            }
        }

        fn num_candidates(&self) -> usize {
            self.initial.len()
        }

        fn initial_candidates(&self) -> &PointSet {
            &self.initial
        }
    }

    /// Slopes down toward +x but stops being a number past `|x| > 0.5`.
    struct NanCliffProblem {
        initial: PointSet,
    }

    impl Problem for NanCliffProblem {
        fn evaluate(&self, candidates: &PointSet) -> Evaluation {
            let p = candidates.point(0);
            let value = if p.x.abs() > 0.5 || p.y.abs() > 0.5 {
                f64::NAN
            } else {
                1.0 - p.x
            };
            Evaluation {
                value,
                discarded: 0,
            }
        }

        fn num_candidates(&self) -> usize {
            self.initial.len()
        }

        fn initial_candidates(&self) -> &PointSet {
            &self.initial
        }
    }

    #[test]
    fn test_relative_change() {
        assert_eq!(relative_change(0.0, 0.0), 0.0);
        assert_eq!(relative_change(1.0, 1.0), 0.0);
        assert_eq!(relative_change(1.0, 3.0), 0.5);
    }

    #[test]
    fn test_objective_never_increases() {
        let existing = PointSet::from_points([
            Point::new(0.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(-4.0, 2.0),
        ]);
        let candidates = PointSet::from_points([
            Point::new(0.5, 0.5),
            Point::new(2.0, -1.0),
            Point::new(-3.0, 2.5),
        ]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let mut solver = GradientDescent::new(500, 1e-12);
        let result = solver.solve(&problem, &mut NoopCallback).unwrap();

        assert!(result.trace.iter().all(|v| v.is_finite()));
        for pair in result.trace.windows(2) {
            assert!(pair[1] <= pair[0], "objective rose from {} to {}", pair[0], pair[1]);
        }
        assert!(result.objective < result.trace[0]);
        assert_eq!(result.trace.last().copied(), Some(result.objective));
        assert_eq!(result.gradient_evals, result.iterations as usize);
    }

    #[test]
    fn test_iteration_budget() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::from_points([Point::new(0.5, 0.0), Point::new(-0.5, 0.3)]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let mut solver = GradientDescent::new(3, 1e-300);
        let result = solver.solve(&problem, &mut NoopCallback).unwrap();

        assert_eq!(result.status, Termination::Exhausted);
        assert_eq!(result.iterations, 3);
        assert_eq!(result.trace.len(), 4);
    }

    #[test]
    fn test_halving_cap_stalls() {
        let problem = UphillProblem {
            initial: PointSet::from_points([Point::new(0.0, 0.0)]),
        };

        let mut solver = GradientDescent::new(100, 1e-15).with_max_halvings(5);
        let result = solver.solve(&problem, &mut NoopCallback).unwrap();

        assert_eq!(result.status, Termination::Stalled);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.objective, 1.0);
        assert_eq!(result.candidates, problem.initial);
        assert_eq!(result.step, 1.0 / 32.0);
        // initial + 2 gradient probes + 6 tentative steps
        assert_eq!(result.objective_evals, 1 + 2 + 6);
    }

    #[test]
    fn test_step_grows_without_backtracking() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::from_points([Point::new(0.5, 0.0)]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let mut solver = GradientDescent::new(1, 1e-300).with_initial_step(0.5);
        let result = solver.solve(&problem, &mut NoopCallback).unwrap();

        assert_eq!(result.status, Termination::Exhausted);
        assert!((result.step - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_nan_step_keeps_last_committed_state() {
        let problem = NanCliffProblem {
            initial: PointSet::from_points([Point::new(0.0, 0.0)]),
        };

        let mut callback = SummaryCallback::new(false);
        let result = GradientDescent::new(100, 1e-15)
            .solve(&problem, &mut callback)
            .unwrap();

        // the first full step lands at x = 1, where the objective is NaN
        assert_eq!(result.status, Termination::Diverged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.objective, 1.0);
        assert_eq!(result.candidates, problem.initial);
        assert_eq!(result.trace, vec![1.0]);
        assert!(callback.history().is_empty());
        // initial + 2 gradient probes + 1 tentative step
        assert_eq!(result.objective_evals, 4);
    }

    #[test]
    fn test_non_finite_start_is_rejected() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::from_points([Point::new(1000.0, 1000.0)]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default())
            .with_accumulation(AccumulationPolicy::Strict);

        let err = GradientDescent::new(10, 1e-15)
            .solve(&problem, &mut NoopCallback)
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::NonFiniteObjective { value } if value == f64::INFINITY
        ));
    }
}
