pub mod callback;
pub mod gradient;
pub mod kernel;
pub mod problem;
pub mod solvers;

pub use callback::{IterationRecord, NoopCallback, SummaryCallback};
pub use gradient::{Direction, GradientEstimator, GradientVector};
pub use problem::{Accumulator, Evaluation, PlacementProblem};
pub use solvers::{
    GradientDescent, OptimizationCallback, Problem, Solver, SolverResult, Termination,
};
