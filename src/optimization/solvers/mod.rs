mod descent;
pub mod traits;

pub use descent::GradientDescent;
pub use traits::{OptimizationCallback, Problem, Solver, SolverResult, Termination};
