use thiserror::Error;

/// Errors surfaced by the placement library.
///
/// Numerical trouble inside a run is not reported here: non-finite cost
/// terms are absorbed by the evaluator and divergence ends the run with
/// [`Termination::Diverged`](crate::Termination::Diverged). Everything in this
/// enum is caught before the descent loop starts, or comes from the
/// peripheral dataset and report helpers. A starting configuration whose
/// objective is not finite has no valid state to fall back to, so it is an
/// error rather than a diverged run.
#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("no existing points given")]
    NoExistingPoints,

    #[error("no candidate points given")]
    NoCandidates,

    #[error("coordinate arrays differ in length (x: {xs}, y: {ys})")]
    MismatchedCoordinates { xs: usize, ys: usize },

    #[error("{set} point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { set: &'static str, index: usize },

    #[error("invalid domain [{min_x}, {max_x}] x [{min_y}, {max_y}]")]
    InvalidDomain {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    },

    #[error("invalid configuration: {name} = {value} ({reason})")]
    InvalidConfig {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("objective at the starting configuration is not finite ({value})")]
    NonFiniteObjective { value: f64 },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("dataset I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("dataset truncated: expected {expected} numbers, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
