use super::error::{PlacementError, Result};
use serde::{Deserialize, Serialize};

// ===== GEOMETRY =====

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn squared_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Ordered set of 2-D points stored as two parallel coordinate arrays.
///
/// Index `i` names the same logical facility for the lifetime of the set;
/// nothing else about the order is meaningful.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PointSet {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl PointSet {
    /// Build a set from parallel coordinate arrays.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(PlacementError::MismatchedCoordinates {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        Ok(Self { xs, ys })
    }

    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let (xs, ys) = points.into_iter().map(|p| (p.x, p.y)).unzip();
        Self { xs, ys }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    #[inline]
    pub fn point(&self, i: usize) -> Point {
        Point::new(self.xs[i], self.ys[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.xs
            .iter()
            .zip(self.ys.iter())
            .map(|(&x, &y)| Point::new(x, y))
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub(crate) fn xs_mut(&mut self) -> &mut [f64] {
        &mut self.xs
    }

    pub(crate) fn ys_mut(&mut self) -> &mut [f64] {
        &mut self.ys
    }

    /// Index of the first point with a NaN or infinite coordinate.
    pub fn find_non_finite(&self) -> Option<usize> {
        self.iter().position(|p| !p.is_finite())
    }

    pub fn into_coords(self) -> (Vec<f64>, Vec<f64>) {
        (self.xs, self.ys)
    }
}

/// Axis-aligned rectangle describing the serviceable region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Domain {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Boundary counts as inside.
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(-10.0, 10.0, -10.0, 10.0)
    }
}

// ===== CONFIGURATION =====

/// How the objective evaluator treats increments that would make a running
/// total NaN or infinite.
///
/// Placement runs always use [`BestEffort`](Self::BestEffort); `Strict` is
/// for inspecting a configuration with
/// [`PlacementProblem`](crate::PlacementProblem) directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPolicy {
    /// Drop the offending increment and keep the previous total.
    #[default]
    BestEffort,
    /// Add every term; non-finite values propagate to the result.
    Strict,
}

/// Numeric knobs for a placement run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Forward-difference step `h` used by the gradient estimator.
    pub difference_step: f64,
    /// Step size the descent starts with.
    pub initial_step: f64,
    /// Relative objective change below which the run is converged.
    pub epsilon: f64,
    pub max_iterations: u32,
    /// Step halvings allowed within one iteration before the run stalls.
    pub max_halvings: u32,
    /// Factor applied to the step after an iteration that needed no backtracking.
    pub step_growth: f64,
    /// Factor applied to the step on each backtracking retry.
    pub step_shrink: f64,
    /// Worker threads; `None` uses one per logical CPU.
    pub threads: Option<usize>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            difference_step: 0.01,
            initial_step: 1.0,
            epsilon: 1e-15,
            max_iterations: 10_000,
            max_halvings: 64,
            step_growth: 1.1,
            step_shrink: 0.5,
            threads: None,
        }
    }
}

impl PlacementConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_difference_step(mut self, h: f64) -> Self {
        self.difference_step = h;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_halvings(mut self, max_halvings: u32) -> Self {
        self.max_halvings = max_halvings;
        self
    }

    /// Configure step adaptation (defaults: growth=1.1, shrink=0.5)
    pub fn with_step_factors(mut self, growth: f64, shrink: f64) -> Self {
        self.step_growth = growth;
        self.step_shrink = shrink;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Worker count the pool will be built with.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}
