//! Forward finite-difference gradient of the placement objective.
//!
//! Every candidate coordinate is perturbed on its own, so the estimate is a
//! set of independent partial derivatives with no cross terms. The partials
//! are normalized jointly into a unit descent direction.

use super::solvers::traits::Problem;
use crate::core::PointSet;
use rayon::prelude::*;

/// Per-candidate `(dx, dy)` components of a gradient.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientVector {
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
}

impl GradientVector {
    pub fn len(&self) -> usize {
        self.dx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dx.is_empty()
    }

    /// Euclidean norm over all `2m` components.
    pub fn norm(&self) -> f64 {
        self.dx
            .par_iter()
            .zip(self.dy.par_iter())
            .map(|(gx, gy)| gx * gx + gy * gy)
            .sum::<f64>()
            .sqrt()
    }
}

/// Outcome of a gradient estimate.
#[derive(Clone, Debug, PartialEq)]
pub enum Direction {
    /// Unit-norm descent direction.
    Descent(GradientVector),
    /// Every partial is exactly zero.
    Flat,
    /// A partial or the norm is NaN or infinite.
    NonFinite,
}

#[derive(Clone, Copy, Debug)]
pub struct GradientEstimator {
    h: f64,
}

impl GradientEstimator {
    pub fn new(h: f64) -> Self {
        Self { h }
    }

    /// Estimate the descent direction at `candidates`.
    pub fn estimate(&self, problem: &dyn Problem, candidates: &PointSet) -> Direction {
        let base = problem.objective(candidates);
        self.estimate_from(problem, candidates, base)
    }

    /// Same as [`estimate`](Self::estimate) with the unperturbed objective
    /// already known.
    pub fn estimate_from(
        &self,
        problem: &dyn Problem,
        candidates: &PointSet,
        base: f64,
    ) -> Direction {
        normalize(self.partials(problem, candidates, base))
    }

    /// Raw forward differences `(f(c + h e_k) - f(c)) / h` for every coordinate.
    ///
    /// Candidates are processed in parallel; each worker perturbs its own
    /// scratch copy and restores the coordinate before moving on.
    pub fn partials(
        &self,
        problem: &dyn Problem,
        candidates: &PointSet,
        base: f64,
    ) -> GradientVector {
        let h = self.h;
        let (dx, dy) = (0..candidates.len())
            .into_par_iter()
            .map_init(
                || candidates.clone(),
                |scratch, i| {
                    let x = scratch.xs()[i];
                    scratch.xs_mut()[i] = x + h;
                    let fx = problem.objective(scratch);
                    scratch.xs_mut()[i] = x;

                    let y = scratch.ys()[i];
                    scratch.ys_mut()[i] = y + h;
                    let fy = problem.objective(scratch);
                    scratch.ys_mut()[i] = y;

                    ((fx - base) / h, (fy - base) / h)
                },
            )
            .unzip();

        GradientVector { dx, dy }
    }
}

fn normalize(mut grad: GradientVector) -> Direction {
    let norm = grad.norm();
    if !norm.is_finite() {
        return Direction::NonFinite;
    }
    if norm == 0.0 {
        return Direction::Flat;
    }

    grad.dx
        .par_iter_mut()
        .chain(grad.dy.par_iter_mut())
        .for_each(|g| *g /= norm);
    Direction::Descent(grad)
}
