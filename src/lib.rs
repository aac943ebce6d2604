//! Continuous facility placement.
//!
//! Candidate facilities are moved on a plane to minimize their interaction
//! cost with a fixed set of existing facilities and with each other, while a
//! soft penalty keeps them inside a rectangular domain. The solver is a
//! gradient descent with forward finite-difference gradients, backtracking
//! step control, and rayon-parallel objective evaluation.
//!
//! ```no_run
//! use siteopt::{Domain, Optimizer, PlacementConfig, Point, PointSet};
//!
//! let existing = PointSet::from_points([Point::new(0.0, 0.0), Point::new(4.0, -2.0)]);
//! let candidates = PointSet::from_points([Point::new(1.0, 1.0)]);
//! let optimizer = Optimizer::new(Domain::default(), PlacementConfig::default());
//! let result = optimizer.optimize(&existing, &candidates)?;
//! println!("{:?} after {} iterations", result.status, result.iterations);
//! # Ok::<(), siteopt::PlacementError>(())
//! ```

mod core;
mod optimization;
mod optimizer;

pub use crate::core::*;
pub use crate::optimization::*;
pub use crate::optimizer::dataset::{self, Dataset, PRESET_SIZES, preset_size};
pub use crate::optimizer::{Optimizer, PlacementResult};
