use super::error::{PlacementError, Result};
use super::types::{Domain, PlacementConfig, PointSet};

fn require(name: &'static str, value: f64, ok: bool, reason: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(PlacementError::InvalidConfig {
            name,
            value,
            reason,
        })
    }
}

/// Validate the numeric knobs of a run.
pub fn validate_config(config: &PlacementConfig) -> Result<()> {
    let h = config.difference_step;
    require("difference_step", h, h.is_finite() && h > 0.0, "must be positive")?;

    let step = config.initial_step;
    require("initial_step", step, step.is_finite() && step > 0.0, "must be positive")?;

    let eps = config.epsilon;
    require("epsilon", eps, eps.is_finite() && eps > 0.0, "must be positive")?;

    require(
        "max_iterations",
        config.max_iterations as f64,
        config.max_iterations > 0,
        "must be at least 1",
    )?;
    require(
        "max_halvings",
        config.max_halvings as f64,
        config.max_halvings > 0,
        "must be at least 1",
    )?;

    let growth = config.step_growth;
    require("step_growth", growth, growth.is_finite() && growth >= 1.0, "must be >= 1")?;

    let shrink = config.step_shrink;
    require("step_shrink", shrink, shrink > 0.0 && shrink < 1.0, "must lie in (0, 1)")?;

    if let Some(threads) = config.threads {
        require("threads", threads as f64, threads > 0, "must be at least 1")?;
    }

    Ok(())
}

/// Reject empty or inverted rectangles and non-finite bounds.
pub fn validate_domain(domain: &Domain) -> Result<()> {
    let bounds = [domain.min_x, domain.max_x, domain.min_y, domain.max_y];
    if bounds.iter().all(|b| b.is_finite())
        && domain.min_x <= domain.max_x
        && domain.min_y <= domain.max_y
    {
        return Ok(());
    }
    Err(PlacementError::InvalidDomain {
        min_x: domain.min_x,
        max_x: domain.max_x,
        min_y: domain.min_y,
        max_y: domain.max_y,
    })
}

fn validate_points(set: &'static str, points: &PointSet) -> Result<()> {
    match points.find_non_finite() {
        Some(index) => Err(PlacementError::NonFiniteCoordinate { set, index }),
        None => Ok(()),
    }
}

/// Validate everything a run consumes before the descent loop starts.
///
/// Checks the point sets first, then the domain, then the knobs, so the
/// first reported problem is the one closest to the caller's data.
pub fn validate_inputs(
    existing: &PointSet,
    candidates: &PointSet,
    domain: &Domain,
    config: &PlacementConfig,
) -> Result<()> {
    if existing.is_empty() {
        return Err(PlacementError::NoExistingPoints);
    }
    if candidates.is_empty() {
        return Err(PlacementError::NoCandidates);
    }
    validate_points("existing", existing)?;
    validate_points("candidate", candidates)?;
    validate_domain(domain)?;
    validate_config(config)
}
