//! Pure cost terms of the placement objective.

use crate::core::{Domain, Point};

/// Interaction cost between two facilities, `exp(-0.2 * d^2)`.
///
/// Equals 1 for coincident points and decays towards 0 with distance.
#[inline]
pub fn pair_cost(a: &Point, b: &Point) -> f64 {
    (-0.2 * a.squared_distance(b)).exp()
}

/// Projection of `p` onto the closest side line of `domain`.
///
/// Sides are compared by perpendicular distance in the order bottom, top,
/// right, left; the first minimum wins.
pub fn nearest_boundary_point(p: &Point, domain: &Domain) -> Point {
    let sides = [
        ((p.y - domain.min_y).abs(), Point::new(p.x, domain.min_y)),
        ((p.y - domain.max_y).abs(), Point::new(p.x, domain.max_y)),
        ((p.x - domain.max_x).abs(), Point::new(domain.max_x, p.y)),
        ((p.x - domain.min_x).abs(), Point::new(domain.min_x, p.y)),
    ];

    let mut best = sides[0];
    for side in &sides[1..] {
        if side.0 < best.0 {
            best = *side;
        }
    }
    best.1
}

/// Soft containment penalty: 0 inside (boundary inclusive), otherwise
/// `exp(0.25 * d^2) - 1` against the nearest boundary point.
///
/// Far outside the domain this overflows to infinity; the evaluator's
/// accumulation policy decides what happens to such terms.
pub fn boundary_penalty(p: &Point, domain: &Domain) -> f64 {
    if domain.contains(p) {
        return 0.0;
    }
    let nearest = nearest_boundary_point(p, domain);
    (0.25 * p.squared_distance(&nearest)).exp() - 1.0
}
