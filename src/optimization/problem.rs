use super::kernel::{boundary_penalty, pair_cost};
use super::solvers::traits::Problem;
use crate::core::{AccumulationPolicy, Domain, PointSet};
use rayon::prelude::*;

/// Result of one objective evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// Increments dropped by [`AccumulationPolicy::BestEffort`].
    pub discarded: usize,
}

/// Running sum that applies an [`AccumulationPolicy`] to every increment.
#[derive(Clone, Copy, Debug)]
pub struct Accumulator {
    policy: AccumulationPolicy,
    total: f64,
    discarded: usize,
}

impl Accumulator {
    pub fn new(policy: AccumulationPolicy) -> Self {
        Self {
            policy,
            total: 0.0,
            discarded: 0,
        }
    }

    #[inline]
    pub fn add(&mut self, term: f64) {
        let next = self.total + term;
        match self.policy {
            AccumulationPolicy::Strict => self.total = next,
            AccumulationPolicy::BestEffort => {
                if next.is_finite() {
                    self.total = next;
                } else {
                    self.discarded += 1;
                }
            }
        }
    }

    /// Reduction combine: the other partial sum is one more guarded increment.
    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        self.discarded += other.discarded;
        self.add(other.total);
        self
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn finish(self) -> Evaluation {
        Evaluation {
            value: self.total,
            discarded: self.discarded,
        }
    }
}

/// Placement problem: fixed existing facilities, a domain, and the
/// candidates' starting positions.
pub struct PlacementProblem<'a> {
    existing: &'a PointSet,
    initial: &'a PointSet,
    domain: Domain,
    policy: AccumulationPolicy,
}

impl<'a> PlacementProblem<'a> {
    pub fn new(existing: &'a PointSet, initial: &'a PointSet, domain: Domain) -> Self {
        Self {
            existing,
            initial,
            domain,
            policy: AccumulationPolicy::default(),
        }
    }

    pub fn with_accumulation(mut self, policy: AccumulationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cost contributed by candidate `i`: its interaction with every existing
    /// point, with every other candidate, and its boundary penalty.
    fn candidate_cost(&self, candidates: &PointSet, i: usize) -> Accumulator {
        let c = candidates.point(i);
        let mut acc = Accumulator::new(self.policy);

        for e in self.existing.iter() {
            acc.add(pair_cost(&c, &e));
        }

        for (j, other) in candidates.iter().enumerate() {
            if j != i {
                acc.add(pair_cost(&c, &other));
            }
        }

        acc.add(boundary_penalty(&c, &self.domain));
        acc
    }
}

impl Problem for PlacementProblem<'_> {
    fn evaluate(&self, candidates: &PointSet) -> Evaluation {
        let policy = self.policy;
        (0..candidates.len())
            .into_par_iter()
            .map(|i| self.candidate_cost(candidates, i))
            .reduce(|| Accumulator::new(policy), Accumulator::merge)
            .finish()
    }

    fn num_candidates(&self) -> usize {
        self.initial.len()
    }

    fn initial_candidates(&self) -> &PointSet {
        self.initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn random_points(rng: &mut StdRng, count: usize, spread: f64) -> PointSet {
        PointSet::from_points((0..count).map(|_| {
            Point::new(rng.gen_range(-spread..spread), rng.gen_range(-spread..spread))
        }))
    }

    fn brute_force(existing: &PointSet, candidates: &PointSet, domain: &Domain) -> f64 {
        let mut total = 0.0;
        for (i, c) in candidates.iter().enumerate() {
            for e in existing.iter() {
                total += pair_cost(&c, &e);
            }
            for (j, o) in candidates.iter().enumerate() {
                if i != j {
                    total += pair_cost(&c, &o);
                }
            }
            total += boundary_penalty(&c, domain);
        }
        total
    }

    #[test]
    fn test_single_pair() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::from_points([Point::new(3.0, 4.0)]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let eval = problem.evaluate(&candidates);
        assert_relative_eq!(eval.value, (-5.0f64).exp(), epsilon = 1e-15);
        assert_eq!(eval.discarded, 0);
    }

    #[test]
    fn test_candidate_pairs_counted_both_ways() {
        let existing = PointSet::from_points([Point::new(100.0, 100.0)]);
        let candidates = PointSet::from_points([Point::new(1.0, 0.0), Point::new(-1.0, 0.0)]);
        let domain = Domain::new(-1000.0, 1000.0, -1000.0, 1000.0);
        let problem = PlacementProblem::new(&existing, &candidates, domain);

        // existing point is ~140 away, its cost underflows to 0
        let expected = 2.0 * (-0.2f64 * 4.0).exp();
        assert_relative_eq!(problem.objective(&candidates), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_matches_sequential_sum() {
        let mut rng = StdRng::seed_from_u64(7);
        let existing = random_points(&mut rng, 40, 10.0);
        let candidates = random_points(&mut rng, 30, 12.0);
        let domain = Domain::default();
        let problem = PlacementProblem::new(&existing, &candidates, domain);

        assert_relative_eq!(
            problem.objective(&candidates),
            brute_force(&existing, &candidates, &domain),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_invariant_to_candidate_order() {
        let mut rng = StdRng::seed_from_u64(11);
        let existing = random_points(&mut rng, 25, 10.0);
        let candidates = random_points(&mut rng, 25, 11.0);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let mut shuffled: Vec<Point> = candidates.iter().collect();
        shuffled.shuffle(&mut rng);
        let permuted = PointSet::from_points(shuffled);

        assert_relative_eq!(
            problem.objective(&candidates),
            problem.objective(&permuted),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_best_effort_drops_overflowing_penalty() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::from_points([Point::new(1000.0, 1000.0), Point::new(0.0, 1.0)]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let eval = problem.evaluate(&candidates);
        assert!(eval.value.is_finite());
        assert_eq!(eval.discarded, 1);
        // only the in-domain candidate's cost against the origin survives,
        // everything involving the far point underflows to 0
        assert_relative_eq!(eval.value, (-0.2f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_strict_propagates_overflow() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::from_points([Point::new(1000.0, 1000.0)]);
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default())
            .with_accumulation(AccumulationPolicy::Strict);

        let eval = problem.evaluate(&candidates);
        assert!(eval.value.is_infinite());
        assert_eq!(eval.discarded, 0);
    }

    #[test]
    fn test_accumulator_guards_each_increment() {
        let mut acc = Accumulator::new(AccumulationPolicy::BestEffort);
        acc.add(1.5);
        acc.add(f64::NAN);
        acc.add(f64::INFINITY);
        acc.add(2.0);
        assert_eq!(acc.total(), 3.5);

        let mut big = Accumulator::new(AccumulationPolicy::BestEffort);
        big.add(f64::MAX);
        big.add(f64::MAX);
        assert_eq!(big.total(), f64::MAX);

        // the second merge would overflow the combined total
        let eval = acc.merge(big).merge(big).finish();
        assert_eq!(eval.value, f64::MAX);
        assert_eq!(eval.discarded, 5);
    }

    #[test]
    fn test_non_finite_coordinates_are_absorbed() {
        let existing = PointSet::from_points([Point::new(0.0, 0.0)]);
        let candidates = PointSet::new(vec![f64::NAN], vec![0.0]).unwrap();
        let problem = PlacementProblem::new(&existing, &candidates, Domain::default());

        let eval = problem.evaluate(&candidates);
        assert_eq!(eval.value, 0.0);
        assert_eq!(eval.discarded, 2);
    }
}
