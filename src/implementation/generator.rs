// Copyright (c) 2024 The Parcoord Authors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Cube generators (`spec.md` §4.8): bounded lazy sequences of consistent
//! partial assignments, used by the EPS and partition strategies to carve up
//! the search space. All three generators here enumerate over an explicit,
//! caller-supplied list of `(variable, domain)` pairs -- the core has no way
//! to ask a [`crate::abstraction::solver::ConstraintSolver`] for a variable's
//! domain (that is outside the narrow solver interface), so a strategy reads
//! the domains it needs from wherever it gets them (the partition strategy
//! from the cutset, a host embedding from its own model) and hands them to
//! the generator at construction.

use std::cmp::Ordering;

use num_bigint::BigInt;

use crate::abstraction::checker::ConsistencyChecker;
use crate::abstraction::generator::CubeGenerator;
use crate::common::{Assumption, Cube, VariableId};

/// One variable and the ordered list of values (or, for the interval
/// generator, domain buckets) a generator enumerates it over.
pub type Domain = (VariableId, Vec<BigInt>);

/// One enumerable "move" at a given depth of the search tree: the group of
/// assumptions that commits a single variable to a single value or bucket.
/// A value choice is `vec![Assumption::eq(var, v)]`; an interval choice
/// (see [`LexicographicIntervalCubeGenerator`]) is the set of `not-equal`
/// assumptions excluding every value of the domain outside the bucket --
/// `spec.md` §3 only ever gives assumptions an `equal`/`not-equal` relation,
/// so a bucket is expressed as the conjunction of exclusions rather than as
/// a dedicated range relation.
type Choice = Vec<Assumption>;

/// Shared odometer-style enumeration engine: a standard "mixed radix
/// counter" over `levels[i]`, one digit per variable. `next_cube` advances
/// the counter lexicographically, building and checking one candidate cube
/// per call until it finds one both checkers accept or the space (or the
/// configured budget) is exhausted.
struct Odometer<C: ConsistencyChecker> {
    levels: Vec<Vec<Choice>>,
    checker: C,
    max_cubes: usize,
    emitted: usize,
    counters: Vec<usize>,
    exhausted: bool,
}

impl<C: ConsistencyChecker> Odometer<C> {
    fn new(levels: Vec<Vec<Choice>>, checker: C, max_cubes: usize) -> Self {
        let exhausted = levels.iter().any(|choices| choices.is_empty());
        let counters = vec![0; levels.len()];
        Odometer { levels, checker, max_cubes, emitted: 0, exhausted, counters }
    }

    /// Builds the cube implied by the current counter state.
    fn build_cube(&self) -> Cube {
        let mut cube = Cube::empty();
        for (level, &choice_index) in self.levels.iter().zip(self.counters.iter()) {
            for assumption in &level[choice_index] {
                cube.push(assumption.clone());
            }
        }
        cube
    }

    /// Advances the counters to the next combination, lexicographically;
    /// sets `exhausted` once every combination has been tried.
    fn advance(&mut self) {
        if self.counters.is_empty() {
            self.exhausted = true;
            return;
        }
        for i in (0..self.counters.len()).rev() {
            self.counters[i] += 1;
            if self.counters[i] < self.levels[i].len() {
                return;
            }
            self.counters[i] = 0;
        }
        self.exhausted = true;
    }

    /// Runs the partial check on every variable-aligned prefix of `cube`,
    /// then the final check on the whole cube.
    fn passes(&self, cube: &Cube) -> bool {
        let mut prefix = Cube::empty();
        for assumption in cube.assumptions() {
            prefix.push(assumption.clone());
            if !self.checker.check_partial(&prefix) {
                return false;
            }
        }
        self.checker.check_final(cube)
    }

    fn next(&mut self) -> Option<Cube> {
        if self.emitted >= self.max_cubes {
            return None;
        }
        if self.levels.is_empty() {
            // Nothing to enumerate over (e.g. an empty cutset): the single
            // trivial cube stands for "no restriction", emitted exactly once.
            if self.exhausted {
                return None;
            }
            self.exhausted = true;
            return Some(Cube::empty());
        }
        while !self.exhausted {
            let cube = self.build_cube();
            self.advance();
            if self.passes(&cube) {
                self.emitted += 1;
                return Some(cube);
            }
        }
        None
    }
}

/// Enumerates variables in a fixed order, picking each domain value in turn
/// (`spec.md` §4.8's lexicographic generator). Stops once `max_cubes` cubes
/// have been emitted even if the domain is not exhausted.
pub struct LexicographicCubeGenerator<C: ConsistencyChecker> {
    odometer: Odometer<C>,
}

impl<C: ConsistencyChecker> LexicographicCubeGenerator<C> {
    pub fn new(domains: Vec<Domain>, checker: C, max_cubes: usize) -> Self {
        let levels = domains
            .into_iter()
            .map(|(variable, values)| values.into_iter().map(|v| vec![Assumption::eq(variable, v)]).collect())
            .collect();
        LexicographicCubeGenerator { odometer: Odometer::new(levels, checker, max_cubes) }
    }
}

impl<C: ConsistencyChecker> CubeGenerator for LexicographicCubeGenerator<C> {
    fn next_cube(&mut self) -> Option<Cube> {
        self.odometer.next()
    }
}

/// Like [`LexicographicCubeGenerator`], but a variable whose domain is
/// larger than `interval_budget` is enumerated in buckets of
/// `ceil(domain.len() / interval_budget)` consecutive values instead of one
/// cube per value (`spec.md` §4.8's "domain intervals `[v, v+stride)`"),
/// expressed as the conjunction excluding every value outside the bucket.
pub struct LexicographicIntervalCubeGenerator<C: ConsistencyChecker> {
    odometer: Odometer<C>,
}

impl<C: ConsistencyChecker> LexicographicIntervalCubeGenerator<C> {
    pub fn new(domains: Vec<Domain>, interval_budget: usize, checker: C, max_cubes: usize) -> Self {
        let levels = domains.into_iter().map(|(variable, values)| bucket_choices(variable, values, interval_budget)).collect();
        LexicographicIntervalCubeGenerator { odometer: Odometer::new(levels, checker, max_cubes) }
    }
}

impl<C: ConsistencyChecker> CubeGenerator for LexicographicIntervalCubeGenerator<C> {
    fn next_cube(&mut self) -> Option<Cube> {
        self.odometer.next()
    }
}

fn bucket_choices(variable: VariableId, values: Vec<BigInt>, interval_budget: usize) -> Vec<Choice> {
    if interval_budget == 0 || values.len() <= interval_budget {
        return values.into_iter().map(|v| vec![Assumption::eq(variable, v)]).collect();
    }
    let stride = values.len().div_ceil(interval_budget);
    values
        .chunks(stride)
        .map(|bucket| {
            values
                .iter()
                .filter(|v| !bucket.contains(v))
                .map(|excluded| Assumption::ne(variable, excluded.clone()))
                .collect()
        })
        .collect()
}

/// Scores a partial cube during [`CartesianProductRefinementGenerator`]'s
/// best-first refinement; higher scores are explored first.
pub trait CubeScorer: Send + Sync {
    fn score(&self, cube: &Cube, domains: &[Domain]) -> i64;
}

/// The concrete score `spec.md` §4.8 names: the negated product of the
/// still-undecided variables' domain sizes, so the partial cube closest to
/// fully pinning down the smallest remaining search space is refined first.
pub struct RemainingDomainProduct;

impl CubeScorer for RemainingDomainProduct {
    fn score(&self, cube: &Cube, domains: &[Domain]) -> i64 {
        let decided = cube.assumptions().len();
        domains.get(decided..).map(|rest| -rest.iter().map(|(_, values)| values.len() as i64).product::<i64>()).unwrap_or(0)
    }
}

struct ScoredCube {
    cube: Cube,
    score: i64,
}

struct ByScore;

impl compare::Compare<ScoredCube> for ByScore {
    fn compare(&self, l: &ScoredCube, r: &ScoredCube) -> Ordering {
        l.score.cmp(&r.score)
    }
}

/// A priority queue of `(partial-cube, score)` pairs (`spec.md` §4.8): each
/// step pops the highest-scored partial cube and extends it by one more
/// assumption (the next undecided variable's next domain value), reinserting
/// the extended cube, or emitting it once it reaches full length.
pub struct CartesianProductRefinementGenerator<S: CubeScorer, C: ConsistencyChecker> {
    domains: Vec<Domain>,
    scorer: S,
    checker: C,
    max_cubes: usize,
    emitted: usize,
    heap: binary_heap_plus::BinaryHeap<ScoredCube, ByScore>,
}

impl<S: CubeScorer, C: ConsistencyChecker> CartesianProductRefinementGenerator<S, C> {
    pub fn new(domains: Vec<Domain>, scorer: S, checker: C, max_cubes: usize) -> Self {
        let root = Cube::empty();
        let score = scorer.score(&root, &domains);
        let heap = binary_heap_plus::BinaryHeap::from_vec_cmp(vec![ScoredCube { cube: root, score }], ByScore);
        CartesianProductRefinementGenerator { domains, scorer, checker, max_cubes, emitted: 0, heap }
    }
}

impl<S: CubeScorer, C: ConsistencyChecker> CubeGenerator for CartesianProductRefinementGenerator<S, C> {
    fn next_cube(&mut self) -> Option<Cube> {
        if self.emitted >= self.max_cubes {
            return None;
        }
        while let Some(ScoredCube { cube, .. }) = self.heap.pop() {
            let depth = cube.assumptions().len();
            if depth == self.domains.len() {
                if self.checker.check_final(&cube) {
                    self.emitted += 1;
                    return Some(cube);
                }
                continue;
            }
            if !self.checker.check_partial(&cube) {
                continue;
            }
            let (variable, values) = &self.domains[depth];
            for value in values {
                let mut child = cube.clone();
                child.push(Assumption::eq(*variable, value.clone()));
                let score = self.scorer.score(&child, &self.domains);
                self.heap.push(ScoredCube { cube: child, score });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::checker::NullChecker;

    fn domains() -> Vec<Domain> {
        vec![(VariableId(0), vec![BigInt::from(0), BigInt::from(1)]), (VariableId(1), vec![BigInt::from(0), BigInt::from(1)])]
    }

    #[test]
    fn lexicographic_enumerates_every_combination_exactly_once() {
        let mut generator = LexicographicCubeGenerator::new(domains(), NullChecker, 10);
        let mut seen = Vec::new();
        while let Some(cube) = generator.next_cube() {
            seen.push(cube);
        }
        assert_eq!(seen.len(), 4);
        for cube in &seen {
            let matches = seen.iter().filter(|c| *c == cube).count();
            assert_eq!(matches, 1);
        }
    }

    #[test]
    fn lexicographic_stops_at_the_configured_budget() {
        let mut generator = LexicographicCubeGenerator::new(domains(), NullChecker, 2);
        assert!(generator.next_cube().is_some());
        assert!(generator.next_cube().is_some());
        assert!(generator.next_cube().is_none());
    }

    #[test]
    fn lexicographic_with_empty_domains_yields_one_empty_cube() {
        let mut generator = LexicographicCubeGenerator::<NullChecker>::new(vec![], NullChecker, 10);
        let cube = generator.next_cube().expect("one trivial cube");
        assert!(cube.is_empty());
        assert!(generator.next_cube().is_none());
    }

    #[test]
    fn interval_generator_buckets_a_domain_larger_than_its_budget() {
        let large_domain = vec![(VariableId(0), (0..20).map(BigInt::from).collect::<Vec<_>>())];
        let mut generator = LexicographicIntervalCubeGenerator::new(large_domain, 4, NullChecker, 100);
        let mut count = 0;
        while generator.next_cube().is_some() {
            count += 1;
        }
        // stride = ceil(20 / 4) == 5, so 20 values split into 4 buckets of 5.
        assert_eq!(count, 4);
    }

    #[test]
    fn cartesian_product_refinement_emits_full_length_cubes() {
        let mut generator = CartesianProductRefinementGenerator::new(domains(), RemainingDomainProduct, NullChecker, 10);
        let mut seen = 0;
        while let Some(cube) = generator.next_cube() {
            assert_eq!(cube.assumptions().len(), 2);
            seen += 1;
        }
        assert_eq!(seen, 4);
    }
}
