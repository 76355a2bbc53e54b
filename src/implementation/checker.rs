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

//! `Null`, `Partial` and `Final` consistency checkers (`spec.md` §4.10).
//!
//! `Partial` and `Final` each hold their own auxiliary solver instance used
//! only for propagation queries, never shared with a worker's own solver --
//! the generator thread and a worker's solve thread can otherwise run the
//! same backend concurrently and corrupt each other's state.

use parking_lot::Mutex;

use crate::abstraction::checker::ConsistencyChecker;
use crate::abstraction::solver::ConstraintSolver;
use crate::common::{Cube, SolveTermination};

/// Accepts every cube without consulting a solver.
pub struct NullChecker;

impl ConsistencyChecker for NullChecker {
    fn check_partial(&self, _cube: &Cube) -> bool {
        true
    }

    fn check_final(&self, _cube: &Cube) -> bool {
        true
    }
}

fn is_consistent<S: ConstraintSolver>(oracle: &Mutex<S>, cube: &Cube) -> bool {
    let mut oracle = oracle.lock();
    oracle.reset();
    let noop = &|_bound| {};
    !matches!(oracle.solve_assumptions(cube, noop), SolveTermination::Unsatisfiable)
}

/// Prunes a prefix as soon as the oracle proves it inconsistent; accepts
/// every complete cube without a final re-check.
pub struct PartialChecker<S: ConstraintSolver> {
    oracle: Mutex<S>,
}

impl<S: ConstraintSolver> PartialChecker<S> {
    pub fn new(oracle: S) -> Self {
        PartialChecker { oracle: Mutex::new(oracle) }
    }
}

impl<S: ConstraintSolver> ConsistencyChecker for PartialChecker<S> {
    fn check_partial(&self, cube: &Cube) -> bool {
        is_consistent(&self.oracle, cube)
    }

    fn check_final(&self, _cube: &Cube) -> bool {
        true
    }
}

/// Accepts every prefix without a check; only a complete cube is sent to the
/// oracle, and only fully consistent cubes are emitted.
pub struct FinalChecker<S: ConstraintSolver> {
    oracle: Mutex<S>,
}

impl<S: ConstraintSolver> FinalChecker<S> {
    pub fn new(oracle: S) -> Self {
        FinalChecker { oracle: Mutex::new(oracle) }
    }
}

impl<S: ConstraintSolver> ConsistencyChecker for FinalChecker<S> {
    fn check_partial(&self, _cube: &Cube) -> bool {
        true
    }

    fn check_final(&self, cube: &Cube) -> bool {
        is_consistent(&self.oracle, cube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Cube, VariableId};
    use crate::implementation::solver::dummy::BruteForceSolver;

    fn oracle() -> BruteForceSolver {
        BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1)
    }

    #[test]
    fn null_checker_accepts_everything() {
        let checker = NullChecker;
        let cube = Cube::empty();
        assert!(checker.check_partial(&cube));
        assert!(checker.check_final(&cube));
    }

    #[test]
    fn partial_checker_rejects_an_inconsistent_prefix() {
        let checker = PartialChecker::new(oracle());
        let inconsistent = Cube::from(vec![
            crate::common::Assumption::eq(VariableId(0), 0),
            crate::common::Assumption::eq(VariableId(1), 0),
        ]);
        assert!(!checker.check_partial(&inconsistent));
        assert!(checker.check_final(&inconsistent));
    }

    #[test]
    fn final_checker_accepts_a_consistent_full_cube() {
        let checker = FinalChecker::new(oracle());
        let consistent =
            Cube::from(vec![crate::common::Assumption::eq(VariableId(0), 0), crate::common::Assumption::eq(VariableId(1), 1)]);
        assert!(checker.check_partial(&consistent));
        assert!(checker.check_final(&consistent));
    }
}
