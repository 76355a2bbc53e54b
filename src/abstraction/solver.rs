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

//! The sequential constraint-solver interface consumed by the worker
//! dispatcher (`spec.md` §6.2). This is deliberately narrow: a production
//! backend (e.g. a JVM-hosted CP solver reached through JNI, or a native SAT
//! engine) is expected to expose a much richer surface to its own callers,
//! but the parallel-search control plane only ever needs the handful of
//! methods declared here.
//!
//! Two implementations exist in this crate: [`crate::implementation::remote::RemoteSolverProxy`],
//! which forwards every call over a [`crate::abstraction::transport::Transport`]
//! to a worker process, and
//! [`crate::implementation::solver::dummy::BruteForceSolver`], a toy
//! in-memory backend used by the test suite and the embedding demo.

use std::path::Path;

use fxhash::FxHashMap;
use num_bigint::BigInt;

use crate::common::{Bound, Cube, SolveTermination, VariableId};
use crate::error::CoreResult;

/// A callback invoked by [`ConstraintSolver::solve`] (and its `solve_file` /
/// `solve_assumptions` siblings) every time the solver improves on the
/// objective *before* it reaches a terminal outcome. The worker dispatcher
/// turns each call into a `new-bound-found` message (`spec.md` §4.3); a
/// decision-only backend simply never calls it.
pub type BoundCallback<'a> = &'a (dyn Fn(Bound) + Send + Sync);

/// The narrow interface the core relies on from a sequential constraint
/// solver, consumed directly by the worker dispatcher and remotely (via RPC)
/// by the coordinator-side [`crate::implementation::remote::RemoteSolverProxy`].
pub trait ConstraintSolver: Send {
    /// Loads the problem instance from `file`. Called once per worker
    /// lifetime, before the first `solve*` call.
    fn load_instance(&mut self, file: &Path) -> CoreResult<()>;

    /// Clears any decisions/bounds accumulated by a previous `solve*` call.
    /// The loaded instance itself is *not* unloaded.
    fn reset(&mut self);

    fn n_variables(&self) -> usize;
    fn n_constraints(&self) -> usize;
    fn is_optimization(&self) -> bool;
    fn is_minimization(&self) -> bool;
    fn auxiliary_variables(&self) -> Vec<VariableId>;

    /// Worker-local only: a remote proxy must answer this with
    /// [`crate::error::CoreError::Unsupported`], per `spec.md` §7.
    fn variables_mapping(&self) -> CoreResult<FxHashMap<String, VariableId>>;

    fn solve(&mut self, on_bound: BoundCallback<'_>) -> SolveTermination;
    fn solve_file(&mut self, file: &Path, on_bound: BoundCallback<'_>) -> SolveTermination;
    fn solve_assumptions(&mut self, cube: &Cube, on_bound: BoundCallback<'_>) -> SolveTermination;

    /// Asynchronously requests that the current solve stop. Safe to call
    /// concurrently with an in-flight `solve*` call; does not require
    /// exclusive access to the solver.
    fn interrupt(&self);

    fn solution(&self) -> CoreResult<Vec<BigInt>>;
    fn map_solution(&self, exclude_auxiliary: bool) -> CoreResult<FxHashMap<String, BigInt>>;

    fn check_solution(&self) -> CoreResult<bool>;
    fn check_solution_assignment(&self, assignment: &FxHashMap<String, BigInt>) -> CoreResult<bool>;

    fn set_lower_bound(&mut self, bound: Bound);
    fn set_upper_bound(&mut self, bound: Bound);
    fn set_bounds(&mut self, lower: Bound, upper: Bound);
    fn lower_bound(&self) -> Bound;
    fn upper_bound(&self) -> Bound;
    fn current_bound(&self) -> Bound;

    fn set_decision_variables(&mut self, variables: Vec<VariableId>);
    fn set_value_heuristic_static(&mut self, variables: Vec<VariableId>, ordered_values: Vec<BigInt>);

    fn set_timeout(&mut self, seconds: u64);
    fn set_timeout_ms(&mut self, millis: u64);
    fn set_verbosity(&mut self, level: u8);
    fn set_log_file(&mut self, path: &Path);
}
