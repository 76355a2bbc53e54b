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

//! This module defines the most basic data types used throughout the crate:
//! variables, assumptions, cubes, bounds, worker descriptors and solutions.
//! These are the types a client embedding this crate is going to work with
//! directly, regardless of which parallel strategy is chosen.

use std::fmt;

use fxhash::FxHashMap;
use num_bigint::BigInt;
use num_traits::{One, Zero};

// ----------------------------------------------------------------------------
// --- VARIABLE ----------------------------------------------------------------
// ----------------------------------------------------------------------------

/// The identifier of a variable in the problem being solved. Variables are
/// numbered `0..nb_variables()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VariableId(pub usize);

impl VariableId {
    /// Returns the raw numeric id of this variable.
    pub fn id(self) -> usize {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// The id of a worker process, in `0..n`. Distinct from the transport rank
/// the worker happens to occupy (see [`crate::abstraction::transport::Transport`]).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// --- ASSUMPTIONS & CUBES ------------------------------------------------------
// ----------------------------------------------------------------------------

/// The relation an [`Assumption`] restricts a variable with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Relation {
    Equal,
    NotEqual,
}

/// A single restriction `(variable, relation, value)` on the search space.
/// Ordered conjunctions of assumptions (see [`Cube`]) model both point
/// decisions (`x = v`) and half-open intervals (`x >= a, x < b`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Assumption {
    pub variable: VariableId,
    pub relation: Relation,
    pub value: BigInt,
}

impl Assumption {
    pub fn eq(variable: VariableId, value: impl Into<BigInt>) -> Self {
        Assumption { variable, relation: Relation::Equal, value: value.into() }
    }

    pub fn ne(variable: VariableId, value: impl Into<BigInt>) -> Self {
        Assumption { variable, relation: Relation::NotEqual, value: value.into() }
    }
}

/// A finite ordered sequence of assumptions restricting the search space that
/// a worker is asked to explore. An empty cube denotes exhausted search (the
/// sentinel the cube generators emit once the space they enumerate is fully
/// covered).
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Cube(pub Vec<Assumption>);

impl Cube {
    pub fn empty() -> Self {
        Cube(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn assumptions(&self) -> &[Assumption] {
        &self.0
    }

    pub fn push(&mut self, assumption: Assumption) {
        self.0.push(assumption);
    }
}

impl From<Vec<Assumption>> for Cube {
    fn from(assumptions: Vec<Assumption>) -> Self {
        Cube(assumptions)
    }
}

// ----------------------------------------------------------------------------
// --- BOUNDS & OBJECTIVE --------------------------------------------------------
// ----------------------------------------------------------------------------

/// An arbitrary-precision bound on the objective function: an upper bound
/// when minimizing, a lower bound when maximizing.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bound(pub BigInt);

impl Bound {
    pub fn new(value: impl Into<BigInt>) -> Self {
        Bound(value.into())
    }

    pub fn value(&self) -> &BigInt {
        &self.0
    }

    pub fn one() -> Self {
        Bound(BigInt::one())
    }

    pub fn zero() -> Self {
        Bound(BigInt::zero())
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the objective is being minimized or maximized.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// The global objective state `(lower, upper, sense)` described in `spec.md`
/// §3. `None` means the instance is a pure decision problem (no objective).
#[derive(Clone, Debug)]
pub struct Objective {
    pub lower: Bound,
    pub upper: Bound,
    pub sense: Sense,
}

impl Objective {
    pub fn new(lower: Bound, upper: Bound, sense: Sense) -> Self {
        Objective { lower, upper, sense }
    }

    /// Whether the current range still admits at least one integer value.
    pub fn is_empty(&self) -> bool {
        self.lower.0 > self.upper.0
    }
}

// ----------------------------------------------------------------------------
// --- WORKER DESCRIPTOR ---------------------------------------------------------
// ----------------------------------------------------------------------------

/// The coordinator's view of a single worker. Mutated only by the
/// coordinator's reader thread, per `spec.md` §3.
#[derive(Clone, Debug)]
pub struct WorkerDescriptor {
    pub id: WorkerId,
    pub running: bool,
    pub current_bound: Option<Bound>,
    /// Bumped every time the coordinator (re)issues a `solve*` request to
    /// this worker. Lets the reader loop recognize and discard a message
    /// that was in flight for a solve this worker has since been reset out
    /// of -- see `SPEC_FULL.md` §3 and `DESIGN.md`'s open questions.
    pub solve_generation: u64,
}

impl WorkerDescriptor {
    pub fn new(id: WorkerId) -> Self {
        WorkerDescriptor { id, running: false, current_bound: None, solve_generation: 0 }
    }
}

// ----------------------------------------------------------------------------
// --- SOLUTIONS & OUTCOMES --------------------------------------------------------
// ----------------------------------------------------------------------------

/// A decision assigning every problem variable a value, as returned by
/// `solution()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    pub values: Vec<BigInt>,
    pub includes_auxiliary: bool,
}

/// A name-keyed view of a solution, as returned by `mapSolution()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappedSolution(pub FxHashMap<String, BigInt>);

/// The terminal outcome of a single solve request, as reported by a worker.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SolveTermination {
    Satisfiable,
    Unsatisfiable,
    OptimumFound,
    Unknown,
    Unsupported,
}

/// The global verdict returned by [`crate::implementation::coordinator::Coordinator::solve`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    Satisfiable,
    Unsatisfiable,
    OptimumFound,
    Unknown,
    /// An error inside the reader loop or a generator task kept the search
    /// from reaching a real verdict (`spec.md` §7's propagation rule); the
    /// message is the originating [`crate::error::CoreError`]'s rendering.
    Failed(String),
}
