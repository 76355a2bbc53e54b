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

//! The prelude module is only present to ease your life while wiring up a new
//! coordination session. That way you don't have to care about manually
//! importing every struct and trait by yourself.
//!
//! # Example
//! ```
//! // At the top of a file that builds or drives a session you will usually
//! // want to import everything this crate exposes at once:
//! use parcoord::prelude::*;
//! ```

pub use crate::common::*;
pub use crate::config::{SolverConfig, SolverConfigBuilder};
pub use crate::error::{CoreError, CoreResult};

// Abstractions
pub use crate::abstraction::allocation::*;
pub use crate::abstraction::checker::*;
pub use crate::abstraction::generator::*;
pub use crate::abstraction::solver::*;
pub use crate::abstraction::strategy::*;
pub use crate::abstraction::transport::*;

// Implementations
pub use crate::implementation::allocation::{Linear, Logarithmic};
pub use crate::implementation::checker::{FinalChecker, NullChecker, PartialChecker};
pub use crate::implementation::coordinator::{BestSolution, Coordinator, CoordinatorState};
pub use crate::implementation::dispatcher::WorkerDispatcher;
pub use crate::implementation::generator::{
    CartesianProductRefinementGenerator, CubeScorer, LexicographicCubeGenerator,
    LexicographicIntervalCubeGenerator, RemainingDomainProduct,
};
pub use crate::implementation::message::{Message, Opcode, Parameter, Tag};
pub use crate::implementation::remote::RemoteSolverProxy;
pub use crate::implementation::solver::BruteForceSolver;
pub use crate::implementation::strategy::{Eps, Partition, PartitionPlan, Portfolio};
pub use crate::implementation::transport::{ThreadNetwork, ThreadTransport};
