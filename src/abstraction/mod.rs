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

//! This module (and its submodules) provides the abstractions a client
//! embedding this crate, or a new parallel strategy, needs to depend on:
//! the transport, the sequential-solver interface, bound allocation, cube
//! generation, consistency checking, and the strategy hooks themselves.

pub mod transport;
pub mod solver;
pub mod allocation;
pub mod generator;
pub mod checker;
pub mod strategy;

pub use transport::{Filter, Transport};
pub use solver::{BoundCallback, ConstraintSolver};
pub use allocation::BoundAllocationStrategy;
pub use generator::CubeGenerator;
pub use checker::ConsistencyChecker;
pub use strategy::Strategy;
