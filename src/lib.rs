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

//! # Parcoord
//! Parcoord is a generic coordinator/worker framework for running a fleet of
//! constraint solvers in parallel. It does not itself solve anything: you
//! bring a [`abstraction::solver::ConstraintSolver`] implementation (your own,
//! or an off the shelf backend), and parcoord takes care of distributing the
//! search for you across a [`abstraction::transport::Transport`] of your
//! choosing.
//!
//! Three coordination strategies are provided out of the box, each trading
//! off coordination chatter against load balancing:
//!
//! * [`implementation::strategy::Portfolio`] runs every worker on the whole
//!   instance and keeps their objective bound ranges disjoint.
//! * [`implementation::strategy::Eps`] (embarrassingly parallel search) slices
//!   the instance into small sub-problems (cubes) and dispatches them one at a
//!   time to whichever worker is idle.
//! * [`implementation::strategy::Partition`] splits the variables themselves
//!   into disjoint blocks, one per worker, and merges their answers back into
//!   a single solution.
//!
//! ## Getting started
//! A session is built out of a [`implementation::coordinator::Coordinator`],
//! one [`implementation::remote::RemoteSolverProxy`] per worker, and a
//! [`abstraction::strategy::Strategy`] to drive it:
//!
//! ```no_run
//! use parcoord::prelude::*;
//!
//! # fn build<T: Transport + Clone + 'static>(transport: T, worker_ranks: &[usize]) {
//! let coordinator = Coordinator::new(transport, worker_ranks, SolverConfig::default());
//! let strategy = Portfolio::new(Linear);
//! coordinator.solve(&strategy);
//! # }
//! ```
//!
//! On the worker side of the wire, a [`implementation::dispatcher::WorkerDispatcher`]
//! pairs a [`abstraction::transport::Transport`] handle with a local
//! [`abstraction::solver::ConstraintSolver`] and answers the coordinator's
//! requests until it receives the end-of-search handshake.
//!
//! See `demos/cli_embedding.rs` for a complete, runnable wiring of the pieces
//! above over the in-process [`implementation::transport::ThreadTransport`].

pub mod abstraction;
pub mod common;
pub mod config;
pub mod error;
pub mod implementation;

pub mod prelude;
