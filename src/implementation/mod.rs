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

//! Concrete implementations of the abstractions declared in
//! `crate::abstraction`: the wire format, the in-process transport, the
//! worker dispatcher, the coordinator base and its three strategies, the
//! bound-allocation policies, the cube generators and the consistency
//! checkers.

pub mod message;
pub mod wire;
pub mod sync;
pub mod transport;
pub mod solver;
pub mod dispatcher;
pub mod remote;
pub mod allocation;
pub mod checker;
pub mod generator;
pub mod coordinator;
pub mod strategy;

pub use coordinator::Coordinator;
pub use dispatcher::WorkerDispatcher;
pub use remote::RemoteSolverProxy;
