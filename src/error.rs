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

//! The error taxonomy shared by every component of the crate. Each variant
//! corresponds to one of the five error kinds described in `spec.md` §7.

use crate::common::WorkerId;

/// Errors that can arise while driving the parallel search.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A message arrived with an unknown opcode, a truncated payload, or a
    /// parameter count that doesn't match the opcode's declared shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The underlying sequential solver threw from `solve`/`loadInstance` on
    /// the given worker. The worker is treated as permanently lost.
    #[error("solver failure on {worker}: {reason}")]
    Solver { worker: WorkerId, reason: String },

    /// `send`/`receive` returned an I/O-level error.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The caller violated a documented precondition, e.g. requesting
    /// `solution()` before any `satisfiable` outcome was observed.
    #[error("illegal state: {0}")]
    Contract(String),

    /// The operation is meaningless in the current role (e.g.
    /// `variables_mapping()` called on a remote-solver proxy).
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl CoreError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        CoreError::Protocol(msg.into())
    }

    pub fn solver(worker: WorkerId, reason: impl Into<String>) -> Self {
        CoreError::Solver { worker, reason: reason.into() }
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        CoreError::Contract(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        CoreError::Unsupported(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
