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

//! The strategy hooks the coordinator base (`spec.md` §4.5, "Abraracourcix")
//! calls into at well-defined points of the solving session. Each of the
//! three parallel search strategies (portfolio, EPS, partition) is one
//! implementation of this trait; the coordinator itself never knows which
//! one it is driving.

use crate::common::{Bound, WorkerId};
use crate::error::CoreResult;
use crate::implementation::coordinator::Coordinator;
use crate::abstraction::transport::Transport;

/// Strategy-specific behavior plugged into the coordinator base.
///
/// Hooks with a default implementation are optional for a given strategy;
/// `start_search` and `on_unsatisfiable` are the only ones every strategy
/// must define, since they are the two points where the three strategies
/// genuinely disagree (what to send first, and what an UNSAT from one
/// worker means for the others).
pub trait Strategy<T: Transport>: Send + Sync {
    /// Runs once, before any worker-specific hook, right after
    /// `loadInstance` and before the first `solve` wave. Portfolio uses this
    /// to read `isMinimization` and compute the initial bound allocation.
    fn before_search(&self, _coordinator: &Coordinator<T>) -> CoreResult<()> {
        Ok(())
    }

    /// Runs once per worker, after [`Strategy::before_search`]. Portfolio
    /// assigns each worker its objective sub-range here; partition disables
    /// the constraints outside a worker's block here.
    fn before_search_worker(&self, _coordinator: &Coordinator<T>, _worker: WorkerId) -> CoreResult<()> {
        Ok(())
    }

    /// Issues the first wave of `solve` requests.
    fn start_search(&self, coordinator: &Coordinator<T>) -> CoreResult<()>;

    /// Called when `worker` reports `satisfiable`. The default records the
    /// worker's solution as the incumbent and, for a pure decision instance,
    /// concludes the session -- the generic rule of `spec.md` §4.5/§4.6. EPS
    /// overrides this to additionally cancel its generator and idle-worker
    /// queue (`spec.md` §4.8 step 4); partition overrides it to track
    /// per-cube answers instead of concluding directly (`spec.md` §4.9).
    fn on_satisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        coordinator.default_on_satisfiable(worker)
    }

    /// Called when `worker` reports `unsatisfiable`. Strategies disagree on
    /// whether this is terminal (plain portfolio, partition) or merely
    /// triggers a rebalance (optimizing portfolio, EPS).
    fn on_unsatisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()>;

    /// Called when `worker` reports `unknown` (interrupted, or the
    /// underlying solver gave up without an answer).
    fn on_unknown(&self, _coordinator: &Coordinator<T>, _worker: WorkerId) -> CoreResult<()> {
        Ok(())
    }

    /// Called when `worker` reports an improved objective bound mid-solve.
    /// Only ever fires for optimization instances.
    fn on_new_bound_found(&self, _coordinator: &Coordinator<T>, _worker: WorkerId, _bound: Bound) -> CoreResult<()> {
        Ok(())
    }
}
