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

//! The coordinator-side remote-solver proxy (`spec.md` §4.4): a
//! [`ConstraintSolver`] implementation that forwards every call to a worker
//! process over a [`Transport`], following the wire protocol `spec.md` §4.3
//! describes for the worker dispatcher on the other end.
//!
//! Two things make this different from a plain RPC client: `solve`/`solve_file`
//! /`solve_assumptions` are fire-and-forget (the real terminal outcome surfaces
//! later on the coordinator's reader thread, tagged [`Tag::Solve`], not from
//! this call -- see [`crate::implementation::coordinator::Coordinator`]), and
//! four answers (`nVariables`, `nConstraints`, `isOptimization`, the auxiliary
//! variable list) are cached after their first RPC because the instance they
//! describe is immutable for the worker's lifetime.

use std::path::Path;

use fxhash::FxHashMap;
use num_bigint::BigInt;
use parking_lot::Mutex;

use crate::abstraction::solver::{BoundCallback, ConstraintSolver};
use crate::abstraction::transport::{Filter, Transport};
use crate::common::{Bound, Cube, SolveTermination, VariableId};
use crate::error::{CoreError, CoreResult};
use crate::implementation::message::{Message, Opcode, Parameter, Tag};
use crate::implementation::wire;

const MAX_REPLY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Default)]
struct ProxyCache {
    n_variables: Option<usize>,
    n_constraints: Option<usize>,
    is_optimization: Option<bool>,
    auxiliary_variables: Option<Vec<VariableId>>,
}

/// A coordinator-side handle onto a single worker's solver, reached over
/// `transport`. One instance per worker; the coordinator base owns a
/// `Vec<RemoteSolverProxy<T>>` indexed by [`crate::common::WorkerId`].
pub struct RemoteSolverProxy<T: Transport> {
    transport: T,
    worker: usize,
    /// Serializes request/response round trips so that two coordinator
    /// threads can't interleave an RPC to the same worker (`spec.md` §4.4).
    rpc_lock: Mutex<()>,
    cache: Mutex<ProxyCache>,
}

impl<T: Transport> RemoteSolverProxy<T> {
    pub fn new(transport: T, worker: usize) -> Self {
        RemoteSolverProxy { transport, worker, rpc_lock: Mutex::new(()), cache: Mutex::new(ProxyCache::default()) }
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Sends an interrogation RPC and waits for its `RESPONSE`-tagged reply.
    fn rpc(&self, opcode: Opcode, parameters: Vec<Parameter>) -> CoreResult<Message> {
        let _guard = self.rpc_lock.lock();
        let request = Message::new(Tag::Config, opcode, self.transport.id(), parameters);
        self.transport.send(self.worker, request)?;
        let reply = self.transport.receive(Filter::Exact(Tag::Response), Filter::Exact(self.worker), MAX_REPLY_BYTES)?;
        if reply.opcode != opcode {
            return Err(CoreError::protocol(format!(
                "expected a {opcode:?} reply from worker {}, got {:?}",
                self.worker, reply.opcode
            )));
        }
        Ok(reply)
    }

    /// Sends a fire-and-forget message with no expected reply (config
    /// side-effects, `reset`, the `solve*` family, `interrupt`).
    fn cast(&self, tag: Tag, opcode: Opcode, parameters: Vec<Parameter>) -> CoreResult<()> {
        let message = Message::new(tag, opcode, self.transport.id(), parameters);
        self.transport.send(self.worker, message)
    }

    /// Sends the `end-search` shutdown request. Not part of
    /// [`ConstraintSolver`]: this is the coordinator base's own lifecycle
    /// message, issued once the whole session is ending rather than as a
    /// per-call solver operation.
    pub(crate) fn request_end_search(&self) -> CoreResult<()> {
        self.cast(Tag::Solve, Opcode::EndSearch, vec![])
    }
}

impl<T: Transport> ConstraintSolver for RemoteSolverProxy<T> {
    fn load_instance(&mut self, file: &Path) -> CoreResult<()> {
        let path = file.to_string_lossy().into_owned();
        self.cast(Tag::Config, Opcode::LoadInstance, vec![wire::text(path)])
    }

    fn reset(&mut self) {
        let _ = self.cast(Tag::Solve, Opcode::Reset, vec![]);
    }

    fn n_variables(&self) -> usize {
        if let Some(n) = self.cache.lock().n_variables {
            return n;
        }
        let n = self
            .rpc(Opcode::NVariables, vec![])
            .and_then(|reply| wire::as_int(&reply.parameters, 0))
            .map(|v| v as usize)
            .unwrap_or(0);
        self.cache.lock().n_variables = Some(n);
        n
    }

    fn n_constraints(&self) -> usize {
        if let Some(n) = self.cache.lock().n_constraints {
            return n;
        }
        let n = self
            .rpc(Opcode::NConstraints, vec![])
            .and_then(|reply| wire::as_int(&reply.parameters, 0))
            .map(|v| v as usize)
            .unwrap_or(0);
        self.cache.lock().n_constraints = Some(n);
        n
    }

    fn is_optimization(&self) -> bool {
        if let Some(v) = self.cache.lock().is_optimization {
            return v;
        }
        let v = self
            .rpc(Opcode::IsOptimization, vec![])
            .and_then(|reply| wire::as_bool(&reply.parameters, 0))
            .unwrap_or(false);
        self.cache.lock().is_optimization = Some(v);
        v
    }

    fn is_minimization(&self) -> bool {
        self.rpc(Opcode::IsMinimization, vec![])
            .and_then(|reply| wire::as_bool(&reply.parameters, 0))
            .unwrap_or(true)
    }

    fn auxiliary_variables(&self) -> Vec<VariableId> {
        if let Some(v) = self.cache.lock().auxiliary_variables.clone() {
            return v;
        }
        let v = self
            .rpc(Opcode::AuxiliaryVariables, vec![])
            .and_then(|reply| wire::decode_variable_value_lists(&reply.parameters))
            .map(|(vars, _)| vars)
            .unwrap_or_default();
        self.cache.lock().auxiliary_variables = Some(v.clone());
        v
    }

    fn variables_mapping(&self) -> CoreResult<FxHashMap<String, VariableId>> {
        Err(CoreError::unsupported("getVariablesMapping is worker-local only; a remote proxy cannot answer it"))
    }

    fn solve(&mut self, _on_bound: BoundCallback<'_>) -> SolveTermination {
        let _ = self.cast(Tag::Solve, Opcode::Solve, vec![]);
        SolveTermination::Unknown
    }

    fn solve_file(&mut self, file: &Path, _on_bound: BoundCallback<'_>) -> SolveTermination {
        let path = file.to_string_lossy().into_owned();
        let _ = self.cast(Tag::Solve, Opcode::SolveFile, vec![wire::text(path)]);
        SolveTermination::Unknown
    }

    fn solve_assumptions(&mut self, cube: &Cube, _on_bound: BoundCallback<'_>) -> SolveTermination {
        let _ = self.cast(Tag::Solve, Opcode::SolveAssumptions, wire::encode_cube(cube));
        SolveTermination::Unknown
    }

    fn interrupt(&self) {
        let _ = self.cast(Tag::Solve, Opcode::Interrupt, vec![]);
    }

    fn solution(&self) -> CoreResult<Vec<BigInt>> {
        let reply = self.rpc(Opcode::Solution, vec![])?;
        wire::decode_solution(&reply.parameters)
    }

    fn map_solution(&self, exclude_auxiliary: bool) -> CoreResult<FxHashMap<String, BigInt>> {
        let reply = self.rpc(Opcode::MapSolution, vec![Parameter::Bool(exclude_auxiliary)])?;
        wire::decode_mapping(&reply.parameters)
    }

    fn check_solution(&self) -> CoreResult<bool> {
        let reply = self.rpc(Opcode::CheckSolution, vec![])?;
        wire::as_bool(&reply.parameters, 0)
    }

    fn check_solution_assignment(&self, assignment: &FxHashMap<String, BigInt>) -> CoreResult<bool> {
        let reply = self.rpc(Opcode::CheckSolutionAssignment, wire::encode_mapping(assignment))?;
        wire::as_bool(&reply.parameters, 0)
    }

    fn set_lower_bound(&mut self, bound: Bound) {
        let _ = self.cast(Tag::Config, Opcode::SetLowerBound, vec![wire::bound_param(&bound)]);
    }

    fn set_upper_bound(&mut self, bound: Bound) {
        let _ = self.cast(Tag::Config, Opcode::SetUpperBound, vec![wire::bound_param(&bound)]);
    }

    fn set_bounds(&mut self, lower: Bound, upper: Bound) {
        let _ = self.cast(Tag::Config, Opcode::SetLowerUpperBound, vec![wire::bound_param(&lower), wire::bound_param(&upper)]);
    }

    fn lower_bound(&self) -> Bound {
        self.rpc(Opcode::GetLowerBound, vec![])
            .and_then(|reply| wire::bound_from(&reply.parameters, 0))
            .unwrap_or_else(|_| Bound::zero())
    }

    fn upper_bound(&self) -> Bound {
        self.rpc(Opcode::GetUpperBound, vec![])
            .and_then(|reply| wire::bound_from(&reply.parameters, 0))
            .unwrap_or_else(|_| Bound::zero())
    }

    fn current_bound(&self) -> Bound {
        self.rpc(Opcode::GetCurrentBound, vec![])
            .and_then(|reply| wire::bound_from(&reply.parameters, 0))
            .unwrap_or_else(|_| Bound::zero())
    }

    fn set_decision_variables(&mut self, variables: Vec<VariableId>) {
        let _ = self.cast(Tag::Config, Opcode::SetDecisionVariables, wire::encode_variable_value_lists(&variables, &[]));
    }

    fn set_value_heuristic_static(&mut self, variables: Vec<VariableId>, ordered_values: Vec<BigInt>) {
        let _ = self.cast(
            Tag::Config,
            Opcode::SetValueHeuristicStatic,
            wire::encode_variable_value_lists(&variables, &ordered_values),
        );
    }

    fn set_timeout(&mut self, seconds: u64) {
        let _ = self.cast(Tag::Config, Opcode::SetTimeout, vec![wire::int(seconds as i64)]);
    }

    fn set_timeout_ms(&mut self, millis: u64) {
        let _ = self.cast(Tag::Config, Opcode::SetTimeoutMs, vec![wire::int(millis as i64)]);
    }

    fn set_verbosity(&mut self, level: u8) {
        let _ = self.cast(Tag::Config, Opcode::SetVerbosity, vec![wire::int(level as i64)]);
    }

    fn set_log_file(&mut self, path: &Path) {
        let path = path.to_string_lossy().into_owned();
        let _ = self.cast(Tag::Config, Opcode::SetLogFile, vec![wire::text(path)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::dispatcher::WorkerDispatcher;
    use crate::implementation::solver::dummy::BruteForceSolver;
    use crate::implementation::transport::ThreadNetwork;

    #[test]
    fn variables_mapping_is_unsupported_on_a_remote_proxy() {
        let network = ThreadNetwork::new(1);
        let proxy = RemoteSolverProxy::new(network.coordinator_handle(), 0);
        assert!(proxy.variables_mapping().is_err());
    }

    #[test]
    fn n_variables_and_n_constraints_are_cached_after_the_worker_shuts_down() {
        let network = ThreadNetwork::new(1);
        let worker_transport = network.worker_handle(0);
        let coordinator_rank = network.coordinator_rank();
        let solver = BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        let dispatcher = WorkerDispatcher::new(worker_transport, coordinator_rank, solver);
        let handle = std::thread::spawn(move || dispatcher.run());

        let mut proxy = RemoteSolverProxy::new(network.coordinator_handle(), 0);
        assert_eq!(proxy.n_variables(), 2);
        assert_eq!(proxy.n_constraints(), 1);

        proxy.interrupt();
        let _ = proxy.cast(Tag::Solve, Opcode::EndSearch, vec![]);
        // Drain the end-search-ack so the dispatcher's loop actually exits.
        let _ = network.coordinator_handle().receive(Filter::Exact(Tag::Solve), Filter::Exact(0), 1 << 20);
        handle.join().unwrap().unwrap();

        // The worker is gone; cached answers must not trigger a new RPC (it
        // would block forever waiting for a reply that will never come).
        assert_eq!(proxy.n_variables(), 2);
        assert_eq!(proxy.n_constraints(), 1);
    }
}
