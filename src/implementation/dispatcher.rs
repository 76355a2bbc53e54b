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

//! The worker-side dispatcher ("Gaulois", `spec.md` §4.3, §6.2): the loop a
//! worker process runs against its locally loaded
//! [`crate::abstraction::solver::ConstraintSolver`], translating inbound
//! wire messages from the coordinator into calls on it and outbound
//! replies/streamed bounds back.

use std::cell::UnsafeCell;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use crate::abstraction::solver::ConstraintSolver;
use crate::abstraction::transport::{Filter, Transport};
use crate::common::Bound;
use crate::error::CoreResult;
use crate::implementation::message::{Message, Opcode, Parameter, Tag};
use crate::implementation::wire;

/// The largest single message this dispatcher is willing to receive.
/// `solve_file`/`load_instance` paths are short strings; nothing in this
/// protocol legitimately needs more.
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Grants interior mutability to a `ConstraintSolver` trait object so that
/// [`ConstraintSolver::interrupt`] (`&self`) can run on the dispatcher's main
/// thread while a `solve*` call (`&mut self`) is in flight on a background
/// thread. Sound because the two sides never touch overlapping memory: a
/// correct `interrupt` implementation only ever mutates fields it itself
/// made interior-mutable (an `AtomicBool`, typically), and nothing besides
/// `interrupt` is ever called through the shared-reference side of this
/// cell while a `solve*` call owns the mutable side.
struct SolverCell<S>(UnsafeCell<S>);

// SAFETY: `S: Send` and the cell is only ever shared between threads that
// respect the single-writer discipline documented on `SolverCell` itself.
unsafe impl<S: Send> Sync for SolverCell<S> {}

impl<S> SolverCell<S> {
    fn new(solver: S) -> Self {
        SolverCell(UnsafeCell::new(solver))
    }

    fn get_ref(&self) -> &S {
        unsafe { &*self.0.get() }
    }

    /// # Safety
    /// The caller must ensure no other thread is concurrently calling a
    /// `&mut self` method on the same solver.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self) -> &mut S {
        &mut *self.0.get()
    }
}

fn termination_opcode(termination: crate::common::SolveTermination) -> Opcode {
    use crate::common::SolveTermination as T;
    match termination {
        T::Satisfiable => Opcode::Satisfiable,
        T::Unsatisfiable => Opcode::Unsatisfiable,
        T::OptimumFound => Opcode::OptimumFound,
        T::Unknown => Opcode::Unknown,
        T::Unsupported => Opcode::Unsupported,
    }
}

/// Drives a single worker's message loop against its local solver.
pub struct WorkerDispatcher<T: Transport, S: ConstraintSolver> {
    transport: T,
    coordinator_rank: usize,
    solver: Arc<SolverCell<S>>,
    /// Serializes *issuing* a mutating call (load/reset/solve); does not
    /// need to be held for `interrupt`.
    dispatch_lock: Mutex<()>,
    active_solve: Mutex<Option<JoinHandle<()>>>,
}

impl<T, S> WorkerDispatcher<T, S>
where
    T: Transport + Clone + 'static,
    S: ConstraintSolver + 'static,
{
    pub fn new(transport: T, coordinator_rank: usize, solver: S) -> Self {
        WorkerDispatcher {
            transport,
            coordinator_rank,
            solver: Arc::new(SolverCell::new(solver)),
            dispatch_lock: Mutex::new(()),
            active_solve: Mutex::new(None),
        }
    }

    /// Runs the dispatch loop until an `end-search` request is handled.
    /// Blocks the calling thread; callers typically run this on its own
    /// `std::thread`, one per worker.
    #[instrument(skip(self), fields(rank = self.transport.id()))]
    pub fn run(&self) -> CoreResult<()> {
        loop {
            let message = self.transport.receive(
                Filter::Any,
                Filter::Exact(self.coordinator_rank),
                MAX_MESSAGE_BYTES,
            )?;
            if self.dispatch(message)? {
                return Ok(());
            }
        }
    }

    /// Handles one message; returns `Ok(true)` once `end-search` has been
    /// fully handshaked and the loop should stop.
    fn dispatch(&self, message: Message) -> CoreResult<bool> {
        let params = &message.parameters;
        match message.opcode {
            Opcode::AssignIndex => Ok(false),
            Opcode::LoadInstance => {
                let _guard = self.dispatch_lock.lock();
                let path = PathBuf::from(wire::as_str(params, 0)?);
                unsafe { self.solver.get_mut() }.load_instance(&path)?;
                Ok(false)
            }
            Opcode::Reset => {
                let _guard = self.dispatch_lock.lock();
                self.join_active_solve();
                unsafe { self.solver.get_mut() }.reset();
                Ok(false)
            }
            Opcode::Solve => {
                self.spawn_solve(move |solver, on_bound| solver.solve(on_bound));
                Ok(false)
            }
            Opcode::SolveFile => {
                let path = PathBuf::from(wire::as_str(params, 0)?);
                self.spawn_solve(move |solver, on_bound| solver.solve_file(&path, on_bound));
                Ok(false)
            }
            Opcode::SolveAssumptions => {
                let cube = wire::decode_cube(params)?;
                self.spawn_solve(move |solver, on_bound| solver.solve_assumptions(&cube, on_bound));
                Ok(false)
            }
            Opcode::Interrupt => {
                self.solver.get_ref().interrupt();
                Ok(false)
            }
            Opcode::EndSearch => {
                self.solver.get_ref().interrupt();
                self.join_active_solve();
                // The reader thread on the coordinator only ever listens on
                // `Tag::Solve` (spec.md §4.5), so the ack travels on that tag
                // rather than through the generic `Tag::Response` `reply`
                // helper used by the interrogation RPCs.
                let ack = Message::new(Tag::Solve, Opcode::EndSearch, self.transport.id(), vec![]);
                self.transport.send(message.source, ack)?;
                info!("worker dispatcher handshaked end-search");
                Ok(true)
            }
            Opcode::SetTimeout => {
                unsafe { self.solver.get_mut() }.set_timeout(wire::as_int(params, 0)? as u64);
                Ok(false)
            }
            Opcode::SetTimeoutMs => {
                unsafe { self.solver.get_mut() }.set_timeout_ms(wire::as_int(params, 0)? as u64);
                Ok(false)
            }
            Opcode::SetVerbosity => {
                unsafe { self.solver.get_mut() }.set_verbosity(wire::as_int(params, 0)? as u8);
                Ok(false)
            }
            Opcode::SetLogFile => {
                let path = PathBuf::from(wire::as_str(params, 0)?);
                unsafe { self.solver.get_mut() }.set_log_file(&path);
                Ok(false)
            }
            Opcode::SetLogStream => {
                warn!("set-log-stream is not meaningful for an in-process worker; ignoring");
                Ok(false)
            }
            Opcode::SetLowerBound => {
                let bound = wire::bound_from(params, 0)?;
                unsafe { self.solver.get_mut() }.set_lower_bound(bound);
                Ok(false)
            }
            Opcode::SetUpperBound => {
                let bound = wire::bound_from(params, 0)?;
                unsafe { self.solver.get_mut() }.set_upper_bound(bound);
                Ok(false)
            }
            Opcode::SetLowerUpperBound => {
                let lower = wire::bound_from(params, 0)?;
                let upper = wire::bound_from(params, 1)?;
                unsafe { self.solver.get_mut() }.set_bounds(lower, upper);
                Ok(false)
            }
            Opcode::SetDecisionVariables => {
                let (variables, _) = wire::decode_variable_value_lists(params)?;
                unsafe { self.solver.get_mut() }.set_decision_variables(variables);
                Ok(false)
            }
            Opcode::SetValueHeuristicStatic => {
                let (variables, values) = wire::decode_variable_value_lists(params)?;
                unsafe { self.solver.get_mut() }.set_value_heuristic_static(variables, values);
                Ok(false)
            }
            Opcode::NVariables => {
                let n = self.solver.get_ref().n_variables();
                self.reply(&message, Opcode::NVariables, vec![wire::int(n as i64)])
            }
            Opcode::NConstraints => {
                let n = self.solver.get_ref().n_constraints();
                self.reply(&message, Opcode::NConstraints, vec![wire::int(n as i64)])
            }
            Opcode::IsOptimization => {
                let v = self.solver.get_ref().is_optimization();
                self.reply(&message, Opcode::IsOptimization, vec![Parameter::Bool(v)])
            }
            Opcode::IsMinimization => {
                let v = self.solver.get_ref().is_minimization();
                self.reply(&message, Opcode::IsMinimization, vec![Parameter::Bool(v)])
            }
            Opcode::GetLowerBound => {
                let bound = self.solver.get_ref().lower_bound();
                self.reply(&message, Opcode::GetLowerBound, vec![wire::bound_param(&bound)])
            }
            Opcode::GetUpperBound => {
                let bound = self.solver.get_ref().upper_bound();
                self.reply(&message, Opcode::GetUpperBound, vec![wire::bound_param(&bound)])
            }
            Opcode::GetCurrentBound => {
                let bound = self.solver.get_ref().current_bound();
                self.reply(&message, Opcode::GetCurrentBound, vec![wire::bound_param(&bound)])
            }
            Opcode::Solution => {
                let solution = self.solver.get_ref().solution()?;
                self.reply(&message, Opcode::Solution, wire::encode_solution(&solution))
            }
            Opcode::MapSolution => {
                let exclude_auxiliary = wire::as_bool(params, 0)?;
                let mapping = self.solver.get_ref().map_solution(exclude_auxiliary)?;
                self.reply(&message, Opcode::MapSolution, wire::encode_mapping(&mapping))
            }
            Opcode::AuxiliaryVariables => {
                let vars = self.solver.get_ref().auxiliary_variables();
                let params = wire::encode_variable_value_lists(&vars, &[]);
                self.reply(&message, Opcode::AuxiliaryVariables, params)
            }
            Opcode::CheckSolution => {
                let ok = self.solver.get_ref().check_solution()?;
                self.reply(&message, Opcode::CheckSolution, vec![Parameter::Bool(ok)])
            }
            Opcode::CheckSolutionAssignment => {
                let assignment = wire::decode_mapping(params)?;
                let ok = self.solver.get_ref().check_solution_assignment(&assignment)?;
                self.reply(&message, Opcode::CheckSolutionAssignment, vec![Parameter::Bool(ok)])
            }
            other => Err(crate::error::CoreError::protocol(format!(
                "opcode {other:?} is not valid on the worker side"
            ))),
        }
    }

    fn join_active_solve(&self) {
        if let Some(handle) = self.active_solve.lock().take() {
            let _ = handle.join();
        }
    }

    fn spawn_solve<F>(&self, run: F)
    where
        F: FnOnce(&mut S, &(dyn Fn(Bound) + Send + Sync)) -> crate::common::SolveTermination + Send + 'static,
    {
        let _guard = self.dispatch_lock.lock();
        self.join_active_solve();

        let solver = self.solver.clone();
        let transport = self.transport.clone();
        let coordinator_rank = self.coordinator_rank;
        let my_rank = self.transport.id();

        let handle = std::thread::spawn(move || {
            let on_bound = {
                let transport = transport.clone();
                move |bound: Bound| {
                    let message = Message::new(Tag::Solve, Opcode::NewBoundFound, my_rank, vec![wire::bound_param(&bound)]);
                    let _ = transport.send(coordinator_rank, message);
                }
            };
            // SAFETY: `dispatch_lock` was held while this thread was spawned
            // and any previous solve thread was joined first, so this is the
            // only thread calling a `&mut` method on the solver right now.
            let termination = unsafe { solver.get_mut() }.solve_entry(&run, &on_bound);
            let opcode = termination_opcode(termination);
            let _ = transport.send(coordinator_rank, Message::new(Tag::Solve, opcode, my_rank, vec![]));
        });
        *self.active_solve.lock() = Some(handle);
    }
}

/// Lets [`WorkerDispatcher::spawn_solve`] invoke any of the three `solve*`
/// entry points through one closure without the trait itself growing an
/// extra method.
trait SolveEntry {
    fn solve_entry(
        &mut self,
        run: impl FnOnce(&mut Self, &(dyn Fn(Bound) + Send + Sync)) -> crate::common::SolveTermination,
        on_bound: &(dyn Fn(Bound) + Send + Sync),
    ) -> crate::common::SolveTermination
    where
        Self: Sized;
}

impl<S: ConstraintSolver> SolveEntry for S {
    fn solve_entry(
        &mut self,
        run: impl FnOnce(&mut Self, &(dyn Fn(Bound) + Send + Sync)) -> crate::common::SolveTermination,
        on_bound: &(dyn Fn(Bound) + Send + Sync),
    ) -> crate::common::SolveTermination {
        run(self, on_bound)
    }
}

impl<T, S> WorkerDispatcher<T, S>
where
    T: Transport + Clone + 'static,
    S: ConstraintSolver + 'static,
{
    fn reply(&self, request: &Message, opcode: Opcode, parameters: Vec<Parameter>) -> CoreResult<bool> {
        let response = Message::new(Tag::Response, opcode, self.transport.id(), parameters);
        self.transport.send(request.source, response)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::solver::dummy::BruteForceSolver;
    use crate::implementation::transport::ThreadNetwork;

    #[test]
    fn answers_interrogation_rpcs() {
        let network = ThreadNetwork::new(1);
        let worker_transport = network.worker_handle(0);
        let coordinator_rank = network.coordinator_rank();
        let solver = BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        let dispatcher = WorkerDispatcher::new(worker_transport, coordinator_rank, solver);

        let coordinator = network.coordinator_handle();
        let handle = std::thread::spawn(move || dispatcher.run());

        coordinator
            .send(0, Message::new(Tag::Config, Opcode::NVariables, coordinator_rank, vec![]))
            .unwrap();
        let reply = coordinator.receive(Filter::Exact(Tag::Response), Filter::Exact(0), 1 << 20).unwrap();
        assert_eq!(wire::as_int(&reply.parameters, 0).unwrap(), 2);

        coordinator
            .send(0, Message::new(Tag::Solve, Opcode::EndSearch, coordinator_rank, vec![]))
            .unwrap();
        let ack = coordinator.receive(Filter::Exact(Tag::Solve), Filter::Exact(0), 1 << 20).unwrap();
        assert_eq!(ack.opcode, Opcode::EndSearch);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn streams_bounds_and_a_terminal_outcome() {
        let network = ThreadNetwork::new(1);
        let worker_transport = network.worker_handle(0);
        let coordinator_rank = network.coordinator_rank();
        let solver = BruteForceSolver::new()
            .with_domain(vec![2, 1, 0])
            .with_domain(vec![0, 1, 2])
            .with_not_equal(0, 1)
            .with_objective(0, true);
        let dispatcher = WorkerDispatcher::new(worker_transport, coordinator_rank, solver);

        let coordinator = network.coordinator_handle();
        let handle = std::thread::spawn(move || dispatcher.run());

        coordinator.send(0, Message::new(Tag::Solve, Opcode::Solve, coordinator_rank, vec![])).unwrap();
        let mut saw_bound = false;
        loop {
            let message = coordinator.receive(Filter::Exact(Tag::Solve), Filter::Exact(0), 1 << 20).unwrap();
            match message.opcode {
                Opcode::NewBoundFound => saw_bound = true,
                Opcode::OptimumFound | Opcode::Satisfiable | Opcode::Unsatisfiable => break,
                other => panic!("unexpected opcode {other:?}"),
            }
        }
        assert!(saw_bound);

        coordinator.send(0, Message::new(Tag::Solve, Opcode::EndSearch, coordinator_rank, vec![])).unwrap();
        let ack = coordinator.receive(Filter::Exact(Tag::Solve), Filter::Exact(0), 1 << 20).unwrap();
        assert_eq!(ack.opcode, Opcode::EndSearch);
        handle.join().unwrap().unwrap();
    }
}
