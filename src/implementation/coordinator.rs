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

//! The strategy-independent coordinator base ("Abraracourcix", `spec.md`
//! §4.5): the state machine every parallel search strategy is plugged into.
//! It owns the workers (as [`RemoteSolverProxy`] handles), the objective
//! state, the best-known solution, and the `solved`/`end` semaphore pair
//! that lets the public [`Coordinator::solve`] call block its caller until
//! the whole session -- including the `end-search` handshake -- is done.
//!
//! The coordinator never knows which of the three strategies (portfolio,
//! EPS, partition) it is driving; it only calls into the
//! [`Strategy`] trait at the well-defined points `spec.md` §4.5 names, and
//! exposes the handful of accessors a strategy implementation needs
//! (`spec.md` §5's "shared resources", each behind its own mutex).

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::abstraction::solver::ConstraintSolver;
use crate::abstraction::strategy::Strategy;
use crate::abstraction::transport::{Filter, Transport};
use crate::common::{
    Bound, MappedSolution, Objective, SessionOutcome, Solution, WorkerDescriptor, WorkerId,
};
use crate::config::SolverConfig;
use crate::error::{CoreError, CoreResult};
use crate::implementation::message::{Opcode, Tag};
use crate::implementation::remote::RemoteSolverProxy;
use crate::implementation::sync::Semaphore;
use crate::implementation::wire;

const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// The lifecycle states of `spec.md` §4.5's diagram. Exposed for
/// introspection (tests, logging); no behavior is keyed off it besides a
/// couple of debug-assertions-in-spirit `tracing` events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CoordinatorState {
    Created,
    Loaded,
    Searching,
    Solved,
    EndSearch,
    Drained,
}

struct BestSolution {
    winner: WorkerId,
    solution: Solution,
    mapped: MappedSolution,
}

/// Owns one solving session against a fixed fleet of workers. Generic over
/// the transport so the same coordinator logic drives an in-process
/// [`crate::implementation::transport::ThreadTransport`] or a real
/// MPI-backed one without change.
pub struct Coordinator<T: Transport> {
    transport: T,
    proxies: Vec<Mutex<RemoteSolverProxy<T>>>,
    descriptors: Mutex<Vec<WorkerDescriptor>>,
    objective: Mutex<Option<Objective>>,
    best_solution: Mutex<Option<BestSolution>>,
    concluded: AtomicBool,
    outcome: Mutex<Option<SessionOutcome>>,
    interrupted: AtomicBool,
    solved: Semaphore,
    end: Semaphore,
    state: Mutex<CoordinatorState>,
    config: SolverConfig,
    /// Bumped by [`Coordinator::end_search`]; the reader loop stops once it
    /// has drained this many `end-search-ack`s, regardless of how many
    /// workers were actually mid-solve at that point.
    acks_expected: AtomicU64,
}

impl<T: Transport + Clone + 'static> Coordinator<T> {
    /// Builds a coordinator over `worker_ranks`, reached through `transport`.
    /// `worker_ranks[i]` is the transport rank of logical worker `i`
    /// ([`WorkerId`]`(i)`).
    pub fn new(transport: T, worker_ranks: &[usize], config: SolverConfig) -> Self {
        let proxies = worker_ranks
            .iter()
            .map(|&rank| Mutex::new(RemoteSolverProxy::new(transport.clone(), rank)))
            .collect();
        let descriptors = (0..worker_ranks.len()).map(|i| WorkerDescriptor::new(WorkerId(i))).collect();
        Coordinator {
            transport,
            proxies,
            descriptors: Mutex::new(descriptors),
            objective: Mutex::new(None),
            best_solution: Mutex::new(None),
            concluded: AtomicBool::new(false),
            outcome: Mutex::new(None),
            interrupted: AtomicBool::new(false),
            solved: Semaphore::new(0),
            end: Semaphore::new(0),
            state: Mutex::new(CoordinatorState::Created),
            config,
            acks_expected: AtomicU64::new(0),
        }
    }

    pub fn n_workers(&self) -> usize {
        self.proxies.len()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    /// The worker's remote-solver handle, behind its own mutex (`spec.md`
    /// §4.4's per-proxy mutex already serializes RPC round trips; this outer
    /// mutex additionally lets the proxy's `&mut self` methods -- `solve`,
    /// `reset`, the bound setters -- be called from strategy code that only
    /// ever holds `&Coordinator<T>`).
    pub fn worker(&self, id: WorkerId) -> &Mutex<RemoteSolverProxy<T>> {
        &self.proxies[id.0]
    }

    pub fn descriptors(&self) -> &Mutex<Vec<WorkerDescriptor>> {
        &self.descriptors
    }

    pub fn objective(&self) -> &Mutex<Option<Objective>> {
        &self.objective
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn is_concluded(&self) -> bool {
        self.concluded.load(Ordering::SeqCst)
    }

    pub fn running(&self, id: WorkerId) -> bool {
        self.descriptors.lock()[id.0].running
    }

    pub fn mark_running(&self, id: WorkerId) {
        self.descriptors.lock()[id.0].running = true;
    }

    pub fn mark_idle(&self, id: WorkerId) {
        self.descriptors.lock()[id.0].running = false;
    }

    /// Bumps and returns the worker's `solve_generation` counter -- call
    /// this every time a fresh `solve*` request is issued, so that a
    /// terminal message or bound update that was already in flight for a
    /// round this worker has since been reset out of can be recognized as
    /// stale (see `SPEC_FULL.md` §3).
    pub fn bump_generation(&self, id: WorkerId) -> u64 {
        let mut descriptors = self.descriptors.lock();
        descriptors[id.0].solve_generation += 1;
        descriptors[id.0].solve_generation
    }

    pub fn generation(&self, id: WorkerId) -> u64 {
        self.descriptors.lock()[id.0].solve_generation
    }

    pub fn set_current_bound(&self, id: WorkerId, bound: Option<Bound>) {
        self.descriptors.lock()[id.0].current_bound = bound;
    }

    /// Broadcasts `loadInstance(file)` to every worker, then the session
    /// configuration (timeout/verbosity/log file), per `spec.md` §4.5 and
    /// `SPEC_FULL.md` §2's ambient configuration layer.
    #[instrument(skip(self, file))]
    pub fn load_instance(&self, file: &Path) -> CoreResult<()> {
        for proxy in &self.proxies {
            let mut proxy = proxy.lock();
            proxy.load_instance(file)?;
            if let Some(timeout) = self.config.timeout {
                proxy.set_timeout(timeout.as_secs());
            }
            if self.config.verbosity > 0 {
                proxy.set_verbosity(self.config.verbosity);
            }
            if let Some(log_file) = &self.config.log_file {
                proxy.set_log_file(log_file);
            }
        }
        *self.state.lock() = CoordinatorState::Loaded;
        Ok(())
    }

    /// Records `worker`'s solution as the incumbent. Called by the reader
    /// loop whenever a `satisfiable` or `optimum-found` message arrives.
    pub fn record_solution(&self, worker: WorkerId) -> CoreResult<()> {
        let mut proxy = self.proxies[worker.0].lock();
        let values = proxy.solution()?;
        let mapped = proxy.map_solution(false)?;
        *self.best_solution.lock() = Some(BestSolution {
            winner: worker,
            solution: Solution { values, includes_auxiliary: true },
            mapped: MappedSolution(mapped),
        });
        Ok(())
    }

    /// Publishes a solution assembled by the caller rather than fetched
    /// from a single worker's proxy -- the partition strategy's merge step
    /// (`spec.md` §4.9), which combines each worker's partial assignment by
    /// variable ownership into one answer that no single worker holds in
    /// full. `solution()`'s positional vector is left empty: it only makes
    /// sense relative to one worker's own variable ordering, which a merged
    /// cross-partition answer does not have.
    pub fn record_mapped_solution(&self, winner: WorkerId, mapped: MappedSolution) {
        *self.best_solution.lock() =
            Some(BestSolution { winner, solution: Solution::default(), mapped });
    }

    pub fn winner(&self) -> Option<WorkerId> {
        self.best_solution.lock().as_ref().map(|b| b.winner)
    }

    pub fn best_solution(&self) -> Option<(WorkerId, Solution, MappedSolution)> {
        self.best_solution.lock().as_ref().map(|b| (b.winner, b.solution.clone(), b.mapped.clone()))
    }

    /// Default handling for a `satisfiable` message (`spec.md` §4.5/§4.6):
    /// record the incumbent, and conclude the session only for a pure
    /// decision instance (no objective). Optimization instances keep
    /// searching until `optimum-found` or the unsatisfiable-from-the-last-
    /// worker rule fires.
    pub fn default_on_satisfiable(&self, worker: WorkerId) -> CoreResult<()> {
        self.record_solution(worker)?;
        if self.objective.lock().is_none() {
            self.conclude(SessionOutcome::Satisfiable);
        }
        Ok(())
    }

    /// First call wins: stores `outcome`, and releases the `solved`
    /// semaphore so the thread blocked in [`Coordinator::solve`] can proceed
    /// to the `end-search` handshake. Subsequent calls are no-ops, which is
    /// what makes `interrupt()` (and redundant terminal messages racing each
    /// other) idempotent.
    pub fn conclude(&self, outcome: SessionOutcome) -> bool {
        if self.concluded.swap(true, Ordering::SeqCst) {
            return false;
        }
        debug!(?outcome, "coordinator concluding session");
        *self.outcome.lock() = Some(outcome);
        self.solved.release();
        true
    }

    /// Captures an error surfacing from a strategy hook or the reader loop
    /// itself: per `spec.md` §7's propagation rule, this must not silently
    /// stop the search -- it releases `solved` with a failure outcome
    /// instead of leaving the caller of `solve()` blocked forever.
    pub fn fail(&self, err: CoreError) {
        error!(error = %err, "coordinator session failed");
        self.conclude(SessionOutcome::Failed(err.to_string()));
    }

    /// Sends `interrupt` to every currently-running worker. Safe to call
    /// any number of times from any thread (`spec.md` §5's idempotent
    /// interrupt contract): once `interrupted` is set, repeat calls just
    /// re-signal workers that are still marked running.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        for (i, proxy) in self.proxies.iter().enumerate() {
            if self.descriptors.lock()[i].running {
                proxy.lock().interrupt();
            }
        }
    }

    /// Runs a full solving session against `strategy`: `before_search` /
    /// per-worker `before_search_worker` hooks, then `start_search`, then
    /// blocks until a terminal outcome is reached and the `end-search`
    /// handshake with every worker completes (`spec.md` §4.5).
    #[instrument(skip(self, strategy))]
    pub fn solve(&self, strategy: &dyn Strategy<T>) -> SessionOutcome {
        *self.state.lock() = CoordinatorState::Searching;
        std::thread::scope(|scope| {
            scope.spawn(|| self.reader_loop(strategy));

            if let Err(e) = strategy.before_search(self) {
                self.fail(e);
            } else {
                for i in 0..self.proxies.len() {
                    if self.is_concluded() {
                        break;
                    }
                    if let Err(e) = strategy.before_search_worker(self, WorkerId(i)) {
                        self.fail(e);
                        break;
                    }
                }
                if !self.is_concluded() {
                    if let Err(e) = strategy.start_search(self) {
                        self.fail(e);
                    }
                }
            }

            self.solved.acquire();
            *self.state.lock() = CoordinatorState::Solved;
            self.end_search();
            *self.state.lock() = CoordinatorState::EndSearch;
            self.end.acquire();
        });
        *self.state.lock() = CoordinatorState::Drained;
        self.outcome.lock().clone().unwrap_or(SessionOutcome::Unknown)
    }

    /// Broadcasts `end-search` to every worker and records how many acks
    /// the reader loop still needs to see before it releases `end`.
    fn end_search(&self) {
        self.acks_expected.store(self.proxies.len() as u64, Ordering::SeqCst);
        for proxy in &self.proxies {
            if let Err(e) = proxy.lock().request_end_search() {
                warn!(error = %e, "failed to send end-search to a worker");
            }
        }
        // A worker stuck past its own `end-search` ack (spec.md §5's
        // cooperative-cancellation caveat) would otherwise wedge `end`
        // forever; nothing in this core can force it, so this is exactly
        // the situation `SPEC_FULL.md`'s non-goals accept.
        if self.proxies.is_empty() {
            self.end.release();
        }
    }

    /// The single reader thread (`spec.md` §4.5, §5): loops on
    /// `receive(tag = SOLVE, source = ANY)` and dispatches by opcode until
    /// every worker's `end-search-ack` has been drained.
    #[instrument(skip(self, strategy))]
    fn reader_loop(&self, strategy: &dyn Strategy<T>) {
        let mut acks_remaining: Option<u64> = None;
        loop {
            let message = match self.transport.receive(Filter::Exact(Tag::Solve), Filter::Any, MAX_MESSAGE_BYTES) {
                Ok(m) => m,
                Err(e) => {
                    self.fail(e);
                    return;
                }
            };
            let worker = WorkerId(message.source);

            match message.opcode {
                Opcode::Satisfiable => {
                    if let Err(e) = strategy.on_satisfiable(self, worker) {
                        self.fail(e);
                    }
                }
                Opcode::Unsatisfiable => {
                    self.mark_idle(worker);
                    if let Err(e) = strategy.on_unsatisfiable(self, worker) {
                        self.fail(e);
                    }
                }
                Opcode::OptimumFound => {
                    self.mark_idle(worker);
                    if self.record_solution(worker).is_err() {
                        // A worker may declare optimality on an instance
                        // for which it never reported an intermediate
                        // `satisfiable`; that's fine, the incumbent from an
                        // earlier worker (if any) still stands.
                        debug!(%worker, "optimum-found with no fresh solution to record");
                    }
                    self.conclude(SessionOutcome::OptimumFound);
                }
                Opcode::Unknown | Opcode::Unsupported => {
                    self.mark_idle(worker);
                    if let Err(e) = strategy.on_unknown(self, worker) {
                        self.fail(e);
                    }
                }
                Opcode::NewBoundFound => match wire::bound_from(&message.parameters, 0) {
                    Ok(bound) => {
                        if let Err(e) = strategy.on_new_bound_found(self, worker, bound) {
                            self.fail(e);
                        }
                    }
                    Err(e) => self.fail(e),
                },
                Opcode::EndSearch => {
                    let remaining = acks_remaining.unwrap_or_else(|| self.acks_expected.load(Ordering::SeqCst));
                    let remaining = remaining.saturating_sub(1);
                    acks_remaining = Some(remaining);
                    if remaining == 0 {
                        info!("end-search handshake complete for every worker");
                        self.end.release();
                        return;
                    }
                }
                other => {
                    self.fail(CoreError::protocol(format!("opcode {other:?} is not valid on the SOLVE tag")));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::common::SessionOutcome;
    use crate::implementation::dispatcher::WorkerDispatcher;
    use crate::implementation::solver::dummy::BruteForceSolver;
    use crate::implementation::transport::{ThreadNetwork, ThreadTransport};

    fn spawn_worker(network: &ThreadNetwork, worker: usize, solver: BruteForceSolver) -> std::thread::JoinHandle<()> {
        let transport = network.worker_handle(worker);
        let coordinator_rank = network.coordinator_rank();
        let dispatcher = WorkerDispatcher::new(transport, coordinator_rank, solver);
        std::thread::spawn(move || dispatcher.run().unwrap())
    }

    /// Sends `solve` to every worker up front; every strategy needs this much.
    fn start_every_worker(coordinator: &Coordinator<ThreadTransport>) -> CoreResult<()> {
        for i in 0..coordinator.n_workers() {
            coordinator.mark_running(WorkerId(i));
            coordinator.bump_generation(WorkerId(i));
            coordinator.worker(WorkerId(i)).lock().solve(&|_bound| {});
        }
        Ok(())
    }

    struct ConcludeOnFirstSatisfiable;

    impl Strategy<ThreadTransport> for ConcludeOnFirstSatisfiable {
        fn start_search(&self, coordinator: &Coordinator<ThreadTransport>) -> CoreResult<()> {
            start_every_worker(coordinator)
        }

        fn on_unsatisfiable(&self, coordinator: &Coordinator<ThreadTransport>, _worker: WorkerId) -> CoreResult<()> {
            coordinator.conclude(SessionOutcome::Unsatisfiable);
            Ok(())
        }
    }

    struct ConcludeUnsatisfiableOnlyWhenEveryWorkerAgrees {
        remaining: AtomicUsize,
    }

    impl Strategy<ThreadTransport> for ConcludeUnsatisfiableOnlyWhenEveryWorkerAgrees {
        fn start_search(&self, coordinator: &Coordinator<ThreadTransport>) -> CoreResult<()> {
            start_every_worker(coordinator)
        }

        fn on_unsatisfiable(&self, coordinator: &Coordinator<ThreadTransport>, _worker: WorkerId) -> CoreResult<()> {
            if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                coordinator.conclude(SessionOutcome::Unsatisfiable);
            }
            Ok(())
        }
    }

    #[test]
    fn concludes_satisfiable_and_records_the_winning_worker() {
        let network = ThreadNetwork::new(1);
        let solver = BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        let worker_handle = spawn_worker(&network, 0, solver);

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0], SolverConfig::default());
        let outcome = coordinator.solve(&ConcludeOnFirstSatisfiable);

        assert_eq!(outcome, SessionOutcome::Satisfiable);
        assert_eq!(coordinator.winner(), Some(WorkerId(0)));
        assert!(coordinator.best_solution().is_some());
        assert_eq!(coordinator.state(), CoordinatorState::Drained);
        worker_handle.join().unwrap();
    }

    #[test]
    fn concludes_unsatisfiable_only_once_every_worker_has_reported_it() {
        let network = ThreadNetwork::new(2);
        // Both workers see the same impossible instance: a single shared
        // value for two variables that must differ.
        let unsatisfiable = || BruteForceSolver::new().with_domain(vec![0]).with_domain(vec![0]).with_not_equal(0, 1);
        let first = spawn_worker(&network, 0, unsatisfiable());
        let second = spawn_worker(&network, 1, unsatisfiable());

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let strategy = ConcludeUnsatisfiableOnlyWhenEveryWorkerAgrees { remaining: AtomicUsize::new(2) };
        let outcome = coordinator.solve(&strategy);

        assert_eq!(outcome, SessionOutcome::Unsatisfiable);
        assert!(coordinator.winner().is_none());
        first.join().unwrap();
        second.join().unwrap();
    }

    #[test]
    fn a_failing_strategy_hook_surfaces_as_a_failed_outcome() {
        struct AlwaysFails;
        impl Strategy<ThreadTransport> for AlwaysFails {
            fn start_search(&self, _coordinator: &Coordinator<ThreadTransport>) -> CoreResult<()> {
                Err(CoreError::contract("deliberate test failure"))
            }
            fn on_unsatisfiable(&self, _coordinator: &Coordinator<ThreadTransport>, _worker: WorkerId) -> CoreResult<()> {
                Ok(())
            }
        }

        let network = ThreadNetwork::new(1);
        let solver = BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        let worker_handle = spawn_worker(&network, 0, solver);

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0], SolverConfig::default());
        let outcome = coordinator.solve(&AlwaysFails);

        assert!(matches!(outcome, SessionOutcome::Failed(_)));
        worker_handle.join().unwrap();
    }
}
