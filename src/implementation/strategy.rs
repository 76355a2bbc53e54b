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

//! The three parallel search strategies (`spec.md` §4.6, §4.8, §4.9):
//! [`Portfolio`] (shared instance, cooperative bound rebalancing),
//! [`Eps`] (disjoint cubes over the whole search space) and [`Partition`]
//! (disjoint constraint blocks with a shared cutset). Each is plugged into
//! [`crate::implementation::coordinator::Coordinator`] through the
//! [`Strategy`] trait; the coordinator itself never branches on which one
//! is running.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use fxhash::FxHashMap;
use num_bigint::BigInt;
use num_traits::One;
use parking_lot::Mutex;
use tracing::debug;

use crate::abstraction::allocation::BoundAllocationStrategy;
use crate::abstraction::generator::CubeGenerator;
use crate::abstraction::strategy::Strategy;
use crate::abstraction::transport::Transport;
use crate::common::{Bound, MappedSolution, Objective, Sense, SessionOutcome, VariableId, WorkerId};
use crate::error::CoreResult;
use crate::implementation::coordinator::Coordinator;

// ----------------------------------------------------------------------------
// --- PORTFOLIO ----------------------------------------------------------------
// ----------------------------------------------------------------------------

/// All workers attack the same instance. For a decision instance they race
/// unmodified; for an optimization instance the coordinator additionally
/// splits `[lower, upper]` across workers with a [`BoundAllocationStrategy`]
/// and rebalances that split as bounds improve (`spec.md` §4.6).
pub struct Portfolio<A: BoundAllocationStrategy> {
    allocation: A,
    cuts: Mutex<Vec<Bound>>,
}

impl<A: BoundAllocationStrategy> Portfolio<A> {
    pub fn new(allocation: A) -> Self {
        Portfolio { allocation, cuts: Mutex::new(Vec::new()) }
    }

    /// `spec.md` §4.6's `updateBounds()`: recompute the split, interrupt any
    /// worker left with an empty sub-range, and push a changed bound (with a
    /// reset + re-solve if the worker had gone idle) to everyone else.
    fn update_bounds<T: Transport + Clone + 'static>(
        &self,
        coordinator: &Coordinator<T>,
        lower: &Bound,
        upper: &Bound,
    ) -> CoreResult<()> {
        let old = self.cuts.lock().clone();
        let n = coordinator.n_workers();
        let new_cuts = self.allocation.rebalance(&old, lower, upper, n);
        let sense = coordinator.objective().lock().as_ref().map(|o| o.sense);

        for i in 0..n {
            let worker = WorkerId(i);
            if new_cuts[i] == new_cuts[i + 1] {
                coordinator.worker(worker).lock().interrupt();
                continue;
            }
            let assigned = match sense {
                Some(Sense::Minimize) => new_cuts[i + 1].clone(),
                Some(Sense::Maximize) => new_cuts[i].clone(),
                None => continue,
            };
            let previous = coordinator.descriptors().lock()[i].current_bound.clone();
            if previous.as_ref() == Some(&assigned) {
                continue;
            }
            let was_running = coordinator.running(worker);
            let mut proxy = coordinator.worker(worker).lock();
            match sense {
                Some(Sense::Minimize) => proxy.set_upper_bound(assigned.clone()),
                Some(Sense::Maximize) => proxy.set_lower_bound(assigned.clone()),
                None => {}
            }
            coordinator.set_current_bound(worker, Some(assigned));
            if !was_running {
                proxy.reset();
                coordinator.mark_running(worker);
                coordinator.bump_generation(worker);
                proxy.solve(&|_bound| {});
            }
        }
        *self.cuts.lock() = new_cuts;
        Ok(())
    }
}

impl<T: Transport + Clone + 'static, A: BoundAllocationStrategy> Strategy<T> for Portfolio<A> {
    fn before_search(&self, coordinator: &Coordinator<T>) -> CoreResult<()> {
        let is_optimization = coordinator.worker(WorkerId(0)).lock().is_optimization();
        if !is_optimization {
            return Ok(());
        }
        let (lower, upper, sense) = {
            let proxy = coordinator.worker(WorkerId(0)).lock();
            let sense = if proxy.is_minimization() { Sense::Minimize } else { Sense::Maximize };
            (proxy.lower_bound(), proxy.upper_bound(), sense)
        };
        let cuts = self.allocation.allocate(&lower, &upper, coordinator.n_workers());
        *coordinator.objective().lock() = Some(Objective::new(lower, upper, sense));
        *self.cuts.lock() = cuts;
        Ok(())
    }

    fn before_search_worker(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        let cuts = self.cuts.lock().clone();
        if cuts.is_empty() {
            return Ok(());
        }
        let sense = coordinator.objective().lock().as_ref().map(|o| o.sense);
        let mut proxy = coordinator.worker(worker).lock();
        let i = worker.0;
        match sense {
            Some(Sense::Minimize) => {
                proxy.set_upper_bound(cuts[i + 1].clone());
                coordinator.set_current_bound(worker, Some(cuts[i + 1].clone()));
            }
            Some(Sense::Maximize) => {
                proxy.set_lower_bound(cuts[i].clone());
                coordinator.set_current_bound(worker, Some(cuts[i].clone()));
            }
            None => {}
        }
        Ok(())
    }

    fn start_search(&self, coordinator: &Coordinator<T>) -> CoreResult<()> {
        for i in 0..coordinator.n_workers() {
            let worker = WorkerId(i);
            coordinator.mark_running(worker);
            coordinator.bump_generation(worker);
            coordinator.worker(worker).lock().solve(&|_bound| {});
        }
        Ok(())
    }

    fn on_new_bound_found(&self, coordinator: &Coordinator<T>, worker: WorkerId, bound: Bound) -> CoreResult<()> {
        let (lower, upper) = {
            let mut objective = coordinator.objective().lock();
            let Some(obj) = objective.as_mut() else { return Ok(()) };
            let improved = match obj.sense {
                Sense::Minimize => bound < obj.upper,
                Sense::Maximize => bound > obj.lower,
            };
            if !improved {
                return Ok(());
            }
            match obj.sense {
                Sense::Minimize => obj.upper = bound,
                Sense::Maximize => obj.lower = bound,
            }
            (obj.lower.clone(), obj.upper.clone())
        };
        // `bound < upper` / `bound > lower` above is a strict inequality
        // evaluated one message at a time on the single reader thread, so
        // two workers reporting an identical bound can never both "win" --
        // the second arrival simply fails the improvement test. That is
        // `spec.md` §4.6's "smallest src wins" tie-break, for free.
        coordinator.record_solution(worker)?;
        self.update_bounds(coordinator, &lower, &upper)
    }

    fn on_unsatisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        let outcome = {
            let mut objective = coordinator.objective().lock();
            let Some(obj) = objective.as_mut() else {
                // No objective: every worker attacks the identical full
                // instance, so a single authoritative UNSAT is conclusive.
                return Ok(if coordinator.conclude(SessionOutcome::Unsatisfiable) { () } else { () });
            };
            let cuts = self.cuts.lock().clone();
            let i = worker.0;
            if i + 1 >= cuts.len() {
                return Ok(());
            }
            match obj.sense {
                Sense::Minimize => {
                    let candidate = cuts[i + 1].value().clone() + BigInt::one();
                    if candidate > *obj.lower.value() {
                        obj.lower = Bound::new(candidate);
                    }
                }
                Sense::Maximize => {
                    let candidate = cuts[i].value().clone() - BigInt::one();
                    if candidate < *obj.upper.value() {
                        obj.upper = Bound::new(candidate);
                    }
                }
            }
            if obj.is_empty() {
                Some((obj.lower.clone(), obj.upper.clone()))
            } else {
                None
            }
        };
        match outcome {
            Some(_) => {
                let outcome = if coordinator.best_solution().is_some() {
                    SessionOutcome::OptimumFound
                } else {
                    SessionOutcome::Unsatisfiable
                };
                coordinator.conclude(outcome);
                Ok(())
            }
            None => {
                let (lower, upper) = {
                    let objective = coordinator.objective().lock();
                    let obj = objective.as_ref().expect("objective set above");
                    (obj.lower.clone(), obj.upper.clone())
                };
                self.update_bounds(coordinator, &lower, &upper)
            }
        }
    }
}

// ----------------------------------------------------------------------------
// --- EPS ------------------------------------------------------------------------
// ----------------------------------------------------------------------------

/// All workers solve the same instance on disjoint cubes drawn from a
/// shared generator (`spec.md` §4.8).
///
/// `spec.md` describes a dedicated generator task pulling from a blocking
/// idle-worker queue, concurrently with the reader loop. This crate's
/// reader loop is the only thread dispatching strategy callbacks, so the
/// generator task collapses into a reactive one: a cube is handed to a
/// worker the instant it goes idle (`start_search` for the initial wave,
/// `on_unsatisfiable`/`on_unknown` afterwards) instead of running on its
/// own thread. Externally this is indistinguishable from the queue-based
/// design -- a worker is never left idle while an ungenerated cube remains.
pub struct Eps<G: CubeGenerator> {
    generator: Mutex<G>,
    exhausted: AtomicBool,
    /// Cubes handed out but not yet answered -- `spec.md`'s pending-cube
    /// semaphore, as a count rather than an object to block on (nothing in
    /// this reactive design ever waits on it).
    outstanding: AtomicUsize,
}

impl<G: CubeGenerator> Eps<G> {
    pub fn new(generator: G) -> Self {
        Eps { generator: Mutex::new(generator), exhausted: AtomicBool::new(false), outstanding: AtomicUsize::new(0) }
    }

    fn dispatch_next<T: Transport + Clone + 'static>(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        if coordinator.is_concluded() {
            return Ok(());
        }
        if self.exhausted.load(Ordering::SeqCst) {
            self.conclude_if_drained(coordinator);
            return Ok(());
        }
        match self.generator.lock().next_cube() {
            Some(cube) => {
                self.outstanding.fetch_add(1, Ordering::SeqCst);
                let mut proxy = coordinator.worker(worker).lock();
                proxy.reset();
                coordinator.mark_running(worker);
                coordinator.bump_generation(worker);
                proxy.solve_assumptions(&cube, &|_bound| {});
                Ok(())
            }
            None => {
                self.exhausted.store(true, Ordering::SeqCst);
                self.conclude_if_drained(coordinator);
                Ok(())
            }
        }
    }

    /// `spec.md` §4.8 step 5: once the generator is exhausted, the search is
    /// only really over once every cube handed out before exhaustion has
    /// come back unsatisfiable.
    fn conclude_if_drained<T: Transport + Clone + 'static>(&self, coordinator: &Coordinator<T>) {
        if self.outstanding.load(Ordering::SeqCst) == 0 {
            coordinator.conclude(SessionOutcome::Unsatisfiable);
        }
    }
}

impl<T: Transport + Clone + 'static, G: CubeGenerator> Strategy<T> for Eps<G> {
    fn start_search(&self, coordinator: &Coordinator<T>) -> CoreResult<()> {
        for i in 0..coordinator.n_workers() {
            self.dispatch_next(coordinator, WorkerId(i))?;
            if coordinator.is_concluded() {
                break;
            }
        }
        Ok(())
    }

    fn on_satisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        coordinator.record_solution(worker)?;
        if coordinator.conclude(SessionOutcome::Satisfiable) {
            coordinator.interrupt();
        }
        Ok(())
    }

    fn on_unsatisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.dispatch_next(coordinator, worker)
    }

    fn on_unknown(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        // Not named by `spec.md` for EPS; treated the same as an
        // unsatisfiable reply so a worker that gave up never sits idle
        // forever while cubes remain.
        debug!(%worker, "eps: worker reported unknown, moving to the next cube");
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.dispatch_next(coordinator, worker)
    }
}

// ----------------------------------------------------------------------------
// --- PARTITION ------------------------------------------------------------------
// ----------------------------------------------------------------------------

/// A decomposition of the problem into one constraint block per worker plus
/// a cutset of variables shared across blocks (`spec.md` §4.9). The
/// decomposition itself -- reading the constraint hypergraph and running a
/// partitioner over it -- is outside this narrow crate's solver interface;
/// it is supplied by the embedding, which has direct access to the model.
pub struct PartitionPlan {
    /// `blocks[i]` lists the decision variables worker `i` owns. Passed to
    /// `set_decision_variables` in `before_search_worker` -- the closest
    /// lever the narrow [`crate::abstraction::solver::ConstraintSolver`]
    /// interface exposes to `spec.md`'s literal "set every foreign
    /// constraint's `ignored` flag", which has no equivalent method here.
    pub blocks: Vec<Vec<VariableId>>,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Answer {
    Satisfiable,
    Unsatisfiable,
}

struct Round {
    generations: Vec<u64>,
    answers: Vec<Option<Answer>>,
    decided: bool,
}

/// Enumerates cutset assignments and, for each one, broadcasts it to every
/// worker and waits for all of them to answer before deciding the cube's
/// fate (`spec.md` §4.9).
pub struct Partition<G: CubeGenerator> {
    plan: PartitionPlan,
    generator: Mutex<G>,
    round: Mutex<Round>,
}

impl<G: CubeGenerator> Partition<G> {
    pub fn new(plan: PartitionPlan, generator: G) -> Self {
        let n = plan.blocks.len();
        Partition { plan, generator: Mutex::new(generator), round: Mutex::new(Round { generations: vec![0; n], answers: vec![None; n], decided: true }) }
    }

    fn broadcast_next_cube<T: Transport + Clone + 'static>(&self, coordinator: &Coordinator<T>) -> CoreResult<()> {
        let cube = self.generator.lock().next_cube();
        let Some(cube) = cube else {
            coordinator.conclude(SessionOutcome::Unsatisfiable);
            return Ok(());
        };
        let n = coordinator.n_workers();
        let mut generations = Vec::with_capacity(n);
        for i in 0..n {
            let worker = WorkerId(i);
            let mut proxy = coordinator.worker(worker).lock();
            proxy.reset();
            coordinator.mark_running(worker);
            generations.push(coordinator.bump_generation(worker));
            proxy.solve_assumptions(&cube, &|_bound| {});
        }
        *self.round.lock() = Round { generations, answers: vec![None; n], decided: false };
        Ok(())
    }

    fn record_answer<T: Transport + Clone + 'static>(
        &self,
        coordinator: &Coordinator<T>,
        worker: WorkerId,
        answer: Answer,
    ) -> CoreResult<()> {
        let should_advance = {
            let mut round = self.round.lock();
            if round.decided || coordinator.generation(worker) != round.generations[worker.0] {
                // A stale reply for a cube this strategy has already moved
                // on from (or already decided).
                return Ok(());
            }
            round.answers[worker.0] = Some(answer);
            if answer == Answer::Unsatisfiable {
                round.decided = true;
                Advance::NextCube
            } else if round.answers.iter().all(|a| *a == Some(Answer::Satisfiable)) {
                round.decided = true;
                Advance::Publish
            } else {
                Advance::Wait
            }
        };
        match should_advance {
            Advance::NextCube => {
                coordinator.interrupt();
                self.broadcast_next_cube(coordinator)
            }
            Advance::Publish => {
                self.publish_merged_solution(coordinator)?;
                coordinator.conclude(SessionOutcome::Satisfiable);
                Ok(())
            }
            Advance::Wait => Ok(()),
        }
    }

    /// `spec.md` §4.9's merge: for each variable, take the value from the
    /// worker whose partition owns it, keyed by the naming convention every
    /// [`crate::abstraction::solver::ConstraintSolver`] in this crate
    /// follows for positional variables (`VariableId`'s `Display`, `x{id}`)
    /// -- the same assumption `mapSolution` already rests on wherever a
    /// remote worker's own variable names aren't otherwise recoverable (see
    /// `RemoteSolverProxy::variables_mapping`).
    fn publish_merged_solution<T: Transport + Clone + 'static>(&self, coordinator: &Coordinator<T>) -> CoreResult<()> {
        let mut merged = FxHashMap::default();
        for (i, block) in self.plan.blocks.iter().enumerate() {
            let mapped = coordinator.worker(WorkerId(i)).lock().map_solution(false)?;
            for variable in block {
                if let Some(value) = mapped.get(&variable.to_string()) {
                    merged.insert(variable.to_string(), value.clone());
                }
            }
        }
        coordinator.record_mapped_solution(WorkerId(0), MappedSolution(merged));
        Ok(())
    }
}

enum Advance {
    NextCube,
    Publish,
    Wait,
}

impl<T: Transport + Clone + 'static, G: CubeGenerator> Strategy<T> for Partition<G> {
    fn before_search_worker(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        coordinator.worker(worker).lock().set_decision_variables(self.plan.blocks[worker.0].clone());
        Ok(())
    }

    fn start_search(&self, coordinator: &Coordinator<T>) -> CoreResult<()> {
        self.broadcast_next_cube(coordinator)
    }

    fn on_satisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        self.record_answer(coordinator, worker, Answer::Satisfiable)
    }

    fn on_unsatisfiable(&self, coordinator: &Coordinator<T>, worker: WorkerId) -> CoreResult<()> {
        self.record_answer(coordinator, worker, Answer::Unsatisfiable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SessionOutcome;
    use crate::implementation::allocation::Linear;
    use crate::implementation::checker::NullChecker;
    use crate::implementation::coordinator::CoordinatorState;
    use crate::implementation::dispatcher::WorkerDispatcher;
    use crate::implementation::generator::{Domain, LexicographicCubeGenerator};
    use crate::implementation::solver::dummy::BruteForceSolver;
    use crate::implementation::transport::{ThreadNetwork, ThreadTransport};
    use crate::config::SolverConfig;

    fn spawn_worker(network: &ThreadNetwork, worker: usize, solver: BruteForceSolver) -> std::thread::JoinHandle<()> {
        let transport = network.worker_handle(worker);
        let coordinator_rank = network.coordinator_rank();
        let dispatcher = WorkerDispatcher::new(transport, coordinator_rank, solver);
        std::thread::spawn(move || dispatcher.run().unwrap())
    }

    #[test]
    fn portfolio_races_two_workers_on_the_same_satisfiable_decision_instance() {
        let network = ThreadNetwork::new(2);
        let make = || BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        let a = spawn_worker(&network, 0, make());
        let b = spawn_worker(&network, 1, make());

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let outcome = coordinator.solve(&Portfolio::new(Linear));

        assert_eq!(outcome, SessionOutcome::Satisfiable);
        assert!(coordinator.best_solution().is_some());
        assert_eq!(coordinator.state(), CoordinatorState::Drained);
        a.join().unwrap();
        b.join().unwrap();
    }

    #[test]
    fn portfolio_concludes_unsatisfiable_on_a_shared_impossible_decision_instance() {
        let network = ThreadNetwork::new(2);
        let make = || BruteForceSolver::new().with_domain(vec![0]).with_domain(vec![0]).with_not_equal(0, 1);
        let a = spawn_worker(&network, 0, make());
        let b = spawn_worker(&network, 1, make());

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let outcome = coordinator.solve(&Portfolio::new(Linear));

        assert_eq!(outcome, SessionOutcome::Unsatisfiable);
        a.join().unwrap();
        b.join().unwrap();
    }

    fn domains() -> Vec<Domain> {
        vec![(VariableId(0), vec![BigInt::from(0), BigInt::from(1)]), (VariableId(1), vec![BigInt::from(0), BigInt::from(1)])]
    }

    #[test]
    fn eps_finds_the_satisfiable_cube_among_several_unsatisfiable_ones() {
        let network = ThreadNetwork::new(2);
        let make = || BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        let a = spawn_worker(&network, 0, make());
        let b = spawn_worker(&network, 1, make());

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let generator = LexicographicCubeGenerator::new(domains(), NullChecker, 100);
        let outcome = coordinator.solve(&Eps::new(generator));

        assert_eq!(outcome, SessionOutcome::Satisfiable);
        a.join().unwrap();
        b.join().unwrap();
    }

    #[test]
    fn eps_concludes_unsatisfiable_once_every_cube_is_exhausted() {
        let network = ThreadNetwork::new(2);
        let make = || BruteForceSolver::new().with_domain(vec![0]).with_domain(vec![0]).with_not_equal(0, 1);
        let a = spawn_worker(&network, 0, make());
        let b = spawn_worker(&network, 1, make());

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let single_domain = vec![(VariableId(0), vec![BigInt::from(0)]), (VariableId(1), vec![BigInt::from(0)])];
        let generator = LexicographicCubeGenerator::new(single_domain, NullChecker, 100);
        let outcome = coordinator.solve(&Eps::new(generator));

        assert_eq!(outcome, SessionOutcome::Unsatisfiable);
        a.join().unwrap();
        b.join().unwrap();
    }

    #[test]
    fn partition_merges_two_workers_each_owning_one_variable() {
        let network = ThreadNetwork::new(2);
        // Two single-variable workers, no cutset: the lone cube is the
        // empty cube, broadcast once, answered satisfiable by both.
        let a = spawn_worker(&network, 0, BruteForceSolver::new().with_domain(vec![0, 1]));
        let b = spawn_worker(&network, 1, BruteForceSolver::new().with_domain(vec![0, 1]));

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let plan = PartitionPlan { blocks: vec![vec![VariableId(0)], vec![VariableId(0)]] };
        let generator = LexicographicCubeGenerator::<NullChecker>::new(vec![], NullChecker, 10);
        let outcome = coordinator.solve(&Partition::new(plan, generator));

        assert_eq!(outcome, SessionOutcome::Satisfiable);
        assert!(coordinator.best_solution().is_some());
        a.join().unwrap();
        b.join().unwrap();
    }

    #[test]
    fn partition_concludes_unsatisfiable_when_a_worker_rejects_every_cutset_cube() {
        let network = ThreadNetwork::new(2);
        let a = spawn_worker(&network, 0, BruteForceSolver::new().with_domain(vec![0]));
        // worker 1's own variable has domain {0}, but it is also given an
        // (infeasible under its model) cutset assumption pinning it to 1.
        let b = spawn_worker(&network, 1, BruteForceSolver::new().with_domain(vec![0]));

        let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1], SolverConfig::default());
        let plan = PartitionPlan { blocks: vec![vec![VariableId(0)], vec![VariableId(0)]] };
        let cutset = vec![(VariableId(0), vec![BigInt::from(1)])];
        let generator = LexicographicCubeGenerator::new(cutset, NullChecker, 10);
        let outcome = coordinator.solve(&Partition::new(plan, generator));

        assert_eq!(outcome, SessionOutcome::Unsatisfiable);
        a.join().unwrap();
        b.join().unwrap();
    }
}
