//! End-to-end runs of the portfolio strategy over real worker threads
//! connected through [`ThreadNetwork`], driving [`BruteForceSolver`]
//! instances to completion. Complements the in-module unit tests, which
//! exercise satisfiable/unsatisfiable decision instances and the EPS and
//! partition strategies against the same toy solver; these two cover the
//! optimization case, which is otherwise untested end to end: convergence
//! to the true optimum across disjoint bound ranges, and rebalancing once
//! one of those ranges turns out to be empty.

use std::thread::JoinHandle;

use num_bigint::BigInt;

use parcoord::prelude::*;

fn spawn_worker(network: &ThreadNetwork, worker: usize, solver: BruteForceSolver) -> JoinHandle<()> {
    let transport = network.worker_handle(worker);
    let coordinator_rank = network.coordinator_rank();
    let dispatcher = WorkerDispatcher::new(transport, coordinator_rank, solver);
    std::thread::spawn(move || dispatcher.run().unwrap())
}

/// `var1` only ever takes the values in `feasible`; tying it to `var0` with
/// an `equal` constraint restricts `var0`'s effective domain to `feasible`
/// without the toy solver needing anything richer than `equal`/`not_equal`.
fn minimize_among(feasible: &[i64]) -> BruteForceSolver {
    BruteForceSolver::new()
        .with_domain((0..=30).collect())
        .with_domain(feasible.to_vec())
        .with_equal(0, 1)
        .with_objective(0, true)
}

#[test]
fn portfolio_minimization_converges_to_the_true_optimum_across_disjoint_ranges() {
    let network = ThreadNetwork::new(3);
    let make = || minimize_among(&[5, 10, 20]);
    let workers: Vec<JoinHandle<()>> =
        (0..3).map(|i| spawn_worker(&network, i, make())).collect();

    let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1, 2], SolverConfig::default());
    let outcome = coordinator.solve(&Portfolio::new(Linear));

    assert_eq!(outcome, SessionOutcome::OptimumFound);
    let (_winner, solution, _mapped) = coordinator.best_solution().expect("an optimum was recorded");
    assert_eq!(solution.values[0], BigInt::from(5));

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn portfolio_rebalances_past_a_sub_range_with_no_feasible_solution() {
    // Linear allocation over [0, 30] with 3 workers hands worker 0 the
    // sub-range [0, 10]; the only feasible values are 15 and 20, both
    // outside it, so worker 0 must report unsatisfiable, the coordinator
    // must raise the shared lower bound past 10, and the remaining search
    // must still land on the true optimum of 15.
    let network = ThreadNetwork::new(3);
    let make = || minimize_among(&[15, 20]);
    let workers: Vec<JoinHandle<()>> =
        (0..3).map(|i| spawn_worker(&network, i, make())).collect();

    let coordinator = Coordinator::new(network.coordinator_handle(), &[0, 1, 2], SolverConfig::default());
    let outcome = coordinator.solve(&Portfolio::new(Linear));

    assert_eq!(outcome, SessionOutcome::OptimumFound);
    let (_winner, solution, _mapped) = coordinator.best_solution().expect("an optimum was recorded");
    assert_eq!(solution.values[0], BigInt::from(15));

    for worker in workers {
        worker.join().unwrap();
    }
}
