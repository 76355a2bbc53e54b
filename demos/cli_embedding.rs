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

//! A small, self-contained demonstration of wiring an in-process transport, a
//! handful of worker threads running [`BruteForceSolver`], and a strategy
//! together -- the shape an embedder reaching for a real transport and a real
//! [`ConstraintSolver`] backend would follow. Not shipped as a binary: this is
//! a dev-only `[[example]]`, run with `cargo run --example cli_embedding --
//! --strategy portfolio`.

use std::io::Write;
use std::path::PathBuf;
use std::thread;

use clap::{Parser, ValueEnum};
use tempfile::NamedTempFile;

use parcoord::prelude::*;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StrategyKind {
    Portfolio,
    Eps,
}

#[derive(Parser, Debug)]
#[command(about = "Run a toy instance across a handful of in-process workers")]
struct Args {
    #[arg(long, value_enum, default_value_t = StrategyKind::Portfolio)]
    strategy: StrategyKind,

    #[arg(long, default_value_t = 3)]
    workers: usize,

    #[arg(long, default_value_t = 0)]
    verbosity: u8,
}

/// A tiny satisfiable instance: three variables in `0..=3`, no two equal,
/// third variable minimized.
const INSTANCE: &str = "\
domain 0 1 2 3
domain 0 1 2 3
domain 0 1 2 3
not_equal 0 1
not_equal 1 2
not_equal 0 2
objective minimize 2
";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut instance_file = NamedTempFile::new().expect("create temp instance file");
    instance_file.write_all(INSTANCE.as_bytes()).expect("write temp instance file");
    let instance_path: PathBuf = instance_file.path().to_path_buf();

    // Rank 0 is the coordinator; ranks 1..=workers are the worker dispatchers.
    let network = ThreadNetwork::new(args.workers + 1);
    let worker_ranks: Vec<usize> = (1..=args.workers).collect();

    let dispatchers: Vec<_> = worker_ranks
        .iter()
        .map(|&rank| {
            let transport = network.worker_handle(rank);
            let solver = BruteForceSolver::new();
            WorkerDispatcher::new(transport, network.coordinator_rank(), solver)
        })
        .collect();

    let worker_threads: Vec<_> = dispatchers
        .into_iter()
        .map(|dispatcher| thread::spawn(move || dispatcher.run()))
        .collect();

    let config = SolverConfigBuilder::default()
        .verbosity(args.verbosity)
        .build()
        .expect("every field of SolverConfigBuilder has a default");
    let coordinator = Coordinator::new(network.coordinator_handle(), &worker_ranks, config);
    coordinator.load_instance(&instance_path).expect("broadcast load-instance to every worker");

    let outcome = match args.strategy {
        StrategyKind::Portfolio => {
            let strategy = Portfolio::new(Linear);
            coordinator.solve(&strategy)
        }
        StrategyKind::Eps => {
            let domains = vec![
                (VariableId(0), (0..=3).map(Into::into).collect()),
                (VariableId(1), (0..=3).map(Into::into).collect()),
                (VariableId(2), (0..=3).map(Into::into).collect()),
            ];
            let generator = LexicographicCubeGenerator::new(domains, NullChecker, 256);
            let strategy = Eps::new(generator);
            coordinator.solve(&strategy)
        }
    };

    println!("outcome: {outcome:?}");
    if let Some((winner, solution, _mapped)) = coordinator.best_solution() {
        println!("winner: worker {}", winner.0);
        println!("solution: {:?}", solution.values);
    }

    for handle in worker_threads {
        // Workers exit once `end-search` has been handshaked by the
        // coordinator; join them so the process doesn't linger.
        let _ = handle.join();
    }
}
