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

//! [`BruteForceSolver`]: a toy [`ConstraintSolver`] over small finite integer
//! domains, used by the test suite and the embedding demo in place of a real
//! backend. It understands exactly two constraint shapes (`NotEqual`,
//! `Equal` between a pair of variables) and an optional linear objective
//! that is just "minimize/maximize one variable" -- enough to exercise every
//! strategy without pulling in an actual solver dependency.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use fxhash::FxHashMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use tracing::{debug, trace};

use crate::abstraction::solver::{BoundCallback, ConstraintSolver};
use crate::common::{Bound, Cube, Relation, SolveTermination, VariableId};
use crate::error::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Constraint {
    NotEqual(usize, usize),
    Equal(usize, usize),
}

/// A brute-force reference backend: enumerates the cartesian product of
/// each variable's explicit finite domain, in variable order, filtering by
/// the loaded constraints and (if present) the current objective window.
pub struct BruteForceSolver {
    domains: Vec<Vec<i64>>,
    constraints: Vec<Constraint>,
    objective_variable: Option<usize>,
    minimize: bool,
    auxiliary: Vec<VariableId>,
    lower_bound: Bound,
    upper_bound: Bound,
    current_bound: Bound,
    solution: Vec<BigInt>,
    has_solution: bool,
    interrupted: AtomicBool,
    timeout: Option<Duration>,
    verbosity: u8,
    log_file: Option<PathBuf>,
    value_heuristic: Option<(Vec<VariableId>, Vec<BigInt>)>,
}

impl Default for BruteForceSolver {
    fn default() -> Self {
        BruteForceSolver {
            domains: Vec::new(),
            constraints: Vec::new(),
            objective_variable: None,
            minimize: true,
            auxiliary: Vec::new(),
            lower_bound: Bound::zero(),
            upper_bound: Bound::zero(),
            current_bound: Bound::zero(),
            solution: Vec::new(),
            has_solution: false,
            interrupted: AtomicBool::new(false),
            timeout: None,
            verbosity: 0,
            log_file: None,
            value_heuristic: None,
        }
    }
}

impl BruteForceSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares variable `index`'s explicit finite domain. Variables must be
    /// declared in order starting at 0.
    pub fn with_domain(mut self, values: Vec<i64>) -> Self {
        self.domains.push(values);
        self
    }

    pub fn with_not_equal(mut self, a: usize, b: usize) -> Self {
        self.constraints.push(Constraint::NotEqual(a, b));
        self
    }

    pub fn with_equal(mut self, a: usize, b: usize) -> Self {
        self.constraints.push(Constraint::Equal(a, b));
        self
    }

    pub fn with_objective(mut self, variable: usize, minimize: bool) -> Self {
        self.objective_variable = Some(variable);
        self.minimize = minimize;
        let seed = self.domains.get(variable).and_then(|d| d.iter().min().copied()).unwrap_or(0);
        let ceiling = self.domains.get(variable).and_then(|d| d.iter().max().copied()).unwrap_or(0);
        self.lower_bound = Bound::new(seed);
        self.upper_bound = Bound::new(ceiling);
        self
    }

    pub fn with_auxiliary(mut self, variables: Vec<usize>) -> Self {
        self.auxiliary = variables.into_iter().map(VariableId).collect();
        self
    }

    fn variable_name(index: usize) -> String {
        format!("x{index}")
    }

    fn parse_text(&mut self, text: &str) -> CoreResult<()> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                ["domain", rest @ ..] => {
                    let values = rest
                        .iter()
                        .map(|t| t.parse::<i64>().map_err(|_| CoreError::protocol(format!("bad domain value {t:?}"))))
                        .collect::<CoreResult<Vec<_>>>()?;
                    self.domains.push(values);
                }
                ["not_equal", a, b] => {
                    let a = a.parse().map_err(|_| CoreError::protocol("bad not_equal index"))?;
                    let b = b.parse().map_err(|_| CoreError::protocol("bad not_equal index"))?;
                    self.constraints.push(Constraint::NotEqual(a, b));
                }
                ["equal", a, b] => {
                    let a = a.parse().map_err(|_| CoreError::protocol("bad equal index"))?;
                    let b = b.parse().map_err(|_| CoreError::protocol("bad equal index"))?;
                    self.constraints.push(Constraint::Equal(a, b));
                }
                ["objective", sense, var] => {
                    let var = var.parse().map_err(|_| CoreError::protocol("bad objective variable"))?;
                    let minimize = match *sense {
                        "minimize" => true,
                        "maximize" => false,
                        other => return Err(CoreError::protocol(format!("unknown objective sense {other:?}"))),
                    };
                    let seed = self.domains.get(var).and_then(|d| d.iter().min().copied()).unwrap_or(0);
                    let ceiling = self.domains.get(var).and_then(|d| d.iter().max().copied()).unwrap_or(0);
                    self.objective_variable = Some(var);
                    self.minimize = minimize;
                    self.lower_bound = Bound::new(seed);
                    self.upper_bound = Bound::new(ceiling);
                }
                ["auxiliary", rest @ ..] => {
                    for t in rest {
                        let idx = t.parse().map_err(|_| CoreError::protocol("bad auxiliary index"))?;
                        self.auxiliary.push(VariableId(idx));
                    }
                }
                other => return Err(CoreError::protocol(format!("unrecognized instance line {other:?}"))),
            }
        }
        Ok(())
    }

    fn satisfies_constraints(&self, assignment: &[i64]) -> bool {
        self.constraints.iter().all(|c| match *c {
            Constraint::NotEqual(a, b) => assignment[a] != assignment[b],
            Constraint::Equal(a, b) => assignment[a] == assignment[b],
        })
    }

    fn within_objective_window(&self, assignment: &[i64]) -> bool {
        match self.objective_variable {
            None => true,
            Some(var) => {
                let value = BigInt::from(assignment[var]);
                value >= *self.lower_bound.value() && value <= *self.upper_bound.value()
            }
        }
    }

    /// Restricts each variable's candidate values per the cube's
    /// assumptions, preserving declared order within each domain.
    fn restricted_domains(&self, cube: &Cube) -> Vec<Vec<i64>> {
        let mut domains = self.domains.clone();
        for assumption in cube.assumptions() {
            let idx = assumption.variable.id();
            let value = assumption.value.to_i64().expect("demo domains fit in i64");
            match assumption.relation {
                Relation::Equal => domains[idx].retain(|v| *v == value),
                Relation::NotEqual => domains[idx].retain(|v| *v != value),
            }
        }
        domains
    }

    fn ordered_candidates(&self, var: usize, domain: &[i64]) -> Vec<i64> {
        if let Some((vars, values)) = &self.value_heuristic {
            if let Some(pos) = vars.iter().position(|v| v.id() == var) {
                let preferred = values[pos].to_i64();
                if let Some(preferred) = preferred {
                    let mut ordered = Vec::with_capacity(domain.len());
                    if domain.contains(&preferred) {
                        ordered.push(preferred);
                    }
                    ordered.extend(domain.iter().copied().filter(|v| *v != preferred));
                    return ordered;
                }
            }
        }
        domain.to_vec()
    }

    fn search(&mut self, domains: &[Vec<i64>], on_bound: BoundCallback<'_>, deadline: Option<Instant>) -> SolveTermination {
        let mut assignment = vec![0i64; domains.len()];
        let mut found_any = false;
        let mut best: Option<Vec<i64>> = None;
        let optimizing = self.objective_variable.is_some();

        let outcome = self.backtrack(0, domains, &mut assignment, &mut best, &mut found_any, on_bound, deadline);

        if let Some(best) = best {
            self.solution = best.iter().map(|v| BigInt::from(*v)).collect();
            self.has_solution = true;
        }

        match outcome {
            SearchOutcome::Interrupted => SolveTermination::Unknown,
            SearchOutcome::Exhausted if found_any && optimizing => SolveTermination::OptimumFound,
            SearchOutcome::Exhausted if found_any => SolveTermination::Satisfiable,
            SearchOutcome::Exhausted => SolveTermination::Unsatisfiable,
        }
    }

    fn backtrack(
        &mut self,
        depth: usize,
        domains: &[Vec<i64>],
        assignment: &mut Vec<i64>,
        best: &mut Option<Vec<i64>>,
        found_any: &mut bool,
        on_bound: BoundCallback<'_>,
        deadline: Option<Instant>,
    ) -> SearchOutcome {
        if self.interrupted.load(Ordering::SeqCst) {
            return SearchOutcome::Interrupted;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                self.interrupted.store(true, Ordering::SeqCst);
                return SearchOutcome::Interrupted;
            }
        }

        if depth == domains.len() {
            if !self.satisfies_constraints(assignment) || !self.within_objective_window(assignment) {
                return SearchOutcome::Exhausted;
            }
            *found_any = true;
            match self.objective_variable {
                None => {
                    *best = Some(assignment.clone());
                    return SearchOutcome::Exhausted;
                }
                Some(var) => {
                    let value = assignment[var];
                    let improves = match best {
                        None => true,
                        Some(current) => {
                            if self.minimize {
                                value < current[var]
                            } else {
                                value > current[var]
                            }
                        }
                    };
                    if improves {
                        *best = Some(assignment.clone());
                        let new_bound = Bound::new(value);
                        trace!(?new_bound, "brute force improved bound");
                        on_bound(new_bound.clone());
                        if self.minimize {
                            self.upper_bound = new_bound.clone();
                        } else {
                            self.lower_bound = new_bound.clone();
                        }
                        self.current_bound = new_bound;
                    }
                    return SearchOutcome::Exhausted;
                }
            }
        }

        let candidates = self.ordered_candidates(depth, &domains[depth]);
        for value in candidates {
            assignment[depth] = value;
            match self.backtrack(depth + 1, domains, assignment, best, found_any, on_bound, deadline) {
                SearchOutcome::Interrupted => return SearchOutcome::Interrupted,
                SearchOutcome::Exhausted => {}
            }
        }
        SearchOutcome::Exhausted
    }
}

enum SearchOutcome {
    Exhausted,
    Interrupted,
}

impl ConstraintSolver for BruteForceSolver {
    fn load_instance(&mut self, file: &Path) -> CoreResult<()> {
        let text = fs::read_to_string(file).map_err(|e| CoreError::protocol(format!("reading {file:?}: {e}")))?;
        debug!(path = ?file, "loading brute-force instance");
        self.parse_text(&text)
    }

    fn reset(&mut self) {
        self.solution.clear();
        self.has_solution = false;
        self.current_bound = Bound::zero();
        self.interrupted.store(false, Ordering::SeqCst);
    }

    fn n_variables(&self) -> usize {
        self.domains.len()
    }

    fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn is_optimization(&self) -> bool {
        self.objective_variable.is_some()
    }

    fn is_minimization(&self) -> bool {
        self.minimize
    }

    fn auxiliary_variables(&self) -> Vec<VariableId> {
        self.auxiliary.clone()
    }

    fn variables_mapping(&self) -> CoreResult<FxHashMap<String, VariableId>> {
        Ok((0..self.domains.len()).map(|i| (Self::variable_name(i), VariableId(i))).collect())
    }

    fn solve(&mut self, on_bound: BoundCallback<'_>) -> SolveTermination {
        let deadline = self.timeout.map(|d| Instant::now() + d);
        let domains = self.domains.clone();
        self.search(&domains, on_bound, deadline)
    }

    fn solve_file(&mut self, file: &Path, on_bound: BoundCallback<'_>) -> SolveTermination {
        if let Err(e) = self.load_instance(file) {
            tracing::warn!(error = %e, "solve_file failed to load instance");
            return SolveTermination::Unknown;
        }
        self.solve(on_bound)
    }

    fn solve_assumptions(&mut self, cube: &Cube, on_bound: BoundCallback<'_>) -> SolveTermination {
        let deadline = self.timeout.map(|d| Instant::now() + d);
        let domains = self.restricted_domains(cube);
        self.search(&domains, on_bound, deadline)
    }

    fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    fn solution(&self) -> CoreResult<Vec<BigInt>> {
        if !self.has_solution {
            return Err(CoreError::contract("no solution recorded yet"));
        }
        Ok(self.solution.clone())
    }

    fn map_solution(&self, exclude_auxiliary: bool) -> CoreResult<FxHashMap<String, BigInt>> {
        let solution = self.solution()?;
        Ok(solution
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !exclude_auxiliary || !self.auxiliary.contains(&VariableId(*i)))
            .map(|(i, v)| (Self::variable_name(i), v))
            .collect())
    }

    fn check_solution(&self) -> CoreResult<bool> {
        let solution = self.solution()?;
        let assignment: Vec<i64> = solution
            .iter()
            .map(|v| v.to_i64().ok_or_else(|| CoreError::contract("solution value out of i64 range")))
            .collect::<CoreResult<_>>()?;
        Ok(self.satisfies_constraints(&assignment))
    }

    fn check_solution_assignment(&self, assignment: &FxHashMap<String, BigInt>) -> CoreResult<bool> {
        let mut values = vec![0i64; self.domains.len()];
        for i in 0..self.domains.len() {
            let key = Self::variable_name(i);
            let value = assignment
                .get(&key)
                .ok_or_else(|| CoreError::contract(format!("assignment missing {key}")))?;
            values[i] = value.to_i64().ok_or_else(|| CoreError::contract("assignment value out of i64 range"))?;
        }
        Ok(self.satisfies_constraints(&values))
    }

    fn set_lower_bound(&mut self, bound: Bound) {
        self.lower_bound = bound;
    }

    fn set_upper_bound(&mut self, bound: Bound) {
        self.upper_bound = bound;
    }

    fn set_bounds(&mut self, lower: Bound, upper: Bound) {
        self.lower_bound = lower;
        self.upper_bound = upper;
    }

    fn lower_bound(&self) -> Bound {
        self.lower_bound.clone()
    }

    fn upper_bound(&self) -> Bound {
        self.upper_bound.clone()
    }

    fn current_bound(&self) -> Bound {
        self.current_bound.clone()
    }

    fn set_decision_variables(&mut self, _variables: Vec<VariableId>) {
        // The brute-force backend always branches on every variable in
        // declaration order; a decision-variable subset would only narrow
        // which ones a real solver branches on.
    }

    fn set_value_heuristic_static(&mut self, variables: Vec<VariableId>, ordered_values: Vec<BigInt>) {
        self.value_heuristic = Some((variables, ordered_values));
    }

    fn set_timeout(&mut self, seconds: u64) {
        self.timeout = Some(Duration::from_secs(seconds));
    }

    fn set_timeout_ms(&mut self, millis: u64) {
        self.timeout = Some(Duration::from_millis(millis));
    }

    fn set_verbosity(&mut self, level: u8) {
        self.verbosity = level;
    }

    fn set_log_file(&mut self, path: &Path) {
        self.log_file = Some(path.to_path_buf());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Assumption;

    fn noop(_: Bound) {}

    #[test]
    fn finds_a_satisfying_assignment() {
        let mut solver = BruteForceSolver::new()
            .with_domain(vec![0, 1])
            .with_domain(vec![0, 1])
            .with_not_equal(0, 1);
        let outcome = solver.solve(&noop);
        assert_eq!(outcome, SolveTermination::Satisfiable);
        assert!(solver.check_solution().unwrap());
    }

    #[test]
    fn reports_unsatisfiable() {
        let mut solver = BruteForceSolver::new()
            .with_domain(vec![0])
            .with_domain(vec![0])
            .with_not_equal(0, 1);
        assert_eq!(solver.solve(&noop), SolveTermination::Unsatisfiable);
    }

    #[test]
    fn minimizes_and_reports_improving_bounds() {
        let mut seen = Vec::new();
        let mut solver = BruteForceSolver::new()
            .with_domain(vec![2, 1, 0])
            .with_domain(vec![0, 1, 2])
            .with_not_equal(0, 1)
            .with_objective(0, true);
        let outcome = solver.solve(&mut |b: Bound| seen.push(b));
        assert_eq!(outcome, SolveTermination::OptimumFound);
        assert_eq!(solver.solution().unwrap()[0], BigInt::from(0));
        assert!(!seen.is_empty());
    }

    #[test]
    fn solve_assumptions_restricts_the_domain() {
        let mut solver = BruteForceSolver::new().with_domain(vec![0, 1, 2]).with_domain(vec![0, 1, 2]);
        let cube = Cube::from(vec![Assumption::eq(VariableId(0), 2)]);
        let outcome = solver.solve_assumptions(&cube, &noop);
        assert_eq!(outcome, SolveTermination::Satisfiable);
        assert_eq!(solver.solution().unwrap()[0], BigInt::from(2));
    }

    #[test]
    fn interrupt_is_observed_before_search_starts() {
        let mut solver = BruteForceSolver::new().with_domain((0..200_000).collect());
        solver.interrupt();
        assert_eq!(solver.solve(&noop), SolveTermination::Unknown);
    }

    #[test]
    fn reset_clears_a_pending_interrupt() {
        let mut solver = BruteForceSolver::new().with_domain(vec![0, 1]).with_domain(vec![0, 1]).with_not_equal(0, 1);
        solver.interrupt();
        solver.reset();
        assert_eq!(solver.solve(&noop), SolveTermination::Satisfiable);
    }
}
