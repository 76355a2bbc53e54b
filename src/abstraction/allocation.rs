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

//! Bound-allocation strategies (`spec.md` §4.7): partitioning of
//! `[lower, upper]` into `n` sub-intervals, one per portfolio worker, and
//! rebalancing that partition as improved bounds arrive.

use crate::common::Bound;

/// Splits `[lower, upper]` into `n` sub-intervals and recomputes that split
/// as the range tightens.
pub trait BoundAllocationStrategy: Send + Sync {
    /// Computes a fresh allocation `b[0..=n]` with `b[0] == lower`,
    /// `b[n] == upper` and `b[i] <= b[i + 1]`.
    fn allocate(&self, lower: &Bound, upper: &Bound, n: usize) -> Vec<Bound>;

    /// Recomputes the allocation given the previous one and a (possibly)
    /// tightened range. The default implementation always recomputes from
    /// scratch -- the "aggressive" policy of `spec.md` §4.7. The
    /// non-aggressive policy overrides this to keep unchanged sub-ranges in
    /// place (see [`crate::implementation::allocation::rebalance_non_aggressive`]).
    fn rebalance(&self, _old: &[Bound], lower: &Bound, upper: &Bound, n: usize) -> Vec<Bound> {
        self.allocate(lower, upper, n)
    }
}
