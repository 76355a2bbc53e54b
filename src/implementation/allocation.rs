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

//! `Linear` and `Logarithmic` bound-allocation strategies (`spec.md` §4.7),
//! and the non-aggressive rebalancing policy shared by both.

use num_bigint::BigInt;
use num_traits::One;

use crate::abstraction::allocation::BoundAllocationStrategy;
use crate::common::Bound;

/// Splits `[lower, upper]` into `n` equal-sized steps, clamped at `upper`.
pub struct Linear;

impl BoundAllocationStrategy for Linear {
    fn allocate(&self, lower: &Bound, upper: &Bound, n: usize) -> Vec<Bound> {
        linear_cuts(lower.value(), upper.value(), n)
    }

    fn rebalance(&self, old: &[Bound], lower: &Bound, upper: &Bound, n: usize) -> Vec<Bound> {
        rebalance_non_aggressive(old, lower, upper, n, linear_cuts)
    }
}

fn linear_cuts(lower: &BigInt, upper: &BigInt, n: usize) -> Vec<Bound> {
    if n == 0 {
        return vec![Bound::new(lower.clone())];
    }
    let span = upper - lower;
    let step = (&span / BigInt::from(n)).max(BigInt::one());
    let mut cuts = Vec::with_capacity(n + 1);
    let mut cursor = lower.clone();
    cuts.push(Bound::new(cursor.clone()));
    for _ in 0..n {
        cursor = (cursor + &step).min(upper.clone());
        cuts.push(Bound::new(cursor.clone()));
    }
    // The clamp above can leave `cuts` shorter than `n + 1` cuts worth of
    // distinct values once `cursor` saturates at `upper`; pad with `upper`.
    while cuts.len() < n + 1 {
        cuts.push(Bound::new(upper.clone()));
    }
    cuts
}

/// Splits `[lower, upper]` into `n` sub-intervals whose size grows (or
/// shrinks, when `increasing` is `false`) geometrically from one end to the
/// other, via a lazy generator of `n` strictly increasing interior cuts.
pub struct Logarithmic {
    pub base: f64,
    pub increasing: bool,
}

impl Logarithmic {
    pub fn new(base: f64, increasing: bool) -> Self {
        Logarithmic { base, increasing }
    }
}

impl BoundAllocationStrategy for Logarithmic {
    fn allocate(&self, lower: &Bound, upper: &Bound, n: usize) -> Vec<Bound> {
        logarithmic_cuts(lower.value(), upper.value(), n, self.base, self.increasing)
    }

    fn rebalance(&self, old: &[Bound], lower: &Bound, upper: &Bound, n: usize) -> Vec<Bound> {
        let base = self.base;
        let increasing = self.increasing;
        rebalance_non_aggressive(old, lower, upper, n, move |l, u, k| logarithmic_cuts(l, u, k, base, increasing))
    }
}

fn logarithmic_cuts(lower: &BigInt, upper: &BigInt, n: usize, base: f64, increasing: bool) -> Vec<Bound> {
    if n == 0 {
        return vec![Bound::new(lower.clone())];
    }
    let span = (upper - lower).to_string().parse::<f64>().unwrap_or(0.0);
    let lower_f = lower.to_string().parse::<f64>().unwrap_or(0.0);
    let denom = 1.0 - base.powf(-1.0);
    let increasing_frac = |i: usize| -> f64 {
        if denom.abs() < f64::EPSILON {
            i as f64 / n as f64
        } else {
            (1.0 - base.powf(-(i as f64) / n as f64)) / denom
        }
    };
    let mut cuts = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let frac = if increasing { increasing_frac(i) } else { 1.0 - increasing_frac(n - i) };
        let raw = lower_f + span * frac.clamp(0.0, 1.0);
        cuts.push(BigInt::from(raw.round() as i64));
    }
    // Enforce strict monotonicity and the fixed endpoints regardless of how
    // the floating-point interpolation above rounded.
    cuts[0] = lower.clone();
    let last = cuts.len() - 1;
    cuts[last] = upper.clone();
    for i in 1..cuts.len() {
        if cuts[i] <= cuts[i - 1] {
            cuts[i] = (&cuts[i - 1] + BigInt::one()).min(upper.clone());
        }
    }
    cuts.into_iter().map(Bound::new).collect()
}

/// The shared non-aggressive rebalancing algorithm (`spec.md` §4.7): find the
/// smallest `iLow` with `old[iLow] > lower'` and the largest `iHigh` with
/// `old[iHigh] < upper'`; if both ends have enough room, keep
/// `old[iLow+1..=iHigh-1]` untouched and recompute only the two end spans
/// with `base_iterator`; otherwise recompute everything.
///
/// Implemented literally as written rather than following
/// `RangeBaseAllocationStrategy.cpp`'s always-recompute behavior, since the
/// governing document is explicit here and the C++ source is silent on a
/// non-aggressive mode.
pub fn rebalance_non_aggressive(
    old: &[Bound],
    lower: &Bound,
    upper: &Bound,
    n: usize,
    base_iterator: impl Fn(&BigInt, &BigInt, usize) -> Vec<Bound>,
) -> Vec<Bound> {
    if old.len() != n + 1 {
        return base_iterator(lower.value(), upper.value(), n);
    }
    let lower_v = lower.value();
    let upper_v = upper.value();

    let i_low = old.iter().position(|b| b.value() > lower_v);
    let i_high = old.iter().rposition(|b| b.value() < upper_v);

    let (i_low, i_high) = match (i_low, i_high) {
        (Some(lo), Some(hi)) if lo <= hi => (lo, hi),
        _ => return base_iterator(lower_v, upper_v, n),
    };

    let room_low = i_low;
    let room_high = n - i_high;
    let span_low_available = old[i_low].value() - lower_v;
    let span_high_available = upper_v - old[i_high].value();
    let enough_room_low = span_low_available >= BigInt::from(room_low.max(1));
    let enough_room_high = span_high_available >= BigInt::from(room_high.max(1));
    if !enough_room_low || !enough_room_high {
        return base_iterator(lower_v, upper_v, n);
    }

    // `head` covers the `i_low` cuts strictly before the untouched middle,
    // `tail` the `n - i_high` cuts strictly after it; the middle itself,
    // `old[i_low..=i_high]`, is carried over unchanged.
    let head = base_iterator(lower_v, old[i_low].value(), room_low);
    let tail = base_iterator(old[i_high].value(), upper_v, room_high);

    let mut rebuilt = Vec::with_capacity(n + 1);
    rebuilt.extend(head.into_iter().take(room_low));
    rebuilt.extend(old[i_low..=i_high].iter().cloned());
    rebuilt.extend(tail.into_iter().skip(1));
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(v: i64) -> Bound {
        Bound::new(BigInt::from(v))
    }

    #[test]
    fn linear_allocate_produces_n_plus_one_monotone_cuts() {
        let cuts = Linear.allocate(&b(0), &b(100), 4);
        assert_eq!(cuts.len(), 5);
        assert_eq!(cuts.first().unwrap().value(), &BigInt::from(0));
        assert_eq!(cuts.last().unwrap().value(), &BigInt::from(100));
        for window in cuts.windows(2) {
            assert!(window[0].value() <= window[1].value());
        }
    }

    #[test]
    fn linear_allocate_clamps_when_the_range_is_smaller_than_n() {
        let cuts = Linear.allocate(&b(0), &b(2), 8);
        assert_eq!(cuts.len(), 9);
        assert_eq!(cuts.last().unwrap().value(), &BigInt::from(2));
    }

    #[test]
    fn logarithmic_allocate_is_monotone_and_respects_endpoints() {
        let cuts = Logarithmic::new(2.0, true).allocate(&b(0), &b(1000), 5);
        assert_eq!(cuts.len(), 6);
        assert_eq!(cuts.first().unwrap().value(), &BigInt::from(0));
        assert_eq!(cuts.last().unwrap().value(), &BigInt::from(1000));
        for window in cuts.windows(2) {
            assert!(window[0].value() < window[1].value());
        }
    }

    #[test]
    fn non_aggressive_rebalance_keeps_the_untouched_middle_span() {
        let old = Linear.allocate(&b(0), &b(100), 4);
        let rebalanced = Linear.rebalance(&old, &b(10), &b(90), 4);
        // the middle cuts (index 2) sit well inside [10, 90] and have ample
        // room on both ends, so the policy should leave them untouched.
        assert_eq!(rebalanced[2], old[2]);
    }

    #[test]
    fn non_aggressive_rebalance_falls_back_to_full_recompute_when_room_runs_out() {
        let old = Linear.allocate(&b(0), &b(100), 4);
        let rebalanced = Linear.rebalance(&old, &b(24), &b(26), 4);
        assert_eq!(rebalanced.first().unwrap().value(), &BigInt::from(24));
        assert_eq!(rebalanced.last().unwrap().value(), &BigInt::from(26));
    }
}
