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

//! The cube generator abstraction (`spec.md` §4.8): a bounded lazy sequence
//! of consistent partial assignments used by the EPS and partition
//! strategies to carve up the search space.
//!
//! `spec.md` models exhaustion as "the generator yields the empty cube".
//! This crate instead models it the idiomatic way: `next_cube` returning
//! `None`. The two are equivalent -- `None` *is* the exhausted-space
//! sentinel -- but this form composes with the rest of std (no caller has to
//! special-case a zero-length `Cube` against a "real" cube that merely
//! contains zero assumptions, which can legitimately happen for a
//! single-variable problem).

use crate::common::Cube;

/// A bounded lazy sequence of consistent cubes.
pub trait CubeGenerator: Send {
    /// Produces the next cube, or `None` once the search space this
    /// generator enumerates (bounded by its configured cube budget) has been
    /// exhausted.
    fn next_cube(&mut self) -> Option<Cube>;
}
