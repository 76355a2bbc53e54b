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

//! The transport abstraction (`spec.md` §4.1, §6.1): delivery of framed
//! messages between processes identified by a small integer rank. The core
//! never assumes anything about *how* bytes move between ranks -- MPI,
//! in-process queues, or any other carrier all implement the same trait.

use crate::error::CoreResult;
use crate::implementation::message::{Message, Tag};

/// Either a specific rank/tag, or a wildcard matching any value -- the `ANY`
/// sentinel of `spec.md` §6.1, spelled idiomatically instead of as `-1`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Filter<T> {
    Any,
    Exact(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::Any => true,
            Filter::Exact(expected) => expected == value,
        }
    }
}

/// Delivers variable-length framed [`Message`]s between processes.
///
/// Implementations must guarantee in-order delivery between a given
/// `(source, destination)` pair *and* a given tag; no ordering is required
/// across tags or sources. `send` must be safe to call concurrently from
/// several threads (the coordinator has more than one sender).
pub trait Transport: Send + Sync {
    /// The rank of the process this handle belongs to.
    fn id(&self) -> usize;

    /// The total number of processes participating in this session
    /// (workers plus the coordinator).
    fn size(&self) -> usize;

    /// Enqueues `message` for delivery to `destination`.
    fn send(&self, destination: usize, message: Message) -> CoreResult<()>;

    /// Blocks until a message matching both filters is available, then
    /// removes and returns it. `max_bytes` bounds the size of messages this
    /// call is willing to accept; oversized messages are a protocol error.
    fn receive(&self, tag: Filter<Tag>, source: Filter<usize>, max_bytes: usize) -> CoreResult<Message>;

    /// Releases any transport-level resources held by this handle.
    fn finalize(&self);
}
