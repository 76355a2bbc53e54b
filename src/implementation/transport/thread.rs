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

//! An in-process [`Transport`] backed by one `Mutex<VecDeque<Message>>` per
//! rank (`spec.md` §5, "the degenerate transport case"). No bytes ever
//! actually cross a wire; `Message` values are moved directly between
//! inboxes. `max_bytes` is still honored by checking the message's encoded
//! length, so a test exercising a too-small `max_bytes` budget behaves the
//! same here as it would against a byte-oriented transport.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::abstraction::transport::{Filter, Transport};
use crate::error::{CoreError, CoreResult};
use crate::implementation::message::{Message, Tag};

struct Inbox {
    queue: Mutex<VecDeque<Message>>,
    condvar: Condvar,
}

impl Inbox {
    fn new() -> Self {
        Inbox { queue: Mutex::new(VecDeque::new()), condvar: Condvar::new() }
    }
}

struct NetworkInner {
    inboxes: Vec<Inbox>,
}

/// Shared state backing every [`ThreadTransport`] handle obtained from the
/// same [`ThreadNetwork`]. One rank per participant: ranks `0..n` are
/// workers, rank `n` is the coordinator, matching `WorkerDescriptor::id`
/// directly (`spec.md` §3).
#[derive(Clone)]
pub struct ThreadNetwork {
    inner: Arc<NetworkInner>,
}

impl ThreadNetwork {
    /// Builds a network with `n_workers + 1` ranks (workers, then the
    /// coordinator at the last rank).
    pub fn new(n_workers: usize) -> Self {
        let size = n_workers + 1;
        let inboxes = (0..size).map(|_| Inbox::new()).collect();
        ThreadNetwork { inner: Arc::new(NetworkInner { inboxes }) }
    }

    pub fn size(&self) -> usize {
        self.inner.inboxes.len()
    }

    /// The rank reserved for the coordinator: always the last one.
    pub fn coordinator_rank(&self) -> usize {
        self.size() - 1
    }

    /// Obtains the transport handle for a given rank. Cloning a handle for
    /// the same rank is safe: every clone shares the same inbox.
    pub fn handle(&self, rank: usize) -> ThreadTransport {
        assert!(rank < self.size(), "rank {rank} out of range for a network of size {}", self.size());
        ThreadTransport { network: self.clone(), id: rank }
    }

    pub fn worker_handle(&self, worker: usize) -> ThreadTransport {
        self.handle(worker)
    }

    pub fn coordinator_handle(&self) -> ThreadTransport {
        self.handle(self.coordinator_rank())
    }
}

/// One participant's view of a [`ThreadNetwork`].
#[derive(Clone)]
pub struct ThreadTransport {
    network: ThreadNetwork,
    id: usize,
}

impl Transport for ThreadTransport {
    fn id(&self) -> usize {
        self.id
    }

    fn size(&self) -> usize {
        self.network.size()
    }

    fn send(&self, destination: usize, message: Message) -> CoreResult<()> {
        let inbox = self
            .network
            .inner
            .inboxes
            .get(destination)
            .ok_or_else(|| CoreError::Transport(format!("no such rank {destination}")))?;
        let mut queue = inbox.queue.lock();
        queue.push_back(message);
        inbox.condvar.notify_all();
        Ok(())
    }

    fn receive(&self, tag: Filter<Tag>, source: Filter<usize>, max_bytes: usize) -> CoreResult<Message> {
        let inbox = &self.network.inner.inboxes[self.id];
        let mut queue = inbox.queue.lock();
        loop {
            if let Some(position) = queue
                .iter()
                .position(|msg| tag.matches(&msg.tag) && source.matches(&msg.source))
            {
                let message = queue.remove(position).expect("position just found");
                let size = message.encode().len();
                if size > max_bytes {
                    return Err(CoreError::Transport(format!(
                        "message of {size} bytes exceeds the {max_bytes}-byte budget"
                    )));
                }
                return Ok(message);
            }
            inbox.condvar.wait(&mut queue);
        }
    }

    fn finalize(&self) {
        // Nothing to release: the network lives as long as any handle does,
        // and drops its inboxes when the last `Arc` goes away.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::message::{Opcode, Parameter};
    use std::thread;

    #[test]
    fn delivers_in_order_between_two_ranks() {
        let network = ThreadNetwork::new(1);
        let worker = network.worker_handle(0);
        let coordinator = network.coordinator_handle();

        coordinator
            .send(0, Message::new(Tag::Solve, Opcode::Solve, coordinator.id(), vec![]))
            .unwrap();
        coordinator
            .send(0, Message::new(Tag::Solve, Opcode::Interrupt, coordinator.id(), vec![]))
            .unwrap();

        let first = worker.receive(Filter::Any, Filter::Any, 1 << 20).unwrap();
        let second = worker.receive(Filter::Any, Filter::Any, 1 << 20).unwrap();
        assert_eq!(first.opcode, Opcode::Solve);
        assert_eq!(second.opcode, Opcode::Interrupt);
    }

    #[test]
    fn receive_filters_by_tag_and_source() {
        let network = ThreadNetwork::new(2);
        let coordinator = network.coordinator_handle();
        let worker = network.worker_handle(1);

        coordinator
            .send(1, Message::new(Tag::Config, Opcode::SetVerbosity, coordinator.id(), vec![Parameter::Int(2)]))
            .unwrap();
        coordinator
            .send(1, Message::new(Tag::Solve, Opcode::Solve, coordinator.id(), vec![]))
            .unwrap();

        let solve_only = worker.receive(Filter::Exact(Tag::Solve), Filter::Any, 1 << 20).unwrap();
        assert_eq!(solve_only.opcode, Opcode::Solve);
    }

    #[test]
    fn receive_blocks_until_a_send_arrives() {
        let network = ThreadNetwork::new(1);
        let worker = network.worker_handle(0);
        let coordinator = network.coordinator_handle();

        let network2 = network.clone();
        let joiner = thread::spawn(move || {
            let worker = network2.worker_handle(0);
            worker.receive(Filter::Any, Filter::Any, 1 << 20).unwrap()
        });

        thread::sleep(std::time::Duration::from_millis(20));
        coordinator
            .send(0, Message::new(Tag::Solve, Opcode::Reset, coordinator.id(), vec![]))
            .unwrap();
        let received = joiner.join().unwrap();
        assert_eq!(received.opcode, Opcode::Reset);
        let _ = worker;
    }

    #[test]
    fn oversized_message_is_a_transport_error() {
        let network = ThreadNetwork::new(1);
        let worker = network.worker_handle(0);
        let coordinator = network.coordinator_handle();
        coordinator
            .send(0, Message::new(Tag::Solve, Opcode::LoadInstance, coordinator.id(), vec![Parameter::Str("x".repeat(200))]))
            .unwrap();
        let err = worker.receive(Filter::Any, Filter::Any, 8).unwrap_err();
        assert!(matches!(err, CoreError::Transport(_)));
    }
}
