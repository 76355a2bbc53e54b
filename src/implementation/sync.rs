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

//! A small monitor-style synchronization primitive shared by the coordinator.
//! Built directly on `parking_lot`'s `Mutex`/`Condvar`, the same pair the
//! critical section in a parallel branch-and-bound solver protects its
//! shared frontier with.

use parking_lot::{Condvar, Mutex};

/// A classic counting semaphore. The coordinator uses one to let its public
/// `solve()` call block the caller's thread until the reader thread has
/// observed a terminal outcome, and a second to wait out the end-search
/// handshake.
pub struct Semaphore {
    count: Mutex<i64>,
    condvar: Condvar,
}

impl Semaphore {
    pub fn new(initial: i64) -> Self {
        Semaphore { count: Mutex::new(initial), condvar: Condvar::new() }
    }

    /// Increments the count and wakes one waiter.
    pub fn release(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.condvar.notify_one();
    }

    /// Blocks until the count is strictly positive, then decrements it.
    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count <= 0 {
            self.condvar.wait(&mut count);
        }
        *count -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn semaphore_blocks_until_released() {
        let sem = Arc::new(Semaphore::new(0));
        let sem2 = sem.clone();
        let handle = std::thread::spawn(move || {
            sem2.acquire();
        });
        std::thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        sem.release();
        handle.join().unwrap();
    }
}
