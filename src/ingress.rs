//! Thread-safe entry point for sends originating outside the loop thread.
//!
//! Any number of foreign threads may call [`AsyncIngress::push`] concurrently.
//! The loop thread alone calls [`AsyncIngress::drain`], once per tick, and
//! dispatches the drained batch without holding the mutex — so a slow actor
//! behavior never blocks a foreign thread trying to enqueue a send.

use parking_lot::Mutex;

use crate::mailbox::Payload;
use crate::util::ActorId;

/// A send that arrived through [`AsyncIngress`] and is waiting to be
/// delivered to its target's mailbox on the next tick.
pub(crate) struct PendingSend {
    pub target: ActorId,
    pub payload: Payload,
    pub tag: u32,
    pub sender: ActorId,
}

// `Payload` carries a raw pointer; the runtime never dereferences it except
// through the caller-owned memory it points at, so moving a `PendingSend`
// across the ingress mutex to the loop thread is sound under the same
// ownership-by-convention contract the rest of the crate relies on.
unsafe impl Send for PendingSend {}

#[derive(Default)]
pub(crate) struct AsyncIngress {
    queue: Mutex<Vec<PendingSend>>,
}

impl AsyncIngress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a send. Safe to call from any thread, including the loop
    /// thread itself and the timer service's helper thread.
    pub fn push(&self, send: PendingSend) {
        self.queue.lock().push(send);
    }

    /// Atomically takes every pending send, leaving the queue empty.
    pub fn drain(&self) -> Vec<PendingSend> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::Payload;

    #[test]
    fn drain_empties_the_queue() {
        let ingress = AsyncIngress::new();
        ingress.push(PendingSend {
            target: ActorId::new(0, 0),
            payload: Payload::EMPTY,
            tag: 1,
            sender: ActorId::new(1, 0),
        });
        assert!(!ingress.is_empty());
        let drained = ingress.drain();
        assert_eq!(drained.len(), 1);
        assert!(ingress.is_empty());
    }

    #[test]
    fn concurrent_pushes_are_all_observed() {
        use std::sync::Arc;
        use std::thread;

        let ingress = Arc::new(AsyncIngress::new());
        let mut handles = Vec::new();
        for i in 0..8u32 {
            let ingress = Arc::clone(&ingress);
            handles.push(thread::spawn(move || {
                ingress.push(PendingSend {
                    target: ActorId::new(i, 0),
                    payload: Payload::EMPTY,
                    tag: i,
                    sender: ActorId::new(0, 0),
                });
            }));
        }
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(ingress.drain().len(), 8);
    }
}
