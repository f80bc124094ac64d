//! Helper-thread timer service.
//!
//! One background thread owns a due-time-sorted list of pending timers,
//! guarded by a mutex and a condvar. It sleeps until the earliest due time
//! (or until woken by a new, earlier registration, a cancellation, or
//! shutdown), then hands expired entries to the [`AsyncIngress`] so the loop
//! thread picks them up on its next tick like any other cross-thread send.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::ingress::{AsyncIngress, PendingSend};
use crate::mailbox::Payload;
use crate::system::errors::RuntimeError;
use crate::util::{ActorId, TimerId};

struct TimerEntry {
    due: Instant,
    // Arrival order tiebreak for entries with an identical due time, so
    // same-tick scheduling is still delivered in the order it was requested.
    seq: u64,
    id: TimerId,
    target: ActorId,
    payload: Payload,
    tag: u32,
}

struct Shared {
    entries: Mutex<Vec<TimerEntry>>,
    cv: Condvar,
    stop: AtomicBool,
}

/// Owns the timer helper thread for the lifetime of the runtime.
pub(crate) struct TimerService {
    shared: Arc<Shared>,
    next_id: AtomicU64,
    next_seq: AtomicU64,
    handle: Option<JoinHandle<()>>,
}

impl TimerService {
    /// Spawns the helper thread. Fails with `no-memory` if the OS refuses to
    /// create it (thread/stack exhaustion).
    pub fn start(ingress: Arc<AsyncIngress>) -> Result<Self, RuntimeError> {
        let shared = Arc::new(Shared {
            entries: Mutex::new(Vec::new()),
            cv: Condvar::new(),
            stop: AtomicBool::new(false),
        });
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("corvid-rt-timer".into())
            .spawn(move || run(worker_shared, ingress))
            .map_err(|_| RuntimeError::NoMemory)?;
        Ok(Self {
            shared,
            next_id: AtomicU64::new(1),
            next_seq: AtomicU64::new(0),
            handle: Some(handle),
        })
    }

    /// Schedules `target` to receive `(payload, tag)` after `delay_ms`.
    pub fn schedule(
        &self,
        target: ActorId,
        delay_ms: u64,
        payload: Payload,
        tag: u32,
    ) -> TimerId {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = TimerId::new(raw);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let due = Instant::now() + Duration::from_millis(delay_ms);
        let mut entries = self.shared.entries.lock();
        let pos = entries
            .binary_search_by(|e| e.due.cmp(&due).then(e.seq.cmp(&seq)))
            .unwrap_or_else(|p| p);
        entries.insert(
            pos,
            TimerEntry {
                due,
                seq,
                id,
                target,
                payload,
                tag,
            },
        );
        drop(entries);
        self.shared.cv.notify_all();
        id
    }

    /// Cancels a pending timer. Returns `TimerInvalid` if it already fired
    /// or was never registered.
    pub fn cancel(&self, id: TimerId) -> Result<(), RuntimeError> {
        let mut entries = self.shared.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(RuntimeError::TimerInvalid);
        }
        drop(entries);
        self.shared.cv.notify_all();
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.lock().is_empty()
    }

    /// Wakes the helper thread without stopping it, so a `request_stop`
    /// observed at the next tick boundary is not deferred behind a long
    /// condition wait on a far-future timer.
    pub fn wake(&self) {
        self.shared.cv.notify_all();
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.cv.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(shared: Arc<Shared>, ingress: Arc<AsyncIngress>) {
    loop {
        let mut entries = shared.entries.lock();
        if shared.stop.load(Ordering::SeqCst) {
            return;
        }
        if entries.is_empty() {
            shared.cv.wait(&mut entries);
            continue;
        }
        let now = Instant::now();
        let due = entries[0].due;
        if due > now {
            shared.cv.wait_for(&mut entries, due - now);
            continue;
        }
        let entry = entries.remove(0);
        drop(entries);
        ingress.push(PendingSend {
            target: entry.target,
            payload: entry.payload,
            tag: entry.tag,
            sender: ActorId::from_u64(0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fires_after_delay_and_delivers_through_ingress() {
        let ingress = Arc::new(AsyncIngress::new());
        let timers = TimerService::start(Arc::clone(&ingress)).expect("test thread spawn");
        let target = ActorId::new(3, 0);
        timers.schedule(target, 10, Payload::EMPTY, 7);
        thread::sleep(Duration::from_millis(60));
        let drained = ingress.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].target, target);
        assert_eq!(drained[0].tag, 7);
    }

    #[test]
    fn cancel_prevents_delivery() {
        let ingress = Arc::new(AsyncIngress::new());
        let timers = TimerService::start(Arc::clone(&ingress)).expect("test thread spawn");
        let id = timers.schedule(ActorId::new(0, 0), 30, Payload::EMPTY, 1);
        timers.cancel(id).expect("still pending");
        thread::sleep(Duration::from_millis(60));
        assert!(ingress.is_empty());
    }

    #[test]
    fn cancel_unknown_timer_is_invalid() {
        let ingress = Arc::new(AsyncIngress::new());
        let timers = TimerService::start(ingress).expect("test thread spawn");
        let bogus = TimerId::new(999_999);
        assert!(matches!(
            timers.cancel(bogus),
            Err(RuntimeError::TimerInvalid)
        ));
    }

    #[test]
    fn same_due_time_preserves_arrival_order() {
        let ingress = Arc::new(AsyncIngress::new());
        let timers = TimerService::start(Arc::clone(&ingress)).expect("test thread spawn");
        let a = ActorId::new(1, 0);
        let b = ActorId::new(2, 0);
        timers.schedule(a, 20, Payload::EMPTY, 1);
        timers.schedule(b, 20, Payload::EMPTY, 2);
        thread::sleep(Duration::from_millis(80));
        let drained = ingress.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].target, a);
        assert_eq!(drained[1].target, b);
    }
}
