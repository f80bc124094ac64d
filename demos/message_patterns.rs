//! Message passing patterns: small tagged control messages, a zero-copy
//! large payload shared across actors via a caller-owned buffer, and
//! batched delivery under the per-tick message budget.
//!
//! Run with: cargo run --example message_patterns

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use corvid_rt::prelude::*;

// =============================================================================
// Pattern 1: small tagged messages
//
// A message here is just `(Payload, tag)`; when the payload carries no data
// of its own, the tag alone is the whole message. Cheapest possible
// encoding, and the natural fit for pure control signals.
// =============================================================================

const INCREMENT: u32 = 1;
const DECREMENT: u32 = 2;
const RESET: u32 = 3;

struct Counter {
    name: &'static str,
    count: i32,
}

impl Actor for Counter {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            INCREMENT => {
                self.count += 1;
                println!("[{}] incremented to {}", self.name, self.count);
            }
            DECREMENT => {
                self.count -= 1;
                println!("[{}] decremented to {}", self.name, self.count);
            }
            RESET => {
                self.count = 0;
                println!("[{}] reset to 0", self.name);
            }
            _ => {}
        }
        BehaviorResult::Ok
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// =============================================================================
// Pattern 2: zero-copy large payload
//
// `Payload` is a pointer and a length; sending one to several actors copies
// that pair, never the bytes behind it. The buffer has to outlive every
// `Payload` built from it, so the sender keeps it pinned in an `Arc` for as
// long as any receiver might still read it - here, for the rest of `main`.
// =============================================================================

const PROCESS: u32 = 1;

struct DataProcessor {
    name: &'static str,
    processed: usize,
}

impl Actor for DataProcessor {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        if msg.tag == PROCESS {
            let bytes = unsafe { msg.payload.as_slice() };
            self.processed += 1;
            println!(
                "[{}] processed {} bytes (job #{})",
                self.name,
                bytes.len(),
                self.processed
            );
        }
        BehaviorResult::Ok
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// =============================================================================
// Pattern 3: message batching under the per-tick budget
//
// `max_msgs_per_actor` bounds how many queued messages one actor drains
// before the loop moves to the next actor in the run queue. A burst larger
// than the budget is split across dispatches rather than delivered whole;
// the actor here counts how many dispatch passes it took.
// =============================================================================

const JOB: u32 = 1;

struct BatchWorker {
    jobs_seen: Arc<AtomicUsize>,
}

impl Actor for BatchWorker {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        if msg.tag == JOB {
            self.jobs_seen.fetch_add(1, Ordering::SeqCst);
        }
        BehaviorResult::Ok
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn small_messages(rt: &mut RtLoop) -> Result<(), RuntimeError> {
    println!("-- small tagged messages --");
    let counter = rt.spawn(Box::new(Counter { name: "widgets", count: 0 }))?;
    rt.send(counter, Payload::EMPTY, INCREMENT)?;
    rt.send(counter, Payload::EMPTY, INCREMENT)?;
    rt.send(counter, Payload::EMPTY, DECREMENT)?;
    rt.send(counter, Payload::EMPTY, RESET)?;
    rt.actor_stop(counter)?;
    rt.run()
}

fn zero_copy_payload(rt: &mut RtLoop) -> Result<(), RuntimeError> {
    println!("-- zero-copy shared payload --");
    // A stand-in for a large buffer (network frame, file chunk, ...) that
    // several workers read without any of them copying it.
    let buffer: Arc<Vec<u8>> = Arc::new(vec![0xABu8; 4_096]);
    let payload = Payload::from_slice(&buffer);

    let a = rt.spawn(Box::new(DataProcessor { name: "worker-a", processed: 0 }))?;
    let b = rt.spawn(Box::new(DataProcessor { name: "worker-b", processed: 0 }))?;
    rt.send(a, payload, PROCESS)?;
    rt.send(b, payload, PROCESS)?;
    rt.actor_stop(a)?;
    rt.actor_stop(b)?;
    let result = rt.run();
    // `buffer` must outlive the run: both sends above only ever stored a
    // pointer into it, never its bytes.
    drop(buffer);
    result
}

fn batched_delivery(rt: &mut RtLoop) -> Result<(), RuntimeError> {
    println!("-- batching under the per-tick budget --");
    let jobs_seen = Arc::new(AtomicUsize::new(0));
    let worker = rt.spawn_with_capacity(
        Box::new(BatchWorker {
            jobs_seen: Arc::clone(&jobs_seen),
        }),
        256,
    )?;
    for _ in 0..200 {
        rt.send(worker, Payload::EMPTY, JOB)?;
    }
    rt.actor_stop(worker)?;
    rt.run()?;
    println!(
        "delivered {} jobs (default max_msgs_per_actor={})",
        jobs_seen.load(Ordering::SeqCst),
        RuntimeConfig::default().max_msgs_per_actor
    );
    Ok(())
}

fn main() -> Result<(), RuntimeError> {
    let mut rt = RtLoop::new(RuntimeConfig::default())?;
    small_messages(&mut rt)?;

    let mut rt = RtLoop::new(RuntimeConfig::default())?;
    zero_copy_payload(&mut rt)?;

    let mut rt = RtLoop::new(RuntimeConfig::default())?;
    batched_delivery(&mut rt)
}
