//! Event processing pipeline under rest-for-one supervision.
//!
//! Three stages - ingest, transform, output - are declared as one
//! supervisor's children, in pipeline order. Rest-for-one means a failure
//! in an earlier stage restarts that stage and everything declared after
//! it, while earlier stages keep running untouched: poisoning `transform`
//! also restarts `output`, but `ingest` is left alone.
//!
//! Each stage resolves its downstream neighbor through its parent
//! supervisor by index, via [`ActorContext::parent`], rather than capturing
//! a neighbor's `ActorId` directly - a restarted neighbor gets a new id,
//! but the supervisor itself is stable across the whole run.
//!
//! Run with: cargo run --example event_pipeline

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use corvid_rt::prelude::*;

// Events are tiny enough to ride entirely in the tag, as the sequence
// number itself — the first user tag value, so the reserved range starts
// at `EVENT_BASE`. Avoids handing a freshly-built `Payload` to `ctx.send`
// from inside a `handle` call, which would point at a stack buffer that's
// gone by the time a later tick actually dispatches the message.
const EVENT_BASE: u32 = 10;
const POISON: u32 = 2;

struct IngestStage;

impl Actor for IngestStage {
    fn handle(&mut self, msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            POISON => BehaviorResult::Fail,
            tag if tag >= EVENT_BASE => {
                if let Some(supervisor) = ctx.parent() {
                    if let Ok(transform) = ctx.supervisor_child_id(supervisor, 1) {
                        let _ = ctx.send(transform, Payload::EMPTY, tag);
                    }
                }
                BehaviorResult::Ok
            }
            _ => BehaviorResult::Ok,
        }
    }

    fn pre_start(&mut self, ctx: &mut ActorContext<'_>) {
        println!("  [ingest] spawned as {}", ctx.id());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct TransformStage {
    processed: Arc<AtomicU32>,
}

impl Actor for TransformStage {
    fn handle(&mut self, msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            POISON => BehaviorResult::Fail,
            tag if tag >= EVENT_BASE => {
                self.processed.fetch_add(1, Ordering::SeqCst);
                if let Some(supervisor) = ctx.parent() {
                    if let Ok(output) = ctx.supervisor_child_id(supervisor, 2) {
                        let _ = ctx.send(output, Payload::EMPTY, tag);
                    }
                }
                BehaviorResult::Ok
            }
            _ => BehaviorResult::Ok,
        }
    }

    fn pre_start(&mut self, ctx: &mut ActorContext<'_>) {
        println!("  [transform] spawned as {}", ctx.id());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct OutputStage {
    seen: Arc<Mutex<Vec<u32>>>,
}

impl Actor for OutputStage {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            POISON => BehaviorResult::Fail,
            tag if tag >= EVENT_BASE => {
                self.seen.lock().unwrap().push(tag - EVENT_BASE);
                BehaviorResult::Ok
            }
            _ => BehaviorResult::Ok,
        }
    }

    fn pre_start(&mut self, ctx: &mut ActorContext<'_>) {
        println!("  [output] spawned as {}", ctx.id());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Feeds a few events through, poisons the transform stage partway through,
/// then feeds a few more to show the restarted transform/output pair kept
/// the pipeline working.
struct Driver {
    supervisor: ActorId,
    seen: Arc<Mutex<Vec<u32>>>,
    processed: Arc<AtomicU32>,
    round: u32,
    next_seq: u32,
}

impl Actor for Driver {
    fn handle(&mut self, _msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        self.round += 1;
        let ingest = ctx.supervisor_child_id(self.supervisor, 0);
        let transform = ctx.supervisor_child_id(self.supervisor, 1);
        match self.round {
            1..=2 | 4..=5 => {
                if let Ok(ingest) = ingest {
                    self.next_seq += 1;
                    let _ = ctx.send(ingest, Payload::EMPTY, EVENT_BASE + self.next_seq);
                }
                ctx.send_after(ctx.id(), 20, Payload::EMPTY, 0);
                BehaviorResult::Ok
            }
            3 => {
                println!("poisoning the transform stage");
                if let Ok(transform) = transform {
                    let _ = ctx.send(transform, Payload::EMPTY, POISON);
                }
                ctx.send_after(ctx.id(), 40, Payload::EMPTY, 0);
                BehaviorResult::Ok
            }
            _ => {
                println!("events seen by output: {:?}", self.seen.lock().unwrap());
                println!(
                    "total events processed by transform (across restarts): {}",
                    self.processed.load(Ordering::SeqCst)
                );
                let _ = ctx.stop(self.supervisor);
                BehaviorResult::Stop
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn main() -> Result<(), RuntimeError> {
    let mut rt = RtLoop::new(RuntimeConfig::default())?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let processed = Arc::new(AtomicU32::new(0));

    let policy = SupervisorPolicy {
        strategy: SupervisionStrategy::RestForOne,
        intensity: 5,
        period_ms: 5_000,
        backoff: BackoffKind::Constant,
        base_delay_ms: 5,
    };

    let output_seen = Arc::clone(&seen);
    let transform_processed = Arc::clone(&processed);
    let children = vec![
        ChildSpec::new(RestartMode::Permanent, 16, || Box::new(IngestStage) as Box<dyn Actor>),
        ChildSpec::new(RestartMode::Permanent, 16, move || {
            Box::new(TransformStage {
                processed: Arc::clone(&transform_processed),
            }) as Box<dyn Actor>
        }),
        ChildSpec::new(RestartMode::Permanent, 16, move || {
            Box::new(OutputStage {
                seen: Arc::clone(&output_seen),
            }) as Box<dyn Actor>
        }),
    ];

    let spec = SupervisorSpec { children, policy };
    let supervisor = rt.spawn_supervisor(spec)?;

    let driver = rt.spawn(Box::new(Driver {
        supervisor,
        seen,
        processed,
        round: 0,
        next_seq: 0,
    }))?;
    rt.send(driver, Payload::EMPTY, 0)?;
    rt.run()
}
