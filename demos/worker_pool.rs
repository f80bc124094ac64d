//! A supervised worker pool: a dispatcher round-robins jobs across a fixed
//! set of workers declared as permanent children under one-for-one
//! supervision, so a worker that panics on a bad job is replaced without
//! disturbing its siblings.
//!
//! Run with: cargo run --example worker_pool

use corvid_rt::prelude::*;

const JOB: u32 = 1;
const POISON: u32 = 2;
const SHUTDOWN: u32 = 3;

struct Worker {
    id: usize,
}

impl Actor for Worker {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            JOB => {
                let byte = unsafe { msg.payload.as_slice() }.first().copied().unwrap_or(0);
                println!("worker {} processed job {}", self.id, byte);
                BehaviorResult::Ok
            }
            POISON => {
                eprintln!("worker {} hit a poison job, failing", self.id);
                BehaviorResult::Fail
            }
            _ => BehaviorResult::Ok,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Round-robins incoming jobs across the supervisor's children and shuts
/// the pool down on request.
struct Dispatcher {
    supervisor: ActorId,
    pool_size: usize,
    next: usize,
}

impl Actor for Dispatcher {
    fn handle(&mut self, msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            JOB | POISON => {
                let index = self.next;
                self.next = (self.next + 1) % self.pool_size;
                if let Ok(worker) = ctx.supervisor_child_id(self.supervisor, index) {
                    let _ = ctx.send(worker, msg.payload, msg.tag);
                }
                BehaviorResult::Ok
            }
            SHUTDOWN => {
                let _ = ctx.stop(self.supervisor);
                BehaviorResult::Stop
            }
            _ => BehaviorResult::Ok,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn main() -> Result<(), RuntimeError> {
    let mut rt = RtLoop::new(RuntimeConfig::default())?;

    const POOL_SIZE: usize = 3;
    let policy = SupervisorPolicy {
        strategy: SupervisionStrategy::OneForOne,
        intensity: 10,
        period_ms: 5_000,
        backoff: BackoffKind::Constant,
        base_delay_ms: 5,
    };
    let children: Vec<ChildSpec> = (0..POOL_SIZE)
        .map(|id| ChildSpec::new(RestartMode::Permanent, 16, move || Box::new(Worker { id }) as Box<dyn Actor>))
        .collect();
    let supervisor = rt.spawn_supervisor(SupervisorSpec { children, policy })?;

    let dispatcher = rt.spawn(Box::new(Dispatcher {
        supervisor,
        pool_size: POOL_SIZE,
        next: 0,
    }))?;

    // Each byte must outlive the `rt.run()` call below: a `Payload` only ever
    // points into caller-owned memory, and delivery doesn't happen until the
    // loop actually runs.
    let jobs = [1u8, 2, 3, 4, 5];
    for byte in &jobs {
        rt.send(dispatcher, Payload::from_slice(std::slice::from_ref(byte)), JOB)?;
    }
    rt.send(dispatcher, Payload::EMPTY, POISON)?;
    rt.send(dispatcher, Payload::EMPTY, SHUTDOWN)?;

    rt.run()
}
