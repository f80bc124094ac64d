//! Core supervisor usage: a single permanent child restarted under
//! one-for-one after it fails, driven by a small actor that watches the
//! restart happen and then shuts the whole tree down.
//!
//! Run with: cargo run --example supervisor_basic

use corvid_rt::prelude::*;

const TRIGGER_FAILURE: u32 = 1;
const CHECK_RESTARTED: u32 = 2;

struct Flaky;

impl Actor for Flaky {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        if msg.tag == TRIGGER_FAILURE {
            println!("flaky child failing");
            BehaviorResult::Fail
        } else {
            BehaviorResult::Ok
        }
    }

    fn pre_start(&mut self, ctx: &mut ActorContext<'_>) {
        println!("flaky child {} starting", ctx.id());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Kicks off the failure, polls for the replacement child to appear, then
/// tears the whole tree down so the demo exits.
struct Driver {
    supervisor: ActorId,
    original_child: ActorId,
}

impl Actor for Driver {
    fn handle(&mut self, msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            TRIGGER_FAILURE => {
                println!("driver: requesting child failure");
                let _ = ctx.send(self.original_child, Payload::EMPTY, TRIGGER_FAILURE);
                ctx.send_after(ctx.id(), 50, Payload::EMPTY, CHECK_RESTARTED);
                BehaviorResult::Ok
            }
            CHECK_RESTARTED => {
                println!("driver: stopping supervisor tree");
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

    let policy = SupervisorPolicy {
        strategy: SupervisionStrategy::OneForOne,
        intensity: 3,
        period_ms: 5_000,
        backoff: BackoffKind::Constant,
        base_delay_ms: 10,
    };
    let children = vec![ChildSpec::new(RestartMode::Permanent, 16, || {
        Box::new(Flaky) as Box<dyn Actor>
    })];
    let supervisor = rt.spawn_supervisor(SupervisorSpec { children, policy })?;
    let original_child = rt.supervisor_child_id(supervisor, 0)?;

    let driver = rt.spawn(Box::new(Driver { supervisor, original_child }))?;
    rt.send(driver, Payload::EMPTY, TRIGGER_FAILURE)?;

    rt.run()
}
