//! Supervision strategy comparison: the same three-child tree, rebuilt once
//! per strategy, so the difference in which siblings restart is visible.
//!
//! - `OneForOne` restarts only the child that failed.
//! - `OneForAll` restarts every child, including the ones still running.
//! - `RestForOne` restarts the failed child and every child declared after
//!   it, leaving earlier siblings untouched.
//!
//! Run with: cargo run --example supervisor_strategies

use corvid_rt::prelude::*;

const TRIGGER_FAILURE: u32 = 1;
const REPORT: u32 = 2;

struct Steady {
    label: &'static str,
}

impl Actor for Steady {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        if msg.tag == TRIGGER_FAILURE {
            BehaviorResult::Fail
        } else {
            BehaviorResult::Ok
        }
    }

    fn pre_start(&mut self, ctx: &mut ActorContext<'_>) {
        println!("  [{}] child spawned as {}", self.label, ctx.id());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct Driver {
    supervisor: ActorId,
    middle_child: ActorId,
    label: &'static str,
}

impl Actor for Driver {
    fn handle(&mut self, msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            TRIGGER_FAILURE => {
                let _ = ctx.send(self.middle_child, Payload::EMPTY, TRIGGER_FAILURE);
                ctx.send_after(ctx.id(), 40, Payload::EMPTY, REPORT);
                BehaviorResult::Ok
            }
            REPORT => {
                println!("  [{}] after restart:", self.label);
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

fn run_one(strategy: SupervisionStrategy, label: &'static str) -> Result<(), RuntimeError> {
    println!("--- {label} ---");
    let mut rt = RtLoop::new(RuntimeConfig::default())?;
    let policy = SupervisorPolicy {
        strategy,
        intensity: 5,
        period_ms: 5_000,
        backoff: BackoffKind::Constant,
        base_delay_ms: 5,
    };
    let children = vec![
        ChildSpec::new(RestartMode::Permanent, 8, || Box::new(Steady { label: "first" }) as Box<dyn Actor>),
        ChildSpec::new(RestartMode::Permanent, 8, || Box::new(Steady { label: "middle" }) as Box<dyn Actor>),
        ChildSpec::new(RestartMode::Permanent, 8, || Box::new(Steady { label: "last" }) as Box<dyn Actor>),
    ];
    let supervisor = rt.spawn_supervisor(SupervisorSpec { children, policy })?;
    let middle_child = rt.supervisor_child_id(supervisor, 1)?;

    let driver = rt.spawn(Box::new(Driver { supervisor, middle_child, label }))?;
    rt.send(driver, Payload::EMPTY, TRIGGER_FAILURE)?;
    rt.run()
}

fn main() -> Result<(), RuntimeError> {
    run_one(SupervisionStrategy::OneForOne, "one-for-one")?;
    run_one(SupervisionStrategy::OneForAll, "one-for-all")?;
    run_one(SupervisionStrategy::RestForOne, "rest-for-one")?;
    Ok(())
}
