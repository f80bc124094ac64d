//! Actor lifecycle hooks: `pre_start` runs once before the first message,
//! `post_stop` runs once after the last one regardless of whether the actor
//! stopped cleanly or failed.
//!
//! Run with: cargo run --example actor_lifecycle

use corvid_rt::prelude::*;

const PING: u32 = 1;
const CRASH: u32 = 2;

struct Lifecycle {
    name: &'static str,
    pings: u32,
}

impl Actor for Lifecycle {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            PING => {
                self.pings += 1;
                println!("{} received ping #{}", self.name, self.pings);
                BehaviorResult::Ok
            }
            CRASH => {
                println!("{} crashing on request", self.name);
                BehaviorResult::Fail
            }
            _ => BehaviorResult::Ok,
        }
    }

    fn pre_start(&mut self, _ctx: &mut ActorContext<'_>) {
        println!("{} entering Running", self.name);
    }

    fn post_stop(&mut self, _ctx: &mut ActorContext<'_>) {
        println!("{} torn down after {} pings", self.name, self.pings);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn main() -> Result<(), RuntimeError> {
    let mut rt = RtLoop::new(RuntimeConfig::default())?;

    let clean = rt.spawn(Box::new(Lifecycle { name: "clean-exit", pings: 0 }))?;
    rt.send(clean, Payload::EMPTY, PING)?;
    rt.actor_stop(clean)?;

    let crashes = rt.spawn(Box::new(Lifecycle { name: "crasher", pings: 0 }))?;
    rt.send(crashes, Payload::EMPTY, PING)?;
    rt.send(crashes, Payload::EMPTY, CRASH)?;

    rt.run()
}
