//! Getting started - your first actor.
//!
//! Run with: cargo run --example getting_started

use corvid_rt::prelude::*;

struct Counter {
    value: i64,
}

const INCREMENT: u32 = 1;
const DECREMENT: u32 = 2;
const GET_VALUE: u32 = 3;

impl Actor for Counter {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            INCREMENT => self.value += 1,
            DECREMENT => self.value -= 1,
            GET_VALUE => println!("counter is now {}", self.value),
            _ => {}
        }
        BehaviorResult::Ok
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn main() -> Result<(), RuntimeError> {
    let mut rt = RtLoop::new(RuntimeConfig::default())?;
    let counter = rt.spawn(Box::new(Counter { value: 0 }))?;

    rt.send(counter, Payload::EMPTY, INCREMENT)?;
    rt.send(counter, Payload::EMPTY, INCREMENT)?;
    rt.send(counter, Payload::EMPTY, DECREMENT)?;
    rt.send(counter, Payload::EMPTY, GET_VALUE)?;
    rt.actor_stop(counter)?;

    rt.run()
}
