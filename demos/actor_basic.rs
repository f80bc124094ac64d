//! Core actor trait fundamentals: handling messages, stopping cleanly, and
//! failing on a bad input so the caller can observe both terminal outcomes.
//!
//! Run with: cargo run --example actor_basic

use corvid_rt::prelude::*;

const DIVIDE: u32 = 1;
const STOP: u32 = 2;

/// Divides a fixed numerator by the byte the payload carries. Division by
/// zero fails the actor instead of panicking.
struct Divider {
    numerator: i64,
}

impl Actor for Divider {
    fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        match msg.tag {
            DIVIDE => {
                let divisor = unsafe { msg.payload.as_slice() }
                    .first()
                    .copied()
                    .unwrap_or(0) as i64;
                if divisor == 0 {
                    eprintln!("refusing to divide by zero, failing");
                    return BehaviorResult::Fail;
                }
                println!("{} / {} = {}", self.numerator, divisor, self.numerator / divisor);
                BehaviorResult::Ok
            }
            STOP => BehaviorResult::Stop,
            _ => BehaviorResult::Ok,
        }
    }

    fn pre_start(&mut self, _ctx: &mut ActorContext<'_>) {
        println!("divider starting with numerator {}", self.numerator);
    }

    fn post_stop(&mut self, _ctx: &mut ActorContext<'_>) {
        println!("divider torn down");
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn main() -> Result<(), RuntimeError> {
    let mut rt = RtLoop::new(RuntimeConfig::default())?;
    let divider = rt.spawn(Box::new(Divider { numerator: 100 }))?;

    let five = [5u8];
    rt.send(divider, Payload::from_slice(&five), DIVIDE)?;
    rt.send(divider, Payload::EMPTY, STOP)?;

    rt.run()
}
