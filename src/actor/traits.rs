//! The `Actor` trait: a single, non-async dispatch capability.
//!
//! A behavior runs to completion on the loop thread with no preemption and
//! no `await` points. Anything that would block — network I/O, sleeping,
//! waiting on another actor — goes through [`ActorContext`] instead, which
//! schedules the continuation as a future message.

use std::any::Any;

use crate::actor::ActorContext;
use crate::mailbox::Message;

/// The outcome of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorResult {
    /// Continue running; process the next queued message, if any.
    Ok,
    /// Stop cleanly. Torn down with status `Stopped`.
    Stop,
    /// Stop due to an internal error. Torn down with status `Failed` and
    /// reported to a supervising parent, if any.
    Fail,
}

/// A runnable unit of actor state and behavior.
///
/// Implementors own their state directly — there is no generic message type
/// parameter; every actor in a given [`crate::RtLoop`] receives the same
/// opaque [`Message`] envelope and is responsible for interpreting its `tag`
/// and `payload` itself.
pub trait Actor: 'static {
    /// Handles one message. Called at most
    /// `RuntimeConfig::max_msgs_per_actor` times per tick before the loop
    /// moves on to the next actor in the run queue.
    fn handle(&mut self, msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult;

    /// Runs once, immediately after the actor is inserted into the table and
    /// before it can receive any message. The default does nothing.
    fn pre_start(&mut self, _ctx: &mut ActorContext<'_>) {}

    /// Runs once, after the last `handle` call, regardless of whether the
    /// actor stopped cleanly or failed. By the time `post_stop` runs the
    /// final status is already settled; it can still use `ctx` to send
    /// final messages or unregister a watched descriptor. The default does
    /// nothing.
    fn post_stop(&mut self, _ctx: &mut ActorContext<'_>) {}

    /// Downcasts the stored behavior back to a concrete type. Used by
    /// embedders inspecting a running actor for diagnostics; the runtime
    /// itself never calls this.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{Message, Payload};
    use crate::util::ActorId;

    struct Counter {
        seen: u32,
    }

    impl Actor for Counter {
        fn handle(&mut self, _msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
            self.seen += 1;
            if self.seen >= 3 {
                BehaviorResult::Stop
            } else {
                BehaviorResult::Ok
            }
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn is_object_safe() {
        let counter: Box<dyn Actor> = Box::new(Counter { seen: 0 });
        assert!(counter.as_any().downcast_ref::<Counter>().is_some());
    }

    #[test]
    fn message_carries_sender_and_tag() {
        let msg = Message::new(Payload::EMPTY, 42, ActorId::new(1, 0));
        assert_eq!(msg.tag, 42);
        assert_eq!(msg.sender, ActorId::new(1, 0));
    }
}
