//! The handle a behavior uses to act on anything other than its own state.
//!
//! `ActorContext` borrows the owning [`crate::RtLoop`] for the duration of a
//! single `handle`/`pre_start`/`post_stop` call. The actor whose behavior is
//! currently running has already been removed from the loop's actor table
//! for that duration (see `rt_loop::dispatch_one`), so that borrow never
//! aliases the actor's own record. That means a send addressed back to the
//! sender itself can't go through the table lookup `send_from` uses —
//! instead it's buffered here in `self_pending` and `dispatch_one` drains it
//! into the actor's own mailbox once `handle` returns and the record is back
//! in hand.

use std::os::unix::io::RawFd;

use crate::io::Interest;
use crate::mailbox::{Message, Payload};
use crate::supervisor::ChildSpec;
use crate::system::errors::RuntimeError;
use crate::system::rt_loop::RtLoop;
use crate::util::{ActorId, TimerId};

/// Borrowed access back into the loop, scoped to one behavior invocation.
pub struct ActorContext<'a> {
    pub(crate) rt: &'a mut RtLoop,
    pub(crate) self_id: ActorId,
    pub(crate) parent: Option<ActorId>,
    pub(crate) self_pending: Vec<Message>,
}

impl<'a> ActorContext<'a> {
    pub(crate) fn new(rt: &'a mut RtLoop, self_id: ActorId, parent: Option<ActorId>) -> Self {
        Self {
            rt,
            self_id,
            parent,
            self_pending: Vec::new(),
        }
    }

    /// The id of the actor currently being dispatched.
    pub fn id(&self) -> ActorId {
        self.self_id
    }

    /// The id of this actor's supervising parent, if it was spawned as a
    /// child (via [`ActorContext::spawn`]/[`ActorContext::spawn_supervisor`]
    /// or a [`crate::supervisor::ChildSpec`]) rather than with
    /// [`crate::RtLoop::spawn`] directly.
    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    /// Delivers `(payload, tag)` to `target`, enqueued in its mailbox for
    /// dispatch later this tick or a following one. A send addressed to the
    /// currently-dispatching actor itself is buffered and applied to its own
    /// mailbox once its `handle` call returns.
    pub fn send(&mut self, target: ActorId, payload: Payload, tag: u32) -> Result<(), RuntimeError> {
        if target == self.self_id {
            self.self_pending.push(Message::new(payload, tag, self.self_id));
            return Ok(());
        }
        self.rt.send_from(target, payload, tag, self.self_id)
    }

    /// Schedules `(payload, tag)` to be delivered to `target` after
    /// `delay_ms` milliseconds.
    pub fn send_after(
        &mut self,
        target: ActorId,
        delay_ms: u64,
        payload: Payload,
        tag: u32,
    ) -> TimerId {
        self.rt.send_after(target, delay_ms, payload, tag)
    }

    /// Cancels a timer previously returned by [`ActorContext::send_after`].
    pub fn cancel_timer(&mut self, timer: TimerId) -> Result<(), RuntimeError> {
        self.rt.cancel_timer(timer)
    }

    /// Registers interest in a raw descriptor's readiness. Readiness events
    /// arrive as messages tagged [`crate::mailbox::IO_READY_TAG`] addressed
    /// to this actor.
    pub fn watch_fd(&mut self, fd: RawFd, interest: Interest) -> Result<(), RuntimeError> {
        self.rt.watch_fd(fd, self.self_id, interest)
    }

    /// Drops interest in a previously-watched descriptor.
    pub fn unwatch_fd(&mut self, fd: RawFd) -> Result<(), RuntimeError> {
        self.rt.unwatch_fd(fd)
    }

    /// Spawns a new plain actor as a child of the current one.
    pub fn spawn(
        &mut self,
        behavior: Box<dyn crate::actor::Actor>,
        mailbox_cap: usize,
    ) -> Result<ActorId, RuntimeError> {
        self.rt.spawn_child(behavior, mailbox_cap, Some(self.self_id))
    }

    /// Looks up the live id of `supervisor`'s child at `index`, in the order
    /// the children were declared in its spec.
    pub fn supervisor_child_id(&self, supervisor: ActorId, index: usize) -> Result<ActorId, RuntimeError> {
        self.rt.supervisor_child_id(supervisor, index)
    }

    /// Spawns a supervisor as a child of the current one.
    pub fn spawn_supervisor(
        &mut self,
        children: Vec<ChildSpec>,
        policy: crate::supervisor::SupervisorPolicy,
    ) -> Result<ActorId, RuntimeError> {
        self.rt
            .spawn_supervisor_internal(children, policy, Some(self.self_id))
    }

    /// Requests that `target` stop cleanly at its next dispatch.
    pub fn stop(&mut self, target: ActorId) -> Result<(), RuntimeError> {
        self.rt.actor_stop(target)
    }

    /// Requests that `target` be torn down as failed at its next dispatch.
    pub fn fail(&mut self, target: ActorId) -> Result<(), RuntimeError> {
        self.rt.actor_fail(target)
    }
}
