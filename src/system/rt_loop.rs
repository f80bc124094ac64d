//! The scheduler: a single-threaded, cooperative run loop.
//!
//! One tick is: drain cross-thread sends, poll for I/O readiness, then
//! dispatch actors off the run queue up to `max_actors_per_tick`, each
//! running up to `max_msgs_per_actor` of its queued messages before
//! yielding back to the loop. Nothing here preempts a running behavior;
//! cooperation is the only scheduling discipline.

use std::os::unix::io::RawFd;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::actor::{Actor, ActorContext, BehaviorResult};
use crate::ingress::AsyncIngress;
use crate::io::{Interest, IoWatcher};
use crate::mailbox::{Mailbox, Message, Payload};
use crate::run_queue::RunQueue;
use crate::supervisor::{
    affected_indices, restart_delay_ms, ChildSpec, RestartBatch, RestartMode, SupervisorPolicy,
    SupervisorSpec, SupervisorState, RESTART_TAG_BASE,
};
use crate::system::config::RuntimeConfig;
use crate::system::errors::RuntimeError;
use crate::table::{ActorRecord, ActorStatus, ActorTable};
use crate::timer::TimerService;
use crate::util::{ActorId, TimerId};

/// A behavior that never receives or acts on user messages. Installed as
/// the dispatch target for supervisor actors, whose actual state lives in
/// [`ActorRecord::supervisor`] rather than behind this trait object.
struct NullActor;

impl Actor for NullActor {
    fn handle(&mut self, _msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        BehaviorResult::Ok
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A thread-safe handle for sending into a running [`RtLoop`] from outside
/// the loop thread. Cloneable; every clone shares the same ingress queue.
#[derive(Clone)]
pub struct RtHandle {
    ingress: Arc<AsyncIngress>,
}

impl RtHandle {
    /// Enqueues a send for delivery on the loop's next tick. Never blocks on
    /// the loop thread; only ever contends with other callers of `send` and
    /// the loop's own per-tick drain.
    pub fn send(&self, target: ActorId, payload: Payload, tag: u32) {
        self.ingress.push(crate::ingress::PendingSend {
            target,
            payload,
            tag,
            sender: ActorId::from_u64(0),
        });
    }
}

/// The embeddable actor runtime: scheduler, mailboxes, timers, I/O watcher
/// and supervision tree rolled into one single-threaded loop.
pub struct RtLoop {
    config: RuntimeConfig,
    actors: ActorTable,
    run_queue: RunQueue,
    ingress: Arc<AsyncIngress>,
    timers: TimerService,
    io: IoWatcher,
    running: bool,
    stop_requested: bool,
}

impl RtLoop {
    /// Builds a new loop. Spawns the timer helper thread immediately; it
    /// lives for as long as this `RtLoop` does.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let ingress = Arc::new(AsyncIngress::new());
        let timers = TimerService::start(Arc::clone(&ingress))?;
        Ok(Self {
            actors: ActorTable::new(config.max_actors),
            run_queue: RunQueue::new(config.max_actors),
            io: IoWatcher::new(config.max_io_watchers),
            ingress,
            timers,
            config,
            running: false,
            stop_requested: false,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The number of actors currently live (running or pending teardown).
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// A cloneable, thread-safe handle for sending into this loop from
    /// another thread.
    pub fn handle(&self) -> RtHandle {
        RtHandle {
            ingress: Arc::clone(&self.ingress),
        }
    }

    // ---- spawning ----------------------------------------------------

    /// Spawns a plain (non-supervised) actor with the default mailbox
    /// capacity.
    pub fn spawn(&mut self, behavior: Box<dyn Actor>) -> Result<ActorId, RuntimeError> {
        let cap = self.config.default_mailbox_cap;
        self.spawn_child(behavior, cap, None)
    }

    /// Spawns a plain actor with an explicit mailbox capacity.
    pub fn spawn_with_capacity(
        &mut self,
        behavior: Box<dyn Actor>,
        mailbox_cap: usize,
    ) -> Result<ActorId, RuntimeError> {
        self.spawn_child(behavior, mailbox_cap, None)
    }

    pub(crate) fn spawn_child(
        &mut self,
        behavior: Box<dyn Actor>,
        mailbox_cap: usize,
        parent: Option<ActorId>,
    ) -> Result<ActorId, RuntimeError> {
        let mailbox_cap = if mailbox_cap == 0 {
            self.config.default_mailbox_cap
        } else {
            mailbox_cap
        };
        let id = self.actors.insert(|id| ActorRecord {
            id,
            status: ActorStatus::Init,
            behavior: Some(behavior),
            mailbox: Mailbox::new(mailbox_cap),
            parent,
            in_run_queue: false,
            supervisor: None,
        })?;
        trace!(actor = %id, "spawned");
        self.run_pre_start(id);
        self.schedule(id);
        Ok(id)
    }

    fn run_pre_start(&mut self, id: ActorId) {
        let Some(mut record) = self.actors.take_for_dispatch(id) else {
            return;
        };
        if let Some(mut behavior) = record.behavior.take() {
            let mut ctx = ActorContext::new(self, id, record.parent);
            behavior.pre_start(&mut ctx);
            let self_sends = std::mem::take(&mut ctx.self_pending);
            record.behavior = Some(behavior);
            for msg in self_sends {
                let _ = record.mailbox.push(msg);
            }
        }
        record.status = ActorStatus::Running;
        self.actors.restore(record);
    }

    /// Spawns a supervisor and its initial children as declared by `spec`.
    pub fn spawn_supervisor(&mut self, spec: SupervisorSpec) -> Result<ActorId, RuntimeError> {
        self.spawn_supervisor_internal(spec.children, spec.policy, None)
    }

    pub(crate) fn spawn_supervisor_internal(
        &mut self,
        children: Vec<ChildSpec>,
        policy: SupervisorPolicy,
        parent: Option<ActorId>,
    ) -> Result<ActorId, RuntimeError> {
        let child_count = children.len();
        let sup_state = SupervisorState::new(children, policy);
        let sup_id = self.actors.insert(|id| ActorRecord {
            id,
            status: ActorStatus::Running,
            behavior: Some(Box::new(NullActor)),
            mailbox: Mailbox::new(1),
            parent,
            in_run_queue: false,
            supervisor: Some(sup_state),
        })?;
        debug!(supervisor = %sup_id, children = child_count, "supervisor spawned");
        for index in 0..child_count {
            self.spawn_one_child(sup_id, index)?;
        }
        Ok(sup_id)
    }

    fn spawn_one_child(&mut self, sup_id: ActorId, index: usize) -> Result<(), RuntimeError> {
        let mailbox_cap = {
            let record = self.actors.get(sup_id).ok_or(RuntimeError::NoSuchActor)?;
            let sup = record.supervisor.as_ref().ok_or(RuntimeError::InvalidArg)?;
            sup.children[index].mailbox_cap
        };
        let behavior = {
            let record = self.actors.get(sup_id).ok_or(RuntimeError::NoSuchActor)?;
            let sup = record.supervisor.as_ref().ok_or(RuntimeError::InvalidArg)?;
            (sup.children[index].factory)()
        };
        let child_id = self.spawn_child(behavior, mailbox_cap, Some(sup_id))?;
        if let Some(record) = self.actors.get_mut(sup_id) {
            if let Some(sup) = record.supervisor.as_mut() {
                sup.set_child_id(index, child_id);
            }
        }
        Ok(())
    }

    /// Looks up the live id of `supervisor`'s child at `index` (in the
    /// order the children were declared in its `SupervisorSpec`).
    pub fn supervisor_child_id(
        &self,
        supervisor: ActorId,
        index: usize,
    ) -> Result<ActorId, RuntimeError> {
        let record = self.actors.get(supervisor).ok_or(RuntimeError::NoSuchActor)?;
        let sup = record.supervisor.as_ref().ok_or(RuntimeError::InvalidArg)?;
        sup.child_id(index).ok_or(RuntimeError::NoSuchActor)
    }

    // ---- messaging -----------------------------------------------------

    /// Delivers `(payload, tag)` to `target`'s mailbox, attributed to the
    /// zero (no-sender) id. Scheduling the target happens as a side effect.
    pub fn send(&mut self, target: ActorId, payload: Payload, tag: u32) -> Result<(), RuntimeError> {
        self.send_from(target, payload, tag, ActorId::from_u64(0))
    }

    pub(crate) fn send_from(
        &mut self,
        target: ActorId,
        payload: Payload,
        tag: u32,
        sender: ActorId,
    ) -> Result<(), RuntimeError> {
        self.deliver_message(target, Message::new(payload, tag, sender))
    }

    /// Enqueues an already-built [`Message`] as-is, preserving any buffer it
    /// owns (see [`Message`]'s `owned` field) rather than reconstructing a
    /// fresh message from its parts and dropping that ownership.
    pub(crate) fn deliver_message(
        &mut self,
        target: ActorId,
        message: Message,
    ) -> Result<(), RuntimeError> {
        let record = self.actors.get_mut(target).ok_or(RuntimeError::NoSuchActor)?;
        record.mailbox.push(message)?;
        self.schedule(target);
        Ok(())
    }

    /// Schedules `(payload, tag)` for delivery to `target` after `delay_ms`.
    pub fn send_after(
        &mut self,
        target: ActorId,
        delay_ms: u64,
        payload: Payload,
        tag: u32,
    ) -> TimerId {
        self.timers.schedule(target, delay_ms, payload, tag)
    }

    /// Cancels a pending timer.
    pub fn cancel_timer(&mut self, timer: TimerId) -> Result<(), RuntimeError> {
        self.timers.cancel(timer)
    }

    /// Registers interest in a raw descriptor's readiness on `owner`'s
    /// behalf.
    pub fn watch_fd(&mut self, fd: RawFd, owner: ActorId, interest: Interest) -> Result<(), RuntimeError> {
        self.io.watch(fd, owner, interest)
    }

    pub fn unwatch_fd(&mut self, fd: RawFd) -> Result<(), RuntimeError> {
        self.io.unwatch(fd)
    }

    // ---- lifecycle control ---------------------------------------------

    /// Requests that `target` stop cleanly. Idempotent; a no-op if the
    /// actor is already terminal. The actual teardown (running `post_stop`,
    /// releasing its slot) happens at its next dispatch.
    pub fn actor_stop(&mut self, target: ActorId) -> Result<(), RuntimeError> {
        self.request_terminal(target, ActorStatus::Stopping)
    }

    /// Requests that `target` be torn down as failed, reporting to a
    /// supervising parent if it has one.
    pub fn actor_fail(&mut self, target: ActorId) -> Result<(), RuntimeError> {
        self.request_terminal(target, ActorStatus::Failed)
    }

    fn request_terminal(&mut self, target: ActorId, status: ActorStatus) -> Result<(), RuntimeError> {
        let record = self.actors.get_mut(target).ok_or(RuntimeError::NoSuchActor)?;
        if record.status.is_terminal() {
            return Ok(());
        }
        record.status = status;
        self.schedule(target);
        Ok(())
    }

    fn schedule(&mut self, id: ActorId) {
        if let Some(record) = self.actors.get_mut(id) {
            if !record.in_run_queue {
                record.in_run_queue = true;
                self.run_queue.push(id);
            }
        }
    }

    // ---- the tick loop --------------------------------------------------

    /// Requests that [`RtLoop::run`] return once the current tick finishes.
    /// Also wakes the timer helper thread so a long wait on a far-future
    /// timer doesn't defer shutdown.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
        self.timers.wake();
    }

    /// Runs ticks until either `request_stop` is observed or the loop goes
    /// quiescent (no live actors, nothing pending in the ingress, no timers,
    /// no watched descriptors). Returns `LoopClosed` if already running.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        if self.running {
            return Err(RuntimeError::LoopClosed);
        }
        self.running = true;
        self.stop_requested = false;
        loop {
            if self.stop_requested {
                break;
            }
            self.drain_ingress();
            self.poll_io(0);
            self.process_run_queue();
            if self.run_queue.is_empty() {
                if self.is_quiescent() {
                    break;
                }
                self.poll_io(self.config.io_poll_timeout_ms as i32);
            }
        }
        self.running = false;
        Ok(())
    }

    fn is_quiescent(&self) -> bool {
        self.actors.is_empty()
            && self.ingress.is_empty()
            && self.timers.is_empty()
            && self.io.is_empty()
            && self.run_queue.is_empty()
    }

    fn drain_ingress(&mut self) {
        let pending = self.ingress.drain();
        for send in pending {
            // A target torn down between the send and this drain is simply
            // dropped: async sends are fire-and-forget.
            let _ = self.send_from(send.target, send.payload, send.tag, send.sender);
        }
    }

    fn poll_io(&mut self, timeout_ms: i32) {
        let mut io = std::mem::replace(&mut self.io, IoWatcher::new(1));
        let mut deliveries = Vec::new();
        let _ = io.poll(timeout_ms, |owner, msg| deliveries.push((owner, msg)));
        self.io = io;
        for (owner, msg) in deliveries {
            let _ = self.deliver_message(owner, msg);
        }
    }

    fn process_run_queue(&mut self) {
        let mut processed = 0;
        while processed < self.config.max_actors_per_tick {
            let Some(id) = self.run_queue.pop() else {
                break;
            };
            processed += 1;
            self.dispatch_one(id);
        }
    }

    fn dispatch_one(&mut self, id: ActorId) {
        let Some(mut record) = self.actors.take_for_dispatch(id) else {
            return;
        };
        record.in_run_queue = false;

        if record.status.tears_down_without_dispatch() {
            if record.status == ActorStatus::Stopping {
                record.status = ActorStatus::Stopped;
            }
            self.finalize_teardown(record);
            return;
        }

        let mut handled = 0;
        while handled < self.config.max_msgs_per_actor {
            let Some(msg) = record.mailbox.pop() else {
                break;
            };
            handled += 1;

            if msg.tag >= RESTART_TAG_BASE && record.supervisor.is_some() {
                self.run_restart_batch(&mut record, id, msg.tag - RESTART_TAG_BASE);
                continue;
            }

            let Some(mut behavior) = record.behavior.take() else {
                continue;
            };
            let (result, self_sends) = {
                let mut ctx = ActorContext::new(self, id, record.parent);
                let result = behavior.handle(&msg, &mut ctx);
                (result, std::mem::take(&mut ctx.self_pending))
            };
            record.behavior = Some(behavior);
            for self_msg in self_sends {
                let _ = record.mailbox.push(self_msg);
            }

            match result {
                BehaviorResult::Ok => {}
                BehaviorResult::Stop => {
                    record.status = ActorStatus::Stopped;
                    break;
                }
                BehaviorResult::Fail => {
                    record.status = ActorStatus::Failed;
                    break;
                }
            }
        }

        if record.status.is_terminal() {
            self.finalize_teardown(record);
        } else {
            let more_pending = record.mailbox.has_items();
            self.actors.restore(record);
            if more_pending {
                self.schedule(id);
            }
        }
    }

    fn finalize_teardown(&mut self, mut record: ActorRecord) {
        let id = record.id;
        if let Some(mut behavior) = record.behavior.take() {
            let mut ctx = ActorContext::new(self, id, record.parent);
            behavior.post_stop(&mut ctx);
        }
        self.io.unwatch_owner(id);

        if let Some(sup) = record.supervisor.take() {
            let failing = record.status == ActorStatus::Failed;
            for meta in &sup.meta {
                if let Some(child_id) = meta.current_id {
                    if failing {
                        let _ = self.actor_fail(child_id);
                    } else {
                        let _ = self.actor_stop(child_id);
                    }
                }
            }
        }

        let parent = record.parent;
        let final_status = record.status;
        debug!(actor = %id, status = ?final_status, "torn down");
        self.actors.release(id);

        if let Some(parent_id) = parent {
            self.notify_parent_of_termination(parent_id, id, final_status);
        }
    }

    /// The supervisor whose child just terminated has its own record
    /// checked out of the table for the duration of this call (see
    /// `notify_parent_of_termination`), so a decision to escalate can't be
    /// carried out through `actor_fail` — that would look up the very slot
    /// that's currently empty. It's surfaced back to the caller instead,
    /// which holds the record locally and can set its status directly.
    fn notify_parent_of_termination(
        &mut self,
        parent_id: ActorId,
        child_id: ActorId,
        final_status: ActorStatus,
    ) {
        let Some(mut record) = self.actors.take_for_dispatch(parent_id) else {
            return;
        };
        let mut escalate = false;
        if let Some(mut sup) = record.supervisor.take() {
            escalate = self.on_child_terminated(&mut sup, parent_id, child_id, final_status);
            record.supervisor = Some(sup);
        }
        if escalate && !record.status.is_terminal() {
            record.status = ActorStatus::Failed;
        }
        let needs_dispatch = record.status.tears_down_without_dispatch();
        self.actors.restore(record);
        if needs_dispatch {
            self.schedule(parent_id);
        }
    }

    /// Returns `true` if the supervisor itself should be escalated (torn
    /// down as failed) rather than restarting the child.
    fn on_child_terminated(
        &mut self,
        sup: &mut SupervisorState,
        sup_id: ActorId,
        child_id: ActorId,
        final_status: ActorStatus,
    ) -> bool {
        if sup.take_expected_termination(child_id) {
            // Torn down as part of a batch this supervisor already kicked
            // off for a sibling's failure; that batch's restart decision
            // and intensity accounting already happened. Just drop the
            // now-stale id mapping, don't decide again.
            if let Some(index) = sup.index_of(child_id) {
                sup.clear_child_id(index);
            }
            return false;
        }

        let Some(index) = sup.index_of(child_id) else {
            return false;
        };
        sup.clear_child_id(index);

        let mode = sup.children[index].mode;
        let should_restart = matches!(
            (final_status, mode),
            (ActorStatus::Failed, RestartMode::Permanent)
                | (ActorStatus::Failed, RestartMode::Transient)
                | (ActorStatus::Stopped, RestartMode::Permanent)
        );
        if !should_restart {
            return false;
        }

        if sup.record_intensity() {
            debug!(supervisor = %sup_id, "restart intensity exceeded, escalating");
            return true;
        }

        let indices = affected_indices(sup.policy.strategy, index, sup.child_count());
        let restart_count = sup.meta[index].restart_count;
        let delay = restart_delay_ms(sup.policy.backoff, sup.policy.base_delay_ms, restart_count);

        let old_ids: Vec<(usize, Option<ActorId>)> =
            indices.iter().map(|&i| (i, sup.meta[i].current_id)).collect();
        for &(i, _) in &old_ids {
            sup.meta[i].restart_count += 1;
        }
        for &(i, old_id) in &old_ids {
            if i != index {
                if let Some(sibling_id) = old_id {
                    sup.mark_expected_termination(sibling_id);
                    let _ = self.actor_fail(sibling_id);
                }
            }
        }

        let batch_id = sup.next_batch_id();
        sup.pending.insert(batch_id, RestartBatch { indices });
        let tag = RESTART_TAG_BASE + batch_id;
        self.send_after(sup_id, delay, Payload::EMPTY, tag);
        false
    }

    fn run_restart_batch(&mut self, record: &mut ActorRecord, sup_id: ActorId, batch_id: u32) {
        let Some(sup) = record.supervisor.as_mut() else {
            return;
        };
        let Some(batch) = sup.pending.remove(&batch_id) else {
            return;
        };
        for index in batch.indices {
            let (behavior, mailbox_cap) = {
                let spec = &sup.children[index];
                ((spec.factory)(), spec.mailbox_cap)
            };
            match self.spawn_child(behavior, mailbox_cap, Some(sup_id)) {
                Ok(new_id) => {
                    if let Some(sup) = record.supervisor.as_mut() {
                        sup.set_child_id(index, new_id);
                    }
                }
                Err(err) => {
                    debug!(supervisor = %sup_id, index, ?err, "restart spawn failed");
                }
            }
        }
    }
}
