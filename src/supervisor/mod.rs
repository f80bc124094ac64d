//! Hierarchical supervision: restart policy data and bookkeeping.
//!
//! The orchestration itself — deciding when a termination warrants a
//! restart, applying backoff, cascading a strategy across siblings — lives
//! in [`crate::system::rt_loop`], since it needs mutable access to the rest
//! of the scheduler (spawning replacement actors, scheduling timers). This
//! module only holds the policy types and the per-supervisor restart
//! bookkeeping those operations read and update.

mod backoff;
mod strategy;
mod types;

use std::collections::{HashMap, HashSet};

use crate::util::ActorId;

/// First reserved message tag used for supervisor restart-batch control
/// messages a supervisor schedules to itself via `send_after`. Tags in
/// `RESTART_TAG_BASE..IO_READY_TAG` are never delivered to user code.
pub(crate) const RESTART_TAG_BASE: u32 = u32::MAX - 1_000_000;

pub use backoff::restart_delay_ms;
pub use strategy::affected_indices;
pub use types::{
    BackoffKind, ChildSpec, RestartMode, SupervisionStrategy, SupervisorPolicy, SupervisorSpec,
};

use backoff::IntensityWindow;

/// Per-child restart bookkeeping: which actor id currently occupies the
/// slot (`None` while a replacement is pending) and how many times in a row
/// this slot has been restarted.
pub(crate) struct ChildMeta {
    pub current_id: Option<ActorId>,
    pub restart_count: u32,
}

/// A group of sibling indices torn down together under `OneForAll` or
/// `RestForOne`, waiting on the same backoff timer before they are all
/// respawned.
pub(crate) struct RestartBatch {
    pub indices: Vec<usize>,
}

/// Everything a supervisor actor needs beyond the generic actor record:
/// its children's specs, their live ids, and the shared intensity window.
pub(crate) struct SupervisorState {
    pub children: Vec<ChildSpec>,
    pub meta: Vec<ChildMeta>,
    pub policy: SupervisorPolicy,
    window: IntensityWindow,
    pub pending: HashMap<u32, RestartBatch>,
    next_batch: u32,
    /// Children the supervisor itself just marked `Failed` as part of an
    /// `OneForAll`/`RestForOne` restart batch. Their teardown is about to
    /// re-enter `on_child_terminated` as a sibling notification; that
    /// notification is expected and must not be treated as an independent
    /// failure (it would double-count the restart and schedule a second,
    /// overlapping restart batch).
    expected_terminations: HashSet<ActorId>,
}

impl SupervisorState {
    pub fn new(children: Vec<ChildSpec>, policy: SupervisorPolicy) -> Self {
        let meta = children
            .iter()
            .map(|_| ChildMeta {
                current_id: None,
                restart_count: 0,
            })
            .collect();
        let window = IntensityWindow::new(policy.period_ms);
        Self {
            children,
            meta,
            policy,
            window,
            pending: HashMap::new(),
            next_batch: 0,
            expected_terminations: HashSet::new(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child_id(&self, index: usize) -> Option<ActorId> {
        self.meta.get(index).and_then(|m| m.current_id)
    }

    pub fn set_child_id(&mut self, index: usize, id: ActorId) {
        if let Some(meta) = self.meta.get_mut(index) {
            meta.current_id = Some(id);
        }
    }

    pub fn clear_child_id(&mut self, index: usize) {
        if let Some(meta) = self.meta.get_mut(index) {
            meta.current_id = None;
        }
    }

    pub fn index_of(&self, id: ActorId) -> Option<usize> {
        self.meta.iter().position(|m| m.current_id == Some(id))
    }

    /// Records a restart attempt against the shared intensity window and
    /// reports whether the count within the window now exceeds policy.
    pub fn record_intensity(&mut self) -> bool {
        self.window.record_and_check(self.policy.intensity)
    }

    pub fn next_batch_id(&mut self) -> u32 {
        let id = self.next_batch;
        self.next_batch = self.next_batch.wrapping_add(1);
        id
    }

    /// Marks `id` as a termination the supervisor itself requested (a
    /// sibling being torn down as part of a restart batch), so the
    /// notification it triggers on teardown is suppressed exactly once.
    pub fn mark_expected_termination(&mut self, id: ActorId) {
        self.expected_terminations.insert(id);
    }

    /// Returns `true` and clears the mark if `id`'s termination was
    /// requested by the supervisor itself via [`Self::mark_expected_termination`].
    pub fn take_expected_termination(&mut self, id: ActorId) -> bool {
        self.expected_terminations.remove(&id)
    }
}
