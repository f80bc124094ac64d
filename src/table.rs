//! Flat, generation-tagged actor storage.
//!
//! The table is the single owner of every actor's behavior, mailbox and
//! supervision state. Slots are reused once an actor is torn down; the
//! generation counter stamped into each [`ActorId`] is what keeps a stale
//! handle from ever addressing the slot's next occupant.

use crate::actor::Actor;
use crate::mailbox::Mailbox;
use crate::supervisor::SupervisorState;
use crate::system::errors::RuntimeError;
use crate::util::ActorId;

/// Lifecycle phase of a single actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStatus {
    /// Allocated but not yet dispatched for the first time.
    Init,
    /// Eligible for normal message dispatch.
    Running,
    /// `actor_stop` was requested; torn down at the next dispatch.
    Stopping,
    /// Terminated cleanly. Terminal.
    Stopped,
    /// Terminated by `actor_fail` or an unrecoverable error. Terminal.
    Failed,
}

impl ActorStatus {
    /// Whether this status can never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, ActorStatus::Stopped | ActorStatus::Failed)
    }

    /// Whether an actor in this status should be torn down at its next
    /// dispatch instead of having messages delivered to it. Covers both
    /// already-terminal statuses and `Stopping`, which is set by
    /// `actor_stop` from outside the actor's own dispatch and has not yet
    /// run its `post_stop`/teardown.
    pub fn tears_down_without_dispatch(self) -> bool {
        matches!(
            self,
            ActorStatus::Stopping | ActorStatus::Stopped | ActorStatus::Failed
        )
    }
}

/// Everything the runtime keeps about one live actor.
pub(crate) struct ActorRecord {
    pub id: ActorId,
    pub status: ActorStatus,
    pub behavior: Option<Box<dyn Actor>>,
    pub mailbox: Mailbox,
    pub parent: Option<ActorId>,
    pub in_run_queue: bool,
    pub supervisor: Option<SupervisorState>,
}

/// Fixed-capacity store of [`ActorRecord`]s addressed by generation-tagged id.
pub(crate) struct ActorTable {
    slots: Vec<Option<ActorRecord>>,
    generations: Vec<u32>,
    free: Vec<u32>,
    len: usize,
}

impl ActorTable {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut free = Vec::with_capacity(capacity);
        // Pop from the back, so index 0 is handed out first.
        for idx in (0..capacity as u32).rev() {
            free.push(idx);
        }
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            generations: vec![1; capacity],
            free,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates a slot and constructs its record from the freshly-stamped id.
    pub fn insert(
        &mut self,
        build: impl FnOnce(ActorId) -> ActorRecord,
    ) -> Result<ActorId, RuntimeError> {
        let idx = self.free.pop().ok_or(RuntimeError::MaxActors)?;
        let generation = self.generations[idx as usize];
        let id = ActorId::new(idx, generation);
        self.slots[idx as usize] = Some(build(id));
        self.len += 1;
        Ok(id)
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorRecord> {
        let record = self.slots.get(id.index() as usize)?.as_ref()?;
        (record.id == id).then_some(record)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorRecord> {
        let record = self.slots.get_mut(id.index() as usize)?.as_mut()?;
        (record.id == id).then_some(record)
    }

    /// Removes the record from its slot without taking ownership of the
    /// dispatch loop: the slot stays reserved (not returned to the free
    /// list) until [`ActorTable::release`] is called. Used to move an
    /// `ActorRecord` out of the table for the duration of message dispatch,
    /// so the rest of the table remains mutably reachable (spawning
    /// children, sending to other actors) while that one record is held
    /// locally.
    pub fn take_for_dispatch(&mut self, id: ActorId) -> Option<ActorRecord> {
        let idx = id.index() as usize;
        let occupied = self.slots.get(idx)?.as_ref()?.id == id;
        if !occupied {
            return None;
        }
        self.slots[idx].take()
    }

    /// Returns a record previously removed by [`ActorTable::take_for_dispatch`].
    pub fn restore(&mut self, record: ActorRecord) {
        let idx = record.id.index() as usize;
        self.slots[idx] = Some(record);
    }

    /// Frees the slot held (but not occupied) after `take_for_dispatch`,
    /// bumping the generation so any outstanding [`ActorId`] is invalidated.
    pub fn release(&mut self, id: ActorId) {
        let idx = id.index() as usize;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push(idx as u32);
        self.len -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::Mailbox;

    struct NullActor;
    impl Actor for NullActor {
        fn handle(
            &mut self,
            _msg: &crate::mailbox::Message,
            _ctx: &mut crate::actor::ActorContext<'_>,
        ) -> crate::actor::BehaviorResult {
            crate::actor::BehaviorResult::Ok
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn record(id: ActorId) -> ActorRecord {
        ActorRecord {
            id,
            status: ActorStatus::Running,
            behavior: Some(Box::new(NullActor)),
            mailbox: Mailbox::new(8),
            parent: None,
            in_run_queue: false,
            supervisor: None,
        }
    }

    #[test]
    fn insert_and_lookup_round_trips() {
        let mut table = ActorTable::new(4);
        let id = table.insert(record).expect("room available");
        assert_eq!(table.len(), 1);
        assert!(table.get(id).is_some());
    }

    #[test]
    fn stale_id_after_reuse_is_rejected() {
        let mut table = ActorTable::new(1);
        let first = table.insert(record).expect("room available");
        let taken = table.take_for_dispatch(first).expect("present");
        table.release(taken.id);
        let second = table.insert(record).expect("slot freed");
        assert_ne!(first, second);
        assert!(table.get(first).is_none());
        assert!(table.get(second).is_some());
    }

    #[test]
    fn max_actors_exhausts_free_list() {
        let mut table = ActorTable::new(2);
        table.insert(record).expect("first");
        table.insert(record).expect("second");
        assert!(matches!(table.insert(record), Err(RuntimeError::MaxActors)));
    }

    #[test]
    fn take_for_dispatch_keeps_slot_reserved() {
        let mut table = ActorTable::new(1);
        let id = table.insert(record).expect("room");
        let rec = table.take_for_dispatch(id).expect("present");
        // Slot is held, not freed: a second insert must fail.
        assert!(matches!(table.insert(record), Err(RuntimeError::MaxActors)));
        table.restore(rec);
        assert!(table.get(id).is_some());
    }
}
