//! Readiness-based I/O watcher built on `poll(2)`.
//!
//! Descriptors are registered by the owning actor's id and an interest mask.
//! Each tick the loop calls [`IoWatcher::poll`] once; any descriptor that
//! became ready has a synthesized [`Message`] with the reserved
//! [`IO_READY_TAG`] pushed straight into its owner's mailbox.
//!
//! The runtime never owns the descriptor: registering it does not duplicate
//! or close it, and dropping the watcher does not close anything either.

use std::os::unix::io::{BorrowedFd, RawFd};
use std::sync::Arc;

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::mailbox::{Message, Payload, IO_READY_TAG};
use crate::system::errors::RuntimeError;
use crate::util::ActorId;

/// Readiness interest: reads, writes, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest(u8);

impl Interest {
    pub const READ: Interest = Interest(0b01);
    pub const WRITE: Interest = Interest(0b10);

    fn contains(self, other: Interest) -> bool {
        self.0 & other.0 != 0
    }

    fn to_poll_flags(self) -> PollFlags {
        let mut flags = PollFlags::empty();
        if self.contains(Interest::READ) {
            flags |= PollFlags::POLLIN | PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL;
        }
        if self.contains(Interest::WRITE) {
            flags |= PollFlags::POLLOUT | PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL;
        }
        flags
    }
}

impl std::ops::BitOr for Interest {
    type Output = Interest;
    fn bitor(self, rhs: Interest) -> Interest {
        Interest(self.0 | rhs.0)
    }
}

fn readiness_from_revents(revents: PollFlags) -> u8 {
    let mut mask = 0u8;
    let read_bits = PollFlags::POLLIN | PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL;
    let write_bits = PollFlags::POLLOUT | PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL;
    if revents.intersects(read_bits) {
        mask |= Interest::READ.0;
    }
    if revents.intersects(write_bits) {
        mask |= Interest::WRITE.0;
    }
    mask
}

struct Watcher {
    fd: RawFd,
    owner: ActorId,
    interest: Interest,
}

/// Flat, resizable registry of watched descriptors plus the parallel poll
/// array rebuilt whenever a registration changes.
pub(crate) struct IoWatcher {
    watchers: Vec<Watcher>,
    capacity: usize,
    dirty: bool,
    cached_flags: Vec<PollFlags>,
}

impl IoWatcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            watchers: Vec::new(),
            capacity: capacity.max(1),
            dirty: false,
            cached_flags: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn watch(
        &mut self,
        fd: RawFd,
        owner: ActorId,
        interest: Interest,
    ) -> Result<(), RuntimeError> {
        if let Some(existing) = self.watchers.iter_mut().find(|w| w.fd == fd) {
            existing.owner = owner;
            existing.interest = interest;
            self.dirty = true;
            return Ok(());
        }
        if self.watchers.len() >= self.capacity {
            self.capacity = self.capacity.saturating_mul(2).max(self.capacity + 1);
        }
        self.watchers.push(Watcher { fd, owner, interest });
        self.dirty = true;
        Ok(())
    }

    pub fn unwatch(&mut self, fd: RawFd) -> Result<(), RuntimeError> {
        let before = self.watchers.len();
        self.watchers.retain(|w| w.fd != fd);
        if self.watchers.len() == before {
            return Err(RuntimeError::IoNotWatched);
        }
        self.dirty = true;
        Ok(())
    }

    /// Removes every watcher owned by `owner`, used when an actor tears
    /// down without explicitly unregistering its descriptors.
    pub fn unwatch_owner(&mut self, owner: ActorId) {
        let before = self.watchers.len();
        self.watchers.retain(|w| w.owner != owner);
        if self.watchers.len() != before {
            self.dirty = true;
        }
    }

    fn rebuild(&mut self) {
        self.cached_flags = self.watchers.iter().map(|w| w.interest.to_poll_flags()).collect();
        self.dirty = false;
    }

    /// Polls for readiness, waiting up to `timeout_ms` (0 = return
    /// immediately). Every descriptor that reported readiness has a
    /// readiness message delivered to `deliver`.
    ///
    /// Called even when no descriptors are registered: `poll(2)` with an
    /// empty set and a nonzero timeout still sleeps for that duration
    /// before returning 0, which is exactly the idle-path wait the
    /// scheduler relies on to avoid busy-spinning while watcher-less.
    pub fn poll(
        &mut self,
        timeout_ms: i32,
        mut deliver: impl FnMut(ActorId, Message),
    ) -> Result<(), RuntimeError> {
        if self.dirty {
            self.rebuild();
        }
        let mut poll_fds: Vec<PollFd<'_>> = self
            .watchers
            .iter()
            .zip(&self.cached_flags)
            .map(|(w, &flags)| {
                // Safety: the descriptor is owned by the embedder for the
                // duration of the registration; the runtime only ever reads
                // its readiness state here and never closes it.
                let borrowed = unsafe { BorrowedFd::borrow_raw(w.fd) };
                PollFd::new(borrowed, flags)
            })
            .collect();
        let timeout = PollTimeout::try_from(timeout_ms).unwrap_or(PollTimeout::MAX);
        let ready = poll(&mut poll_fds, timeout).map_err(|_| RuntimeError::IoRegFailed)?;
        if ready <= 0 {
            return Ok(());
        }
        for (pf, watcher) in poll_fds.iter().zip(&self.watchers) {
            let Some(revents) = pf.revents() else {
                continue;
            };
            let mask = readiness_from_revents(revents);
            if mask == 0 {
                continue;
            }
            let mut buf = Vec::with_capacity(5);
            buf.extend_from_slice(&watcher.fd.to_le_bytes());
            buf.push(mask);
            let buf: Arc<[u8]> = Arc::from(buf.into_boxed_slice());
            let payload = Payload::from_slice(&buf);
            deliver(watcher.owner, Message::io_ready_owned(payload, buf));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_and_unwatch_round_trip() {
        let mut watcher = IoWatcher::new(4);
        let owner = ActorId::new(0, 0);
        watcher.watch(0, owner, Interest::READ).expect("room available");
        assert_eq!(watcher.len(), 1);
        watcher.unwatch(0).expect("registered");
        assert!(watcher.is_empty());
    }

    #[test]
    fn unwatch_missing_fd_is_an_error() {
        let mut watcher = IoWatcher::new(4);
        assert!(matches!(
            watcher.unwatch(5),
            Err(RuntimeError::IoNotWatched)
        ));
    }

    #[test]
    fn capacity_grows_on_overflow_instead_of_failing() {
        let mut watcher = IoWatcher::new(1);
        let owner = ActorId::new(0, 0);
        watcher.watch(0, owner, Interest::READ).expect("first fits");
        watcher
            .watch(1, owner, Interest::READ)
            .expect("capacity doubles rather than rejecting the registration");
        assert_eq!(watcher.len(), 2);
        assert!(watcher.capacity >= 2);
    }

    #[test]
    fn poll_on_a_ready_pipe_delivers_readiness() {
        let (r, w) = nix::unistd::pipe().expect("pipe should be available in tests");
        let owner = ActorId::new(1, 0);
        let mut watcher = IoWatcher::new(4);
        watcher
            .watch(std::os::unix::io::AsRawFd::as_raw_fd(&r), owner, Interest::READ)
            .expect("room available");
        nix::unistd::write(&w, b"x").expect("write should succeed");
        let mut delivered = Vec::new();
        watcher
            .poll(100, |id, msg| delivered.push((id, msg)))
            .expect("poll should succeed");
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, owner);
        assert_eq!(delivered[0].1.tag, IO_READY_TAG);
    }
}
