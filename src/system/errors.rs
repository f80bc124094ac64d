//! The runtime's single error type.

use thiserror::Error;

/// Every way a runtime operation can fail.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// An internal invariant was violated. Should never surface in practice;
    /// if it does, treat it as a bug report.
    #[error("unknown runtime error")]
    Unknown,

    /// A fixed-capacity allocation (table slot, mailbox slot, run queue
    /// entry) could not be satisfied.
    #[error("no memory available for this allocation")]
    NoMemory,

    /// An argument failed validation (e.g. a zero-capacity mailbox request).
    #[error("invalid argument")]
    InvalidArg,

    /// The loop has already shut down or is in the middle of shutting down.
    #[error("the loop is closed")]
    LoopClosed,

    /// The target `ActorId` does not resolve to a live actor — either it
    /// never existed or its slot has since been recycled.
    #[error("no such actor")]
    NoSuchActor,

    /// The target mailbox is at capacity.
    #[error("mailbox is full")]
    MailboxFull,

    /// The `TimerId` does not resolve to a pending timer.
    #[error("invalid or already-fired timer")]
    TimerInvalid,

    /// Registering a descriptor with the I/O watcher failed (capacity
    /// reached, or the underlying `poll` registration failed).
    #[error("I/O registration failed")]
    IoRegFailed,

    /// The descriptor was not registered with the I/O watcher.
    #[error("descriptor is not being watched")]
    IoNotWatched,

    /// The actor table is at capacity.
    #[error("maximum actor count reached")]
    MaxActors,
}

impl RuntimeError {
    /// Whether retrying the same operation later, without any other state
    /// change, has a reasonable chance of succeeding.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            RuntimeError::NoMemory | RuntimeError::MailboxFull | RuntimeError::MaxActors
        )
    }

    /// Whether the error reflects a programming mistake (bad id, bad
    /// argument) rather than a transient resource condition.
    pub fn is_fatal(self) -> bool {
        !self.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_exhaustion_errors_are_transient() {
        assert!(RuntimeError::NoMemory.is_transient());
        assert!(RuntimeError::MailboxFull.is_transient());
        assert!(RuntimeError::MaxActors.is_transient());
    }

    #[test]
    fn identity_and_argument_errors_are_fatal() {
        assert!(RuntimeError::NoSuchActor.is_fatal());
        assert!(RuntimeError::InvalidArg.is_fatal());
        assert!(RuntimeError::TimerInvalid.is_fatal());
        assert!(RuntimeError::LoopClosed.is_fatal());
    }
}
