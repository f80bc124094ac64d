//! Opaque message payloads.
//!
//! The runtime never interprets, copies, or frees payload bytes — ownership
//! stays with whoever constructed the [`Payload`], by convention rather than
//! enforcement (see `SPEC_FULL.md` §5).

// Layer 1: Standard library imports
use std::fmt;
use std::slice;
use std::sync::Arc;

use crate::util::ActorId;

/// The system-reserved message tag used for runtime-synthesized I/O
/// readiness notifications. User code should avoid sending messages with
/// this tag to keep readiness messages distinguishable.
pub const IO_READY_TAG: u32 = u32::MAX;

/// An opaque, caller-owned byte region.
///
/// `Payload` is `Copy` — it is a pointer and a length, nothing more. The
/// runtime stores and moves it between mailboxes without ever dereferencing
/// it itself, except through [`Payload::as_slice`] which the embedder's own
/// behavior code calls.
///
/// # Safety
///
/// The pointed-to memory must remain valid and unmodified-by-others for as
/// long as any `Payload` referencing it could still be read, which in
/// practice means: for as long as the sender's documented ownership
/// contract says so. The runtime does not track this lifetime.
#[derive(Clone, Copy)]
pub struct Payload {
    data: *const u8,
    len: usize,
}

// SAFETY: Payload is a plain pointer+length pair passed between threads only
// as an opaque handle (enqueued in the ingress or a mailbox); dereferencing
// it is entirely the embedder's responsibility via `as_slice`, under the
// same contract the embedder already has to uphold for any raw pointer
// shared across threads.
unsafe impl Send for Payload {}

impl Payload {
    /// An empty payload (zero-length).
    pub const EMPTY: Payload = Payload {
        data: std::ptr::null(),
        len: 0,
    };

    /// Wraps a raw byte region. The caller asserts the pointer is valid for
    /// `len` bytes for as long as this `Payload` (and any copy of it) may be
    /// read.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `len` bytes, or null when `len` is
    /// 0.
    pub unsafe fn from_raw(data: *const u8, len: usize) -> Self {
        Self { data, len }
    }

    /// Wraps a borrowed slice. The returned `Payload` is only valid for as
    /// long as `slice` is.
    pub fn from_slice(slice: &[u8]) -> Self {
        Self {
            data: slice.as_ptr(),
            len: slice.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Views the payload as a byte slice.
    ///
    /// # Safety
    ///
    /// The caller must ensure the memory this `Payload` was constructed from
    /// is still valid.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.data.is_null() {
            &[]
        } else {
            slice::from_raw_parts(self.data, self.len)
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("len", &self.len)
            .finish()
    }
}

/// A single mailbox entry: an opaque payload plus routing metadata.
///
/// Mirrors `jzx_message` from the C reference header: `data`/`len` folded
/// into [`Payload`], plus a 32-bit `tag` and the sending actor's id (zero —
/// i.e. `ActorId::from_u64(0)` — when the message was synthesized by the
/// runtime itself rather than sent by another actor).
///
/// `owned` keeps a runtime-synthesized payload's backing buffer (e.g. an I/O
/// readiness frame) alive for exactly as long as this `Message` exists —
/// from the moment it's built to the moment the owning mailbox pops and
/// drops it — rather than tying its lifetime to an unrelated poll cycle.
/// User-constructed messages over caller-owned payloads leave it `None`;
/// `Payload`'s own safety contract governs those instead.
#[derive(Debug, Clone)]
pub struct Message {
    pub payload: Payload,
    pub tag: u32,
    pub sender: ActorId,
    pub(crate) owned: Option<Arc<[u8]>>,
}

impl Message {
    pub fn new(payload: Payload, tag: u32, sender: ActorId) -> Self {
        Self {
            payload,
            tag,
            sender,
            owned: None,
        }
    }

    /// Builds the message synthesized by the I/O watcher for a readiness
    /// event: payload is `{descriptor, readiness mask}`, tag is the reserved
    /// [`IO_READY_TAG`], sender is the zero id, with no buffer of its own to
    /// keep alive.
    #[cfg(test)]
    pub(crate) fn io_ready(payload: Payload) -> Self {
        Self {
            payload,
            tag: IO_READY_TAG,
            sender: ActorId::from_u64(0),
            owned: None,
        }
    }

    /// Builds a readiness message whose payload points into `buf`, keeping
    /// `buf` alive alongside the message for as long as it sits in a
    /// mailbox (or is in flight through the ingress/delivery path).
    pub(crate) fn io_ready_owned(payload: Payload, buf: Arc<[u8]>) -> Self {
        Self {
            payload,
            tag: IO_READY_TAG,
            sender: ActorId::from_u64(0),
            owned: Some(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_has_zero_length() {
        assert_eq!(Payload::EMPTY.len(), 0);
        assert!(Payload::EMPTY.is_empty());
    }

    #[test]
    fn slice_round_trips() {
        let bytes = [1u8, 2, 3];
        let payload = Payload::from_slice(&bytes);
        let view = unsafe { payload.as_slice() };
        assert_eq!(view, &bytes);
    }

    #[test]
    fn io_ready_uses_reserved_tag_and_zero_sender() {
        let msg = Message::io_ready(Payload::EMPTY);
        assert_eq!(msg.tag, IO_READY_TAG);
        assert_eq!(msg.sender.as_u64(), 0);
    }
}
