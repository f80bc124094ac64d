//! Per-actor mailboxes: bounded, FIFO, arrival-order only (spec §4.1).

pub mod message;
pub mod ring;

pub use message::{Message, Payload, IO_READY_TAG};
pub use ring::Mailbox;
