//! Convenient imports for building on top of the runtime.
//!
//! ```rust,ignore
//! use corvid_rt::prelude::*;
//! ```
//!
//! # What's Included
//!
//! ## Actors
//! - [`Actor`] - the trait every behavior implements
//! - [`ActorContext`] - the handle a behavior uses to send, spawn, and
//!   schedule timers
//! - [`BehaviorResult`] - what `handle` returns: continue, stop, or fail
//!
//! ## Messaging
//! - [`Message`] - a mailbox entry: payload, tag, sender
//! - [`Payload`] - an opaque, caller-owned byte region
//! - [`IO_READY_TAG`] - the reserved tag used for I/O readiness
//!   notifications
//!
//! ## Supervision
//! - [`ChildSpec`] - how to (re)create a supervised child
//! - [`SupervisorSpec`] - a supervisor and its initial children
//! - [`SupervisorPolicy`] - strategy, intensity window, and backoff
//! - [`SupervisionStrategy`] - `OneForOne`, `OneForAll`, `RestForOne`
//! - [`RestartMode`] - `Permanent`, `Transient`, `Temporary`
//! - [`BackoffKind`] - `None`, `Constant`, `Exponential`
//!
//! ## Running the loop
//! - [`RtLoop`] - the scheduler itself
//! - [`RtHandle`] - a cloneable, thread-safe send handle
//! - [`RuntimeConfig`] / [`RuntimeConfigBuilder`] - tunables
//! - [`RuntimeError`] - the runtime's single error type
//!
//! ## I/O and identifiers
//! - [`Interest`] - read/write readiness interest for a watched descriptor
//! - [`ActorId`] / [`TimerId`] - generation-tagged handles

pub use crate::actor::{Actor, ActorContext, BehaviorResult};
pub use crate::io::Interest;
pub use crate::mailbox::{Message, Payload, IO_READY_TAG};
pub use crate::supervisor::{
    BackoffKind, ChildSpec, RestartMode, SupervisionStrategy, SupervisorPolicy, SupervisorSpec,
};
pub use crate::system::{RtHandle, RtLoop, RuntimeConfig, RuntimeConfigBuilder, RuntimeError};
pub use crate::util::{ActorId, TimerId};
