//! # corvid-rt - an embeddable single-process actor runtime
//!
//! A single-threaded, cooperative scheduler with bounded mailboxes, timers
//! and an I/O readiness watcher, topped with Erlang/OTP-style hierarchical
//! supervision: one-for-one, one-for-all and rest-for-one strategies,
//! restart intensity windows, and configurable backoff between restarts.
//!
//! There is no async runtime underneath this crate and no implicit
//! parallelism: one loop thread drives everything, and every behavior runs
//! to completion before the next message is considered. Cross-thread
//! senders reach the loop through [`RtHandle`], and background helper
//! threads (the timer service, `poll(2)` for I/O) hand work back to the
//! loop thread rather than touching actor state directly.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use corvid_rt::prelude::*;
//!
//! struct Counter {
//!     count: u64,
//! }
//!
//! impl Actor for Counter {
//!     fn handle(&mut self, msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
//!         self.count += 1;
//!         BehaviorResult::Ok
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! fn main() -> Result<(), RuntimeError> {
//!     let mut rt = RtLoop::new(RuntimeConfig::default())?;
//!     let counter = rt.spawn(Box::new(Counter { count: 0 }))?;
//!     rt.send(counter, Payload::EMPTY, 1)?;
//!     rt.request_stop();
//!     rt.run()
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`actor`] - the `Actor` trait and the `ActorContext` handle behaviors
//!   run with
//! - [`mailbox`] - bounded, FIFO, arrival-order-only per-actor mailboxes
//! - [`supervisor`] - restart policy types and the supervision data model
//! - [`system`] - the scheduler loop (`RtLoop`), configuration and the
//!   error taxonomy
//! - [`io`] - the `poll(2)`-backed I/O readiness watcher
//! - [`util`] - `ActorId` and `TimerId`
//!
//! The actor table, timer service, cross-thread ingress queue and run
//! queue are internal to the scheduler and not exposed as public modules.
//!
//! # Non-goals
//!
//! This crate does not provide distribution, hot code reloading, or
//! preemptive scheduling. A behavior that blocks or loops without
//! returning blocks the entire loop thread; correctness here depends on
//! actors being well-behaved cooperative participants.

pub mod actor;
pub mod io;
pub mod mailbox;
pub mod prelude;
pub mod supervisor;
pub mod system;
pub mod util;

pub(crate) mod ingress;
pub(crate) mod run_queue;
pub(crate) mod table;
pub(crate) mod timer;

pub use actor::{Actor, ActorContext, BehaviorResult};
pub use io::Interest;
pub use mailbox::{Mailbox, Message, Payload, IO_READY_TAG};
pub use supervisor::{
    BackoffKind, ChildSpec, RestartMode, SupervisionStrategy, SupervisorPolicy, SupervisorSpec,
};
pub use system::{RtHandle, RtLoop, RuntimeConfig, RuntimeConfigBuilder, RuntimeError};
pub use util::{ActorId, TimerId};
