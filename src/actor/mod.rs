//! Actor behavior and the context it runs with.
//!
//! Actor *status* (`Init`/`Running`/`Stopping`/`Stopped`/`Failed`) and the
//! record holding mailbox + behavior together live in [`crate::table`] —
//! that's storage, owned by the scheduler. This module is the trait an
//! embedder implements and the handle their code runs with.

pub mod context;
pub mod traits;

pub use context::ActorContext;
pub use traits::{Actor, BehaviorResult};
