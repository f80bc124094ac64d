//! Runtime configuration, the error taxonomy, and the scheduler loop.

pub mod config;
pub mod errors;
pub mod rt_loop;

pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use errors::RuntimeError;
pub use rt_loop::{RtHandle, RtLoop};
