//! Runtime configuration with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::system::errors::RuntimeError;

/// Tunables fixed at construction and held for the lifetime of an
/// [`crate::RtLoop`]. Most capacities are hard ceilings: exceeding one
/// returns an error rather than growing the underlying allocation, since
/// the runtime is meant to run with a fixed memory footprint decided up
/// front by the embedder. `max_io_watchers` is the one exception — it
/// seeds the watcher array's initial capacity, which doubles on overflow
/// rather than rejecting the registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum number of actors live at once, including supervisors.
    pub max_actors: usize,
    /// Mailbox capacity used when a spawn call doesn't specify its own.
    pub default_mailbox_cap: usize,
    /// Maximum messages drained from one actor's mailbox per tick before
    /// the loop moves on, bounding how long a single busy actor can hold up
    /// the rest of the run queue.
    pub max_msgs_per_actor: usize,
    /// Maximum actors dispatched from the run queue in one tick.
    pub max_actors_per_tick: usize,
    /// Initial capacity of the I/O watcher's descriptor array; doubles on
    /// overflow rather than rejecting further registrations.
    pub max_io_watchers: usize,
    /// Upper bound, in milliseconds, the loop blocks in `poll(2)` while idle.
    pub io_poll_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_actors: 1024,
            default_mailbox_cap: 1024,
            max_msgs_per_actor: 64,
            max_actors_per_tick: 1024,
            max_io_watchers: 1024,
            io_poll_timeout_ms: 10,
        }
    }
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Rejects a config with any zero capacity, which would make the
    /// runtime unable to do anything useful.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let fields = [
            self.max_actors,
            self.default_mailbox_cap,
            self.max_msgs_per_actor,
            self.max_actors_per_tick,
            self.max_io_watchers,
        ];
        if fields.iter().any(|&f| f == 0) {
            return Err(RuntimeError::InvalidArg);
        }
        Ok(())
    }
}

/// Fluent builder for [`RuntimeConfig`], starting from
/// [`RuntimeConfig::default`].
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfigBuilder {
    config: Option<RuntimeConfig>,
}

macro_rules! with_field {
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            let mut config = self.config.take().unwrap_or_default();
            config.$field = value;
            self.config = Some(config);
            self
        }
    };
}

impl RuntimeConfigBuilder {
    with_field!(max_actors, max_actors, usize);
    with_field!(default_mailbox_cap, default_mailbox_cap, usize);
    with_field!(max_msgs_per_actor, max_msgs_per_actor, usize);
    with_field!(max_actors_per_tick, max_actors_per_tick, usize);
    with_field!(max_io_watchers, max_io_watchers, usize);
    with_field!(io_poll_timeout_ms, io_poll_timeout_ms, u64);

    pub fn build(self) -> Result<RuntimeConfig, RuntimeError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_actors, 1024);
        assert_eq!(config.default_mailbox_cap, 1024);
        assert_eq!(config.max_msgs_per_actor, 64);
        assert_eq!(config.max_actors_per_tick, 1024);
        assert_eq!(config.max_io_watchers, 1024);
        assert_eq!(config.io_poll_timeout_ms, 10);
    }

    #[test]
    fn builder_overrides_individual_fields() {
        let config = RuntimeConfig::builder()
            .max_actors(16)
            .default_mailbox_cap(8)
            .build()
            .expect("valid config");
        assert_eq!(config.max_actors, 16);
        assert_eq!(config.default_mailbox_cap, 8);
        assert_eq!(config.max_msgs_per_actor, 64);
    }

    #[test]
    fn zero_capacity_fails_validation() {
        let result = RuntimeConfig::builder().max_actors(0).build();
        assert!(matches!(result, Err(RuntimeError::InvalidArg)));
    }

    #[test]
    fn round_trips_through_json() {
        let config = RuntimeConfig::default();
        let json = serde_json::to_string(&config).expect("serializable");
        let back: RuntimeConfig = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back.max_actors, config.max_actors);
    }
}
