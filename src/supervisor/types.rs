//! Supervision data types: child specs, restart policy, strategy.

use crate::actor::Actor;

/// How a child's termination reason is weighed against restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartMode {
    /// Always restart: on failure and on a clean stop alike.
    Permanent,
    /// Restart only if the child failed; a clean stop is left stopped.
    Transient,
    /// Never restart, regardless of how the child terminated.
    Temporary,
}

/// Restart delay progression for consecutive restarts of the same child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// No delay; the replacement is scheduled immediately.
    None,
    /// A fixed delay, independent of how many times this child has restarted.
    Constant,
    /// Delay doubles with each consecutive restart of the same child,
    /// starting from the policy's base delay and capped at an
    /// implementation-defined ceiling.
    Exponential,
}

/// Which siblings are affected when one child under a supervisor fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionStrategy {
    /// Restart only the child that failed.
    OneForOne,
    /// Restart every child, including the ones still running.
    OneForAll,
    /// Restart the failed child and every child spawned after it.
    RestForOne,
}

/// A supervisor's restart policy: strategy, intensity window, and backoff.
#[derive(Debug, Clone)]
pub struct SupervisorPolicy {
    pub strategy: SupervisionStrategy,
    /// Maximum number of restarts tolerated within `period_ms` before the
    /// supervisor itself is torn down as failed.
    pub intensity: u32,
    /// Width, in milliseconds, of the sliding window `intensity` is counted
    /// over.
    pub period_ms: u64,
    pub backoff: BackoffKind,
    /// Base delay, in milliseconds, used by `BackoffKind::Constant` and as
    /// the starting point doubled by `BackoffKind::Exponential`.
    pub base_delay_ms: u64,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            strategy: SupervisionStrategy::OneForOne,
            intensity: 5,
            period_ms: 2_000,
            backoff: BackoffKind::Exponential,
            base_delay_ms: 100,
        }
    }
}

/// One child slot under a supervisor: how to (re)create it and how to treat
/// its termination.
pub struct ChildSpec {
    /// Builds a fresh behavior instance. Called once at initial spawn and
    /// again on every restart, so a child always starts from clean state.
    pub factory: Box<dyn Fn() -> Box<dyn Actor>>,
    pub mode: RestartMode,
    pub mailbox_cap: usize,
}

impl ChildSpec {
    pub fn new(
        mode: RestartMode,
        mailbox_cap: usize,
        factory: impl Fn() -> Box<dyn Actor> + 'static,
    ) -> Self {
        Self {
            factory: Box::new(factory),
            mode,
            mailbox_cap,
        }
    }
}

/// The full declaration needed to spawn a supervisor and its initial
/// children in one call.
pub struct SupervisorSpec {
    pub children: Vec<ChildSpec>,
    pub policy: SupervisorPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_defaults() {
        let policy = SupervisorPolicy::default();
        assert_eq!(policy.strategy, SupervisionStrategy::OneForOne);
        assert_eq!(policy.intensity, 5);
        assert_eq!(policy.period_ms, 2_000);
        assert_eq!(policy.backoff, BackoffKind::Exponential);
        assert_eq!(policy.base_delay_ms, 100);
    }
}
