//! Fluent builder for Scheduler construction.

use crate::runtime::Scheduler;

use std::time::Duration;

/// Scheduler settings, fixed at build time.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    /// Catch panics inside units and turn them into [`UnitError`](crate::UnitError)s.
    pub(crate) isolate_failures: bool,

    /// Upper bound on how long `run` parks between drains.
    pub(crate) park_timeout: Duration,

    /// Name given to timer notifier threads.
    pub(crate) thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            isolate_failures: true,
            park_timeout: Duration::from_millis(100),
            thread_name: "coop-timer".to_string(),
        }
    }
}

/// Builder for constructing Scheduler instances with fluent API.
///
/// # Example
/// ```ignore
/// let scheduler = SchedulerBuilder::new()
///     .isolate_failures(false)
///     .park_timeout(Duration::from_millis(10))
///     .build();
/// ```
#[derive(Default)]
pub struct SchedulerBuilder {
    config: Config,
}

impl SchedulerBuilder {
    /// Creates a builder holding the default configuration.
    ///
    /// Failures are isolated per unit, `run` parks for at most 100ms between
    /// drains, and timer notifiers are named `coop-timer`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a panicking unit is completed with an error (`true`, default)
    /// or the panic propagates out of `drain` and takes the host down.
    pub fn isolate_failures(mut self, isolate: bool) -> Self {
        self.config.isolate_failures = isolate;
        self
    }

    /// Maximum time `run` blocks waiting for a wakeup before draining again.
    ///
    /// Wakeups end the wait early, so this only bounds how stale an idle
    /// scheduler can get; it never delays a ready unit.
    ///
    /// # Arguments
    /// * `timeout` - Upper bound on each park between drains
    pub fn park_timeout(mut self, timeout: Duration) -> Self {
        self.config.park_timeout = timeout;
        self
    }

    /// Thread name used for timer notifiers.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Consumes the builder and constructs a Scheduler with its configuration.
    ///
    /// # Returns
    /// A new scheduler with no units and an empty ready queue
    pub fn build(self) -> Scheduler {
        Scheduler::with_config(self.config)
    }
}
