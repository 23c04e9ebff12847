//! Scheduler configuration.

use crate::engine::types::{Priority, DEFAULT_PRIORITY};


/// Construction-time settings of a [`Scheduler`](crate::Scheduler).
///
/// `parallel` can also be flipped at runtime with
/// [`Scheduler::set_parallel`](crate::Scheduler::set_parallel).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Run multi-system stages on the worker pool. When `false` every tick
    /// takes the sequential path.
    pub parallel: bool,
    /// Worker pool size. `None` sizes the pool to the available hardware
    /// parallelism.
    pub worker_threads: Option<usize>,
    /// Prefix of worker thread names; the worker index is appended.
    pub thread_name_prefix: String,
    /// Priority given to systems registered without metadata.
    pub default_priority: Priority,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_threads: None,
            thread_name_prefix: "ecs-worker".to_owned(),
            default_priority: DEFAULT_PRIORITY,
        }
    }
}

impl SchedulerConfig {
    /// Configuration that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self::default().with_parallel(false)
    }

    /// Enables or disables parallel stage execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets an explicit worker pool size (clamped to at least one).
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads.max(1));
        self
    }

    /// Sets the worker thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the priority used for systems registered without metadata.
    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Worker pool size after resolving `None` against the host.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, |threads| threads.get())
        })
    }
}
