//! Per-system execution timing.
//!
//! The scheduler times every system invocation and records the duration here,
//! keyed by [`SystemId`]. The tracker is a pure side channel: nothing in the
//! scheduler reads it back, and it never influences planning.
//!
//! Consumers pull a [`PerformanceSnapshot`] whenever they want one; the
//! scheduler does not push to any sink.
//!
//! Worker threads do not touch the tracker. Timings of a stage are gathered by
//! the workers and recorded in one batch, on the ticking thread, after the
//! stage barrier.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::Mutex;

use crate::engine::types::SystemId;


/// Rolling statistics for one system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemTiming {
    /// Duration of the most recent invocation.
    pub last: Duration,
    /// Running mean over all recorded invocations.
    pub mean: Duration,
    /// Shortest recorded invocation.
    pub min: Duration,
    /// Longest recorded invocation.
    pub max: Duration,
    /// Number of recorded invocations, failed ones included.
    pub samples: u64,
    /// Number of invocations that failed or panicked.
    pub failures: u64,
    total: Duration,
}

impl SystemTiming {
    fn record(&mut self, elapsed: Duration) {
        if self.samples == 0 {
            self.min = elapsed;
            self.max = elapsed;
        } else {
            self.min = self.min.min(elapsed);
            self.max = self.max.max(elapsed);
        }
        self.samples += 1;
        self.last = elapsed;
        self.total = self.total.saturating_add(elapsed);
        self.mean = self.total / u32::try_from(self.samples).unwrap_or(u32::MAX);
    }

    /// Sum of all recorded durations.
    pub fn total(&self) -> Duration {
        self.total
    }
}

/// One invocation outcome, as handed to [`PerformanceTracker::record_batch`].
#[derive(Clone, Debug)]
pub struct TimingSample {
    /// System that ran.
    pub system: SystemId,
    /// Wall-clock duration of the invocation.
    pub elapsed: Duration,
    /// `true` if the invocation failed or panicked.
    pub failed: bool,
}

/// Thread-safe accumulator of [`SystemTiming`] per system.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    timings: Mutex<HashMap<SystemId, SystemTiming>>,
}

impl PerformanceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful invocation of `system`.
    pub fn record(&self, system: &SystemId, elapsed: Duration) {
        let mut timings = self.timings.lock();
        timings.entry(system.clone()).or_default().record(elapsed);
    }

    /// Records one failed invocation of `system`.
    pub fn record_failure(&self, system: &SystemId, elapsed: Duration) {
        let mut timings = self.timings.lock();
        let timing = timings.entry(system.clone()).or_default();
        timing.record(elapsed);
        timing.failures += 1;
    }

    /// Records a batch of samples under a single lock acquisition.
    pub fn record_batch(&self, samples: impl IntoIterator<Item = TimingSample>) {
        let mut timings = self.timings.lock();
        for sample in samples {
            let timing = timings.entry(sample.system).or_default();
            timing.record(sample.elapsed);
            if sample.failed {
                timing.failures += 1;
            }
        }
    }

    /// Returns the statistics of one system, if it has run.
    pub fn get(&self, system: &str) -> Option<SystemTiming> {
        self.timings.lock().get(system).copied()
    }

    /// Drops the statistics of one system.
    pub fn forget(&self, system: &str) -> Option<SystemTiming> {
        self.timings.lock().remove(system)
    }

    /// Clears every entry.
    pub fn reset(&self) {
        self.timings.lock().clear();
    }

    /// Copies the current statistics into a read-only snapshot.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let timings = self.timings.lock();
        PerformanceSnapshot {
            systems: timings.iter().map(|(id, timing)| (id.clone(), *timing)).collect(),
        }
    }
}

/// Read-only copy of the tracker, ordered by `SystemId`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerformanceSnapshot {
    /// Statistics per system.
    pub systems: BTreeMap<SystemId, SystemTiming>,
}

impl PerformanceSnapshot {
    /// Statistics of one system.
    pub fn get(&self, system: &str) -> Option<&SystemTiming> {
        self.systems.get(system)
    }

    /// Number of systems with at least one sample.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Sum of the latest durations of every system.
    pub fn total_last(&self) -> Duration {
        self.systems.values().map(|timing| timing.last).sum()
    }

    /// Systems ordered by descending mean duration.
    pub fn slowest(&self) -> Vec<(&SystemId, &SystemTiming)> {
        let mut ordered: Vec<_> = self.systems.iter().collect();
        ordered.sort_by(|a, b| b.1.mean.cmp(&a.1.mean).then_with(|| a.0.cmp(b.0)));
        ordered
    }
}
