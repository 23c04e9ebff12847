//! System scheduling and execution.
//!
//! This module is responsible for:
//! * owning the unified registry of systems,
//! * turning the registry into conflict-free execution stages (lazily, once per
//!   batch of registrations),
//! * running stages on a bounded Rayon worker pool with a barrier between
//!   stages,
//! * falling back to strict sequential execution when no usable plan exists,
//! * isolating per-system failures so a frame always completes.
//!
//! ## Scheduling model
//!
//! Systems are assigned to **stages** by the [`planner`](crate::engine::planner):
//! * systems within the same stage do **not** conflict on component access,
//! * all systems in a stage may run in parallel,
//! * stages are executed sequentially.
//!
//! A stage with a single member runs inline on the ticking thread. A stage with
//! several members is dispatched to the worker pool and the ticking thread
//! blocks until every member returns. No lock is ever taken on component data:
//! freedom from data races comes entirely from the plan.
//!
//! ## Lazy rebuilds
//!
//! Registering or unregistering a system while the plan is `Built` only flips
//! the plan to `Stale`. The next [`Scheduler::tick`] performs a single rebuild
//! no matter how many registrations happened in between.
//!
//! ## Shared state
//!
//! * The registry sits behind a `parking_lot::Mutex`. Registration and rebuild
//!   serialize on it, and the `Built -> Stale` transition happens while it is
//!   held, so a registration racing a rebuild is never lost.
//! * The plan validity flag is atomic, so the ticking thread observes
//!   registrations made on any other thread without locking the registry.
//! * Neither lock is held while systems run, so a system may register or
//!   unregister systems; the change takes effect on the next tick.
//!
//! ## Limitations
//!
//! There is no timeout or cancellation: a system that never returns blocks the
//! tick. There is no circuit breaker: a system that fails every frame is logged
//! every frame.

use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::{debug, debug_span, info, trace, warn};

use crate::engine::component::component_name;
use crate::engine::config::SchedulerConfig;
use crate::engine::error::{
    RegistrationError,
    RegistrationResult,
    SchedulerError,
    SystemError,
};
use crate::engine::metadata::{SystemCategory, SystemMetadata};
use crate::engine::plan::{ExecutionPlan, PlanState, PlanStatus, PlanView, Stage};
use crate::engine::planner::compute_stages;
use crate::engine::registry::{RegistryEntry, SystemRegistry};
use crate::engine::systems::System;
use crate::engine::types::{Priority, Signature, SystemId};
use crate::profiling::tracker::{PerformanceTracker, TimingSample};


/// Counters describing what the scheduler has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Calls to [`Scheduler::tick`].
    pub ticks: u64,
    /// Ticks that ran on the sequential path.
    pub sequential_ticks: u64,
    /// Plan rebuilds attempted, manual and lazy.
    pub rebuilds: u64,
    /// System invocations that failed or panicked.
    pub failures: u64,
    /// The subset of `failures` that were panics.
    pub panics: u64,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    sequential_ticks: AtomicU64,
    rebuilds: AtomicU64,
    failures: AtomicU64,
    panics: AtomicU64,
}

/// Scheduler that stores systems, compiles them into conflict-free execution
/// stages, and executes those stages every tick.
///
/// `W` is the world handle passed to every system; the scheduler never
/// inspects it.
///
/// All methods take `&self`. Share the scheduler with `Arc` to register from
/// one thread while another ticks.
pub struct Scheduler<W: ?Sized + Sync + 'static> {
    registry: Mutex<SystemRegistry<W>>,
    plan: RwLock<Arc<ExecutionPlan<W>>>,
    status: PlanStatus,
    parallel: AtomicBool,
    default_priority: Priority,
    pool: rayon::ThreadPool,
    tracker: PerformanceTracker,
    counters: Counters,
}

impl<W: ?Sized + Sync + 'static> Scheduler<W> {
    /// Creates an empty scheduler and its worker pool.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let threads = config.resolved_worker_threads();
        let prefix = config.thread_name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;

        debug!(threads, parallel = config.parallel, "scheduler created");

        Ok(Self {
            registry: Mutex::new(SystemRegistry::default()),
            plan: RwLock::new(Arc::new(ExecutionPlan::default())),
            status: PlanStatus::default(),
            parallel: AtomicBool::new(config.parallel),
            default_priority: config.default_priority,
            pool,
            tracker: PerformanceTracker::new(),
            counters: Counters::default(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a system using its own [`System::metadata`].
    ///
    /// A system that reports no metadata is stored with default metadata and a
    /// warning is logged.
    pub fn register<S: System<W> + 'static>(&self, system: S) -> RegistrationResult<()> {
        self.register_arc(Arc::new(system), None)
    }

    /// Registers a system with explicit metadata, overriding whatever the
    /// system reports.
    pub fn register_with<S: System<W> + 'static>(
        &self,
        system: S,
        metadata: SystemMetadata,
    ) -> RegistrationResult<()> {
        self.register_arc(Arc::new(system), Some(metadata))
    }

    /// Registers an already shared system.
    ///
    /// Re-registering a known `SystemId` replaces its instance and metadata.
    pub fn register_arc(
        &self,
        system: Arc<dyn System<W>>,
        metadata: Option<SystemMetadata>,
    ) -> RegistrationResult<()> {
        let id = system.id();
        if id.is_empty() {
            return Err(RegistrationError::EmptySystemId);
        }

        let (metadata, explicit) = match metadata.or_else(|| system.metadata()) {
            Some(metadata) => (metadata, true),
            None => {
                warn!(
                    system = %id,
                    "system registered without metadata; it is treated as conflicting with nothing"
                );
                (SystemMetadata::new(id.clone()).priority(self.default_priority), false)
            }
        };

        if metadata.id != id {
            return Err(RegistrationError::MetadataMismatch {
                system: id,
                metadata: metadata.id,
            });
        }
        if let Some(component) = metadata.rejected_component() {
            return Err(RegistrationError::ComponentOutOfRange { system: id, component });
        }

        let reads = component_names(&metadata.access.read);
        let writes = component_names(&metadata.access.write);

        let mut registry = self.registry.lock();
        let replaced = registry.insert(RegistryEntry { system, metadata, explicit }).is_some();
        debug!(system = %id, replaced, ?reads, ?writes, "system registered");
        if self.status.invalidate() {
            info!(system = %id, "execution plan invalidated by registration");
        } else if self.status.load() == PlanState::Unbuilt
            && self.counters.rebuilds.load(Ordering::Relaxed) > 0
        {
            info!(
                system = %id,
                "execution plan is unbuilt; ticks stay sequential until the next rebuild()"
            );
        }
        Ok(())
    }

    /// Removes a system. Returns `true` if it was registered.
    pub fn unregister(&self, id: &str) -> bool {
        let mut registry = self.registry.lock();
        if registry.remove(id).is_none() {
            return false;
        }
        self.tracker.forget(id);
        debug!(system = id, "system unregistered");
        if self.status.invalidate() {
            info!(system = id, "execution plan invalidated by removal");
        }
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Planning
    // ─────────────────────────────────────────────────────────────────────

    /// Rebuilds the execution plan from the registry immediately.
    ///
    /// Leaves the plan `Built`, or `Unbuilt` when the registry yields no usable
    /// stage.
    pub fn rebuild(&self) {
        let registry = self.registry.lock();
        self.rebuild_locked(&registry);
    }

    fn rebuild_if_stale(&self) {
        let registry = self.registry.lock();
        // Another thread may have rebuilt while we waited for the lock.
        if self.status.load() == PlanState::Stale {
            self.rebuild_locked(&registry);
        }
    }

    fn rebuild_locked(&self, registry: &SystemRegistry<W>) {
        self.counters.rebuilds.fetch_add(1, Ordering::Relaxed);

        let planned = compute_stages(&registry.metadata());
        match ExecutionPlan::materialize(planned, registry) {
            Ok(plan) => {
                let stages = plan.stages().len();
                let parallel_stages = plan.stages().iter().filter(|stage| stage.len() > 1).count();
                *self.plan.write() = Arc::new(plan);
                self.status.store(PlanState::Built);
                info!(stages, parallel_stages, systems = registry.len(), "execution plan rebuilt");
            }
            Err(error) => {
                *self.plan.write() = Arc::new(ExecutionPlan::default());
                self.status.store(PlanState::Unbuilt);
                warn!(%error, "execution plan left unbuilt; ticks run sequentially");
            }
        }
    }

    /// Read-only view of the current plan.
    pub fn plan(&self) -> PlanView {
        let state = self.status.load();
        self.plan.read().view(state)
    }

    /// Current plan validity.
    pub fn plan_state(&self) -> PlanState {
        self.status.load()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────

    /// Runs every registered system once.
    ///
    /// Failures inside systems are logged and swallowed; this never fails.
    pub fn tick(&self, world: &W, delta_time: f32) {
        let tick = self.counters.ticks.fetch_add(1, Ordering::Relaxed);
        let _span = debug_span!("tick", tick, delta_time).entered();

        if !self.is_parallel() {
            self.run_sequential(world, delta_time);
            return;
        }

        match self.status.load() {
            PlanState::Unbuilt => {
                self.run_sequential(world, delta_time);
                return;
            }
            PlanState::Stale => self.rebuild_if_stale(),
            PlanState::Built => {}
        }

        let plan = self.plan.read().clone();
        if self.status.load() == PlanState::Unbuilt || plan.is_empty() {
            self.run_sequential(world, delta_time);
            return;
        }

        self.run_plan(&plan, world, delta_time);
    }

    fn run_plan(&self, plan: &ExecutionPlan<W>, world: &W, delta_time: f32) {
        for (index, stage) in plan.stages().iter().enumerate() {
            trace!(stage = index, systems = stage.len(), exclusive = stage.exclusive, "stage starting");
            if stage.len() == 1 {
                let (id, system) = &stage.systems[0];
                let sample = self.invoke(Some(index), id, system.as_ref(), world, delta_time);
                self.tracker.record_batch([sample]);
            } else {
                let samples = self.run_stage_parallel(index, stage, world, delta_time);
                self.tracker.record_batch(samples);
            }
        }
    }

    fn run_stage_parallel(
        &self,
        index: usize,
        stage: &Stage<W>,
        world: &W,
        delta_time: f32,
    ) -> Vec<TimingSample> {
        self.pool.install(|| {
            stage
                .systems
                .par_iter()
                .map(|(id, system)| self.invoke(Some(index), id, system.as_ref(), world, delta_time))
                .collect()
        })
    }

    fn run_sequential(&self, world: &W, delta_time: f32) {
        self.counters.sequential_ticks.fetch_add(1, Ordering::Relaxed);
        let order = self.registry.lock().sequential_order();
        debug!(systems = order.len(), "running sequential tick");

        let samples: Vec<TimingSample> = order
            .iter()
            .map(|entry| {
                self.invoke(None, &entry.metadata.id, entry.system.as_ref(), world, delta_time)
            })
            .collect();
        self.tracker.record_batch(samples);
    }

    /// Runs one system inside its failure boundary and times it.
    fn invoke(
        &self,
        stage: Option<usize>,
        id: &SystemId,
        system: &dyn System<W>,
        world: &W,
        delta_time: f32,
    ) -> TimingSample {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| system.run(world, delta_time)))
            .unwrap_or_else(|payload| {
                Err(SystemError::Panicked { message: panic_message(&*payload) })
            });
        let elapsed = started.elapsed();

        if let Err(error) = &outcome {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            if error.is_panic() {
                self.counters.panics.fetch_add(1, Ordering::Relaxed);
            }
            match stage {
                Some(stage) => warn!(system = %id, stage, %error, "system failed; tick continues"),
                None => warn!(system = %id, %error, "system failed during sequential tick; tick continues"),
            }
        }

        TimingSample {
            system: id.clone(),
            elapsed,
            failed: outcome.is_err(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Configuration and diagnostics
    // ─────────────────────────────────────────────────────────────────────

    /// Enables or disables parallel execution. When disabled every tick takes
    /// the sequential path.
    pub fn set_parallel(&self, parallel: bool) {
        self.parallel.store(parallel, Ordering::Release);
    }

    /// Returns `true` if parallel execution is enabled.
    pub fn is_parallel(&self) -> bool {
        self.parallel.load(Ordering::Acquire)
    }

    /// Size of the worker pool.
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    /// Returns `true` if no system is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.registry.lock().contains(id)
    }

    /// Metadata stored for `id`.
    pub fn metadata_of(&self, id: &str) -> Option<SystemMetadata> {
        self.registry.lock().get(id).map(|entry| entry.metadata.clone())
    }

    /// Returns `Some(false)` when `id` was registered with defaulted metadata.
    pub fn has_explicit_metadata(&self, id: &str) -> Option<bool> {
        self.registry.lock().get(id).map(|entry| entry.explicit)
    }

    /// Identifiers of the systems tagged with `category`, in registration order.
    pub fn systems_in_category(&self, category: &SystemCategory) -> Vec<SystemId> {
        self.registry.lock().ids_in_category(category)
    }

    /// Per-system timing collected so far.
    pub fn performance(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Snapshot of the scheduler counters.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            sequential_ticks: self.counters.sequential_ticks.load(Ordering::Relaxed),
            rebuilds: self.counters.rebuilds.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            panics: self.counters.panics.load(Ordering::Relaxed),
        }
    }
}

fn component_names(signature: &Signature) -> Vec<Cow<'static, str>> {
    signature
        .ids()
        .into_iter()
        .map(|component| component_name(component).unwrap_or_else(|| Cow::Owned(format!("#{component}"))))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
