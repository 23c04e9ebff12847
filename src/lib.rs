//! # ECS Stage Scheduler
//!
//! Conflict-aware parallel scheduler for per-frame systems operating over a
//! shared entity-component store.
//!
//! ## Design Goals
//! - Static read/write conflict analysis instead of per-component locks
//! - Deterministic, race-free stage ordering
//! - Late registration without dropping or corrupting systems (lazy rebuilds)
//! - Safe degradation to sequential execution when no plan is usable
//! - Per-system failure isolation: a frame always completes
//!
//! ## Quick start
//! ```ignore
//! use ecs_stage_scheduler::prelude::*;
//!
//! let position = register_component_named("Position")?;
//! let scheduler: Scheduler<MyWorld> = Scheduler::new(SchedulerConfig::default())?;
//! scheduler.register(FnSystem::described(
//!     SystemMetadata::new("movement").write(position).priority(100),
//!     |world: &MyWorld, dt| { world.integrate(dt); Ok(()) },
//! ))?;
//! scheduler.rebuild();
//! scheduler.tick(&world, 1.0 / 60.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]
#![deny(dead_code)]

pub mod engine;
pub mod profiling;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::scheduler::{
    Scheduler,
    SchedulerStats,
};

pub use engine::config::SchedulerConfig;

pub use engine::systems::{
    System,
    FnSystem,
};

pub use engine::metadata::{
    SystemMetadata,
    SystemCategory,
};

pub use engine::planner::{
    compute_stages,
    conflicts,
    PlannedStage,
};

pub use engine::plan::{
    PlanState,
    PlanView,
};

pub use engine::component::{
    register_component,
    register_component_named,
    component_id_of,
    component_id_of_name,
    component_name,
};

pub use engine::error::{
    RegistrationError,
    ComponentError,
    SystemError,
    SystemResult,
    PlanError,
    SchedulerError,
};

pub use engine::types::{
    AccessSets,
    ComponentID,
    Priority,
    Signature,
    SystemId,
    DEFAULT_PRIORITY,
};

pub use profiling::tracker::{
    PerformanceTracker,
    PerformanceSnapshot,
    SystemTiming,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used scheduler types.
///
/// Import with:
/// ```rust
/// use ecs_stage_scheduler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Scheduler,
        SchedulerConfig,
        System,
        FnSystem,
        SystemMetadata,
        SystemCategory,
        SystemError,
        SystemResult,
        SystemId,
        PlanState,
        register_component,
        register_component_named,
        component_id_of,
    };
}
