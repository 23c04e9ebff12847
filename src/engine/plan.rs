//! Execution plan and its validity flag.
//!
//! An [`ExecutionPlan`] is the materialized output of the planner: the ordered
//! stages, each holding concrete system handles. It is regenerated wholesale on
//! every rebuild and never patched in place.
//!
//! ## Validity state machine
//!
//! ```text
//!            rebuild()                register/unregister
//! Unbuilt ─────────────▶ Built ─────────────────────────▶ Stale
//!    ▲                     ▲                                │
//!    │ degenerate plan     └──── tick() or rebuild() ───────┘
//! ```
//!
//! The state lives in a [`PlanStatus`], an atomic read with `Acquire` and
//! written with `Release`, so a registration made on any thread is observed by
//! the thread that later calls `tick`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::engine::error::PlanError;
use crate::engine::planner::PlannedStage;
use crate::engine::registry::SystemRegistry;
use crate::engine::systems::System;
use crate::engine::types::SystemId;


/// Validity of the execution plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlanState {
    /// No usable plan exists; ticks take the sequential path.
    #[default]
    Unbuilt = 0,
    /// The plan reflects the current registry.
    Built = 1,
    /// The registry changed since the plan was built; the next tick rebuilds.
    Stale = 2,
}

impl PlanState {
    #[inline]
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => PlanState::Built,
            2 => PlanState::Stale,
            _ => PlanState::Unbuilt,
        }
    }
}

impl fmt::Display for PlanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanState::Unbuilt => f.write_str("unbuilt"),
            PlanState::Built => f.write_str("built"),
            PlanState::Stale => f.write_str("stale"),
        }
    }
}

/// Atomic cell holding a [`PlanState`].
#[derive(Debug)]
pub struct PlanStatus(AtomicU8);

impl Default for PlanStatus {
    fn default() -> Self {
        PlanStatus(AtomicU8::new(PlanState::Unbuilt as u8))
    }
}

impl PlanStatus {
    /// Reads the current state.
    #[inline]
    pub fn load(&self) -> PlanState {
        PlanState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Overwrites the current state.
    #[inline]
    pub fn store(&self, state: PlanState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Transitions `Built -> Stale`. Returns `true` if the transition happened.
    #[inline]
    pub fn invalidate(&self) -> bool {
        self.0
            .compare_exchange(
                PlanState::Built as u8,
                PlanState::Stale as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// A stage of concrete system handles that may run in parallel.
pub struct Stage<W: ?Sized + 'static> {
    /// Members of the stage, in (priority, id) order.
    pub systems: Vec<(SystemId, Arc<dyn System<W>>)>,
    /// `true` when the stage holds a parallel-ineligible system.
    pub exclusive: bool,
}

impl<W: ?Sized + 'static> Stage<W> {
    /// Number of systems in the stage.
    #[inline]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if the stage has no member.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

/// Ordered stages of concrete system handles.
pub struct ExecutionPlan<W: ?Sized + 'static> {
    stages: Vec<Stage<W>>,
}

impl<W: ?Sized + 'static> Default for ExecutionPlan<W> {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
        }
    }
}

impl<W: ?Sized + 'static> ExecutionPlan<W> {
    /// Maps type-level stages back to the system instances held by `registry`.
    ///
    /// Empty stages are dropped. Fails with [`PlanError::Degenerate`] when no
    /// non-empty stage remains.
    pub fn materialize(
        planned: Vec<PlannedStage>,
        registry: &SystemRegistry<W>,
    ) -> Result<Self, PlanError> {
        let stages: Vec<Stage<W>> = planned
            .into_iter()
            .map(|stage| Stage {
                exclusive: stage.is_exclusive(),
                systems: stage
                    .systems
                    .into_iter()
                    .filter_map(|id| {
                        let system = Arc::clone(&registry.get(id.as_str())?.system);
                        Some((id, system))
                    })
                    .collect(),
            })
            .filter(|stage| !stage.is_empty())
            .collect();

        if stages.is_empty() {
            return Err(PlanError::Degenerate { systems: registry.len() });
        }

        Ok(Self { stages })
    }

    /// Stages in execution order.
    #[inline]
    pub fn stages(&self) -> &[Stage<W>] {
        &self.stages
    }

    /// Returns `true` if the plan has no stage.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Read-only, instance-free view of the plan.
    pub fn view(&self, state: PlanState) -> PlanView {
        PlanView {
            state,
            stages: self
                .stages
                .iter()
                .map(|stage| stage.systems.iter().map(|(id, _)| id.clone()).collect())
                .collect(),
        }
    }
}

/// Read-only snapshot of the plan for diagnostics and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanView {
    /// Plan validity when the snapshot was taken.
    pub state: PlanState,
    /// System identifiers per stage, in execution order.
    pub stages: Vec<Vec<SystemId>>,
}

impl PlanView {
    /// Number of stages.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the plan has no stage.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total number of systems across all stages.
    pub fn system_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// Index of the stage holding `id`, if planned.
    pub fn stage_of(&self, id: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.iter().any(|member| member.as_str() == id))
    }

    /// Returns `true` if `id` appears in the plan.
    pub fn contains(&self, id: &str) -> bool {
        self.stage_of(id).is_some()
    }
}

impl fmt::Display for PlanView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan ({})", self.state)?;
        for (index, stage) in self.stages.iter().enumerate() {
            write!(f, "\n  stage {index}:")?;
            for id in stage {
                write!(f, " {id}")?;
            }
        }
        Ok(())
    }
}
