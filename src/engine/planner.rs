//! Conflict detection and stage planning.
//!
//! This module turns a set of [`SystemMetadata`] records into an ordered list
//! of **stages**:
//! * systems within the same stage do **not** conflict on component access,
//! * all systems in a stage may run in parallel,
//! * stages are executed sequentially, in the order returned.
//!
//! The planner works on metadata only. Mapping the resulting identifiers back
//! to system instances is the job of the [`ExecutionPlan`](crate::engine::plan::ExecutionPlan).
//!
//! ## Algorithm
//! Systems are processed in deterministic order (ascending priority, then
//! `SystemId`) and assigned greedily:
//! * A parallel-ineligible system always opens a new stage of its own.
//! * Any other system is placed into the first stage that comes **after** the
//!   last stage it must follow, i.e. the last stage holding a system it
//!   conflicts with or a parallel-ineligible system.
//! * If no such stage exists, a new stage is appended.
//!
//! Placing a system after its last conflicting stage keeps every pair of
//! conflicting systems in priority order, which makes any staged execution
//! observe the same writes as the sequential fallback.
//!
//! ## Complexity
//! * O(n · s) stage checks for n systems and s stages, O(n²) in the worst case.
//! * Runs once per rebuild over distinct system types, not per tick.

use indexmap::IndexMap;

use crate::engine::metadata::SystemMetadata;
use crate::engine::types::{AccessSets, SystemId};


/// A type-level stage produced by the planner.
///
/// ## Invariants
/// * All systems within a `PlannedStage` have pairwise non-conflicting access.
/// * An `exclusive` stage holds exactly one system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlannedStage {
    /// Systems scheduled in this stage, in (priority, id) order.
    pub systems: Vec<SystemId>,
    /// Union of the access sets of every member, for fast conflict checks.
    aggregate_access: AccessSets,
    /// `true` when the stage holds a parallel-ineligible system.
    exclusive: bool,
}

impl PlannedStage {
    fn solo(metadata: &SystemMetadata) -> Self {
        Self {
            systems: vec![metadata.id.clone()],
            aggregate_access: metadata.access,
            exclusive: true,
        }
    }

    /// Returns `true` if `metadata` can join this stage without a hazard.
    #[inline]
    pub fn can_accept(&self, metadata: &SystemMetadata) -> bool {
        !self.exclusive && !metadata.access.conflicts_with(&self.aggregate_access)
    }

    /// Returns `true` if `metadata` must run in a later stage than this one.
    #[inline]
    fn must_precede(&self, metadata: &SystemMetadata) -> bool {
        self.exclusive || metadata.access.conflicts_with(&self.aggregate_access)
    }

    fn push(&mut self, metadata: &SystemMetadata) {
        self.systems.push(metadata.id.clone());
        self.aggregate_access.merge(&metadata.access);
    }

    /// Returns `true` if the stage holds a parallel-ineligible system.
    #[inline]
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

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

/// Returns `true` if running `a` and `b` concurrently is a read/write hazard.
///
/// Write/write, write/read and read/write overlaps conflict; read/read never does.
#[inline]
pub fn conflicts(a: &SystemMetadata, b: &SystemMetadata) -> bool {
    a.conflicts_with(b)
}

/// Partitions systems into ordered, conflict-free execution stages.
///
/// Duplicate identifiers are collapsed, the last occurrence winning. The
/// result depends only on the set of inputs, not on their order.
pub fn compute_stages(systems: &[SystemMetadata]) -> Vec<PlannedStage> {
    let mut unique: IndexMap<&SystemId, &SystemMetadata> = IndexMap::with_capacity(systems.len());
    for metadata in systems {
        unique.insert(&metadata.id, metadata);
    }

    let mut ordered: Vec<&SystemMetadata> = unique.into_values().collect();
    ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

    let mut stages: Vec<PlannedStage> = Vec::new();

    for metadata in ordered {
        if !metadata.parallel_eligible {
            stages.push(PlannedStage::solo(metadata));
            continue;
        }

        let floor = stages
            .iter()
            .rposition(|stage| stage.must_precede(metadata))
            .map_or(0, |index| index + 1);

        match stages[floor..].iter_mut().find(|stage| stage.can_accept(metadata)) {
            Some(stage) => stage.push(metadata),
            None => {
                let mut stage = PlannedStage::default();
                stage.push(metadata);
                stages.push(stage);
            }
        }
    }

    stages
}
