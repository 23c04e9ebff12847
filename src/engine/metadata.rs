//! Static scheduling metadata of a system.
//!
//! [`SystemMetadata`] is the only thing the stage planner looks at. It is
//! resolved once, at registration time, either from the system's own
//! [`System::metadata`](crate::engine::systems::System::metadata) capability
//! query or from metadata supplied by the caller, and is immutable afterwards.
//! Re-registering the same [`SystemId`] replaces the record wholesale.
//!
//! ## Example
//! ```ignore
//! let position = register_component_named("Position")?;
//! let animation = register_component_named("AnimationState")?;
//!
//! let metadata = SystemMetadata::new("animation")
//!     .read(position)
//!     .write(animation)
//!     .priority(800)
//!     .category(SystemCategory::Animation);
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::engine::types::{
    AccessSets,
    ComponentID,
    Priority,
    SystemId,
    DEFAULT_PRIORITY,
};


/// Category tag carried by every registry entry.
///
/// All categories live in the same registry and are planned together; the tag
/// only feeds diagnostics such as [`Scheduler::systems_in_category`](crate::Scheduler::systems_in_category).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SystemCategory {
    /// Core simulation logic.
    #[default]
    Simulation,
    /// Animation state machines and skinning inputs.
    Animation,
    /// Agent decision making.
    Ai,
    /// Preparation of data consumed by presentation layers.
    Presentation,
    /// Systems provided by scripts or mods.
    Script,
    /// Application-defined category.
    Custom(Cow<'static, str>),
}

impl fmt::Display for SystemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemCategory::Simulation => f.write_str("simulation"),
            SystemCategory::Animation => f.write_str("animation"),
            SystemCategory::Ai => f.write_str("ai"),
            SystemCategory::Presentation => f.write_str("presentation"),
            SystemCategory::Script => f.write_str("script"),
            SystemCategory::Custom(name) => f.write_str(name),
        }
    }
}

/// Describes one system for the stage planner.
///
/// ## Fields
/// - `id`: stable identity, used as the registry key.
/// - `access`: components the system may read and write.
/// - `priority`: lower runs earlier; primary sort key for planning and the
///   order of the sequential fallback.
/// - `parallel_eligible`: when `false` the system always occupies a stage of
///   its own.
/// - `category`: diagnostic tag, see [`SystemCategory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemMetadata {
    /// Stable identity of the system.
    pub id: SystemId,
    /// Declared component access.
    pub access: AccessSets,
    /// Scheduling priority; lower values are scheduled earlier.
    pub priority: Priority,
    /// Whether the system may share a stage with other systems.
    pub parallel_eligible: bool,
    /// Category tag.
    pub category: SystemCategory,
    rejected_component: Option<usize>,
}

impl SystemMetadata {
    /// Creates metadata with no declared access, default priority, parallel
    /// eligible, in the [`SystemCategory::Simulation`] category.
    pub fn new(id: impl Into<SystemId>) -> Self {
        Self {
            id: id.into(),
            access: AccessSets::default(),
            priority: DEFAULT_PRIORITY,
            parallel_eligible: true,
            category: SystemCategory::default(),
            rejected_component: None,
        }
    }

    /// Adds one component to the read set.
    pub fn read(mut self, component_id: ComponentID) -> Self {
        if !self.access.read.set(component_id) {
            self.reject(component_id);
        }
        self
    }

    /// Adds several components to the read set.
    pub fn reads(self, component_ids: &[ComponentID]) -> Self {
        component_ids.iter().fold(self, |metadata, &id| metadata.read(id))
    }

    /// Adds one component to the write set.
    pub fn write(mut self, component_id: ComponentID) -> Self {
        if !self.access.write.set(component_id) {
            self.reject(component_id);
        }
        self
    }

    /// Adds several components to the write set.
    pub fn writes(self, component_ids: &[ComponentID]) -> Self {
        component_ids.iter().fold(self, |metadata, &id| metadata.write(id))
    }

    /// Replaces the whole access declaration.
    ///
    /// An [`AccessSets`] only ever holds in-range ids; build one with the
    /// fallible [`AccessSets::new`].
    pub fn with_access(mut self, access: AccessSets) -> Self {
        self.access = access;
        self
    }

    /// Sets the priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the system as never sharing a stage.
    pub fn exclusive(self) -> Self {
        self.parallel_eligible(false)
    }

    /// Sets parallel eligibility explicitly.
    pub fn parallel_eligible(mut self, eligible: bool) -> Self {
        self.parallel_eligible = eligible;
        self
    }

    /// Sets the category tag.
    pub fn category(mut self, category: SystemCategory) -> Self {
        self.category = category;
        self
    }

    /// Returns `true` if running `self` and `other` concurrently is a hazard.
    #[inline]
    pub fn conflicts_with(&self, other: &SystemMetadata) -> bool {
        self.access.conflicts_with(&other.access)
    }

    /// First component id passed to the builder that exceeded `COMPONENT_CAP`.
    pub(crate) fn rejected_component(&self) -> Option<usize> {
        self.rejected_component
    }

    fn reject(&mut self, component_id: ComponentID) {
        self.rejected_component.get_or_insert(component_id as usize);
    }
}
