//! Error types for system registration, execution, and plan construction.
//!
//! The scheduler separates failures by *when* they happen:
//!
//! * **Setup-time** failures ([`RegistrationError`], [`ComponentError`],
//!   [`SchedulerError`]) indicate a caller bug or an unusable environment.
//!   They are returned immediately from the call that caused them.
//! * **Tick-time** failures ([`SystemError`]) are raised by a single system.
//!   They are caught at the invocation site, logged with the system identity
//!   and stage index, counted, and swallowed. A frame always completes.
//! * **Plan** outcomes ([`PlanError`]) are produced by a rebuild that yields no
//!   usable stage. They are logged and force the sequential fallback path; they
//!   never reach the caller of `tick`.
//!
//! ## Display vs. Debug
//! * `Display` uses short, lower-case phrasing suited to log lines.
//! * `Debug` (derived) retains full structure for diagnostics.
//!
//! ## Retries
//! There is no retry policy and no circuit breaker. A system that fails every
//! frame is logged every frame.

use thiserror::Error;

use crate::engine::types::{SystemId, COMPONENT_CAP};


/// Returned when a system is registered with invalid arguments.
///
/// These are programmer errors and fail fast at the registration call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    /// The system reported an empty identifier.
    #[error("system identifier must not be empty")]
    EmptySystemId,

    /// Explicit metadata describes a different system than the one registered.
    #[error("metadata for `{metadata}` supplied when registering `{system}`")]
    MetadataMismatch {
        /// Identifier reported by the system.
        system: SystemId,
        /// Identifier carried by the metadata.
        metadata: SystemId,
    },

    /// Metadata references a component id outside the registry capacity.
    #[error("system `{system}` declares component {component} outside capacity {cap}", cap = COMPONENT_CAP)]
    ComponentOutOfRange {
        /// Offending system.
        system: SystemId,
        /// Offending component id.
        component: usize,
    },
}

/// Returned by the component registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ComponentError {
    /// All `COMPONENT_CAP` component ids are in use.
    #[error("component capacity {capacity} exhausted while registering `{name}`")]
    CapacityExhausted {
        /// Component name that could not be registered.
        name: String,
        /// Configured capacity.
        capacity: usize,
    },

    /// A component id at or above the registry capacity was used.
    #[error("component {component} is outside capacity {capacity}")]
    OutOfRange {
        /// Offending component id.
        component: usize,
        /// Configured capacity.
        capacity: usize,
    },

    /// A lookup referenced a component that was never registered.
    #[error("component `{name}` is not registered")]
    NotRegistered {
        /// Requested component name.
        name: String,
    },
}

/// Failure raised by a single system during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SystemError {
    /// The system reported a failure through its return value.
    #[error("system failed: {message}")]
    Failed {
        /// Human readable failure description.
        message: String,
    },

    /// The system panicked; the payload was captured by the failure boundary.
    #[error("system panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl SystemError {
    /// Creates a [`SystemError::Failed`] from any displayable message.
    pub fn failed(message: impl Into<String>) -> Self {
        SystemError::Failed { message: message.into() }
    }

    /// Returns `true` if the failure came from a panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, SystemError::Panicked { .. })
    }
}

/// Outcome of a rebuild that could not produce a usable plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PlanError {
    /// The planner returned no stage, or only empty stages.
    #[error("plan is degenerate ({systems} registered systems produced no usable stage)")]
    Degenerate {
        /// Number of systems known to the registry at rebuild time.
        systems: usize,
    },
}

/// Returned when a scheduler cannot be constructed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedulerError {
    /// The bounded worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience alias for registration results.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Convenience alias for system execution results.
pub type SystemResult = Result<(), SystemError>;

