//! System Abstractions
//!
//! A **system** is one independently registered, per-tick unit of logic that
//! operates over a world handle. Systems:
//! - expose a stable [`SystemId`],
//! - describe their component access through a static capability query
//!   ([`System::metadata`]) resolved once at registration,
//! - run synchronously to completion when invoked, on the calling thread or on
//!   a worker thread.
//!
//! ## World handle
//!
//! The scheduler is generic over the world type `W` and never inspects it. A
//! system receives `&W` together with the elapsed time of the frame. Because
//! systems of the same stage run concurrently, any mutation of `W` goes through
//! its own interior mutability; the planner guarantees that no two co-staged
//! systems touch the same component with a write.
//!
//! ## Thread Safety
//!
//! All systems must be `Send + Sync` so they can be dispatched to worker
//! threads. A system that never returns blocks the tick indefinitely; there is
//! no cancellation or timeout.
//!
//! ## Function-backed Systems
//!
//! [`FnSystem`] wraps a closure so simple systems need no dedicated type.

use std::marker::PhantomData;

use crate::engine::error::SystemResult;
use crate::engine::metadata::SystemMetadata;
use crate::engine::types::SystemId;


/// A unit of executable logic operating on the world `W`.
pub trait System<W: ?Sized>: Send + Sync {
    /// Returns the stable identifier of this system.
    fn id(&self) -> SystemId;

    /// Returns the scheduling metadata of this system.
    ///
    /// Returning `None` registers the system with default metadata (no declared
    /// access, default priority, parallel eligible) and logs a warning: such a
    /// system can never be proven to conflict with anything.
    fn metadata(&self) -> Option<SystemMetadata> {
        None
    }

    /// Executes the system against the world.
    fn run(&self, world: &W, delta_time: f32) -> SystemResult;
}

/// A concrete [`System`] backed by a function or closure.
pub struct FnSystem<W: ?Sized, F>
where
    F: Fn(&W, f32) -> SystemResult + Send + Sync + 'static,
{
    id: SystemId,
    metadata: Option<SystemMetadata>,
    f: F,
    _world: PhantomData<fn(&W)>,
}

impl<W: ?Sized, F> FnSystem<W, F>
where
    F: Fn(&W, f32) -> SystemResult + Send + Sync + 'static,
{
    /// Creates a function-backed system without metadata.
    pub fn new(id: impl Into<SystemId>, f: F) -> Self {
        Self {
            id: id.into(),
            metadata: None,
            f,
            _world: PhantomData,
        }
    }

    /// Creates a function-backed system that reports `metadata`.
    ///
    /// The system id is taken from the metadata.
    pub fn described(metadata: SystemMetadata, f: F) -> Self {
        Self {
            id: metadata.id.clone(),
            metadata: Some(metadata),
            f,
            _world: PhantomData,
        }
    }
}

impl<W: ?Sized, F> System<W> for FnSystem<W, F>
where
    F: Fn(&W, f32) -> SystemResult + Send + Sync + 'static,
{
    fn id(&self) -> SystemId {
        self.id.clone()
    }

    fn metadata(&self) -> Option<SystemMetadata> {
        self.metadata.clone()
    }

    fn run(&self, world: &W, delta_time: f32) -> SystemResult {
        (self.f)(world, delta_time)
    }
}
