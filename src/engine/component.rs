//! # Component Registry
//!
//! This module provides a process-wide registry that assigns stable
//! [`ComponentID`] values to component types, so that systems can declare their
//! read and write sets as compact [`Signature`](crate::engine::types::Signature)
//! bitsets.
//!
//! ## Purpose
//! The scheduler never touches component data. It only needs an opaque,
//! comparable identifier per data-fragment type. Two registration paths feed the
//! same id space:
//!
//! - [`register_component::<T>()`] for Rust component types (keyed by `TypeId`,
//!   named by `type_name::<T>()`),
//! - [`register_component_named`] for data-driven components that only exist as
//!   a name (for example components declared by scripts or content files).
//!
//! ## Invariants
//! - `ComponentID` values are unique and stable for the lifetime of the process.
//! - Registering the same type (or the same name) twice returns the same id.
//! - Ids are allocated densely in `[0, COMPONENT_CAP)`.
//!
//! ## Concurrency
//! The registry is guarded by a `parking_lot::RwLock`: lookups share the lock,
//! registrations serialize on it.

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::engine::error::ComponentError;
use crate::engine::types::{ComponentID, COMPONENT_CAP};


/// Mapping between component types or names and compact `ComponentID` values.
///
/// ## Design
/// - `by_type` maps `TypeId -> ComponentID` for Rust types.
/// - `by_name` maps the component name to its id for both registration paths.
/// - `by_id` stores the [`ComponentDesc`] indexed by id.
#[derive(Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentID>,
    by_name: HashMap<Cow<'static, str>, ComponentID>,
    by_id: Vec<ComponentDesc>,
}

static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();

fn component_registry() -> &'static RwLock<ComponentRegistry> {
    REGISTRY.get_or_init(|| RwLock::new(ComponentRegistry::default()))
}

impl ComponentRegistry {
    fn alloc(&mut self, name: Cow<'static, str>, type_id: Option<TypeId>) -> Result<ComponentID, ComponentError> {
        if self.by_id.len() >= COMPONENT_CAP {
            return Err(ComponentError::CapacityExhausted {
                name: name.into_owned(),
                capacity: COMPONENT_CAP,
            });
        }
        let component_id = self.by_id.len() as ComponentID;
        self.by_id.push(ComponentDesc { component_id, name: name.clone(), type_id });
        self.by_name.insert(name, component_id);
        Ok(component_id)
    }

    /// Registers component type `T` and returns its `ComponentID`.
    pub fn register<T: 'static>(&mut self) -> Result<ComponentID, ComponentError> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }
        let name = Cow::Borrowed(type_name::<T>());
        let component_id = match self.by_name.get(&name) {
            Some(&existing) => existing,
            None => self.alloc(name, Some(type_id))?,
        };
        self.by_type.insert(type_id, component_id);
        Ok(component_id)
    }

    /// Registers a component known only by name and returns its `ComponentID`.
    pub fn register_named(&mut self, name: Cow<'static, str>) -> Result<ComponentID, ComponentError> {
        if let Some(&existing) = self.by_name.get(&name) {
            return Ok(existing);
        }
        self.alloc(name, None)
    }

    /// Returns the `ComponentID` for `T`, if registered.
    pub fn id_of<T: 'static>(&self) -> Option<ComponentID> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the `ComponentID` registered under `name`, if any.
    pub fn id_of_name(&self, name: &str) -> Option<ComponentID> {
        self.by_name.get(name).copied()
    }

    /// Returns the descriptor for a `ComponentID`, if registered.
    pub fn description(&self, component_id: ComponentID) -> Option<&ComponentDesc> {
        self.by_id.get(component_id as usize)
    }
}

/// Registers component type `T` in the global registry and returns its `ComponentID`.
pub fn register_component<T: 'static>() -> Result<ComponentID, ComponentError> {
    component_registry().write().register::<T>()
}

/// Registers a name-only component in the global registry and returns its `ComponentID`.
///
/// Calling this with the same name from different call sites yields the same id.
pub fn register_component_named(name: impl Into<Cow<'static, str>>) -> Result<ComponentID, ComponentError> {
    component_registry().write().register_named(name.into())
}

/// Returns the registered `ComponentID` for type `T`.
pub fn component_id_of<T: 'static>() -> Result<ComponentID, ComponentError> {
    component_registry()
        .read()
        .id_of::<T>()
        .ok_or_else(|| ComponentError::NotRegistered { name: type_name::<T>().to_owned() })
}

/// Returns the registered `ComponentID` for a component name.
pub fn component_id_of_name(name: &str) -> Result<ComponentID, ComponentError> {
    component_registry()
        .read()
        .id_of_name(name)
        .ok_or_else(|| ComponentError::NotRegistered { name: name.to_owned() })
}

/// Returns the name of `component_id` for diagnostics, if registered.
pub fn component_name(component_id: ComponentID) -> Option<Cow<'static, str>> {
    component_registry()
        .read()
        .description(component_id)
        .map(|desc| desc.name.clone())
}

/// Describes a registered component.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentDesc {
    /// Runtime identifier assigned to this component.
    pub component_id: ComponentID,

    /// Type name or declared name.
    pub name: Cow<'static, str>,

    /// Runtime `TypeId`, absent for name-only components.
    pub type_id: Option<TypeId>,
}

impl std::fmt::Display for ComponentDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.component_id)
    }
}
