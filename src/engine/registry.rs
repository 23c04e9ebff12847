//! Unified system registry.
//!
//! Every registration path writes through this one ordered map, whatever the
//! system's [`SystemCategory`](crate::engine::metadata::SystemCategory). The
//! planner and the sequential fallback always enumerate from it, so no class of
//! systems can be left out of parallel execution by living in a side list.
//!
//! The registry itself is not synchronized; the scheduler keeps it behind a
//! mutex.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::engine::metadata::{SystemCategory, SystemMetadata};
use crate::engine::systems::System;
use crate::engine::types::SystemId;


/// One registered system together with its resolved metadata.
pub struct RegistryEntry<W: ?Sized + 'static> {
    /// The system instance.
    pub system: Arc<dyn System<W>>,
    /// Metadata resolved at registration.
    pub metadata: SystemMetadata,
    /// `false` when the metadata was defaulted because none was supplied.
    pub explicit: bool,
}

impl<W: ?Sized + 'static> Clone for RegistryEntry<W> {
    fn clone(&self) -> Self {
        Self {
            system: Arc::clone(&self.system),
            metadata: self.metadata.clone(),
            explicit: self.explicit,
        }
    }
}

/// Insertion-ordered map of `SystemId -> RegistryEntry`.
///
/// ## Invariants
/// - Each `SystemId` appears at most once.
pub struct SystemRegistry<W: ?Sized + 'static> {
    entries: IndexMap<SystemId, RegistryEntry<W>>,
}

impl<W: ?Sized + 'static> Default for SystemRegistry<W> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<W: ?Sized + 'static> SystemRegistry<W> {
    /// Inserts or replaces an entry. Returns the replaced entry, if any.
    ///
    /// A replaced system keeps its original position in registration order.
    pub fn insert(&mut self, entry: RegistryEntry<W>) -> Option<RegistryEntry<W>> {
        self.entries.insert(entry.metadata.id.clone(), entry)
    }

    /// Removes an entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, id: &str) -> Option<RegistryEntry<W>> {
        self.entries.shift_remove(id)
    }

    /// Returns the entry registered under `id`.
    pub fn get(&self, id: &str) -> Option<&RegistryEntry<W>> {
        self.entries.get(id)
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no system is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry<W>> {
        self.entries.values()
    }

    /// Clones out the metadata of every registered system, in registration order.
    pub fn metadata(&self) -> Vec<SystemMetadata> {
        self.entries.values().map(|entry| entry.metadata.clone()).collect()
    }

    /// Identifiers of the systems tagged with `category`, in registration order.
    pub fn ids_in_category(&self, category: &SystemCategory) -> Vec<SystemId> {
        self.entries
            .values()
            .filter(|entry| &entry.metadata.category == category)
            .map(|entry| entry.metadata.id.clone())
            .collect()
    }

    /// Entries sorted by ascending priority, ties broken by `SystemId`.
    ///
    /// This is the order of the sequential fallback path.
    pub fn sequential_order(&self) -> Vec<RegistryEntry<W>> {
        let mut entries: Vec<RegistryEntry<W>> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.metadata.priority
                .cmp(&b.metadata.priority)
                .then_with(|| a.metadata.id.cmp(&b.metadata.id))
        });
        entries
    }
}
