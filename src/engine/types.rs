//! Core Scheduler Types, Identifiers, and Access Signatures
//!
//! This module defines the **fundamental identifiers and bit-level access sets**
//! shared by every part of the scheduler: the registry, the stage planner, the
//! execution plan, and the performance tracker.
//!
//! ## Design Philosophy
//!
//! Conflict detection runs every time the plan is rebuilt and compares every
//! pair of systems. To keep that cheap and allocation-free:
//!
//! - component types are identified by compact numeric [`ComponentID`] values,
//! - read and write sets are fixed-size bit arrays ([`Signature`]),
//! - a hazard check between two systems is a word-wise `AND`.
//!
//! ## Systems
//!
//! Systems are identified by a [`SystemId`], a stable, ordered, hashable name.
//! It is the key of the registry and the deterministic tie-breaker after
//! [`Priority`] when building stages.
//!
//! ## Access Sets
//!
//! [`AccessSets`] pairs a read signature with a write signature. Two access sets
//! conflict when either side writes something the other reads or writes:
//!
//! ```text
//! (W ∩ W) ∪ (W ∩ R) ∪ (R ∩ W) ≠ ∅
//! ```
//!
//! Read/read overlap is never a conflict. A system reading and writing the same
//! component is ordinary read-modify-write and has no special meaning.

use std::borrow::{Borrow, Cow};
use std::fmt;

use crate::engine::error::ComponentError;


/// Unique identifier for a component type.
pub type ComponentID = u16;

/// Maximum number of registered component types.
pub const COMPONENT_CAP: usize = 1024;
/// Number of `u64` words required to represent a full component signature.
pub const SIGNATURE_SIZE: usize = COMPONENT_CAP.div_ceil(64);

/// Scheduling priority of a system. Lower values run earlier.
pub type Priority = i32;

/// Priority assigned to systems registered without explicit metadata.
pub const DEFAULT_PRIORITY: Priority = 0;

/// Bitset representing a set of components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Packed component bitset.
    pub components: [u64; SIGNATURE_SIZE],
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            components: [0u64; SIGNATURE_SIZE],
        }
    }
}

impl Signature {
    /// Sets the bit corresponding to `component_id`.
    ///
    /// Returns `false`, leaving the signature unchanged, when the id is at or
    /// above [`COMPONENT_CAP`].
    #[inline]
    pub fn set(&mut self, component_id: ComponentID) -> bool {
        let bit = component_id as usize;
        match self.components.get_mut(bit / 64) {
            Some(word) if bit < COMPONENT_CAP => {
                *word |= 1u64 << (bit % 64);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if no component is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|&word| word == 0)
    }

    /// Returns `true` if the two signatures share at least one component.
    #[inline]
    pub fn intersects(&self, other: &Signature) -> bool {
        self.components
            .iter()
            .zip(other.components.iter())
            .any(|(a, b)| (a & b) != 0)
    }

    /// Merges every component of `other` into `self`.
    #[inline]
    pub fn union_in_place(&mut self, other: &Signature) {
        for (dst, src) in self.components.iter_mut().zip(other.components.iter()) {
            *dst |= *src;
        }
    }

    /// Component ids present in the signature, ascending.
    pub fn ids(&self) -> Vec<ComponentID> {
        let mut ids = Vec::new();
        for (word_index, &word) in self.components.iter().enumerate() {
            let mut remaining = word;
            while remaining != 0 {
                ids.push((word_index * 64 + remaining.trailing_zeros() as usize) as ComponentID);
                remaining &= remaining - 1;
            }
        }
        ids
    }
}

/// Builds a component signature from a list of component IDs.
///
/// Fails on the first id at or above [`COMPONENT_CAP`].
pub fn build_signature(component_ids: &[ComponentID]) -> Result<Signature, ComponentError> {
    let mut signature = Signature::default();
    for &component_id in component_ids {
        if !signature.set(component_id) {
            return Err(ComponentError::OutOfRange {
                component: component_id as usize,
                capacity: COMPONENT_CAP,
            });
        }
    }
    Ok(signature)
}

/// Declares the component access set of a system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessSets {
    /// Components read by the system.
    pub read: Signature,
    /// Components written by the system.
    pub write: Signature,
}

impl AccessSets {
    /// Creates access sets from explicit read and write component lists.
    pub fn new(reads: &[ComponentID], writes: &[ComponentID]) -> Result<Self, ComponentError> {
        Ok(Self {
            read: build_signature(reads)?,
            write: build_signature(writes)?,
        })
    }

    /// Returns `true` if this access set conflicts with another.
    #[inline]
    pub fn conflicts_with(&self, other: &AccessSets) -> bool {
        // Conflicts if: (W ∩ W) or (W ∩ R) or (R ∩ W)
        for ((a_w, a_r), (b_w, b_r)) in self.write.components.iter().zip(self.read.components.iter())
            .zip(other.write.components.iter().zip(other.read.components.iter()))
        {
            if (a_w & b_w) != 0 || (a_w & b_r) != 0 || (a_r & b_w) != 0 {
                return true;
            }
        }
        false
    }

    /// Merges another access set into this one.
    #[inline]
    pub fn merge(&mut self, other: &AccessSets) {
        self.read.union_in_place(&other.read);
        self.write.union_in_place(&other.write);
    }

    /// Returns `true` if the system declares no component access at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty()
    }
}

/// Stable identity of a system.
///
/// Accepts `&'static str` without allocating and `String` for names produced
/// at runtime (data-driven or scripted systems).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(Cow<'static, str>);

impl SystemId {
    /// Creates an identifier from a static name.
    #[inline]
    pub const fn from_static(name: &'static str) -> Self {
        SystemId(Cow::Borrowed(name))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for SystemId {
    fn from(name: &'static str) -> Self {
        SystemId(Cow::Borrowed(name))
    }
}

impl From<String> for SystemId {
    fn from(name: String) -> Self {
        SystemId(Cow::Owned(name))
    }
}

impl From<Cow<'static, str>> for SystemId {
    fn from(name: Cow<'static, str>) -> Self {
        SystemId(name)
    }
}

impl Borrow<str> for SystemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
