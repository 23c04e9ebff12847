#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use ecs_stage_scheduler::{
    register_component_named, ComponentID, FnSystem, System, SystemMetadata, SystemResult,
};

pub const SYSTEMS_SMALL: usize = 16;
pub const SYSTEMS_MED: usize = 128;
pub const SYSTEMS_LARGE: usize = 1024;

pub const COMPONENTS: usize = 64;

/// World of plain atomic counters, one per component.
pub struct BenchWorld {
    pub columns: Vec<AtomicU64>,
}

impl BenchWorld {
    pub fn new() -> Self {
        Self {
            columns: (0..COMPONENTS).map(|_| AtomicU64::new(1)).collect(),
        }
    }
}

pub fn init_components() -> Vec<ComponentID> {
    (0..COMPONENTS)
        .map(|index| register_component_named(format!("bench::C{index}")).unwrap())
        .collect()
}

/// Deterministic pseudo-random access pattern: each system reads two
/// components and writes one.
pub fn metadata_set(count: usize, ids: &[ComponentID]) -> Vec<SystemMetadata> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % ids.len() as u64) as usize
    };

    (0..count)
        .map(|index| {
            let (a, b, w) = (next(), next(), next());
            SystemMetadata::new(format!("system_{index:04}"))
                .read(ids[a])
                .read(ids[b])
                .write(ids[w])
                .priority((index % 7) as i32)
        })
        .collect()
}

/// A system that spins over its columns for `work` iterations.
pub fn busy_system(metadata: SystemMetadata, slots: Vec<usize>, work: u64) -> impl System<BenchWorld> {
    FnSystem::described(metadata, move |world: &BenchWorld, _dt| -> SystemResult {
        let mut acc = 0u64;
        for round in 0..work {
            for &slot in &slots {
                acc = acc.wrapping_add(world.columns[slot].load(Ordering::Relaxed) ^ round);
            }
        }
        if let Some(&target) = slots.last() {
            world.columns[target].fetch_add(acc & 1, Ordering::Relaxed);
        }
        Ok(())
    })
}
