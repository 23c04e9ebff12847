#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use ecs_stage_scheduler::{
    register_component_named, ComponentID, FnSystem, Priority, System, SystemMetadata,
    SystemResult,
};

static LOGGING: Once = Once::new();

/// Installs a test subscriber once per test binary. Honors `RUST_LOG`.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Registers `count` name-only components under a test-specific prefix.
pub fn components(prefix: &str, count: usize) -> Vec<ComponentID> {
    (0..count)
        .map(|index| register_component_named(format!("{prefix}::C{index}")).unwrap())
        .collect()
}

/// World with one column per component.
///
/// Columns are guarded by `try_read` / `try_write`: a failed attempt means two
/// systems touched the same component with a write at the same time, which is
/// counted as a hazard before falling back to a blocking acquire.
pub struct TestWorld {
    columns: BTreeMap<ComponentID, RwLock<i64>>,
    hazards: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl TestWorld {
    pub fn new(components: &[ComponentID]) -> Self {
        Self {
            columns: components
                .iter()
                .enumerate()
                .map(|(index, &id)| (id, RwLock::new(index as i64 + 1)))
                .collect(),
            hazards: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn read(&self, component: ComponentID) -> i64 {
        let column = &self.columns[&component];
        match column.try_read() {
            Some(value) => *value,
            None => {
                self.hazards.fetch_add(1, Ordering::SeqCst);
                *column.read()
            }
        }
    }

    pub fn write(&self, component: ComponentID, f: impl FnOnce(&mut i64)) {
        let column = &self.columns[&component];
        match column.try_write() {
            Some(mut value) => f(&mut value),
            None => {
                self.hazards.fetch_add(1, Ordering::SeqCst);
                f(&mut column.write())
            }
        }
    }

    /// Holds a write guard on `component` for `hold`, to widen race windows.
    pub fn write_slowly(&self, component: ComponentID, hold: Duration, f: impl FnOnce(&mut i64)) {
        let column = &self.columns[&component];
        let mut guard = match column.try_write() {
            Some(guard) => guard,
            None => {
                self.hazards.fetch_add(1, Ordering::SeqCst);
                column.write()
            }
        };
        thread::sleep(hold);
        f(&mut guard);
    }

    /// Holds a read guard on `component` for `hold`.
    pub fn read_slowly(&self, component: ComponentID, hold: Duration) -> i64 {
        let column = &self.columns[&component];
        let guard = match column.try_read() {
            Some(guard) => guard,
            None => {
                self.hazards.fetch_add(1, Ordering::SeqCst);
                column.read()
            }
        };
        thread::sleep(hold);
        *guard
    }

    pub fn hazards(&self) -> usize {
        self.hazards.load(Ordering::SeqCst)
    }

    pub fn note(&self, entry: impl Into<String>) {
        self.log.lock().push(entry.into());
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn snapshot(&self) -> BTreeMap<ComponentID, i64> {
        self.columns
            .iter()
            .map(|(&id, column)| (id, *column.read()))
            .collect()
    }
}

/// An order-sensitive system: every written column becomes
/// `old * 3 + sum(reads) + salt`.
pub fn arithmetic_system(
    name: &str,
    priority: Priority,
    reads: &[ComponentID],
    writes: &[ComponentID],
    salt: i64,
) -> impl System<TestWorld> {
    let reads_owned = reads.to_vec();
    let writes_owned = writes.to_vec();
    let metadata = SystemMetadata::new(name.to_owned())
        .reads(reads)
        .writes(writes)
        .priority(priority);

    FnSystem::described(metadata, move |world: &TestWorld, _dt| -> SystemResult {
        let sum: i64 = reads_owned.iter().map(|&c| world.read(c)).sum();
        for &component in &writes_owned {
            world.write(component, |value| {
                *value = value.wrapping_mul(3).wrapping_add(sum).wrapping_add(salt)
            });
        }
        Ok(())
    })
}

/// A system that only appends its name to the world log.
pub fn logging_system(name: &'static str, metadata: SystemMetadata) -> impl System<TestWorld> {
    FnSystem::described(metadata, move |world: &TestWorld, _dt| -> SystemResult {
        world.note(name);
        Ok(())
    })
}
