mod common;

use std::thread;
use std::time::Duration;

use common::{init_logging, logging_system, TestWorld};

use ecs_stage_scheduler::{
    FnSystem, PerformanceTracker, Scheduler, SchedulerConfig, SystemId, SystemMetadata,
    SystemResult,
};

#[test]
fn tracker_keeps_rolling_statistics() {
    let tracker = PerformanceTracker::new();
    let id = SystemId::from("physics");

    tracker.record(&id, Duration::from_millis(4));
    tracker.record(&id, Duration::from_millis(2));
    tracker.record(&id, Duration::from_millis(6));

    let timing = tracker.get("physics").unwrap();
    assert_eq!(timing.samples, 3);
    assert_eq!(timing.last, Duration::from_millis(6));
    assert_eq!(timing.min, Duration::from_millis(2));
    assert_eq!(timing.max, Duration::from_millis(6));
    assert_eq!(timing.mean, Duration::from_millis(4));
    assert_eq!(timing.total(), Duration::from_millis(12));
    assert_eq!(timing.failures, 0);
}

#[test]
fn failures_count_as_samples() {
    let tracker = PerformanceTracker::new();
    let id = SystemId::from("ai");

    tracker.record(&id, Duration::from_micros(10));
    tracker.record_failure(&id, Duration::from_micros(30));

    let timing = tracker.get("ai").unwrap();
    assert_eq!(timing.samples, 2);
    assert_eq!(timing.failures, 1);
    assert_eq!(timing.mean, Duration::from_micros(20));
}

#[test]
fn forget_and_reset_remove_entries() {
    let tracker = PerformanceTracker::new();
    tracker.record(&SystemId::from("a"), Duration::from_millis(1));
    tracker.record(&SystemId::from("b"), Duration::from_millis(1));

    assert!(tracker.forget("a").is_some());
    assert!(tracker.get("a").is_none());
    assert_eq!(tracker.snapshot().len(), 1);

    tracker.reset();
    assert!(tracker.snapshot().is_empty());
}

#[test]
fn snapshot_orders_by_mean_duration() {
    let tracker = PerformanceTracker::new();
    tracker.record(&SystemId::from("fast"), Duration::from_millis(1));
    tracker.record(&SystemId::from("slow"), Duration::from_millis(9));
    tracker.record(&SystemId::from("medium"), Duration::from_millis(5));

    let snapshot = tracker.snapshot();
    let slowest: Vec<&str> = snapshot.slowest().into_iter().map(|(id, _)| id.as_str()).collect();

    assert_eq!(slowest, vec!["slow", "medium", "fast"]);
    assert_eq!(snapshot.total_last(), Duration::from_millis(15));
}

#[test]
fn scheduler_times_every_invocation() {
    init_logging();
    let scheduler: Scheduler<TestWorld> =
        Scheduler::new(SchedulerConfig::default().with_worker_threads(2)).unwrap();
    scheduler
        .register(FnSystem::described(
            SystemMetadata::new("sleepy"),
            |_: &TestWorld, _dt| -> SystemResult {
                thread::sleep(Duration::from_millis(3));
                Ok(())
            },
        ))
        .unwrap();
    scheduler.register(logging_system("quick", SystemMetadata::new("quick"))).unwrap();
    let world = TestWorld::new(&[]);

    // First tick takes the sequential path, the rest run the plan.
    scheduler.tick(&world, 0.016);
    scheduler.rebuild();
    scheduler.tick(&world, 0.016);
    scheduler.tick(&world, 0.016);

    let snapshot = scheduler.performance().snapshot();
    assert_eq!(snapshot.len(), 2);
    let sleepy = snapshot.get("sleepy").unwrap();
    assert_eq!(sleepy.samples, 3);
    assert!(sleepy.min >= Duration::from_millis(3));
    assert_eq!(snapshot.get("quick").unwrap().samples, 3);
    assert_eq!(snapshot.slowest()[0].0.as_str(), "sleepy");
}

#[test]
fn unregistering_drops_the_timing_entry() {
    init_logging();
    let scheduler: Scheduler<TestWorld> =
        Scheduler::new(SchedulerConfig::default().with_worker_threads(2)).unwrap();
    let world = TestWorld::new(&[]);
    for round in 0..5 {
        let name = format!("transient_{round}");
        scheduler
            .register(FnSystem::described(
                SystemMetadata::new(name.clone()),
                |_: &TestWorld, _dt| -> SystemResult { Ok(()) },
            ))
            .unwrap();
        scheduler.tick(&world, 0.016);
        assert!(scheduler.performance().get(&name).is_some());

        assert!(scheduler.unregister(&name));
        assert!(scheduler.performance().get(&name).is_none());
    }

    assert!(scheduler.performance().snapshot().is_empty());
}
