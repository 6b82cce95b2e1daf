use coop::{Scheduler, SchedulerBuilder};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_builder_creation() {
    let scheduler = SchedulerBuilder::new().build();
    assert_eq!(scheduler.pending(), 0);
    assert!(scheduler.is_idle());
    assert!(!scheduler.drain());
}

#[test]
fn test_builder_configured_scheduler_runs_timers() {
    let scheduler = Scheduler::builder()
        .park_timeout(Duration::from_millis(5))
        .thread_name("test-timer")
        .build();
    let cx = scheduler.cx();
    let done = Rc::new(Cell::new(false));

    let d = done.clone();
    scheduler.spawn(async move {
        cx.sleep(Duration::from_millis(15)).await;
        d.set(true);
    });

    scheduler.run();
    assert!(done.get());
}

#[test]
fn test_multiple_schedulers_are_independent() {
    let first = Scheduler::new();
    let second = Scheduler::default();
    let counter = Rc::new(Cell::new(0));

    let c = counter.clone();
    first.spawn(async move { c.set(c.get() + 1) });
    let c = counter.clone();
    second.spawn(async move { c.set(c.get() + 10) });

    assert!(!second.drain());
    assert_eq!(counter.get(), 10);
    assert!(!first.drain());
    assert_eq!(counter.get(), 11);
}
