use coop::{Cx, Error, Scheduler, Suspend, Suspension, Token, UnitError, UnitState};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

/// Suspension point that registers with nobody.
struct Never;

impl Suspend for Never {
    type Output = ();

    fn is_ready(&self) -> bool {
        false
    }

    fn suspend(&mut self, _token: Token, _cx: &Cx) -> Suspension {
        Suspension::Wait
    }

    fn resume(&mut self) {}
}

struct DropFlag(Rc<Cell<bool>>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn test_drain_preserves_spawn_order() {
    let scheduler = Scheduler::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    for name in ["A", "B", "C"] {
        let log = log.clone();
        scheduler.spawn(async move {
            log.borrow_mut().push(name);
        });
    }

    assert!(!scheduler.drain(), "all units should have completed");
    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
}

#[test]
fn test_duplicate_wakeups_do_not_resume_twice() {
    let scheduler = Scheduler::new();
    let runs = Rc::new(Cell::new(0));

    let r = runs.clone();
    let token = scheduler.spawn(async move {
        r.set(r.get() + 1);
    });

    // Same batch: the first copy completes the unit, the rest are skipped.
    for _ in 0..999 {
        scheduler.wakeup(token);
    }
    assert!(!scheduler.drain());
    assert_eq!(runs.get(), 1);

    // Later batch, delivered from another thread after the unit is gone.
    let remote = scheduler.remote();
    thread::spawn(move || {
        for _ in 0..1000 {
            remote.wakeup(token);
        }
    })
    .join()
    .unwrap();

    assert!(!scheduler.drain());
    assert_eq!(runs.get(), 1, "completed unit must never run again");
}

#[test]
fn test_unit_state_transitions() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();

    let token = scheduler.spawn(async move {
        cx.yield_now().await;
    });

    assert_eq!(scheduler.state(token), Some(UnitState::NotStarted));
    assert!(scheduler.drain());
    assert_eq!(scheduler.state(token), Some(UnitState::Suspended));
    assert!(!scheduler.drain());
    assert_eq!(scheduler.state(token), None, "completed root should be released");
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_running_unit_sees_itself_running() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    let token = scheduler.spawn(async move {
        for _ in 0..2 {
            let own = cx.current().and_then(|token| cx.state(token));
            s.borrow_mut().push(own);
            cx.yield_now().await;
        }
    });

    assert!(scheduler.drain());
    assert_eq!(scheduler.state(token), Some(UnitState::Suspended));
    scheduler.run();

    assert_eq!(
        *seen.borrow(),
        vec![Some(UnitState::Running), Some(UnitState::Running)]
    );
}

#[test]
fn test_spawn_from_running_unit() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    scheduler.spawn(async move {
        let child_log = l.clone();
        cx.spawn(async move {
            child_log.borrow_mut().push("child");
        });
        l.borrow_mut().push("parent");
    });

    assert!(scheduler.drain(), "child is still pending after first drain");
    assert_eq!(*log.borrow(), vec!["parent"]);
    assert!(!scheduler.drain());
    assert_eq!(*log.borrow(), vec!["parent", "child"]);
}

#[test]
fn test_wakeups_during_drain_wait_for_next_drain() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();
    let steps = Rc::new(Cell::new(0));

    let s = steps.clone();
    scheduler.spawn(async move {
        for _ in 0..3 {
            s.set(s.get() + 1);
            cx.yield_now().await;
        }
    });

    assert!(scheduler.drain());
    assert_eq!(steps.get(), 1);
    assert!(scheduler.drain());
    assert_eq!(steps.get(), 2);
    assert!(scheduler.drain());
    assert_eq!(steps.get(), 3);
    assert!(!scheduler.drain());
}

#[test]
fn test_drop_scheduler_destroys_incomplete_units() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();
    let dropped = Rc::new(Cell::new(false));

    let guard = DropFlag(dropped.clone());
    let token = scheduler.spawn(async move {
        let _guard = guard;
        cx.wait(Never).await;
    });

    assert!(scheduler.drain());
    assert_eq!(scheduler.state(token), Some(UnitState::Suspended));
    assert!(!dropped.get());

    drop(scheduler);
    assert!(dropped.get(), "suspended unit should be destroyed with the scheduler");
}

#[test]
fn test_wakeup_after_shutdown_is_rejected() {
    let scheduler = Scheduler::new();
    let remote = scheduler.remote();
    let token = scheduler.spawn(async {});

    assert!(!scheduler.drain());
    assert!(remote.try_wakeup(token).is_ok());

    drop(scheduler);
    assert_eq!(remote.try_wakeup(token), Err(Error::Shutdown));
    remote.wakeup(token);
}

#[test]
fn test_run_for_reports_stalled_units() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();

    scheduler.spawn(async {});
    scheduler.spawn(async move {
        cx.wait(Never).await;
    });

    let limit = Duration::from_millis(30);
    let result = scheduler.run_for(limit);

    assert_eq!(result, Err(Error::Stalled { remaining: 1, limit }));
}

#[test]
fn test_panicking_unit_is_isolated() {
    let scheduler = Scheduler::new();
    let completed = Rc::new(Cell::new(false));

    let failing = scheduler.spawn(async {
        panic!("boom");
    });

    let c = completed.clone();
    scheduler.spawn(async move {
        c.set(true);
    });

    scheduler.run();

    assert!(completed.get(), "other units keep running after a failure");
    assert_eq!(
        scheduler.take_failures(),
        vec![(failing, UnitError::Panicked("boom".to_string()))]
    );
    assert!(scheduler.take_failures().is_empty());
}

#[test]
#[should_panic(expected = "boom")]
fn test_panic_propagates_without_isolation() {
    let scheduler = Scheduler::builder().isolate_failures(false).build();

    scheduler.spawn(async {
        panic!("boom");
    });

    scheduler.drain();
}

#[test]
fn test_foreign_future_wakes_unit() {
    let scheduler = Scheduler::new();
    let received = Rc::new(Cell::new(0));
    let (tx, rx) = futures::channel::oneshot::channel::<u32>();

    let r = received.clone();
    scheduler.spawn(async move {
        let value = rx.await.unwrap();
        r.set(value);
    });

    assert!(scheduler.drain(), "unit should be waiting on the channel");

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        tx.send(7).unwrap();
    });

    scheduler.run_for(Duration::from_secs(5)).unwrap();
    assert_eq!(received.get(), 7);
}
