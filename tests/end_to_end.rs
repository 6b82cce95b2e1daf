use coop::{Cx, Scheduler};
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(20);

type Log = Rc<RefCell<Vec<String>>>;

async fn basic(cx: Cx, log: Log, yields: usize) {
    log.borrow_mut().push(format!("[basic {yields}] begin"));

    for _ in 0..yields {
        cx.yield_now().await;
    }

    log.borrow_mut().push(format!("[basic {yields}] end"));
}

async fn timed(cx: Cx, log: Log, ticks: u32) {
    log.borrow_mut().push(format!("[timed {ticks}] begin"));
    cx.sleep(TICK * ticks).await;
    log.borrow_mut().push(format!("[timed {ticks}] end"));
}

fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|line| line == entry)
        .unwrap_or_else(|| panic!("missing log entry {entry:?}"))
}

#[test]
fn test_yielding_and_timed_units_all_complete() {
    let scheduler = Scheduler::new();
    let log: Log = Rc::default();

    for yields in [4, 1, 3] {
        scheduler.spawn(basic(scheduler.cx(), log.clone(), yields));
    }
    for ticks in [1, 2] {
        scheduler.spawn(timed(scheduler.cx(), log.clone(), ticks));
    }

    scheduler.run_for(Duration::from_secs(5)).unwrap();
    assert_eq!(scheduler.pending(), 0);

    let log = log.borrow();
    assert_eq!(log.len(), 10);

    for name in ["basic 4", "basic 1", "basic 3", "timed 1", "timed 2"] {
        let begin = position(&log, &format!("[{name}] begin"));
        let end = position(&log, &format!("[{name}] end"));
        assert!(begin < end, "{name} ended before it began");
    }

    // Fewer yields finish first; timers outlast every yielding unit.
    assert!(position(&log, "[basic 1] end") < position(&log, "[basic 3] end"));
    assert!(position(&log, "[basic 3] end") < position(&log, "[basic 4] end"));
    assert!(position(&log, "[basic 4] end") < position(&log, "[timed 1] end"));
    assert!(position(&log, "[timed 1] end") < position(&log, "[timed 2] end"));
}

#[test]
fn test_counter_joins_mixed_operations() {
    let scheduler = Scheduler::new();
    let cx = scheduler.cx();
    let log: Log = Rc::default();

    let l = log.clone();
    scheduler.spawn(async move {
        l.borrow_mut().push("[counter] begin".to_string());

        let nothing = cx.join(Vec::<futures::future::Ready<()>>::new()).await;
        assert!(nothing.is_empty());

        let (a, b, c) = (cx.clone(), cx.clone(), cx.clone());
        let joined = cx
            .join([
                async move { a.yield_now().await }.boxed_local(),
                async move { b.sleep(TICK).await }.boxed_local(),
                async move { c.sleep(TICK * 2).await }.boxed_local(),
            ])
            .await;

        assert!(joined.iter().all(Result::is_ok));
        l.borrow_mut().push("[counter] end".to_string());
    });

    scheduler.spawn(basic(scheduler.cx(), log.clone(), 3));

    scheduler.run_for(Duration::from_secs(5)).unwrap();

    assert!(scheduler.take_failures().is_empty());

    let log = log.borrow();
    assert_eq!(log.first().map(String::as_str), Some("[counter] begin"));
    assert_eq!(log.last().map(String::as_str), Some("[counter] end"));
}
