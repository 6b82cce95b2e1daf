//! Wall-clock timer suspension point.
//!
//! A [`Timer`] computes its deadline when it is created. If the deadline has
//! already passed the unit continues without pausing; otherwise suspending
//! spawns a detached notifier thread that sleeps until the deadline and then
//! wakes the unit through a [`Remote`](crate::Remote).
//!
//! A duration too large to add to the current instant yields a timer that
//! never fires: it is never ready and arms no notifier.
//!
//! Timers cannot be cancelled. Destroying the waiting unit first leaves the
//! notifier running; its eventual wakeup targets a stale token and is ignored.

use crate::runtime::context::Cx;
use crate::suspend::{Suspend, Suspension};
use crate::unit::Token;

use log::{debug, warn};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Timer {
    /// `None` when the deadline lies beyond what `Instant` can represent.
    deadline: Option<Instant>,
    armed: bool,
}

impl Timer {
    /// Timer firing `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(duration),
            armed: false,
        }
    }

    /// Timer firing at `deadline`.
    pub fn at(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            armed: false,
        }
    }

    /// Instant the timer fires at, or `None` if it never fires.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Suspend for Timer {
    type Output = ();

    fn is_ready(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn suspend(&mut self, token: Token, cx: &Cx) -> Suspension {
        // The notifier armed earlier is still on its way.
        if self.armed {
            return Suspension::Wait;
        }

        let Some(deadline) = self.deadline else {
            debug!("{token} waiting on a timer that never fires");
            self.armed = true;
            return Suspension::Wait;
        };

        let remote = cx.remote();

        let spawned = thread::Builder::new()
            .name(cx.core.config.thread_name.clone())
            .spawn(move || {
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                }
                remote.wakeup(token);
            });

        match spawned {
            Ok(_) => {
                debug!("armed timer for {token}");
                self.armed = true;
            }
            Err(err) => {
                // Poll again on every drain until the deadline passes.
                warn!("could not spawn timer notifier for {token}: {err}");
                cx.wakeup(token);
            }
        }

        Suspension::Wait
    }

    fn resume(&mut self) {}
}
