//! The suspension contract.
//!
//! Anything a unit can pause on implements [`Suspend`]:
//!
//! 1. [`is_ready`](Suspend::is_ready) is a cheap probe; if it returns `true`
//!    the unit continues without pausing.
//! 2. [`suspend`](Suspend::suspend) receives the unit's [`Token`] and either
//!    registers it with exactly one wakeup producer, reports that it was
//!    satisfied while registering, or designates another unit to run next.
//! 3. [`resume`](Suspend::resume) extracts the delivered value.
//!
//! A registration must lead to exactly one wakeup or to the unit being
//! destroyed. The scheduler has no timeout sweep, so a lost registration
//! leaves the unit suspended forever.

use crate::runtime::context::Cx;
use crate::unit::{Token, UnitState};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Result of a suspend registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suspension {
    /// Registered with a producer; yield to the scheduler.
    Wait,
    /// Already satisfied during registration; continue without yielding.
    Proceed,
    /// Yield, and run the given unit immediately instead of the next queued one.
    Transfer(Token),
}

/// A point a unit can suspend on.
///
/// `suspend` may be called again if the unit is resumed while the point is
/// still not ready; implementations must not register twice.
pub trait Suspend {
    type Output;

    fn is_ready(&self) -> bool;

    fn suspend(&mut self, token: Token, cx: &Cx) -> Suspension;

    fn resume(&mut self) -> Self::Output;
}

/// Future driving a [`Suspend`] point on behalf of the current unit.
///
/// Created by [`Cx::wait`]. Readiness is probed again on every resumption, so
/// an early or duplicate wakeup never completes the point prematurely.
pub struct Wait<S> {
    point: S,
    cx: Cx,
    done: bool,
}

impl<S: Suspend> Wait<S> {
    pub(crate) fn new(point: S, cx: Cx) -> Self {
        Self {
            point,
            cx,
            done: false,
        }
    }
}

impl<S: Suspend + Unpin> Future for Wait<S> {
    type Output = S::Output;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.done, "`Wait` polled after completion");

        if !this.point.is_ready() {
            let token = this
                .cx
                .current()
                .expect("suspension point awaited outside of a running unit");

            match this.point.suspend(token, &this.cx) {
                Suspension::Proceed => {}
                Suspension::Wait => return Poll::Pending,
                Suspension::Transfer(next) => {
                    this.cx.core.request_transfer(next);
                    return Poll::Pending;
                }
            }
        }

        this.done = true;
        Poll::Ready(this.point.resume())
    }
}

/// Symmetric transfer point: hands the scheduler thread to another unit.
///
/// When the target no longer exists, has completed, or is itself running
/// further up the resume stack (a joiner starting this unit inline, say), the
/// current unit simply carries on. Otherwise it stays suspended after the
/// transfer until someone wakes it, and then proceeds.
#[derive(Debug)]
pub struct Handoff {
    target: Token,
    handed_off: bool,
}

impl Handoff {
    pub fn new(target: Token) -> Self {
        Self {
            target,
            handed_off: false,
        }
    }
}

impl Suspend for Handoff {
    type Output = ();

    fn is_ready(&self) -> bool {
        self.handed_off
    }

    fn suspend(&mut self, token: Token, cx: &Cx) -> Suspension {
        self.handed_off = true;

        match cx.state(self.target) {
            Some(UnitState::NotStarted | UnitState::Suspended) if self.target != token => {
                Suspension::Transfer(self.target)
            }
            // Gone, finished, or somewhere on the resume stack: nothing to run.
            _ => Suspension::Proceed,
        }
    }

    fn resume(&mut self) {}
}
