//! Explicit scheduler context handed to unit bodies.
//!
//! There is no process-wide "current scheduler": a unit reaches its scheduler
//! only through the [`Cx`] it was given. Turning a value into something a unit
//! can wait on is likewise an explicit call (`cx.wait(point)`, `cx.sleep(..)`,
//! `cx.join(..)`) rather than an ambient transformation.
//!
//! `Cx` is reference counted but `!Send`; it never leaves the scheduler thread.

use crate::join::Join;
use crate::runtime::core::Core;
use crate::runtime::queue::Remote;
use crate::runtime::yield_now::YieldNow;
use crate::suspend::{Handoff, Suspend, Wait};
use crate::timer::Timer;
use crate::unit::{Token, UnitState};

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone)]
pub struct Cx {
    pub(crate) core: Rc<Core>,
}

impl Cx {
    pub(crate) fn new(core: Rc<Core>) -> Self {
        Self { core }
    }

    /// Spawns a new root unit owned by the scheduler.
    pub fn spawn<F>(&self, future: F) -> Token
    where
        F: Future<Output = ()> + 'static,
    {
        self.core.spawn(future)
    }

    /// Turns a suspension point into a future the current unit can await.
    pub fn wait<S: Suspend>(&self, point: S) -> Wait<S> {
        Wait::new(point, self.clone())
    }

    /// Suspends the current unit for at least `duration`.
    pub fn sleep(&self, duration: Duration) -> Wait<Timer> {
        self.wait(Timer::after(duration))
    }

    /// Gives every other ready unit a turn before continuing.
    pub fn yield_now(&self) -> Wait<YieldNow> {
        self.wait(YieldNow::new())
    }

    /// Waits for every future in `ops`, each run as its own unit.
    ///
    /// Resolves to one result per operation, in argument order.
    pub fn join<I, F, T>(&self, ops: I) -> Wait<Join<T>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T> + 'static,
        T: 'static,
    {
        self.wait(Join::new(self, ops))
    }

    /// Transfers control directly to `target`, bypassing the ready queue.
    ///
    /// The current unit stays suspended until something wakes it.
    pub fn handoff(&self, target: Token) -> Wait<Handoff> {
        self.wait(Handoff::new(target))
    }

    /// Requests resumption of `token` on the next drain.
    pub fn wakeup(&self, token: Token) {
        self.core.wakeup(token);
    }

    /// Cross-thread wakeup handle for the same scheduler.
    pub fn remote(&self) -> Remote {
        self.core.remote()
    }

    /// Token of the unit currently being resumed.
    pub fn current(&self) -> Option<Token> {
        self.core.current()
    }

    pub fn state(&self, token: Token) -> Option<UnitState> {
        self.core.state(token)
    }
}
