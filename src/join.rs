//! Join combinator: wait for a fixed set of independently scheduled units.
//!
//! Each operation becomes its own unit (an *arm*) owned by the [`Join`]. A
//! shared [`JoinCounter`] starts at the number of arms; every arm decrements it
//! as its finalization step, and the arm that reaches zero wakes the waiter.
//!
//! # Registration race
//!
//! Suspending starts every arm inline before the waiter registers, so arms
//! that never pause finish first. Registration therefore checks the counter
//! and reports [`Suspension::Proceed`] when nothing is left to wait for,
//! instead of parking a waiter that nobody would wake.
//!
//! Dropping a `Join` before it completes destroys its arms, abandoning their
//! operations silently.

use crate::error::UnitError;
use crate::runtime::context::Cx;
use crate::runtime::queue::Remote;
use crate::suspend::{Suspend, Suspension};
use crate::unit::{Finalizer, Token, UnitHandle};

use log::debug;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

/// Completion-tracking state shared by a join and its arms.
pub(crate) struct JoinCounter<T> {
    remaining: usize,
    waiter: Option<Token>,
    results: Vec<Option<Result<T, UnitError>>>,
}

impl<T> JoinCounter<T> {
    fn new(count: usize) -> Self {
        Self {
            remaining: count,
            waiter: None,
            results: (0..count).map(|_| None).collect(),
        }
    }

    fn set_value(&mut self, index: usize, value: T) {
        self.results[index] = Some(Ok(value));
    }

    /// Records an arm's completion. Returns the waiter to wake, at most once.
    fn arrive(&mut self, index: usize, outcome: Result<(), UnitError>) -> Option<Token> {
        if let Err(err) = outcome {
            self.results[index] = Some(Err(err));
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.waiter.take()
        } else {
            None
        }
    }

    /// Registers the waiter unless every arm has already arrived.
    ///
    /// Returns whether the caller still has to wait.
    fn register(&mut self, waiter: Token) -> bool {
        if self.remaining == 0 {
            return false;
        }

        self.waiter = Some(waiter);
        true
    }

    fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// Suspension point completing once all of its arms have finished.
///
/// Resolves to one `Result` per operation, in argument order. An arm that
/// panicked (with failure isolation enabled) yields `Err(UnitError::Panicked)`.
pub struct Join<T> {
    arms: Vec<UnitHandle>,
    counter: Rc<RefCell<JoinCounter<T>>>,
    started: bool,
}

impl<T: 'static> Join<T> {
    pub(crate) fn new<I, F>(cx: &Cx, ops: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T> + 'static,
    {
        let ops: Vec<F> = ops.into_iter().collect();
        let counter = Rc::new(RefCell::new(JoinCounter::new(ops.len())));

        let arms = ops
            .into_iter()
            .enumerate()
            .map(|(index, op)| {
                let slot = counter.clone();
                let arm = async move {
                    let value = op.await;
                    slot.borrow_mut().set_value(index, value);
                };

                let finalizer = arrival(counter.clone(), cx.remote(), index);
                cx.core.insert(Box::pin(arm), Some(finalizer))
            })
            .collect();

        Self {
            arms,
            counter,
            started: false,
        }
    }

    /// Number of joined operations.
    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

// Finalization step run by the scheduler when an arm completes.
fn arrival<T: 'static>(
    counter: Rc<RefCell<JoinCounter<T>>>,
    remote: Remote,
    index: usize,
) -> Finalizer {
    Box::new(move |outcome| {
        let waiter = counter.borrow_mut().arrive(index, outcome);
        if let Some(waiter) = waiter {
            debug!("join complete, waking {waiter}");
            remote.wakeup(waiter);
        }
    })
}

impl<T: 'static> Suspend for Join<T> {
    type Output = Vec<Result<T, UnitError>>;

    fn is_ready(&self) -> bool {
        self.counter.borrow().is_done()
    }

    fn suspend(&mut self, token: Token, cx: &Cx) -> Suspension {
        if !self.started {
            self.started = true;
            debug!("{token} joining {} unit(s)", self.arms.len());

            for arm in &self.arms {
                cx.core.run_unit(arm.token());
            }
        }

        if self.counter.borrow_mut().register(token) {
            Suspension::Wait
        } else {
            Suspension::Proceed
        }
    }

    fn resume(&mut self) -> Self::Output {
        self.counter
            .borrow_mut()
            .results
            .drain(..)
            .map(|result| result.unwrap_or(Err(UnitError::Abandoned)))
            .collect()
    }
}
