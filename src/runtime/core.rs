//! Cooperative scheduler that owns root units and drains the ready queue.
//!
//! Execution is strictly one unit at a time on the thread that owns the
//! [`Scheduler`]. Other threads only ever reach it through a
//! [`Remote`](crate::Remote), which appends tokens to the ready queue.

use crate::builder::{Config, SchedulerBuilder};
use crate::error::{Error, Result, UnitError};
use crate::runtime::context::Cx;
use crate::runtime::queue::{ReadyQueue, Remote};
use crate::runtime::waker::make_waker;
use crate::unit::{Finalizer, Token, Unit, UnitHandle, UnitState};
use crate::utils::slab::Slab;

use futures::future::LocalBoxFuture;
use log::{debug, error, trace};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// State shared between the scheduler, its contexts and unit handles.
pub(crate) struct Core {
    arena: RefCell<Slab<Unit>>,
    roots: RefCell<Vec<UnitHandle>>,
    queue: Arc<ReadyQueue>,
    /// Token of the unit currently being resumed.
    current: Cell<Option<Token>>,
    /// Unit designated by a symmetric transfer during the current resume.
    transfer: Cell<Option<Token>>,
    failures: RefCell<Vec<(Token, UnitError)>>,
    pub(crate) config: Config,
}

impl Core {
    fn new(config: Config) -> Self {
        Self {
            arena: RefCell::new(Slab::new()),
            roots: RefCell::new(Vec::new()),
            queue: Arc::new(ReadyQueue::new()),
            current: Cell::new(None),
            transfer: Cell::new(None),
            failures: RefCell::new(Vec::new()),
            config,
        }
    }

    pub(crate) fn remote(&self) -> Remote {
        Remote::new(self.queue.clone())
    }

    pub(crate) fn current(&self) -> Option<Token> {
        self.current.get()
    }

    pub(crate) fn state(&self, token: Token) -> Option<UnitState> {
        self.arena
            .borrow()
            .get(token.index, token.generation)
            .map(|unit| unit.state)
    }

    /// Number of unit records alive in the arena, roots and join arms alike.
    pub(crate) fn live_units(&self) -> usize {
        self.arena.borrow().len()
    }

    pub(crate) fn request_transfer(&self, token: Token) {
        self.transfer.set(Some(token));
    }

    /// Stores a new unit in the arena and returns its owning handle.
    ///
    /// Nothing is enqueued: the caller decides when the unit first runs, either
    /// by waking its token or by starting it inline with [`run_unit`](Self::run_unit).
    ///
    /// # Arguments
    /// * `future` - The unit's computation
    /// * `finalizer` - Completion hook for join arms; `None` marks a root unit
    ///
    /// # Returns
    /// The handle owning the new record. Dropping it destroys the unit.
    pub(crate) fn insert(
        self: &Rc<Self>,
        future: LocalBoxFuture<'static, ()>,
        finalizer: Option<Finalizer>,
    ) -> UnitHandle {
        let (index, generation) = self
            .arena
            .borrow_mut()
            .insert(Unit::new(future, finalizer));

        UnitHandle::new(Rc::downgrade(self), Token { index, generation })
    }

    /// Takes ownership of a root unit and enqueues it.
    ///
    /// The handle goes into the root collection, which keeps the unit alive
    /// until it completes (pruned at the end of a drain) or the scheduler is
    /// dropped.
    ///
    /// # Returns
    /// The unit's token, usable for wakeups and state queries.
    pub(crate) fn spawn<F>(self: &Rc<Self>, future: F) -> Token
    where
        F: Future<Output = ()> + 'static,
    {
        let handle = self.insert(Box::pin(future), None);
        let token = handle.token();

        self.roots.borrow_mut().push(handle);
        self.wakeup(token);
        debug!("spawned root unit {token}");

        token
    }

    pub(crate) fn wakeup(&self, token: Token) {
        if self.queue.push(token).is_err() {
            trace!("discarding wakeup for {token}: scheduler shut down");
        }
    }

    /// Destroys a unit record.
    ///
    /// Called when the owning [`UnitHandle`] is dropped. An incomplete unit is
    /// abandoned: its computation is dropped and nothing waiting on it is
    /// notified. The future is dropped after the arena borrow ends because its
    /// destructor may release further units (the arms of a join it owned).
    ///
    /// # Arguments
    /// * `token` - The unit to destroy; stale tokens are ignored
    pub(crate) fn release(&self, token: Token) {
        let removed = self
            .arena
            .borrow_mut()
            .remove(token.index, token.generation);

        if let Some(unit) = removed {
            if unit.state != UnitState::Completed {
                debug!("abandoning unit {token} in state {:?}", unit.state);
            }
            drop(unit);
        }
    }

    /// Resumes `token`, then keeps resuming whatever it transfers control to.
    ///
    /// Used by `drain` for every queued token and by [`Join`](crate::Join) to
    /// start its arms inline. Transfers are followed iteratively, so a chain of
    /// handoffs never grows the stack.
    ///
    /// # Arguments
    /// * `token` - The unit to resume first
    pub(crate) fn run_unit(&self, token: Token) {
        let mut next = Some(token);
        while let Some(token) = next {
            next = self.resume(token);
        }
    }

    /// Polls one unit once. Returns the target of a symmetric transfer, if any.
    fn resume(&self, token: Token) -> Option<Token> {
        let future = {
            let mut arena = self.arena.borrow_mut();
            match arena.get_mut(token.index, token.generation) {
                Some(unit) if unit.state != UnitState::Completed => {
                    let future = unit.future.take();
                    if future.is_some() {
                        unit.state = UnitState::Running;
                    }
                    future
                }
                _ => None,
            }
        };

        let Some(mut future) = future else {
            trace!("skipping {token}: completed, released or already running");
            return None;
        };

        trace!("resuming {token}");

        let waker = make_waker(self.remote(), token);
        let mut context = Context::from_waker(&waker);

        let previous = self.current.replace(Some(token));
        let outer_transfer = self.transfer.take();

        let poll = if self.config.isolate_failures {
            panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut context)))
        } else {
            Ok(future.as_mut().poll(&mut context))
        };

        let transfer = self.transfer.replace(outer_transfer);
        self.current.set(previous);

        match poll {
            Ok(Poll::Pending) => {
                let mut arena = self.arena.borrow_mut();
                if let Some(unit) = arena.get_mut(token.index, token.generation) {
                    unit.state = UnitState::Suspended;
                    unit.future = Some(future);
                    return transfer;
                }
                drop(arena);
                // Released while running; nothing left to put the future back into.
                drop(future);
                transfer
            }
            Ok(Poll::Ready(())) => {
                drop(future);
                self.complete(token, Ok(()));
                None
            }
            Err(payload) => {
                drop(future);
                self.complete(token, Err(UnitError::from_panic(payload)));
                None
            }
        }
    }

    fn complete(&self, token: Token, outcome: std::result::Result<(), UnitError>) {
        let (finalizer, root) = {
            let mut arena = self.arena.borrow_mut();
            match arena.get_mut(token.index, token.generation) {
                Some(unit) => {
                    unit.state = UnitState::Completed;
                    let root = unit.is_root();
                    (unit.finalizer.take(), root)
                }
                None => (None, false),
            }
        };

        match &outcome {
            Ok(()) => debug!("unit {token} completed"),
            Err(err) => error!("unit {token} failed: {err}"),
        }

        if let Some(finalizer) = finalizer {
            finalizer(outcome);
        } else if let (true, Err(err)) = (root, outcome) {
            self.failures.borrow_mut().push((token, err));
        }
    }

    /// Drops completed root units; returns how many remain.
    fn prune_roots(&self) -> usize {
        let finished: Vec<UnitHandle> = {
            let mut roots = self.roots.borrow_mut();
            let (finished, pending) = std::mem::take(&mut *roots)
                .into_iter()
                .partition(|handle| handle.is_completed());
            *roots = pending;
            finished
        };

        drop(finished);
        self.roots.borrow().len()
    }

    fn teardown(&self) {
        self.queue.shutdown();

        let roots = std::mem::take(&mut *self.roots.borrow_mut());
        drop(roots);

        let leftovers = self.arena.borrow_mut().take_all();
        drop(leftovers);
    }
}

/// Single-threaded cooperative scheduler.
///
/// Owns root units; dropping it destroys every unit that has not completed.
/// The scheduler is `!Send`, so spawning is only possible from its own thread;
/// see [`Scheduler::remote`] for the cross-thread wakeup entry point.
///
/// # Example
/// ```ignore
/// let scheduler = Scheduler::new();
/// let cx = scheduler.cx();
///
/// scheduler.spawn(async move {
///     cx.sleep(Duration::from_millis(10)).await;
/// });
///
/// scheduler.run();
/// ```
pub struct Scheduler {
    core: Rc<Core>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn with_config(config: Config) -> Self {
        Self {
            core: Rc::new(Core::new(config)),
        }
    }

    /// Context object to hand to unit bodies.
    pub fn cx(&self) -> Cx {
        Cx::new(self.core.clone())
    }

    /// Thread-safe handle for waking units from other threads.
    pub fn remote(&self) -> Remote {
        self.core.remote()
    }

    /// Takes ownership of a new root unit and enqueues it.
    pub fn spawn<F>(&self, future: F) -> Token
    where
        F: Future<Output = ()> + 'static,
    {
        self.core.spawn(future)
    }

    /// Requests resumption of `token` on the next drain.
    pub fn wakeup(&self, token: Token) {
        self.core.wakeup(token);
    }

    /// Runs one scheduling pass.
    ///
    /// Swaps the ready queue out, resumes each token in enqueue order (skipping
    /// units that have completed or no longer exist), then drops completed root
    /// units. Tokens enqueued during the pass are left for the next one.
    ///
    /// Returns whether any root units remain.
    pub fn drain(&self) -> bool {
        let batch = self.core.queue.take_batch();
        trace!(
            "draining {} token(s) across {} live unit(s)",
            batch.len(),
            self.core.live_units()
        );

        for token in batch {
            self.core.run_unit(token);
        }

        self.core.prune_roots() > 0
    }

    /// Drains until no root units remain, parking between passes.
    ///
    /// Blocks forever if a unit waits on something that never wakes it.
    pub fn run(&self) {
        while self.drain() {
            self.core.queue.park(self.core.config.park_timeout);
        }
    }

    /// Like [`run`](Self::run), but gives up once `limit` has elapsed.
    pub fn run_for(&self, limit: Duration) -> Result<()> {
        let deadline = Instant::now() + limit;

        while self.drain() {
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Stalled {
                    remaining: self.pending(),
                    limit,
                });
            }

            let wait = (deadline - now).min(self.core.config.park_timeout);
            self.core.queue.park(wait);
        }

        Ok(())
    }

    /// Current state of a unit, or `None` once its record has been destroyed.
    pub fn state(&self, token: Token) -> Option<UnitState> {
        self.core.state(token)
    }

    /// Number of root units still owned by the scheduler.
    pub fn pending(&self) -> usize {
        self.core.roots.borrow().len()
    }

    /// Whether no tokens are waiting for the next drain.
    pub fn is_idle(&self) -> bool {
        self.core.queue.is_empty()
    }

    /// Returns and clears the failures of root units collected so far.
    pub fn take_failures(&self) -> Vec<(Token, UnitError)> {
        std::mem::take(&mut *self.core.failures.borrow_mut())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.core.teardown();
    }
}
