//! Thread-safe ready queue for resumption tokens.
//!
//! Producers on any thread append tokens; the scheduler thread swaps the whole
//! batch out at the start of each drain so appends made during the drain land
//! in the next one.

use crate::error::{Error, Result};
use crate::unit::Token;

use log::trace;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// FIFO of tokens awaiting the next drain.
///
/// The lock is only held for a push or a swap, never across a resume.
pub(crate) struct ReadyQueue {
    tokens: Mutex<Vec<Token>>,
    available: Condvar,
    shutdown: AtomicBool,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self {
            tokens: Mutex::new(Vec::new()),
            available: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Enqueues a token to be resumed on the next drain.
    ///
    /// Callable from any thread. The lock is held only for the append; a
    /// scheduler parked in [`park`](Self::park) is woken afterwards.
    ///
    /// # Arguments
    /// * `token` - The unit to resume
    ///
    /// # Returns
    /// `Err(Error::Shutdown)` once the owning scheduler has been dropped
    pub(crate) fn push(&self, token: Token) -> Result<()> {
        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        self.tokens.lock().push(token);
        self.available.notify_one();

        Ok(())
    }

    /// Swaps the pending tokens out, leaving the queue empty.
    ///
    /// Producers may keep appending while the scheduler iterates the returned
    /// batch; those tokens wait for the following drain.
    ///
    /// # Returns
    /// Every token queued since the previous call, in enqueue order
    pub(crate) fn take_batch(&self) -> Vec<Token> {
        std::mem::take(&mut *self.tokens.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }

    /// Blocks until a token is queued or `timeout` elapses.
    ///
    /// Returns immediately if tokens are already pending or the queue has been
    /// shut down.
    ///
    /// # Arguments
    /// * `timeout` - Upper bound on the wait
    pub(crate) fn park(&self, timeout: Duration) {
        let mut tokens = self.tokens.lock();
        if tokens.is_empty() && !self.is_shutdown() {
            let _ = self.available.wait_for(&mut tokens, timeout);
        }
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.tokens.lock().clear();
        self.available.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Cross-thread wakeup handle.
///
/// This is the only piece of the scheduler that may leave its thread: it can
/// request resumption of a token but cannot spawn or touch unit state.
#[derive(Clone)]
pub struct Remote {
    queue: Arc<ReadyQueue>,
}

impl Remote {
    pub(crate) fn new(queue: Arc<ReadyQueue>) -> Self {
        Self { queue }
    }

    /// Requests resumption of `token`.
    ///
    /// Always safe: stale tokens are skipped at drain time, and wakeups that
    /// arrive after the scheduler was dropped are discarded.
    pub fn wakeup(&self, token: Token) {
        if self.try_wakeup(token).is_err() {
            trace!("discarding wakeup for {token}: scheduler shut down");
        }
    }

    /// Like [`wakeup`](Self::wakeup) but reports a shut down scheduler.
    pub fn try_wakeup(&self, token: Token) -> Result<()> {
        self.queue.push(token)
    }
}
