//! Suspendable units and the handles that refer to them.
//!
//! A unit is a boxed future stored as a record in the scheduler's arena. Two
//! kinds of reference exist:
//!
//! - [`Token`]: a `Copy`, non-owning key used to request resumption. Waking a
//!   token whose unit has completed or been destroyed is a no-op.
//! - [`UnitHandle`]: the single owner of a record. The scheduler holds handles
//!   for root units, a [`Join`](crate::Join) holds the handles of its arms.
//!   Dropping the handle destroys the unit, abandoning its computation without
//!   notifying anything that waits on it.

use crate::error::UnitError;
use crate::runtime::core::Core;

use futures::future::LocalBoxFuture;
use std::fmt;
use std::rc::Weak;

/// Non-owning reference to a unit, used to request its resumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Lifecycle of a unit.
///
/// `Running` covers every unit currently on the resume stack: the one being
/// polled, and any unit that started a join arm inline and is still inside
/// that call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    NotStarted,
    Running,
    Suspended,
    Completed,
}

pub(crate) type Finalizer = Box<dyn FnOnce(Result<(), UnitError>)>;

/// Arena record for one unit.
///
/// `future` is `None` while the unit is being resumed (it is moved out so the
/// arena is not borrowed across the poll) and after completion.
pub(crate) struct Unit {
    pub(crate) future: Option<LocalBoxFuture<'static, ()>>,
    pub(crate) state: UnitState,
    pub(crate) finalizer: Option<Finalizer>,
}

impl Unit {
    pub(crate) fn new(future: LocalBoxFuture<'static, ()>, finalizer: Option<Finalizer>) -> Self {
        Self {
            future: Some(future),
            state: UnitState::NotStarted,
            finalizer,
        }
    }

    pub(crate) fn is_root(&self) -> bool {
        self.finalizer.is_none()
    }
}

/// Owning handle to a unit record. Not `Clone`; moving it transfers ownership.
pub(crate) struct UnitHandle {
    core: Weak<Core>,
    token: Token,
}

impl UnitHandle {
    pub(crate) fn new(core: Weak<Core>, token: Token) -> Self {
        Self { core, token }
    }

    pub(crate) fn token(&self) -> Token {
        self.token
    }

    pub(crate) fn is_completed(&self) -> bool {
        match self.core.upgrade() {
            Some(core) => matches!(core.state(self.token), Some(UnitState::Completed) | None),
            None => true,
        }
    }
}

impl Drop for UnitHandle {
    fn drop(&mut self) {
        if let Some(core) = self.core.upgrade() {
            core.release(self.token);
        }
    }
}
