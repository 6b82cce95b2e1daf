//! Error definitions.
//!
//! [`Error`] covers failures of the scheduler itself, [`UnitError`] is the
//! outcome of a single unit that did not finish normally.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// Errors reported by the scheduler and its remote handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `run_for` hit its limit with root units still pending.
    #[error("{remaining} root unit(s) still pending after {limit:?}")]
    Stalled { remaining: usize, limit: Duration },

    /// The scheduler owning the ready queue has been dropped.
    #[error("scheduler has shut down")]
    Shutdown,
}

/// Why a unit finished without producing its value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The unit's computation panicked while being resumed.
    #[error("unit panicked: {0}")]
    Panicked(String),

    /// The unit was destroyed before it could deliver a value.
    #[error("unit was abandoned before completing")]
    Abandoned,
}

impl UnitError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self::Panicked(message)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
