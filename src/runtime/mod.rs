//! Runtime subsystem modules.

pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod queue;
pub(crate) mod waker;
pub mod yield_now;

pub use self::context::Cx;
pub use self::core::Scheduler;
pub use self::queue::Remote;
