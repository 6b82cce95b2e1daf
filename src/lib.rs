//! Minimal cooperative multitasking runtime.
//!
//! Units of work are futures owned by a single-threaded [`Scheduler`]. They
//! pause at suspension points (anything implementing [`Suspend`]) and are
//! resumed when a producer, possibly on another thread, hands their [`Token`]
//! back to the scheduler's ready queue.
//!
//! # Architecture
//!
//! - **Scheduler**: owns root units and drains the ready queue until none remain
//! - **Cx**: explicit context handed to unit bodies; spawning and waiting go through it
//! - **Remote**: the thread-safe wakeup entry point used by background producers
//! - **Suspend**: the readiness / registration / resume contract
//! - **Timer**: deadline-based suspension backed by a notifier thread
//! - **Join**: waits for a fixed set of operations, each run as its own unit
//! - **SchedulerBuilder**: fluent configuration
//!
//! # Example
//!
//! ```ignore
//! use coop::Scheduler;
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::new();
//! let cx = scheduler.cx();
//!
//! scheduler.spawn(async move {
//!     let inner = cx.clone();
//!     let results = cx
//!         .join([
//!             Box::pin(async move { inner.sleep(Duration::from_millis(5)).await; 1 })
//!                 as std::pin::Pin<Box<dyn std::future::Future<Output = i32>>>,
//!             Box::pin(async { 2 }),
//!         ])
//!         .await;
//!     assert_eq!(results.len(), 2);
//! });
//!
//! scheduler.run();
//! ```

mod builder;
mod error;
mod join;
mod runtime;
mod suspend;
mod timer;
mod unit;
mod utils;

pub use builder::SchedulerBuilder;
pub use error::{Error, Result, UnitError};
pub use join::Join;
pub use runtime::yield_now::YieldNow;
pub use runtime::{Cx, Remote, Scheduler};
pub use suspend::{Handoff, Suspend, Suspension, Wait};
pub use timer::Timer;
pub use unit::{Token, UnitState};
