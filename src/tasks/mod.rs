//! Background Tasks Module
//!
//! Contains background tasks that run periodically during process operation.
//!
//! # Tasks
//! - Active sweep: removes expired entries and rate counters from every
//!   registered cache at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
