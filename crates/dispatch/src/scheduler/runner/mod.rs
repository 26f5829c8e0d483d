//! Dispatcher runner -- owns every queue and pool and drives the loop.
//!
//! Split into focused submodules:
//! - `core`: Dispatcher struct, constructor, loading, and accessor methods
//! - `scheduling`: admission of arrivals, backlog promotion, lane selection
//! - `execution`: per-quantum step, preemption, start/resume/terminate

mod core;
mod execution;
mod scheduling;
#[cfg(test)]
mod tests;

pub use self::core::Dispatcher;
