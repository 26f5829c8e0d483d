//! Multi-level feedback dispatcher.
//!
//! Four lanes are served in strict order: the real-time FCFS lane (0) and
//! the feedback lanes 1-3. A user job that still has work after a quantum
//! is suspended and demoted one lane whenever another feedback job is
//! waiting; real-time jobs are never preempted.

pub mod metrics;
pub mod runner;
pub mod types;

pub use metrics::DispatcherMetrics;
pub use runner::Dispatcher;
pub use types::{DispatchEvent, StatusReport};
