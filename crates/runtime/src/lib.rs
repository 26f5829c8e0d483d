//! [`ProcessRuntime`](hostd_core::ProcessRuntime) implementations.
//!
//! - [`ChildProcessRuntime`]: real child processes controlled with job-control
//!   signals (Unix only).
//! - [`SimulatedRuntime`]: bookkeeping only, for dry runs and tests.

#[cfg(unix)]
pub mod process;
pub mod simulated;

#[cfg(unix)]
pub use process::ChildProcessRuntime;
pub use simulated::{RuntimeCall, SimulatedRuntime};
