//! Process runtime contract consumed by the dispatcher.
//!
//! The dispatcher never touches OS processes directly; it drives an
//! implementation of [`ProcessRuntime`] (real child processes, or a
//! simulation for tests and dry runs).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OS-level process identifier handed out by a runtime.
pub type Pid = u32;

/// The four operations a runtime exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeOp {
    Start,
    Suspend,
    Resume,
    Terminate,
}

impl fmt::Display for RuntimeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeOp::Start => write!(f, "start"),
            RuntimeOp::Suspend => write!(f, "suspend"),
            RuntimeOp::Resume => write!(f, "resume"),
            RuntimeOp::Terminate => write!(f, "terminate"),
        }
    }
}

/// Error type for runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("job command is empty")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown process {0}")]
    UnknownProcess(Pid),

    #[error("failed to send {signal} to process {pid}: {reason}")]
    Signal {
        pid: Pid,
        signal: &'static str,
        reason: String,
    },

    #[error("failed waiting on process {pid}: {reason}")]
    Wait { pid: Pid, reason: String },

    #[error("process {0} exited before the operation completed")]
    Exited(Pid),

    #[error("process {pid} cannot {op} while {state}")]
    InvalidState {
        pid: Pid,
        op: RuntimeOp,
        state: &'static str,
    },
}

/// Runs, pauses, continues and ends the processes backing jobs.
///
/// Every call blocks until the process has acknowledged the state change
/// or the call has failed.
pub trait ProcessRuntime {
    /// Launch a fresh process for `argv` and return its pid.
    fn start(&mut self, argv: &[String]) -> Result<Pid, RuntimeError>;

    /// Stop a running process, returning once it is stopped.
    fn suspend(&mut self, pid: Pid) -> Result<(), RuntimeError>;

    /// Continue a previously suspended process.
    fn resume(&mut self, pid: Pid) -> Result<(), RuntimeError>;

    /// End a process and reap it.
    fn terminate(&mut self, pid: Pid) -> Result<(), RuntimeError>;
}
