//! Job processes as real OS children.
//!
//! Suspension uses SIGTSTP and blocks until the child reports stopped;
//! resumption uses SIGCONT; termination sends SIGINT and reaps the child.

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};

use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid as NixPid;
use tracing::{debug, warn};

use hostd_core::{Pid, ProcessRuntime, RuntimeError};

struct Tracked {
    child: Child,
    stopped: bool,
}

/// Spawns one child per job and drives it with job-control signals.
///
/// Children still alive when the runtime is dropped are killed and reaped.
#[derive(Default)]
pub struct ChildProcessRuntime {
    children: HashMap<Pid, Tracked>,
}

impl ChildProcessRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn tracked(&mut self, pid: Pid) -> Result<&mut Tracked, RuntimeError> {
        self.children
            .get_mut(&pid)
            .ok_or(RuntimeError::UnknownProcess(pid))
    }
}

fn signal(pid: Pid, sig: Signal) -> Result<(), RuntimeError> {
    kill(NixPid::from_raw(pid as i32), sig).map_err(|e| RuntimeError::Signal {
        pid,
        signal: sig.as_str(),
        reason: e.to_string(),
    })
}

impl ProcessRuntime for ChildProcessRuntime {
    fn start(&mut self, argv: &[String]) -> Result<Pid, RuntimeError> {
        let (program, args) = argv.split_first().ok_or(RuntimeError::EmptyCommand)?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: program.clone(),
                source,
            })?;

        let pid = child.id();
        debug!(pid, program = %program, "process started");
        self.children.insert(
            pid,
            Tracked {
                child,
                stopped: false,
            },
        );
        Ok(pid)
    }

    fn suspend(&mut self, pid: Pid) -> Result<(), RuntimeError> {
        self.tracked(pid)?;
        signal(pid, Signal::SIGTSTP)?;

        match waitpid(NixPid::from_raw(pid as i32), Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Stopped(..)) => {
                self.tracked(pid)?.stopped = true;
                debug!(pid, "process suspended");
                Ok(())
            }
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => {
                // Already reaped by waitpid; forget it.
                self.children.remove(&pid);
                Err(RuntimeError::Exited(pid))
            }
            Ok(other) => Err(RuntimeError::Wait {
                pid,
                reason: format!("unexpected status {other:?}"),
            }),
            Err(e) => Err(RuntimeError::Wait {
                pid,
                reason: e.to_string(),
            }),
        }
    }

    fn resume(&mut self, pid: Pid) -> Result<(), RuntimeError> {
        self.tracked(pid)?;
        signal(pid, Signal::SIGCONT)?;
        self.tracked(pid)?.stopped = false;
        debug!(pid, "process resumed");
        Ok(())
    }

    fn terminate(&mut self, pid: Pid) -> Result<(), RuntimeError> {
        let stopped = self.tracked(pid)?.stopped;
        signal(pid, Signal::SIGINT)?;
        if stopped {
            // A stopped child only acts on SIGINT once continued.
            signal(pid, Signal::SIGCONT)?;
        }

        let mut tracked = self
            .children
            .remove(&pid)
            .ok_or(RuntimeError::UnknownProcess(pid))?;
        let status = tracked.child.wait().map_err(|e| RuntimeError::Wait {
            pid,
            reason: e.to_string(),
        })?;
        debug!(pid, %status, "process terminated");
        Ok(())
    }
}

impl Drop for ChildProcessRuntime {
    fn drop(&mut self) {
        for (pid, mut tracked) in self.children.drain() {
            warn!(pid, "killing leftover job process");
            let _ = tracked.child.kill();
            let _ = tracked.child.wait();
        }
    }
}
