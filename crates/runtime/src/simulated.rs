use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use hostd_core::{Pid, ProcessRuntime, RuntimeError, RuntimeOp};

/// First pid handed out by a [`SimulatedRuntime`].
const FIRST_PID: Pid = 1000;

/// One successful call made against a [`SimulatedRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeCall {
    Start(Pid),
    Suspend(Pid),
    Resume(Pid),
    Terminate(Pid),
}

impl RuntimeCall {
    pub fn pid(&self) -> Pid {
        match *self {
            RuntimeCall::Start(pid)
            | RuntimeCall::Suspend(pid)
            | RuntimeCall::Resume(pid)
            | RuntimeCall::Terminate(pid) => pid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimState {
    Running,
    Stopped,
}

/// Runtime with no real processes: hands out fake pids and enforces the
/// same state transitions a real child would have.
///
/// Every successful call is appended to a shared journal, readable after
/// the runtime has been boxed and moved into a dispatcher.
#[derive(Debug)]
pub struct SimulatedRuntime {
    next_pid: Pid,
    processes: HashMap<Pid, SimState>,
    journal: Arc<Mutex<Vec<RuntimeCall>>>,
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self {
            next_pid: FIRST_PID,
            processes: HashMap::new(),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl SimulatedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the call journal.
    pub fn journal(&self) -> Arc<Mutex<Vec<RuntimeCall>>> {
        Arc::clone(&self.journal)
    }

    fn record(&self, call: RuntimeCall) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(call);
        }
    }

    fn transition(
        &mut self,
        pid: Pid,
        op: RuntimeOp,
        from: SimState,
        to: SimState,
    ) -> Result<(), RuntimeError> {
        let state = self
            .processes
            .get_mut(&pid)
            .ok_or(RuntimeError::UnknownProcess(pid))?;
        if *state != from {
            return Err(RuntimeError::InvalidState {
                pid,
                op,
                state: match state {
                    SimState::Running => "running",
                    SimState::Stopped => "stopped",
                },
            });
        }
        *state = to;
        Ok(())
    }
}

impl ProcessRuntime for SimulatedRuntime {
    fn start(&mut self, argv: &[String]) -> Result<Pid, RuntimeError> {
        if argv.is_empty() {
            return Err(RuntimeError::EmptyCommand);
        }
        let pid = self.next_pid;
        self.next_pid += 1;
        self.processes.insert(pid, SimState::Running);
        self.record(RuntimeCall::Start(pid));
        debug!(pid, "simulated start");
        Ok(pid)
    }

    fn suspend(&mut self, pid: Pid) -> Result<(), RuntimeError> {
        self.transition(pid, RuntimeOp::Suspend, SimState::Running, SimState::Stopped)?;
        self.record(RuntimeCall::Suspend(pid));
        Ok(())
    }

    fn resume(&mut self, pid: Pid) -> Result<(), RuntimeError> {
        self.transition(pid, RuntimeOp::Resume, SimState::Stopped, SimState::Running)?;
        self.record(RuntimeCall::Resume(pid));
        Ok(())
    }

    fn terminate(&mut self, pid: Pid) -> Result<(), RuntimeError> {
        self.processes
            .remove(&pid)
            .ok_or(RuntimeError::UnknownProcess(pid))?;
        self.record(RuntimeCall::Terminate(pid));
        Ok(())
    }
}
