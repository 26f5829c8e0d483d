use serde::Serialize;

use hostd_core::{JobStatus, Pid, Priority, Resources, RuntimeOp, Ticks};

use crate::admission::AdmissionError;
use crate::job::JobId;

/// Snapshot of a job printed when it starts running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub job: JobId,
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub priority: Priority,
    pub remaining_cpu_time: Ticks,
    pub memory_offset: usize,
    pub memory_size: usize,
    pub resources: Resources,
    pub status: JobStatus,
}

/// Something observable that happened during one dispatcher step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    Admitted {
        job: JobId,
        priority: Priority,
    },
    Rejected {
        job: JobId,
        reason: AdmissionError,
    },
    /// Left the backlog with memory and peripherals committed.
    Promoted {
        job: JobId,
        priority: Priority,
        offset: usize,
    },
    Started(StatusReport),
    Resumed {
        job: JobId,
        pid: Pid,
    },
    /// Preempted and moved to `priority`.
    Suspended {
        job: JobId,
        pid: Pid,
        priority: Priority,
    },
    /// `completed` is false when the job was abandoned after a runtime failure.
    Terminated {
        job: JobId,
        pid: Option<Pid>,
        at: Ticks,
        completed: bool,
    },
    RuntimeFailed {
        job: JobId,
        operation: RuntimeOp,
        error: String,
    },
}

impl DispatchEvent {
    pub fn job(&self) -> JobId {
        match self {
            DispatchEvent::Admitted { job, .. }
            | DispatchEvent::Rejected { job, .. }
            | DispatchEvent::Promoted { job, .. }
            | DispatchEvent::Resumed { job, .. }
            | DispatchEvent::Suspended { job, .. }
            | DispatchEvent::Terminated { job, .. }
            | DispatchEvent::RuntimeFailed { job, .. } => *job,
            DispatchEvent::Started(report) => report.job,
        }
    }
}
