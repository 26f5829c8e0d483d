use std::fmt;

use serde::{Deserialize, Serialize};

use hostd_core::{JobRecord, JobStatus, Pid, Priority, Resources, Ticks};

use crate::memory::BlockId;

/// Dispatcher-assigned sequence number (position in the arrival-sorted feed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A job as the dispatcher tracks it from admission to termination.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Set once the runtime has started the process.
    pub pid: Option<Pid>,
    pub args: Vec<String>,
    pub arrival_time: Ticks,
    pub remaining_cpu_time: Ticks,
    pub priority: Priority,
    pub status: JobStatus,
    pub memory_request: usize,
    pub resource_request: Resources,
    /// Peripherals currently held from the ledger.
    pub held: Resources,
    /// Memory block while allocated. Real-time jobs borrow the reserved
    /// block only while they run.
    pub memory: Option<BlockId>,
    /// Clock value of the first start, for response time.
    pub started_at: Option<Ticks>,
}

impl Job {
    pub fn new(id: JobId, record: &JobRecord, priority: Priority, args: Vec<String>) -> Self {
        Self {
            id,
            pid: None,
            args,
            arrival_time: record.arrival_time,
            remaining_cpu_time: record.cpu_time,
            priority,
            status: JobStatus::NotStarted,
            memory_request: record.memory,
            resource_request: record.resources(),
            held: Resources::ZERO,
            memory: None,
            started_at: None,
        }
    }

    pub fn is_real_time(&self) -> bool {
        self.priority.is_real_time()
    }
}
