use std::collections::VecDeque;

use tracing::info;

use hostd_core::{Config, JobRecord, Priority, ProcessRuntime, Ticks};

use crate::admission::AdmissionController;
use crate::error::DispatchError;
use crate::job::{Job, JobId};
use crate::memory::{BlockId, MemoryAllocator};
use crate::queue::JobQueue;
use crate::resources::ResourceLedger;
use crate::scheduler::metrics::DispatcherMetrics;
use crate::timer::QuantumTimer;

/// The HOST dispatcher. Single-threaded; every piece of scheduling state
/// lives here and changes only through [`Dispatcher::step`].
pub struct Dispatcher {
    pub(super) allocator: MemoryAllocator,
    pub(super) ledger: ResourceLedger,
    pub(super) admission: AdmissionController,
    pub(super) runtime: Box<dyn ProcessRuntime>,
    pub(super) timer: Box<dyn QuantumTimer>,
    /// Pinned block shared by every real-time job.
    pub(super) reserved: BlockId,
    /// Records not yet arrived, sorted by arrival time.
    pub(super) input: VecDeque<(JobId, JobRecord)>,
    /// Admitted user jobs waiting for memory and peripherals.
    pub(super) backlog: JobQueue,
    /// Lane 0 is the real-time FCFS lane; 1-3 are feedback lanes.
    pub(super) lanes: [JobQueue; 4],
    pub(super) active: Option<Job>,
    /// Logical clock in quanta.
    pub(super) now: Ticks,
    pub(super) next_job_id: u64,
    pub(super) job_command: Vec<String>,
    pub(super) metrics: DispatcherMetrics,
}

impl Dispatcher {
    /// Build a dispatcher for the machine described by `config`.
    ///
    /// The real-time reservation is the allocator's first allocation, so it
    /// always sits at offset 0.
    pub fn new(
        config: &Config,
        runtime: Box<dyn ProcessRuntime>,
        timer: Box<dyn QuantumTimer>,
    ) -> Result<Self, DispatchError> {
        config.validate()?;
        let system = &config.system;

        let mut allocator = MemoryAllocator::new(system.total_memory)?;
        let reserved = allocator.reserve(system.reserved_memory)?;

        info!(
            total = system.total_memory,
            reserved = system.reserved_memory,
            peripherals = ?system.peripherals(),
            "dispatcher initialized"
        );

        Ok(Self {
            allocator,
            ledger: ResourceLedger::new(system.peripherals()),
            admission: AdmissionController::new(system),
            runtime,
            timer,
            reserved,
            input: VecDeque::new(),
            backlog: JobQueue::new(),
            lanes: Default::default(),
            active: None,
            now: 0,
            next_job_id: 0,
            job_command: config.dispatcher.job_command.clone(),
            metrics: DispatcherMetrics::default(),
        })
    }

    /// Queue job records for arrival. Records are ordered by arrival time;
    /// ties keep their feed order. Ids are assigned in feed order.
    ///
    /// Sorting means an out-of-order list is still admitted by arrival
    /// time. A record listed after a later arrival is not held back
    /// behind it.
    pub fn load(&mut self, records: impl IntoIterator<Item = JobRecord>) {
        let before = self.input.len();
        for record in records {
            let id = JobId(self.next_job_id);
            self.next_job_id += 1;
            self.input.push_back((id, record));
        }
        let loaded = self.input.len() - before;
        self.input
            .make_contiguous()
            .sort_by_key(|(_, record)| record.arrival_time);
        self.metrics.loaded += loaded as u64;
        info!(jobs = loaded, "dispatch list loaded");
    }

    /// True once nothing is running, queued, or still to arrive.
    pub fn is_finished(&self) -> bool {
        self.active.is_none()
            && self.lanes.iter().all(JobQueue::is_empty)
            && self.backlog.is_empty()
            && self.input.is_empty()
    }

    /// Current logical time in quanta.
    pub fn now(&self) -> Ticks {
        self.now
    }

    pub fn metrics(&self) -> &DispatcherMetrics {
        &self.metrics
    }

    pub fn allocator(&self) -> &MemoryAllocator {
        &self.allocator
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// The job currently holding the CPU.
    pub fn active(&self) -> Option<&Job> {
        self.active.as_ref()
    }

    pub fn lane(&self, priority: Priority) -> &JobQueue {
        &self.lanes[priority.index()]
    }

    pub fn backlog(&self) -> &JobQueue {
        &self.backlog
    }

    /// Records loaded but not yet arrived.
    pub fn pending_arrivals(&self) -> usize {
        self.input.len()
    }

    pub fn reserved_block(&self) -> BlockId {
        self.reserved
    }
}
