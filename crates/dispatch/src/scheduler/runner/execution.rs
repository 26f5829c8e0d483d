use chrono::Utc;
use tracing::{debug, error, info};

use hostd_core::{JobStatus, Pid, RuntimeError, RuntimeOp};

use crate::error::DispatchError;
use crate::job::Job;
use crate::scheduler::metrics::DispatcherMetrics;
use crate::scheduler::types::{DispatchEvent, StatusReport};

use super::Dispatcher;

impl Dispatcher {
    /// Run one quantum and return what happened in it.
    ///
    /// Order: admit arrivals, promote the backlog, account the running job
    /// (finish or preempt), dispatch the next job, wait one quantum.
    pub fn step(&mut self) -> Result<Vec<DispatchEvent>, DispatchError> {
        if self.metrics.started_at.is_none() {
            self.metrics.started_at = Some(Utc::now());
        }
        let mut events = Vec::new();

        self.admit_arrivals(&mut events);
        self.promote_backlog(&mut events)?;
        self.tick_active(&mut events)?;
        self.dispatch_next(&mut events)?;

        if self.active.is_some() {
            self.metrics.busy_quanta += 1;
        }
        self.timer.wait_quantum();
        self.now += 1;
        self.metrics.quanta_elapsed += 1;

        if self.is_finished() {
            self.metrics.finished_at = Some(Utc::now());
        }
        Ok(events)
    }

    /// Step until every job has finished.
    pub fn run(&mut self) -> Result<DispatcherMetrics, DispatchError> {
        self.run_with(|_| {})
    }

    /// Step until every job has finished, passing each event to `on_event`.
    pub fn run_with<F>(&mut self, mut on_event: F) -> Result<DispatcherMetrics, DispatchError>
    where
        F: FnMut(&DispatchEvent),
    {
        info!(jobs = self.input.len(), "dispatcher starting");
        loop {
            for event in self.step()? {
                on_event(&event);
            }
            if self.is_finished() {
                break;
            }
        }
        info!(
            completed = self.metrics.completed,
            rejected = self.metrics.rejected,
            quanta = self.metrics.quanta_elapsed,
            "dispatcher finished"
        );
        Ok(self.metrics.clone())
    }

    /// Charge the running job one quantum, then finish or preempt it.
    pub(super) fn tick_active(&mut self, events: &mut Vec<DispatchEvent>) -> Result<(), DispatchError> {
        let Some(mut job) = self.active.take() else {
            return Ok(());
        };
        job.remaining_cpu_time = job.remaining_cpu_time.saturating_sub(1);

        if job.remaining_cpu_time == 0 {
            if let Some(pid) = job.pid {
                if let Err(e) = self.runtime.terminate(pid) {
                    self.runtime_failed(&job, RuntimeOp::Terminate, &e, events);
                }
            }
            return self.retire(job, true, events);
        }

        if job.is_real_time() || !self.feedback_waiting() {
            self.active = Some(job);
            return Ok(());
        }

        let Some(pid) = job.pid else {
            self.active = Some(job);
            return Ok(());
        };
        match self.runtime.suspend(pid) {
            Ok(()) => {
                let from = job.priority;
                job.status = JobStatus::Suspended;
                job.priority = job.priority.demoted();
                self.metrics.preemptions += 1;
                debug!(job = %job.id, pid, from = %from, to = %job.priority, "job preempted");
                events.push(DispatchEvent::Suspended {
                    job: job.id,
                    pid,
                    priority: job.priority,
                });
                self.lanes[job.priority.index()].enqueue(job);
            }
            Err(e) => {
                // Could not stop it, so it keeps the CPU at its current lane.
                self.runtime_failed(&job, RuntimeOp::Suspend, &e, events);
                self.active = Some(job);
            }
        }
        Ok(())
    }

    /// With the CPU idle, start or resume the next job in lane order.
    pub(super) fn dispatch_next(&mut self, events: &mut Vec<DispatchEvent>) -> Result<(), DispatchError> {
        if self.active.is_some() {
            return Ok(());
        }
        let Some(mut job) = self.select_next() else {
            return Ok(());
        };
        if job.is_real_time() {
            job.memory = Some(self.reserved);
        }

        match (job.status, job.pid) {
            (JobStatus::Suspended, Some(pid)) => match self.runtime.resume(pid) {
                Ok(()) => {
                    job.status = JobStatus::Running;
                    debug!(job = %job.id, pid, lane = %job.priority, "job resumed");
                    events.push(DispatchEvent::Resumed { job: job.id, pid });
                    self.active = Some(job);
                }
                Err(e) => {
                    self.runtime_failed(&job, RuntimeOp::Resume, &e, events);
                    if let Err(e) = self.runtime.terminate(pid) {
                        debug!(job = %job.id, pid, error = %e, "could not reap job after failed resume");
                    }
                    self.retire(job, false, events)?;
                }
            },
            _ => match self.runtime.start(&job.args) {
                Ok(pid) => self.started(job, pid, events),
                Err(e) => {
                    self.runtime_failed(&job, RuntimeOp::Start, &e, events);
                    self.retire(job, false, events)?;
                }
            },
        }
        Ok(())
    }

    fn started(&mut self, mut job: Job, pid: Pid, events: &mut Vec<DispatchEvent>) {
        job.pid = Some(pid);
        job.status = JobStatus::Running;
        if job.started_at.is_none() {
            job.started_at = Some(self.now);
            self.metrics.record_start(job.arrival_time, self.now);
        }

        let report = self.status_report(&job, pid);
        info!(
            job = %job.id,
            pid,
            lane = %job.priority,
            offset = report.memory_offset,
            size = report.memory_size,
            "job started"
        );
        events.push(DispatchEvent::Started(report));
        self.active = Some(job);
    }

    /// Give back everything `job` holds and mark it terminated.
    ///
    /// Real-time jobs only drop their borrow of the reserved block.
    fn retire(
        &mut self,
        mut job: Job,
        completed: bool,
        events: &mut Vec<DispatchEvent>,
    ) -> Result<(), DispatchError> {
        let block = job.memory.take();
        if !job.is_real_time() {
            if let Some(block) = block {
                self.allocator.free(block).inspect_err(|e| {
                    error!(job = %job.id, error = %e, "failed to free job memory");
                })?;
            }
            self.ledger.release(&mut job);
        }
        job.status = JobStatus::Terminated;

        if completed {
            self.metrics.record_completion(job.arrival_time, self.now);
            info!(job = %job.id, pid = ?job.pid, at = self.now, "job completed");
        } else {
            self.metrics.abandoned += 1;
            info!(job = %job.id, pid = ?job.pid, at = self.now, "job abandoned");
        }
        events.push(DispatchEvent::Terminated {
            job: job.id,
            pid: job.pid,
            at: self.now,
            completed,
        });
        Ok(())
    }

    fn runtime_failed(
        &mut self,
        job: &Job,
        operation: RuntimeOp,
        err: &RuntimeError,
        events: &mut Vec<DispatchEvent>,
    ) {
        error!(job = %job.id, pid = ?job.pid, %operation, error = %err, "runtime operation failed");
        self.metrics.runtime_failures += 1;
        events.push(DispatchEvent::RuntimeFailed {
            job: job.id,
            operation,
            error: err.to_string(),
        });
    }

    fn status_report(&self, job: &Job, pid: Pid) -> StatusReport {
        let memory_offset = job
            .memory
            .and_then(|id| self.allocator.block(id))
            .map_or(0, |b| b.offset);
        StatusReport {
            job: job.id,
            pid,
            arrival_time: job.arrival_time,
            priority: job.priority,
            remaining_cpu_time: job.remaining_cpu_time,
            memory_offset,
            memory_size: job.memory_request,
            resources: job.held,
            status: job.status,
        }
    }
}
