use tracing::{debug, info, warn};

use crate::error::{DispatchError, MemoryError};
use crate::job::Job;
use crate::scheduler::types::DispatchEvent;

use super::Dispatcher;

impl Dispatcher {
    /// Move every record whose arrival time has come through admission.
    pub(super) fn admit_arrivals(&mut self, events: &mut Vec<DispatchEvent>) {
        while self
            .input
            .front()
            .is_some_and(|(_, record)| record.arrival_time <= self.now)
        {
            let Some((id, record)) = self.input.pop_front() else {
                break;
            };

            match self.admission.admit(&record) {
                Ok(priority) => {
                    debug!(job = %id, %priority, memory = record.memory, "job admitted");
                    self.metrics.admitted += 1;
                    events.push(DispatchEvent::Admitted { job: id, priority });

                    let job = Job::new(id, &record, priority, self.job_command.clone());
                    if priority.is_real_time() {
                        self.lanes[priority.index()].enqueue(job);
                    } else {
                        self.backlog.enqueue(job);
                    }
                }
                Err(reason) => {
                    warn!(job = %id, %reason, "job rejected");
                    self.metrics.rejected += 1;
                    events.push(DispatchEvent::Rejected { job: id, reason });
                }
            }
        }
    }

    /// Promote backlog jobs into their lanes while the head fits.
    ///
    /// Strict head-of-line: a head that does not fit blocks everything
    /// behind it until the next iteration.
    pub(super) fn promote_backlog(
        &mut self,
        events: &mut Vec<DispatchEvent>,
    ) -> Result<(), DispatchError> {
        while let Some(head) = self.backlog.front() {
            if !self.allocator.check(head.memory_request)?
                || !self.ledger.check(&head.resource_request)
            {
                break;
            }
            let Some(mut job) = self.backlog.dequeue() else {
                break;
            };

            let block = match self.allocator.allocate(job.memory_request) {
                Ok(block) => block,
                Err(MemoryError::OutOfMemory { .. }) => {
                    self.backlog.push_front(job);
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            let demand = job.resource_request;
            if !self.ledger.allocate(&mut job, demand) {
                self.allocator.free(block)?;
                self.backlog.push_front(job);
                break;
            }

            let offset = self.allocator.block(block).map_or(0, |b| b.offset);
            job.memory = Some(block);
            info!(job = %job.id, lane = %job.priority, offset, size = job.memory_request, "job promoted");
            events.push(DispatchEvent::Promoted {
                job: job.id,
                priority: job.priority,
                offset,
            });
            self.lanes[job.priority.index()].enqueue(job);
        }
        Ok(())
    }

    /// Dequeue from the highest-priority non-empty lane.
    pub(super) fn select_next(&mut self) -> Option<Job> {
        self.lanes.iter_mut().find_map(|lane| lane.dequeue())
    }

    /// True if any feedback lane (1-3) has a job waiting.
    pub(super) fn feedback_waiting(&self) -> bool {
        self.lanes[1..].iter().any(|lane| !lane.is_empty())
    }
}
