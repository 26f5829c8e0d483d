use std::collections::VecDeque;

use crate::job::Job;

/// FIFO of owned jobs. Holds no allocation logic.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub fn dequeue(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    /// Put a job back at the head, ahead of everything already queued.
    pub fn push_front(&mut self, job: Job) {
        self.jobs.push_front(job);
    }

    pub fn front(&self) -> Option<&Job> {
        self.jobs.front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}
