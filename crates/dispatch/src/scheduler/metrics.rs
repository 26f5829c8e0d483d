use chrono::{DateTime, Utc};
use serde::Serialize;

use hostd_core::Ticks;

/// Counters collected over one dispatcher run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatcherMetrics {
    /// Records handed to the dispatcher.
    pub loaded: u64,
    pub admitted: u64,
    pub rejected: u64,
    /// Jobs that ran out their CPU time.
    pub completed: u64,
    /// Jobs dropped after a start or resume failure.
    pub abandoned: u64,
    pub preemptions: u64,
    pub runtime_failures: u64,
    pub quanta_elapsed: u64,
    /// Quanta in which some job held the CPU.
    pub busy_quanta: u64,
    pub total_turnaround: Ticks,
    pub total_response: Ticks,
    pub started_jobs: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DispatcherMetrics {
    /// Record a job's first start.
    pub fn record_start(&mut self, arrival: Ticks, now: Ticks) {
        self.started_jobs += 1;
        self.total_response += now.saturating_sub(arrival);
    }

    /// Record a job running to completion.
    pub fn record_completion(&mut self, arrival: Ticks, now: Ticks) {
        self.completed += 1;
        self.total_turnaround += now.saturating_sub(arrival);
    }

    /// Mean quanta from arrival to completion.
    pub fn average_turnaround(&self) -> f64 {
        ratio(self.total_turnaround, self.completed)
    }

    /// Mean quanta from arrival to first start.
    pub fn average_response(&self) -> f64 {
        ratio(self.total_response, self.started_jobs)
    }

    /// Share of quanta with a job on the CPU (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        ratio(self.busy_quanta, self.quanta_elapsed)
    }

    pub fn wall_clock(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
