use tracing::trace;

use hostd_core::Resources;

use crate::job::Job;

/// Free counters for the four peripheral pools.
///
/// Invariant: `available + Σ job.held == capacity` for every pool.
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    capacity: Resources,
    available: Resources,
}

impl ResourceLedger {
    pub fn new(capacity: Resources) -> Self {
        Self {
            capacity,
            available: capacity,
        }
    }

    pub fn capacity(&self) -> Resources {
        self.capacity
    }

    pub fn available(&self) -> Resources {
        self.available
    }

    pub fn in_use(&self) -> Resources {
        let mut used = self.capacity;
        used -= self.available;
        used
    }

    /// True if every requested count is currently free.
    pub fn check(&self, demand: &Resources) -> bool {
        demand.fits_within(&self.available)
    }

    /// Take `demand` for `job`. Returns false and changes nothing if any pool
    /// is short.
    pub fn allocate(&mut self, job: &mut Job, demand: Resources) -> bool {
        if !self.check(&demand) {
            return false;
        }
        self.available -= demand;
        job.held += demand;
        trace!(job = %job.id, ?demand, "peripherals allocated");
        true
    }

    /// Return everything `job` holds to the pools.
    pub fn release(&mut self, job: &mut Job) {
        if job.held.is_zero() {
            return;
        }
        self.available += job.held;
        debug_assert!(self.available.fits_within(&self.capacity));
        trace!(job = %job.id, held = ?job.held, "peripherals released");
        job.held = Resources::ZERO;
    }
}
