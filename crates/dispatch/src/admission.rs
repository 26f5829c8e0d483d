//! Admission control: the one-time gate between the dispatch list and the
//! queues. A rejected job is dropped for good; nothing is allocated.

use serde::Serialize;
use thiserror::Error;

use hostd_core::config::SystemConfig;
use hostd_core::{JobRecord, Priority, Resources};

/// Why a job was refused at admission.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdmissionError {
    #[error("Invalid priority {priority}")]
    InvalidPriority { priority: u32 },

    #[error("Job requests no CPU time")]
    NoCpuTime,

    #[error("Job requests no memory")]
    NoMemory,

    #[error("Real-time memory request({requested}MB) exceeds reserved memory({limit}MB)")]
    RealTimeMemoryExceeded { requested: usize, limit: usize },

    #[error("Real-time job not allowed I/O resources")]
    RealTimeResources,

    #[error("Job memory request({requested}MB) exceeds total memory({limit}MB)")]
    MemoryExceeded { requested: usize, limit: usize },

    #[error("Job demands too many resources")]
    ResourcesExceeded {
        requested: Resources,
        capacity: Resources,
    },
}

/// Checks job records against the machine's fixed ceilings.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    reserved_memory: usize,
    general_memory: usize,
    peripherals: Resources,
}

impl AdmissionController {
    pub fn new(system: &SystemConfig) -> Self {
        Self {
            reserved_memory: system.reserved_memory,
            general_memory: system.general_memory(),
            peripherals: system.peripherals(),
        }
    }

    /// Validate `record` and return the lane it enters on.
    ///
    /// Real-time jobs must fit the reserved block and hold no peripherals.
    /// Other jobs must fit the general pool and the peripheral pool sizes;
    /// whether they fit *right now* is the backlog's concern.
    pub fn admit(&self, record: &JobRecord) -> Result<Priority, AdmissionError> {
        let priority = Priority::try_from(record.priority)
            .map_err(|priority| AdmissionError::InvalidPriority { priority })?;
        if record.cpu_time == 0 {
            return Err(AdmissionError::NoCpuTime);
        }

        let requested = record.resources();
        if priority.is_real_time() {
            if record.memory > self.reserved_memory {
                return Err(AdmissionError::RealTimeMemoryExceeded {
                    requested: record.memory,
                    limit: self.reserved_memory,
                });
            }
            if !requested.is_zero() {
                return Err(AdmissionError::RealTimeResources);
            }
        } else {
            if record.memory == 0 {
                return Err(AdmissionError::NoMemory);
            }
            if record.memory > self.general_memory {
                return Err(AdmissionError::MemoryExceeded {
                    requested: record.memory,
                    limit: self.general_memory,
                });
            }
            if !requested.fits_within(&self.peripherals) {
                return Err(AdmissionError::ResourcesExceeded {
                    requested,
                    capacity: self.peripherals,
                });
            }
        }
        Ok(priority)
    }
}
