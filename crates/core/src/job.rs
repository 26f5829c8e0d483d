use std::fmt;
use std::ops::{AddAssign, SubAssign};

use serde::{Deserialize, Serialize};

/// Logical time, counted in dispatcher quanta.
pub type Ticks = u64;

/// One line of a dispatch list: the raw 8-tuple describing a job.
///
/// Values are taken as-is; range checks (priority, capacity ceilings) happen
/// at admission, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub arrival_time: Ticks,
    pub priority: u32,
    pub cpu_time: Ticks,
    pub memory: usize,
    pub printers: u32,
    pub scanners: u32,
    pub modems: u32,
    pub cds: u32,
}

impl JobRecord {
    /// Number of integer fields on a dispatch-list line.
    pub const FIELD_COUNT: usize = 8;

    /// Peripheral demand of this record.
    pub fn resources(&self) -> Resources {
        Resources {
            printers: self.printers,
            scanners: self.scanners,
            modems: self.modems,
            cds: self.cds,
        }
    }
}

/// Job priority. Lower numeric value = higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Priority {
    /// Real-time: FCFS lane, never preempted, runs on the reserved block.
    P0 = 0,
    /// Highest feedback lane; every user job enters here or below.
    P1 = 1,
    P2 = 2,
    /// Lowest feedback lane. Demotion stops here.
    P3 = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::P0, Priority::P1, Priority::P2, Priority::P3];

    pub fn is_real_time(self) -> bool {
        self == Priority::P0
    }

    /// Next lane down after a preemption, capped at [`Priority::P3`].
    ///
    /// Real-time jobs are never demoted.
    pub fn demoted(self) -> Priority {
        match self {
            Priority::P0 => Priority::P0,
            Priority::P1 => Priority::P2,
            Priority::P2 | Priority::P3 => Priority::P3,
        }
    }

    /// Lane index (0-3).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for Priority {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::P0),
            1 => Ok(Priority::P1),
            2 => Ok(Priority::P2),
            3 => Ok(Priority::P3),
            other => Err(other),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Counts of the four peripheral kinds, used both for demands and pool sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub printers: u32,
    pub scanners: u32,
    pub modems: u32,
    pub cds: u32,
}

impl Resources {
    pub const ZERO: Resources = Resources {
        printers: 0,
        scanners: 0,
        modems: 0,
        cds: 0,
    };

    pub fn new(printers: u32, scanners: u32, modems: u32, cds: u32) -> Self {
        Self {
            printers,
            scanners,
            modems,
            cds,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// True if every count is `<=` the matching count in `limit`.
    pub fn fits_within(&self, limit: &Resources) -> bool {
        self.printers <= limit.printers
            && self.scanners <= limit.scanners
            && self.modems <= limit.modems
            && self.cds <= limit.cds
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Self) {
        self.printers += rhs.printers;
        self.scanners += rhs.scanners;
        self.modems += rhs.modems;
        self.cds += rhs.cds;
    }
}

impl SubAssign for Resources {
    fn sub_assign(&mut self, rhs: Self) {
        self.printers -= rhs.printers;
        self.scanners -= rhs.scanners;
        self.modems -= rhs.modems;
        self.cds -= rhs.cds;
    }
}

/// Lifecycle of a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    NotStarted,
    Running,
    Suspended,
    Terminated,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::NotStarted => write!(f, "NOT STARTED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Suspended => write!(f, "SUSPENDED"),
            JobStatus::Terminated => write!(f, "TERMINATED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering() {
        assert!(Priority::P0 < Priority::P1);
        assert!(Priority::P1 < Priority::P2);
        assert!(Priority::P2 < Priority::P3);
    }

    #[test]
    fn demotion_caps_at_lowest_lane() {
        assert_eq!(Priority::P1.demoted(), Priority::P2);
        assert_eq!(Priority::P2.demoted(), Priority::P3);
        assert_eq!(Priority::P3.demoted(), Priority::P3);
        assert_eq!(Priority::P0.demoted(), Priority::P0);
    }

    #[test]
    fn priority_from_raw() {
        assert_eq!(Priority::try_from(0), Ok(Priority::P0));
        assert_eq!(Priority::try_from(3), Ok(Priority::P3));
        assert_eq!(Priority::try_from(4), Err(4));
        assert_eq!(Priority::P2.to_string(), "2");
        assert_eq!(Priority::P2.index(), 2);
    }

    #[test]
    fn resources_fit_and_arithmetic() {
        let pool = Resources::new(2, 1, 1, 2);
        assert!(Resources::new(2, 0, 1, 0).fits_within(&pool));
        assert!(!Resources::new(3, 0, 0, 0).fits_within(&pool));
        assert!(!Resources::new(0, 0, 0, 3).fits_within(&pool));

        let mut free = pool;
        free -= Resources::new(1, 1, 0, 2);
        assert_eq!(free, Resources::new(1, 0, 1, 0));
        free += Resources::new(1, 1, 0, 2);
        assert_eq!(free, pool);
        assert!(Resources::ZERO.is_zero());
    }

    #[test]
    fn record_resources() {
        let record = JobRecord {
            arrival_time: 0,
            priority: 1,
            cpu_time: 3,
            memory: 200,
            printers: 1,
            scanners: 0,
            modems: 1,
            cds: 2,
        };
        assert_eq!(record.resources(), Resources::new(1, 0, 1, 2));
    }
}
