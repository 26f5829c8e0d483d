//! Job dispatching for the HOST machine: memory partitioning, peripheral
//! accounting, admission and the multi-level feedback scheduler.

pub mod admission;
pub mod error;
pub mod job;
pub mod memory;
pub mod queue;
pub mod resources;
pub mod scheduler;
pub mod timer;

pub use admission::{AdmissionController, AdmissionError};
pub use error::{DispatchError, MemoryError};
pub use job::{Job, JobId};
pub use memory::{BlockId, BlockInfo, MemoryAllocator};
pub use queue::JobQueue;
pub use resources::ResourceLedger;
pub use scheduler::{DispatchEvent, Dispatcher, DispatcherMetrics, StatusReport};
pub use timer::{InstantTimer, QuantumTimer, SleepTimer};
