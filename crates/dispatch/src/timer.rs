use std::time::Duration;

/// The blocking wait at the end of every dispatcher iteration.
pub trait QuantumTimer {
    fn wait_quantum(&mut self);
}

/// Sleeps the calling thread for one quantum of wall-clock time.
#[derive(Debug, Clone)]
pub struct SleepTimer {
    quantum: Duration,
}

impl SleepTimer {
    pub fn new(quantum: Duration) -> Self {
        Self { quantum }
    }
}

impl QuantumTimer for SleepTimer {
    fn wait_quantum(&mut self) {
        if !self.quantum.is_zero() {
            std::thread::sleep(self.quantum);
        }
    }
}

/// Returns immediately. Logical time still advances one quantum per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantTimer;

impl QuantumTimer for InstantTimer {
    fn wait_quantum(&mut self) {}
}
