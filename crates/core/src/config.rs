use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HostdError;
use crate::job::Resources;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ── Top-level config ──────────────────────────────────────────

/// Dispatcher configuration, typically parsed from `hostd.toml`.
///
/// Every field has a default matching the classic HOST machine (1024MB with
/// 64MB reserved for real-time jobs, 2 printers, 1 scanner, 1 modem, 2 CD
/// drives, one-second quantum), so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed machine capacities.
    #[serde(default)]
    pub system: SystemConfig,

    /// Scheduling loop settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

// ── Sections ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Size of the whole address space, in MB.
    #[serde(default = "default_total_memory")]
    pub total_memory: usize,
    /// Slice of `total_memory` pinned for real-time jobs.
    #[serde(default = "default_reserved_memory")]
    pub reserved_memory: usize,
    #[serde(default = "default_printers")]
    pub printers: u32,
    #[serde(default = "default_scanners")]
    pub scanners: u32,
    #[serde(default = "default_modems")]
    pub modems: u32,
    #[serde(default = "default_cds")]
    pub cds: u32,
}

fn default_total_memory() -> usize { 1024 }
fn default_reserved_memory() -> usize { 64 }
fn default_printers() -> u32 { 2 }
fn default_scanners() -> u32 { 1 }
fn default_modems() -> u32 { 1 }
fn default_cds() -> u32 { 2 }

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            total_memory: default_total_memory(),
            reserved_memory: default_reserved_memory(),
            printers: default_printers(),
            scanners: default_scanners(),
            modems: default_modems(),
            cds: default_cds(),
        }
    }
}

impl SystemConfig {
    /// Memory available to user (non-real-time) jobs.
    pub fn general_memory(&self) -> usize {
        self.total_memory.saturating_sub(self.reserved_memory)
    }

    /// Peripheral pool sizes.
    pub fn peripherals(&self) -> Resources {
        Resources::new(self.printers, self.scanners, self.modems, self.cds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Wall-clock length of one quantum in milliseconds. 0 = don't sleep.
    #[serde(default = "default_quantum_ms")]
    pub quantum_ms: u64,
    /// Program and arguments launched for every job.
    #[serde(default = "default_job_command")]
    pub job_command: Vec<String>,
}

fn default_quantum_ms() -> u64 { 1000 }
fn default_job_command() -> Vec<String> { vec!["./process".to_string()] }

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            quantum_ms: default_quantum_ms(),
            job_command: default_job_command(),
        }
    }
}

impl DispatcherConfig {
    pub fn quantum(&self) -> Duration {
        Duration::from_millis(self.quantum_ms)
    }
}

// ── Loading ───────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl Config {
    /// Parse config from a TOML string, then apply env overrides and validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, HostdError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HostdError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load from `path` if given, otherwise start from defaults.
    /// Env overrides and validation apply either way.
    pub fn load(path: Option<&Path>) -> Result<Self, HostdError> {
        match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config");
                Self::from_file(p)
            }
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Convention: `HOSTD_SECTION_KEY` overrides `section.key`, e.g.
    /// `HOSTD_SYSTEM_TOTAL_MEMORY` or `HOSTD_DISPATCHER_QUANTUM_MS`.
    /// `HOSTD_DISPATCHER_JOB_COMMAND` is split on whitespace.
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok().filter(|v| !v.is_empty()));
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = lookup(key)?;
            match raw.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "ignoring unparsable env override");
                    None
                }
            }
        }

        if let Some(v) = parsed(&lookup, "HOSTD_SYSTEM_TOTAL_MEMORY") {
            self.system.total_memory = v;
        }
        if let Some(v) = parsed(&lookup, "HOSTD_SYSTEM_RESERVED_MEMORY") {
            self.system.reserved_memory = v;
        }
        if let Some(v) = parsed(&lookup, "HOSTD_SYSTEM_PRINTERS") {
            self.system.printers = v;
        }
        if let Some(v) = parsed(&lookup, "HOSTD_SYSTEM_SCANNERS") {
            self.system.scanners = v;
        }
        if let Some(v) = parsed(&lookup, "HOSTD_SYSTEM_MODEMS") {
            self.system.modems = v;
        }
        if let Some(v) = parsed(&lookup, "HOSTD_SYSTEM_CDS") {
            self.system.cds = v;
        }
        if let Some(v) = parsed(&lookup, "HOSTD_DISPATCHER_QUANTUM_MS") {
            self.dispatcher.quantum_ms = v;
        }
        if let Some(v) = lookup("HOSTD_DISPATCHER_JOB_COMMAND") {
            self.dispatcher.job_command = v.split_whitespace().map(String::from).collect();
        }
    }

    /// Validate capacities and the job command.
    pub fn validate(&self) -> Result<(), HostdError> {
        let system = &self.system;
        if system.total_memory == 0 {
            return Err(HostdError::Config("system.total_memory must be non-zero".into()));
        }
        if system.reserved_memory == 0 {
            return Err(HostdError::Config(
                "system.reserved_memory must be non-zero".into(),
            ));
        }
        if system.reserved_memory >= system.total_memory {
            return Err(HostdError::Config(format!(
                "system.reserved_memory ({}) must be smaller than system.total_memory ({})",
                system.reserved_memory, system.total_memory
            )));
        }
        if self.dispatcher.job_command.is_empty() {
            return Err(HostdError::Config("dispatcher.job_command must not be empty".into()));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let s = &self.system;
        tracing::info!("Config loaded:");
        tracing::info!(
            "  system:      memory={}MB (reserved {}MB), printers={}, scanners={}, modems={}, cds={}",
            s.total_memory, s.reserved_memory, s.printers, s.scanners, s.modems, s.cds
        );
        tracing::info!(
            "  dispatcher:  quantum={}ms, command={:?}",
            self.dispatcher.quantum_ms, self.dispatcher.job_command
        );
    }
}
