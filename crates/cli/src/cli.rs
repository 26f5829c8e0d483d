use std::path::PathBuf;

use clap::Parser;

/// HOST dispatcher.
///
/// Reads a dispatch list (one job per line: arrival, priority, CPU time,
/// MBytes, printers, scanners, modems, CDs) and runs every job to
/// completion under the real-time + feedback scheduler. Without a dispatch
/// list, prints the readme and exits.
#[derive(Parser, Debug)]
#[command(name = "hostd", about = "HOST job dispatcher")]
pub struct CliArgs {
    /// Dispatch list to run
    pub dispatch_list: Option<PathBuf>,

    /// Path to config file (TOML). Defaults apply when not set.
    #[arg(long, env = "HOSTD_CONFIG")]
    pub config: Option<PathBuf>,

    /// File printed when no dispatch list is given
    #[arg(long, default_value = "readme.txt")]
    pub readme: PathBuf,

    /// Quantum length override in milliseconds (0 = no wall-clock wait)
    #[arg(long)]
    pub quantum_ms: Option<u64>,

    /// Do not spawn processes; simulate them instead
    #[arg(long)]
    pub simulate: bool,

    /// Print events as JSON lines instead of the status table
    #[arg(long)]
    pub json: bool,
}
