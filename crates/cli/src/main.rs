mod cli;
mod terminal;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use hostd_core::config::load_dotenv;
use hostd_core::{Config, ProcessRuntime};
use hostd_dispatch::{Dispatcher, InstantTimer, QuantumTimer, SleepTimer};
use hostd_runtime::SimulatedRuntime;

use crate::cli::CliArgs;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let Some(list_path) = args.dispatch_list.as_deref() else {
        return print_readme(&args.readme);
    };

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(ms) = args.quantum_ms {
        config.dispatcher.quantum_ms = ms;
    }
    config.log_summary();

    let (records, skipped) = hostd_feed::read_dispatch_list(list_path)
        .with_context(|| format!("ERROR - Could not open file \"{}\"", list_path.display()))?;
    for err in &skipped {
        warn!(error = %err, "dispatch-list line skipped");
    }
    info!(jobs = records.len(), skipped = skipped.len(), "dispatch list read");

    let runtime = build_runtime(args.simulate)?;
    let timer: Box<dyn QuantumTimer> = if config.dispatcher.quantum_ms == 0 {
        Box::new(InstantTimer)
    } else {
        Box::new(SleepTimer::new(config.dispatcher.quantum()))
    };

    let mut dispatcher =
        Dispatcher::new(&config, runtime, timer).context("failed to initialize dispatcher")?;
    dispatcher.load(records);

    let terminal = Terminal::new(args.json);
    let mut display_error = None;
    let metrics = dispatcher
        .run_with(|event| {
            if let Err(e) = terminal.display_event(event) {
                display_error.get_or_insert(e);
            }
        })
        .context("dispatcher halted")?;
    if let Some(e) = display_error {
        return Err(e.context("failed to write dispatcher output"));
    }

    terminal.print_summary(&metrics)?;
    Ok(())
}

/// Print the readme shown when no dispatch list is given.
fn print_readme(path: &Path) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_readme(path, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn write_readme(path: &Path, out: &mut impl Write) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("ERROR - Could not open readme file \"{}\"", path.display()))?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

fn build_runtime(simulate: bool) -> Result<Box<dyn ProcessRuntime>> {
    if simulate {
        info!("using simulated runtime");
        return Ok(Box::new(SimulatedRuntime::new()));
    }
    #[cfg(unix)]
    {
        Ok(Box::new(hostd_runtime::ChildProcessRuntime::new()))
    }
    #[cfg(not(unix))]
    {
        anyhow::bail!("real job processes need a Unix host; pass --simulate")
    }
}
