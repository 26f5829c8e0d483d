use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use hostd_dispatch::{DispatchEvent, DispatcherMetrics, StatusReport};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const STARTED: Color = Color::Green;
    const ERROR: Color = Color::Red;
    const WARN: Color = Color::Yellow;
    const DIM: Color = Color::DarkGrey;
}

const STATUS_HEADER: &str =
    "    pid\t    arrive\tprior\tcpu\toffset\tMBytes\tprn\tscn\tmodem\tcd\tstatus";

/// Renders dispatcher events on stdout, as a status table or JSON lines.
pub struct Terminal {
    json: bool,
}

impl Terminal {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Display one dispatcher event.
    pub fn display_event(&self, event: &DispatchEvent) -> Result<()> {
        if self.json {
            return print_json(event);
        }

        let mut stdout = io::stdout();
        match event {
            DispatchEvent::Started(report) => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::HEADER),
                    Print(STATUS_HEADER),
                    Print("\n"),
                    ResetColor,
                    SetForegroundColor(Colors::STARTED),
                    Print(status_row(report)),
                    Print("\n"),
                    ResetColor,
                )?;
            }
            DispatchEvent::Rejected { reason, .. } => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::ERROR),
                    Print(format!("\nERROR - {reason} - job deleted\n\n")),
                    ResetColor,
                )?;
            }
            DispatchEvent::RuntimeFailed { job, operation, error } => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::WARN),
                    Print(format!("\t{operation} of job {job} failed: {error}\n")),
                    ResetColor,
                )?;
            }
            // The rest is only visible through tracing.
            _ => {}
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self, metrics: &DispatcherMetrics) -> Result<()> {
        if self.json {
            return print_json(metrics);
        }

        let wall = metrics
            .wall_clock()
            .map(|d| format!("{:.1}s", d.num_milliseconds() as f64 / 1000.0))
            .unwrap_or_else(|| "-".to_string());

        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print("Summary\n"),
            ResetColor,
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "  jobs:        {} loaded, {} admitted, {} rejected\n",
                metrics.loaded, metrics.admitted, metrics.rejected
            )),
            Print(format!(
                "  finished:    {} completed, {} abandoned, {} preemptions\n",
                metrics.completed, metrics.abandoned, metrics.preemptions
            )),
            Print(format!(
                "  time:        {} quanta ({:.0}% busy), wall clock {}\n",
                metrics.quanta_elapsed,
                metrics.utilization() * 100.0,
                wall
            )),
            Print(format!(
                "  averages:    turnaround {:.2}, response {:.2} quanta\n",
                metrics.average_turnaround(),
                metrics.average_response()
            )),
            ResetColor,
        )?;
        if metrics.runtime_failures > 0 {
            execute!(
                stdout,
                SetForegroundColor(Colors::ERROR),
                Print(format!("  runtime failures: {}\n", metrics.runtime_failures)),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// One row under [`STATUS_HEADER`].
fn status_row(r: &StatusReport) -> String {
    format!(
        "  {}\t    {}\t\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        r.pid,
        r.arrival_time,
        r.priority,
        r.remaining_cpu_time,
        r.memory_offset,
        r.memory_size,
        r.resources.printers,
        r.resources.scanners,
        r.resources.modems,
        r.resources.cds,
        r.status,
    )
}
