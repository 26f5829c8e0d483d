//! Parse dispatch-list text into [`JobRecord`]s.
//!
//! A dispatch list has one job per line, eight non-negative integers
//! separated by commas and/or whitespace:
//!
//! ```text
//! <arrival>, <priority>, <cpu time>, <MBytes>, <printers>, <scanners>, <modems>, <CDs>
//! ```

use std::path::Path;

use tracing::warn;

use hostd_core::JobRecord;

use crate::error::FeedError;

/// Parse one line. `line_no` is 1-based and only used for error reporting.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<JobRecord>, FeedError> {
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();

    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() != JobRecord::FIELD_COUNT {
        return Err(FeedError::Parse {
            line: line_no,
            reason: format!(
                "expected {} fields, found {}",
                JobRecord::FIELD_COUNT,
                fields.len()
            ),
        });
    }

    let mut values = [0u64; JobRecord::FIELD_COUNT];
    for (slot, raw) in values.iter_mut().zip(&fields) {
        *slot = raw.parse().map_err(|_| FeedError::Parse {
            line: line_no,
            reason: format!("'{raw}' is not a non-negative integer"),
        })?;
    }

    let narrow = |v: u64, name: &str| -> Result<u32, FeedError> {
        u32::try_from(v).map_err(|_| FeedError::Parse {
            line: line_no,
            reason: format!("{name} {v} out of range"),
        })
    };
    let memory = usize::try_from(values[3]).map_err(|_| FeedError::Parse {
        line: line_no,
        reason: format!("memory {} out of range", values[3]),
    })?;

    Ok(Some(JobRecord {
        arrival_time: values[0],
        priority: narrow(values[1], "priority")?,
        cpu_time: values[2],
        memory,
        printers: narrow(values[4], "printers")?,
        scanners: narrow(values[5], "scanners")?,
        modems: narrow(values[6], "modems")?,
        cds: narrow(values[7], "cds")?,
    }))
}

/// Parse a whole dispatch list, separating records from skipped lines.
///
/// Returns `(records, errors)` in file order. A bad line never blocks the
/// lines after it.
pub fn parse_dispatch_list(text: &str) -> (Vec<JobRecord>, Vec<FeedError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        match parse_line(line, idx + 1) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Skipping malformed dispatch-list line");
                errors.push(e);
            }
        }
    }

    (records, errors)
}

/// Read and parse a dispatch list from disk.
pub fn read_dispatch_list(
    path: impl AsRef<Path>,
) -> Result<(Vec<JobRecord>, Vec<FeedError>), FeedError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_dispatch_list(&text))
}
