//! Line-oriented ingestion from a serial bridge or pipe.
//!
//! The sensor writes one integer ppm value per line, interleaved with boot
//! banners and other chatter. Only lines made entirely of ASCII digits (after
//! trimming) become readings; they are stamped with the clock's current time.

use std::io::BufRead;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::{day::Clock, store::ReadingSink};

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines stored as readings.
    pub inserted: usize,
    /// Lines that were not a bare integer.
    pub skipped: usize,
    /// Valid lines the store refused.
    pub failed: usize,
}

/// The ppm value on `line`, if the line is a bare non-negative integer.
pub fn parse_reading_line(line: &str) -> Option<f64> {
    let t = line.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    t.parse::<u64>().ok().map(|v| v as f64)
}

/// Read `input` to the end, appending every valid line to `sink`.
///
/// Insert failures are logged and counted; only read errors abort the run.
pub fn ingest_lines<R, K, C>(input: R, sink: &mut K, clock: &C) -> anyhow::Result<IngestReport>
where
    R: BufRead,
    K: ReadingSink + ?Sized,
    C: Clock + ?Sized,
{
    let mut report = IngestReport::default();
    for line in input.lines() {
        let line = line.context("read ingest input")?;
        let Some(value) = parse_reading_line(&line) else {
            debug!(line = %line.trim(), "skipping non-numeric line");
            report.skipped += 1;
            continue;
        };
        match sink.insert_reading(clock.now(), value) {
            Ok(id) => {
                debug!(id, value, "stored reading");
                report.inserted += 1;
            }
            Err(e) => {
                warn!(value, error = %e, "failed to store reading");
                report.failed += 1;
            }
        }
    }
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "ingest finished"
    );
    Ok(report)
}
