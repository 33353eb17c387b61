use crate::config::ProgressLogLevel;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use wfc_core::{ProgressInfo, RunReport, WfcError};

/// Trait for reporting the progress of a solve.
pub trait ProgressReporter: Send {
    /// Called with every progress snapshot the runner produces.
    fn report(&mut self, info: &ProgressInfo) -> Result<()>;

    /// Called when the run completes successfully.
    fn finish(&mut self, report: &RunReport) -> Result<()>;

    /// Called when the run fails.
    fn fail(&mut self, error: &WfcError) -> Result<()>;
}

/// Logs progress at a fixed interval, optionally mirroring it to a file.
pub struct ConsoleProgressReporter {
    interval: Duration,
    level: log::Level,
    last_report: Option<Instant>,
    log_file: Option<BufWriter<File>>,
}

impl ConsoleProgressReporter {
    pub fn new(interval: Duration, level: ProgressLogLevel) -> Self {
        Self {
            interval,
            level: level.into(),
            last_report: None,
            log_file: None,
        }
    }

    /// Appends every emitted line to `path`.
    pub fn with_log_file(mut self, path: &Path) -> Result<Self> {
        log::info!("Opening progress log file: {}", path.display());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open progress log file: {}", path.display()))?;
        self.log_file = Some(BufWriter::new(file));
        Ok(self)
    }

    fn emit(&mut self, line: &str) -> Result<()> {
        log::log!(self.level, "{line}");
        if let Some(writer) = &mut self.log_file {
            writeln!(writer, "{line}").context("Failed to write to progress log file")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = &mut self.log_file {
            writer.flush().context("Failed to flush progress log file")?;
        }
        Ok(())
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report(&mut self, info: &ProgressInfo) -> Result<()> {
        let now = Instant::now();
        let due = self
            .last_report
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if due {
            self.last_report = Some(now);
            self.emit(&format_progress(info))?;
        }
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        self.emit(&format!(
            "Finished: {} iterations, {} decisions, {} backtracks in {:.2?}",
            report.iterations, report.decisions, report.backtracks, report.elapsed_time
        ))?;
        self.flush()
    }

    fn fail(&mut self, error: &WfcError) -> Result<()> {
        self.emit(&format!("Failed: {error}"))?;
        self.flush()
    }
}

fn percentage(info: &ProgressInfo) -> f32 {
    if info.total_cells > 0 {
        info.decided_cells as f32 / info.total_cells as f32 * 100.0
    } else {
        100.0
    }
}

/// One progress line, with rate and estimated time remaining.
pub fn format_progress(info: &ProgressInfo) -> String {
    let elapsed_secs = info.elapsed_time.as_secs_f32();
    let rate = if elapsed_secs > 0.0 {
        info.decided_cells as f32 / elapsed_secs
    } else {
        0.0
    };
    let remaining = info.total_cells.saturating_sub(info.decided_cells);
    let eta = if rate > 0.0 {
        format!("{:.1?}", Duration::from_secs_f32(remaining as f32 / rate))
    } else {
        "unknown".to_string()
    };
    format!(
        "Progress: Iter {}, Decided {}/{} ({:.1}%), Backtracks {}, Elapsed: {:.2?}, Rate: {:.1} cells/s, ETA: {}",
        info.iterations,
        info.decided_cells,
        info.total_cells,
        percentage(info),
        info.backtracks,
        info.elapsed_time,
        rate,
        eta
    )
}
