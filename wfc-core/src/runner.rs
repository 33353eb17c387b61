use crate::tile_propagator::TilePropagator;
use crate::{ProgressInfo, Resolution, WfcError};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Alias for the progress callback function type.
pub type ProgressCallback = Box<dyn Fn(&ProgressInfo) -> Result<(), WfcError> + Send + Sync>;

/// Configuration options for [`run`].
pub struct RunConfig {
    pub progress_callback: Option<ProgressCallback>,
    /// Checked between steps; setting it stops the run with
    /// [`WfcError::Interrupted`].
    pub shutdown_signal: Arc<AtomicBool>,
    /// Steps allowed before giving up. Defaults to ten per active cell.
    pub max_iterations: Option<u64>,
    /// Call the progress callback every this many steps (always at the end).
    pub progress_interval: u64,
}

impl RunConfig {
    /// Creates a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            progress_callback: None,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            max_iterations: None,
            progress_interval: 1,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("progress_callback", &self.progress_callback.is_some())
            .field("shutdown_signal", &self.shutdown_signal)
            .field("max_iterations", &self.max_iterations)
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

/// Builder for `RunConfig`.
#[derive(Default)]
pub struct RunConfigBuilder {
    progress_callback: Option<ProgressCallback>,
    shutdown_signal: Option<Arc<AtomicBool>>,
    max_iterations: Option<u64>,
    progress_interval: Option<u64>,
}

impl RunConfigBuilder {
    /// Sets the progress callback function.
    #[must_use]
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Provides an external shutdown signal.
    /// If not provided, a new signal will be created.
    #[must_use]
    pub fn shutdown_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    /// Sets the maximum number of iterations allowed.
    #[must_use]
    pub fn max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    #[must_use]
    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Builds the `RunConfig` instance.
    pub fn build(self) -> RunConfig {
        RunConfig {
            progress_callback: self.progress_callback,
            shutdown_signal: self
                .shutdown_signal
                .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            max_iterations: self.max_iterations,
            progress_interval: self.progress_interval.unwrap_or(1).max(1),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub iterations: u64,
    pub decisions: u64,
    pub backtracks: u64,
    pub elapsed_time: Duration,
}

/// Steps the propagator until every cell is decided.
///
/// Between steps the shutdown signal is checked and the progress callback
/// (if any) is invoked; an error from the callback aborts the run.
///
/// # Errors
///
/// * `WfcError::Contradiction` if the solve fails and backtracking cannot
///   recover.
/// * `WfcError::Interrupted` if the shutdown signal is set.
/// * `WfcError::MaxIterationsReached` if the iteration limit is hit first.
/// * Any error returned by the progress callback.
pub fn run(propagator: &mut TilePropagator, config: &RunConfig) -> Result<RunReport, WfcError> {
    let start_time = Instant::now();
    let (decided, total_cells) = propagator.progress();
    info!("Starting run: {decided}/{total_cells} cells already decided");

    let iteration_limit = config
        .max_iterations
        .unwrap_or_else(|| (total_cells as u64).saturating_mul(10));
    debug!("Iteration limit set to {iteration_limit}");

    let mut iterations = 0u64;
    loop {
        match propagator.status() {
            Resolution::Decided => break,
            Resolution::Contradiction => {
                let reason = propagator
                    .contradiction()
                    .cloned()
                    .unwrap_or_else(|| crate::Contradiction::new("runner", "unknown"));
                error!("Run failed after {iterations} iterations: {reason}");
                return Err(WfcError::Contradiction(reason));
            }
            Resolution::Undecided => {}
        }

        if config.shutdown_signal.load(Ordering::Relaxed) {
            warn!("Shutdown signal received, stopping run prematurely.");
            return Err(WfcError::Interrupted);
        }
        if iterations >= iteration_limit {
            error!("Maximum iterations ({iteration_limit}) exceeded.");
            return Err(WfcError::MaxIterationsReached(iteration_limit));
        }

        propagator.step();
        iterations += 1;

        if iterations % config.progress_interval == 0 || propagator.status() != Resolution::Undecided {
            report_progress(propagator, config, iterations, start_time)?;
        }
    }

    let stats = propagator.stats();
    info!(
        "Run finished in {:?} after {} iterations ({} backtracks).",
        start_time.elapsed(),
        iterations,
        stats.backtracks
    );
    Ok(RunReport {
        iterations,
        decisions: stats.decisions,
        backtracks: stats.backtracks,
        elapsed_time: start_time.elapsed(),
    })
}

fn report_progress(
    propagator: &TilePropagator,
    config: &RunConfig,
    iterations: u64,
    start_time: Instant,
) -> Result<(), WfcError> {
    let Some(callback) = &config.progress_callback else {
        return Ok(());
    };
    let (decided_cells, total_cells) = propagator.progress();
    let info = ProgressInfo {
        decided_cells,
        total_cells,
        elapsed_time: start_time.elapsed(),
        iterations,
        backtracks: propagator.stats().backtracks,
    };
    callback(&info)
}
