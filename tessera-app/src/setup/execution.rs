use crate::config::{AppConfig, PathConstraintKind, SolverSettings, VisualizationMode};
use crate::error::AppError;
use crate::output;
use crate::progress::{ConsoleProgressReporter, ProgressReporter};
use crate::visualization::{TerminalVisualizer, Visualizer};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wfc_core::{
    run, AcyclicConstraint, ConnectedConstraint, GridTopology, LoopConstraint, PathSpec,
    ProgressCallback, ProgressInfo, PropagatorOptions, RunConfig, RunReport, TilePropagator,
    TilePropagatorBuilder, WfcError,
};
use wfc_rules::loader::load_from_file;
use wfc_rules::{DirectionSet, SampleSet, Tile};

type SharedReporter = Arc<Mutex<ConsoleProgressReporter>>;

/// Progress reports default to this interval when only a log file or time
/// limit asks for a callback.
const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Grid shape for the sample's direction set. 2D sets always get one layer.
pub fn build_topology(directions: DirectionSet, settings: &SolverSettings) -> GridTopology {
    let depth = if directions == DirectionSet::Cartesian3d {
        settings.depth
    } else {
        if settings.depth != 1 {
            warn!(
                "{directions:?} is two-dimensional; ignoring depth {}",
                settings.depth
            );
        }
        1
    };
    GridTopology::new(directions, settings.width, settings.height, depth)
        .with_boundary(settings.boundary)
}

pub fn propagator_options(settings: &SolverSettings) -> PropagatorOptions {
    let mut builder = PropagatorOptions::builder().index_picker(settings.index_picker);
    builder = if settings.unbounded_backtracking {
        builder.unbounded_backtracking()
    } else {
        builder.max_backtrack_depth(settings.max_backtrack_depth.unwrap_or(0))
    };
    if let Some(seed) = settings.seed {
        builder = builder.seed(seed);
    }
    builder.build()
}

/// Builds the model from the sample set and a propagator carrying every
/// configured path constraint.
pub fn build_propagator(
    sample_set: &SampleSet,
    settings: &SolverSettings,
) -> Result<TilePropagator, AppError> {
    let (model, mapping) = sample_set.build()?;
    info!(
        "Model built: {} patterns over {} tiles",
        model.pattern_count(),
        mapping.tiles().len()
    );
    let topology = build_topology(sample_set.directions, settings);
    info!(
        "Initializing grid: {}x{}x{}",
        topology.width(),
        topology.height(),
        topology.depth()
    );

    let mut builder = TilePropagatorBuilder::new(model, mapping, topology)
        .options(propagator_options(settings));
    let spec = PathSpec::tiles(settings.path_tiles.iter().copied().map(Tile::from_char))
        .with_relevant_cells(settings.relevant_cells.iter().copied());
    for kind in &settings.path_constraints {
        debug!("Adding {kind:?} path constraint");
        builder = match kind {
            PathConstraintKind::Connected => builder.constraint(ConnectedConstraint::new(spec.clone())),
            PathConstraintKind::Acyclic => builder.constraint(AcyclicConstraint::new(spec.clone())),
            PathConstraintKind::Loop => builder.constraint(LoopConstraint::new(spec.clone())),
        };
    }
    Ok(builder.build()?)
}

fn progress_reporter(config: &AppConfig) -> Result<Option<SharedReporter>, AppError> {
    if config.report_progress_interval.is_none() && config.progress_log_file.is_none() {
        return Ok(None);
    }
    let interval = config
        .report_progress_interval
        .unwrap_or(DEFAULT_REPORT_INTERVAL);
    let mut reporter = ConsoleProgressReporter::new(interval, config.progress_log_level);
    if let Some(path) = &config.progress_log_file {
        reporter = reporter.with_log_file(path)?;
    }
    Ok(Some(Arc::new(Mutex::new(reporter))))
}

fn progress_callback(
    reporter: Option<SharedReporter>,
    time_limit: Option<Duration>,
    shutdown_signal: Arc<AtomicBool>,
) -> ProgressCallback {
    Box::new(move |info: &ProgressInfo| {
        if let Some(limit) = time_limit {
            if info.elapsed_time >= limit && !shutdown_signal.swap(true, Ordering::SeqCst) {
                warn!("Time limit of {limit:?} reached, stopping");
            }
        }
        if let Some(reporter) = &reporter {
            let mut guard = reporter.lock().map_err(|_| {
                WfcError::ConfigurationError("progress reporter mutex poisoned".to_string())
            })?;
            guard.report(info).map_err(|e| {
                WfcError::ConfigurationError(format!("progress reporting failed: {e}"))
            })?;
        }
        Ok(())
    })
}

fn with_reporter(reporter: Option<&SharedReporter>, f: impl FnOnce(&mut ConsoleProgressReporter) -> anyhow::Result<()>) {
    let Some(reporter) = reporter else {
        return;
    };
    match reporter.lock() {
        Ok(mut guard) => {
            if let Err(e) = f(&mut guard) {
                error!("Progress reporter failed: {e}");
            }
        }
        Err(_) => error!("Progress reporter mutex poisoned"),
    }
}

/// Runs a solve to completion on an already built propagator.
pub fn run_solver(
    config: &AppConfig,
    settings: &SolverSettings,
    propagator: &mut TilePropagator,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<RunReport, AppError> {
    let reporter = progress_reporter(config)?;

    let mut builder = RunConfig::builder().shutdown_signal(Arc::clone(&shutdown_signal));
    if let Some(max) = settings.max_iterations {
        builder = builder.max_iterations(max);
    }
    if reporter.is_some() || config.time_limit.is_some() {
        builder = builder.progress_callback(progress_callback(
            reporter.clone(),
            config.time_limit,
            Arc::clone(&shutdown_signal),
        ));
    }
    let run_config = builder.build();
    debug!("Run config: {run_config:?}");

    match run(propagator, &run_config) {
        Ok(report) => {
            with_reporter(reporter.as_ref(), |r| r.finish(&report));
            Ok(report)
        }
        Err(e) => {
            error!("WFC failed: {e}");
            with_reporter(reporter.as_ref(), |r| r.fail(&e));
            if matches!(e, WfcError::Interrupted) {
                Err(AppError::Cancelled)
            } else {
                Err(AppError::WfcCore(e))
            }
        }
    }
}

/// Loads the sample file, solves and writes the output grid.
pub fn execute(
    config: &AppConfig,
    settings: &SolverSettings,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<RunReport, AppError> {
    info!("Loading samples from: {}", config.sample_file.display());
    let sample_set = load_from_file(&config.sample_file)?;
    let mut propagator = build_propagator(&sample_set, settings)?;

    let result = run_solver(config, settings, &mut propagator, shutdown_signal);
    let grid = propagator.to_tile_array();
    if config.visualization_mode == VisualizationMode::Terminal {
        TerminalVisualizer::stdout().display_state(&grid)?;
    }
    let report = result?;
    info!(
        "WFC completed: {} decisions, {} backtracks",
        report.decisions, report.backtracks
    );

    if config.output_path.as_os_str().is_empty() {
        info!("Output path not specified, skipping save.");
    } else {
        output::save_grid_to_file(&grid, &config.output_path)?;
    }
    Ok(report)
}
