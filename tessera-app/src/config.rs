//! Command-line arguments and layered solver settings.

use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wfc_core::{BoundaryCondition, IndexPickerKind};

/// Prefix of environment variables that override solver settings,
/// e.g. `TESSERA_WIDTH=32`.
pub const ENV_PREFIX: &str = "TESSERA_";

/// Represents the different visualization modes available.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum VisualizationMode {
    #[default]
    None,
    /// Print the final grid to stdout with one colour per tile.
    Terminal,
}

/// Log level for everything except progress reports.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<GlobalLogLevel> for LevelFilter {
    fn from(level: GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

/// Log level used for progress reports.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

impl From<ProgressLogLevel> for LevelFilter {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

impl From<ProgressLogLevel> for log::Level {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

/// Structural constraints that can be applied to the path tiles.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathConstraintKind {
    /// All path cells form one connected region.
    Connected,
    /// The path never closes a cycle.
    Acyclic,
    /// The path has no dead ends or cut points.
    Loop,
}

/// Configuration for the Tessera application.
///
/// Solver fields are optional here: when given they take precedence over
/// the TOML file and the environment. See [`AppConfig::settings`].
#[derive(Parser, Debug, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Path to the RON sample file describing the model.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip)]
    pub sample_file: PathBuf,

    /// Optional TOML file with solver settings.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Width of the output grid.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,

    /// Height of the output grid.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,

    /// Depth of the output grid. Only 3D direction sets use more than one layer.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,

    /// Whether the output grid wraps around at its edges.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryCondition>,

    /// Strategy for choosing the next cell to decide.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_picker: Option<IndexPickerKind>,

    /// Decisions kept for backtracking. 0 disables backtracking.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backtrack_depth: Option<usize>,

    /// Keep every decision for backtracking.
    #[arg(long, default_value_t = false)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unbounded_backtracking: bool,

    /// Optional seed for the random number generator.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Steps allowed before the run gives up.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,

    /// A tile that forms part of the path. Repeat for several tiles.
    #[arg(long = "path-tile", value_name = "TILE")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_tiles: Vec<char>,

    /// A constraint applied to the path tiles. Repeat for several.
    #[arg(long = "path-constraint", value_enum, value_name = "KIND")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_constraints: Vec<PathConstraintKind>,

    /// A cell index the path has to reach. Repeat for several.
    #[arg(long = "relevant-cell", value_name = "INDEX")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relevant_cells: Vec<usize>,

    /// Path to save the generated output grid.
    #[arg(short, long, value_name = "FILE", default_value = "output.txt")]
    #[serde(skip)]
    pub output_path: PathBuf,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    #[serde(skip)]
    pub report_progress_interval: Option<Duration>,

    /// Append progress reports to this file as well.
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub progress_log_file: Option<PathBuf>,

    /// Stop the run once it has taken this long (e.g., "30s").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    #[serde(skip)]
    pub time_limit: Option<Duration>,

    /// Choose the visualization mode.
    #[arg(long, value_enum, default_value_t = VisualizationMode::None)]
    #[serde(skip)]
    pub visualization_mode: VisualizationMode,

    /// Log level for everything but progress reports.
    #[arg(long, value_enum, default_value_t = GlobalLogLevel::Info)]
    #[serde(skip)]
    pub global_log_level: GlobalLogLevel,

    /// Log level for progress reports.
    #[arg(long, value_enum, default_value_t = ProgressLogLevel::Info)]
    #[serde(skip)]
    pub progress_log_level: ProgressLogLevel,
}

/// Solver settings after merging defaults, the config file, the
/// environment and the command line, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub boundary: BoundaryCondition,
    pub index_picker: IndexPickerKind,
    pub max_backtrack_depth: Option<usize>,
    pub unbounded_backtracking: bool,
    pub seed: Option<u64>,
    pub max_iterations: Option<u64>,
    pub path_tiles: Vec<char>,
    pub path_constraints: Vec<PathConstraintKind>,
    pub relevant_cells: Vec<usize>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            depth: 1,
            boundary: BoundaryCondition::Finite,
            index_picker: IndexPickerKind::Entropy,
            max_backtrack_depth: Some(64),
            unbounded_backtracking: false,
            seed: None,
            max_iterations: None,
            path_tiles: Vec::new(),
            path_constraints: Vec::new(),
            relevant_cells: Vec::new(),
        }
    }
}

impl SolverSettings {
    /// Rejects settings the solver cannot start from.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(AppError::Config(format!(
                "grid dimensions must be positive, got {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        if !self.path_constraints.is_empty() && self.path_tiles.is_empty() {
            return Err(AppError::Config(
                "path constraints need at least one path tile".to_string(),
            ));
        }
        if !self.relevant_cells.is_empty() && self.path_constraints.is_empty() {
            return Err(AppError::Config(
                "relevant cells are only used by path constraints".to_string(),
            ));
        }
        let cells = self.width * self.height * self.depth;
        if let Some(&cell) = self.relevant_cells.iter().find(|&&cell| cell >= cells) {
            return Err(AppError::Config(format!(
                "relevant cell {cell} is outside the {cells}-cell grid"
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Merges the solver settings from every source and validates them.
    pub fn settings(&self) -> Result<SolverSettings, AppError> {
        let mut figment = Figment::from(Serialized::defaults(SolverSettings::default()));
        if let Some(path) = &self.config_file {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        let settings: SolverSettings = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(self))
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_basic_args() {
        let args = vec![
            "tessera",
            "--sample-file",
            "sample.ron",
            "--width",
            "20",
            "--output-path",
            "out.txt",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.sample_file, PathBuf::from("sample.ron"));
        assert_eq!(config.width, Some(20));
        assert_eq!(config.height, None);
        assert_eq!(config.output_path, PathBuf::from("out.txt"));
        assert_eq!(config.report_progress_interval, None);
        assert_eq!(config.visualization_mode, VisualizationMode::None);
    }

    #[test]
    fn test_progress_interval() {
        let args = vec![
            "tessera",
            "--sample-file",
            "s.ron",
            "--report-progress-interval",
            "2s",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(
            config.report_progress_interval,
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_value_enums() {
        let args = vec![
            "tessera",
            "--sample-file",
            "s.ron",
            "--visualization-mode",
            "terminal",
            "--index-picker",
            "heap-entropy",
            "--boundary",
            "periodic",
            "--path-constraint",
            "connected",
            "--path-constraint",
            "acyclic",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.visualization_mode, VisualizationMode::Terminal);
        assert_eq!(config.index_picker, Some(IndexPickerKind::HeapEntropy));
        assert_eq!(config.boundary, Some(BoundaryCondition::Periodic));
        assert_eq!(
            config.path_constraints,
            vec![PathConstraintKind::Connected, PathConstraintKind::Acyclic]
        );

        let args_err = vec![
            "tessera",
            "--sample-file",
            "s.ron",
            "--visualization-mode",
            "invalid-mode",
        ];
        assert!(AppConfig::try_parse_from(args_err).is_err());
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let config = AppConfig::try_parse_from(vec![
            "tessera",
            "--sample-file",
            "s.ron",
            "--height",
            "7",
            "--seed",
            "3",
        ])
        .unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.height, 7);
        assert_eq!(settings.seed, Some(3));
        assert_eq!(settings.max_backtrack_depth, Some(64));
        assert_eq!(settings.index_picker, IndexPickerKind::Entropy);
    }

    #[test]
    fn test_config_file_is_layered_under_cli() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "width = 5\nheight = 6\npath_tiles = [\"#\"]\npath_constraints = [\"loop\"]"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::try_parse_from(vec![
            "tessera",
            "--sample-file",
            "s.ron",
            "--config-file",
            &path,
            "--width",
            "9",
        ])
        .unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.width, 9);
        assert_eq!(settings.height, 6);
        assert_eq!(settings.path_tiles, vec!['#']);
        assert_eq!(settings.path_constraints, vec![PathConstraintKind::Loop]);
    }

    #[test]
    fn test_missing_config_file() {
        let config = AppConfig::try_parse_from(vec![
            "tessera",
            "--sample-file",
            "s.ron",
            "--config-file",
            "does-not-exist.toml",
        ])
        .unwrap();
        assert!(matches!(config.settings(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validation() {
        let settings = SolverSettings {
            path_constraints: vec![PathConstraintKind::Connected],
            ..SolverSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = SolverSettings {
            width: 0,
            ..SolverSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = SolverSettings {
            path_tiles: vec!['#'],
            path_constraints: vec![PathConstraintKind::Connected],
            relevant_cells: vec![100],
            ..SolverSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(SolverSettings::default().validate().is_ok());
    }
}
