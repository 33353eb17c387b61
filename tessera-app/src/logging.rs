//! Logging setup for the application.

use crate::config::AppConfig;
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Module whose log level follows `--progress-log-level`.
pub const PROGRESS_MODULE: &str = "tessera_app::progress";

/// Initializes the logger from the application settings.
///
/// `RUST_LOG` is read first; the global level and the progress module's
/// level from `config` are applied on top of it.
pub fn init_logger(config: &AppConfig) {
    let global_level = LevelFilter::from(config.global_log_level);
    let progress_level = LevelFilter::from(config.progress_log_level);

    let env = Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);
    builder.filter_level(global_level);
    builder.filter_module(PROGRESS_MODULE, progress_level);
    builder.init();

    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        config.global_log_level,
        config.progress_log_level
    );
}
