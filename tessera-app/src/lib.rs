//! Tessera Application Library
//!
//! Configuration, setup, progress reporting and output for the Tessera
//! command-line solver.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;
pub mod visualization;

pub use config::{AppConfig, SolverSettings};
pub use error::AppError;

// Re-export the main function so it can be called from the root crate
pub use crate::app::main;
