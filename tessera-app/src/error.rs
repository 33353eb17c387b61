use thiserror::Error;
use wfc_core::WfcError;
use wfc_rules::{LoadError, RulesError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sample Error: {0}")]
    Load(#[from] LoadError),

    #[error("Rules Error: {0}")]
    Rules(#[from] RulesError),

    #[error("WFC Core Error: {0}")]
    WfcCore(#[from] WfcError),

    #[error("Run cancelled")]
    Cancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
