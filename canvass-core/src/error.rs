use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvassError {
    #[error("trial table not found: {0}")]
    MissingTable(PathBuf),

    #[error("trial table schema error: {0}")]
    Schema(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
