use std::path::PathBuf;
use thiserror::Error;
use xtal::engine::config::ConfigError;
use xtal::engine::error::ConversionError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
