use crate::core::grid::GridError;
use crate::core::io::ccp4::Ccp4Error;
use crate::core::io::mtz::MtzError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Map does not cover all the ASU")]
    Coverage,

    #[error("mmCIF support not implemented yet")]
    UnsupportedOutput { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: Ccp4Error,
    },

    #[error("{}: {source}", path.display())]
    Mtz {
        path: PathBuf,
        #[source]
        source: MtzError,
    },

    #[error("Fourier transform failed: {0}")]
    Grid(#[from] GridError),
}
