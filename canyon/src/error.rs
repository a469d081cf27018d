use bathydem::DemError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanyonError {
    #[error("missing or invalid required parameters")]
    Builder,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no grid files in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Dem(#[from] DemError),

    #[error("thalweg polyline is empty or has zero length")]
    EmptyThalweg,
}
