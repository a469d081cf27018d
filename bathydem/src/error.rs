use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid grid header {0}")]
    Header(PathBuf),

    #[error("invalid grid data length {0} for {1}")]
    GridLen(u64, PathBuf),
}
