use std::path::PathBuf;

use st_spatial::MixError;
use thiserror::Error;

/// Errors surfaced by the offline render pipeline
#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Mix(#[from] MixError),

    #[error("failed to write '{path}': {source}")]
    Encode {
        path: PathBuf,
        source: hound::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type OfflineResult<T> = Result<T, OfflineError>;
